use std::path::PathBuf;

/// Command-line derived inputs consumed by the service launcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Configuration file requested by the operator, if any.
    pub config_file: Option<PathBuf>,
    /// Quiet override; `Some(true)` suppresses all log output.
    pub quiet: Option<bool>,
}

impl Settings {
    /// Builds settings from the raw command-line values.
    #[must_use]
    pub fn new(config_file: Option<PathBuf>, quiet: Option<bool>) -> Self {
        Self { config_file, quiet }
    }
}
