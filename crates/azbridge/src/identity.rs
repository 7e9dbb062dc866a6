//! Names under which the bridge registers with the platform service manager.

use std::fmt;

/// Default internal service name.
pub const DEFAULT_SERVICE_NAME: &str = "azbridgesvc";

/// Default human-readable service name.
pub const DEFAULT_DISPLAY_NAME: &str = "Azure Relay Bridge Service";

/// Internal and display names of the managed service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    name: String,
    display_name: String,
}

impl ServiceIdentity {
    /// Builds an identity from explicit names.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// Internal name used by the service manager and the event log source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name shown to operators.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME, DEFAULT_DISPLAY_NAME)
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.display_name)
    }
}
