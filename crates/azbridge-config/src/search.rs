//! Resolves which configuration file the service host should load.
//!
//! Resolution is not first-match over the caller's input: a system-wide
//! service configuration always replaces a path supplied on the command line,
//! and the file next to the executable replaces it only when no system file
//! exists. When neither candidate exists the caller's value passes through
//! untouched, including an unset path; reporting a missing file is left to
//! [`crate::Config::load`].

use std::path::{Path, PathBuf};

use crate::Settings;
use crate::defaults::{executable_config_path, system_config_path};

/// Candidate locations probed when resolving the service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSearchPaths {
    system: PathBuf,
    fallback: Option<PathBuf>,
}

impl ConfigSearchPaths {
    /// Builds a search order from explicit candidates.
    #[must_use]
    pub fn new(system: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        Self {
            system: system.into(),
            fallback,
        }
    }

    /// Search order for the current platform and executable.
    #[must_use]
    pub fn platform() -> Self {
        Self::new(system_config_path(), executable_config_path())
    }

    /// Platform well-known service configuration path.
    #[must_use]
    pub fn system(&self) -> &Path {
        self.system.as_path()
    }

    /// Configuration path next to the executable.
    #[must_use]
    pub fn fallback(&self) -> Option<&Path> {
        self.fallback.as_deref()
    }

    /// Returns the candidate that should replace the caller's path, if any.
    #[must_use]
    pub fn locate(&self) -> Option<&Path> {
        if self.system.is_file() {
            return Some(self.system.as_path());
        }
        self.fallback().filter(|candidate| candidate.is_file())
    }
}

impl Default for ConfigSearchPaths {
    fn default() -> Self {
        Self::platform()
    }
}

/// Applies the service configuration search order to `settings`.
///
/// Returns the path that was selected from the search order, or `None` when
/// the settings were left unchanged.
pub fn resolve_config_path(settings: &mut Settings, search: &ConfigSearchPaths) -> Option<PathBuf> {
    let located = search.locate()?.to_path_buf();
    settings.config_file = Some(located.clone());
    Some(located)
}
