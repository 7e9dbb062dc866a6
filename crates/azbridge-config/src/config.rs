//! Loads the subset of the bridge configuration used by the service host.
//!
//! The full bridge configuration carries forwarding rules and connection
//! strings; the host only needs the logging keys, so every other key is
//! accepted and ignored here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::Settings;
use crate::logging::{Severity, effective_severity};

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file named by the settings does not exist.
    #[error("configuration file '{path}' not found")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },
    /// Reading the configuration file failed.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid YAML.
    #[error("failed to parse configuration file '{path}': {message}")]
    Parse {
        /// Path whose content failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Immutable configuration snapshot shared by the logging pipeline and the
/// hosted worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw log-level token, for example `INFO` or `VERBOSE`.
    #[serde(rename = "LogLevel")]
    pub log_level: Option<String>,
    /// Log file path; an empty or missing value disables file logging.
    #[serde(rename = "LogFileName")]
    pub log_file_name: Option<String>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Config {
    /// Builds a configuration from explicit logging values.
    #[must_use]
    pub fn new(log_level: Option<String>, log_file_name: Option<String>) -> Self {
        Self {
            log_level,
            log_file_name,
            source: None,
        }
    }

    /// Loads the configuration named by `settings`.
    ///
    /// Settings without a configuration path produce the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the named file is missing, unreadable, or
    /// not valid YAML.
    pub fn load(settings: &Settings) -> Result<Self, ConfigError> {
        match settings.config_file.as_deref() {
            Some(path) => Self::load_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Loads the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, unreadable, or not
    /// valid YAML.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let mut config = Self::parse(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(contents).map_err(|error| error.to_string())
    }

    /// Configured log-level token, if any.
    #[must_use]
    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    /// Log file path when file logging is enabled.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(Path::new)
    }

    /// File the configuration was loaded from.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Effective severity under the given quiet override.
    #[must_use]
    pub fn severity(&self, quiet: Option<bool>) -> Severity {
        effective_severity(quiet, self.log_level())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn reads_logging_keys_and_ignores_the_rest() {
        let yaml = "\
LogLevel: INFO
LogFileName: /var/log/azbridge/bridge.log
AzureRelayConnectionString: Endpoint=sb://example/
LocalForward:
  - RelayName: db
    BindAddress: 127.0.0.1
    BindPort: 5432
";
        let config = Config::parse(yaml).expect("configuration should parse");

        assert_eq!(config.log_level(), Some("INFO"));
        assert_eq!(
            config.log_file(),
            Some(Path::new("/var/log/azbridge/bridge.log"))
        );
    }

    #[rstest]
    #[case("")]
    #[case("   \n")]
    fn empty_documents_yield_defaults(#[case] yaml: &str) {
        assert_eq!(Config::parse(yaml).expect("parse"), Config::default());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some(String::from("  ")))]
    fn blank_log_file_disables_file_logging(#[case] name: Option<String>) {
        let config = Config {
            log_file_name: name,
            ..Config::default()
        };
        assert!(config.log_file().is_none());
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = TempDir::new().expect("create temporary directory");
        let path = dir.path().join("absent.yml");

        let error = Config::load_file(&path).expect_err("load should fail");

        assert!(matches!(error, ConfigError::NotFound { path: reported } if reported == path));
    }

    #[test]
    fn settings_without_path_produce_defaults() {
        let config = Config::load(&Settings::default()).expect("defaults load");
        assert_eq!(config, Config::default());
        assert!(config.source().is_none());
    }

    #[test]
    fn severity_honours_quiet_override() {
        let config = Config {
            log_level: Some(String::from("DEBUG")),
            ..Config::default()
        };
        assert_eq!(config.severity(None), Severity::Debug);
        assert_eq!(config.severity(Some(true)), Severity::None);
    }
}
