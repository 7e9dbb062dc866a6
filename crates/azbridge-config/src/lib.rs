//! Configuration inputs for the Azure Relay Bridge service host.
//!
//! The crate owns the three decisions taken before the host starts: which
//! configuration file to load ([`resolve_config_path`]), the logging subset
//! of that file ([`Config`]), and the effective severity threshold
//! ([`effective_severity`]). All three are computed once and then shared
//! read-only.

mod config;
mod defaults;
mod logging;
mod search;
mod settings;

pub use config::{Config, ConfigError};
pub use defaults::{
    SERVICE_CONFIG_FILE_NAME, UNIX_SYSTEM_CONFIG_PATH, WINDOWS_CONFIG_SUBDIRECTORY,
    common_application_data, executable_config_path, system_config_path,
};
pub use logging::{LogLevelToken, Severity, effective_severity};
pub use search::{ConfigSearchPaths, resolve_config_path};
pub use settings::Settings;
