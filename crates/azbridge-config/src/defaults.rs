use std::env;
use std::path::PathBuf;

/// File name of the service configuration searched by the launcher.
pub const SERVICE_CONFIG_FILE_NAME: &str = "azbridge_config.svc.yml";

/// System-wide service configuration on Unix hosts.
pub const UNIX_SYSTEM_CONFIG_PATH: &str = "/etc/azbridge/azbridge_config.svc.yml";

/// Directory below `CommonApplicationData` holding the Windows service
/// configuration.
pub const WINDOWS_CONFIG_SUBDIRECTORY: [&str; 2] = ["Microsoft", "Azure Relay Bridge"];

const WINDOWS_DEFAULT_PROGRAM_DATA: &str = r"C:\ProgramData";

/// Platform well-known location of the service configuration file.
#[must_use]
pub fn system_config_path() -> PathBuf {
    system_config_path_inner()
}

#[cfg(windows)]
fn system_config_path_inner() -> PathBuf {
    let mut path = common_application_data();
    path.extend(WINDOWS_CONFIG_SUBDIRECTORY);
    path.push(SERVICE_CONFIG_FILE_NAME);
    path
}

#[cfg(not(windows))]
fn system_config_path_inner() -> PathBuf {
    PathBuf::from(UNIX_SYSTEM_CONFIG_PATH)
}

/// Machine-wide application data directory (`%ProgramData%`).
///
/// Falls back to `%ALLUSERSPROFILE%` and finally `C:\ProgramData` when the
/// environment does not expose the folder.
#[must_use]
pub fn common_application_data() -> PathBuf {
    env::var_os("ProgramData")
        .or_else(|| env::var_os("ALLUSERSPROFILE"))
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from(WINDOWS_DEFAULT_PROGRAM_DATA), PathBuf::from)
}

/// Service configuration stored next to the running executable, if the
/// executable location can be determined.
#[must_use]
pub fn executable_config_path() -> Option<PathBuf> {
    let executable = env::current_exe().ok()?;
    let directory = executable.parent()?;
    Some(directory.join(SERVICE_CONFIG_FILE_NAME))
}
