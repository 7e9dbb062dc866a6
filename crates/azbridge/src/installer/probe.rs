//! Queries whether the service registration exists.

use std::fmt;

use thiserror::Error;

use crate::identity::ServiceIdentity;

/// Result of an installed-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The service manager knows the service.
    Installed,
    /// The service manager confirmed the service does not exist.
    NotInstalled,
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Installed => "installed",
            Self::NotInstalled => "not installed",
        })
    }
}

/// Errors raised when the installed state cannot be determined.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connecting to the service manager failed.
    #[error("failed to connect to the service manager: {message}")]
    Connect {
        /// Platform diagnostic.
        message: String,
    },
    /// Querying the named service failed for a reason other than absence.
    #[error("failed to query service '{service}': {message}")]
    Query {
        /// Service that was queried.
        service: String,
        /// Platform diagnostic.
        message: String,
    },
}

/// Source of truth for the service registration state.
#[cfg_attr(test, mockall::automock)]
pub trait InstallProbe: Send + Sync {
    /// Queries the registration state of `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the state cannot be determined.
    fn query(&self, identity: &ServiceIdentity) -> Result<InstallState, ProbeError>;
}

/// Probe for platforms without a native service query.
///
/// Always reports [`InstallState::Installed`], so `install` is a no-op and
/// `uninstall` always attempts removal on these hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeInstalledProbe;

impl InstallProbe for AssumeInstalledProbe {
    fn query(&self, _identity: &ServiceIdentity) -> Result<InstallState, ProbeError> {
        Ok(InstallState::Installed)
    }
}

#[cfg(windows)]
pub use scm::ScmProbe;

#[cfg(windows)]
mod scm {
    use std::ffi::OsStr;

    use windows_service::service::ServiceAccess;
    use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};
    use winapi::shared::winerror::ERROR_SERVICE_DOES_NOT_EXIST;

    use super::{InstallProbe, InstallState, ProbeError};
    use crate::identity::ServiceIdentity;

    /// Probe that asks the Windows Service Control Manager.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ScmProbe;

    impl InstallProbe for ScmProbe {
        fn query(&self, identity: &ServiceIdentity) -> Result<InstallState, ProbeError> {
            let manager =
                ServiceManager::local_computer(None::<&str>, ServiceManagerAccess::CONNECT)
                    .map_err(|error| ProbeError::Connect {
                        message: error.to_string(),
                    })?;
            let service = match manager
                .open_service(OsStr::new(identity.name()), ServiceAccess::QUERY_STATUS)
            {
                Ok(service) => service,
                Err(windows_service::Error::Winapi(error))
                    if error.raw_os_error() == Some(ERROR_SERVICE_DOES_NOT_EXIST as i32) =>
                {
                    return Ok(InstallState::NotInstalled);
                }
                Err(error) => {
                    return Err(ProbeError::Query {
                        service: identity.name().to_owned(),
                        message: error.to_string(),
                    });
                }
            };
            service
                .query_status()
                .map(|_| InstallState::Installed)
                .map_err(|error| ProbeError::Query {
                    service: identity.name().to_owned(),
                    message: error.to_string(),
                })
        }
    }
}

/// Probe matching the capabilities of the build target.
#[cfg(windows)]
#[must_use]
pub fn platform_probe() -> ScmProbe {
    ScmProbe
}

/// Probe matching the capabilities of the build target.
#[cfg(not(windows))]
#[must_use]
pub fn platform_probe() -> AssumeInstalledProbe {
    AssumeInstalledProbe
}
