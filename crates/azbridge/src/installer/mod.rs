//! Registers and removes the bridge with the platform service manager.
//!
//! Both operations are guarded by an installed-state query, which makes them
//! safe to repeat. Neither compensates for a partial failure: an error from
//! the service-control utility propagates unchanged.

mod probe;

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::identity::ServiceIdentity;
use crate::process::{CommandRunner, ProcessError};

#[cfg(windows)]
pub use probe::ScmProbe;
pub use probe::{AssumeInstalledProbe, InstallProbe, InstallState, ProbeError, platform_probe};

#[cfg(test)]
pub(crate) use probe::MockInstallProbe;

const INSTALLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::installer");

/// Command-line flag passed to the service executable by the registration.
pub const SERVICE_RUN_FLAG: &str = "-svc";

/// Errors raised while installing or removing the service.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The service-control utility failed.
    #[error("service registration command failed: {source}")]
    Command {
        /// Underlying process error.
        #[source]
        source: ProcessError,
    },
    /// The path of the running executable could not be determined.
    #[error("failed to resolve the service executable: {source}")]
    Executable {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl From<ProcessError> for InstallError {
    fn from(source: ProcessError) -> Self {
        Self::Command { source }
    }
}

/// Installs and uninstalls the service registration.
pub struct ServiceInstaller<R, P> {
    identity: ServiceIdentity,
    executable: PathBuf,
    control_utility: PathBuf,
    runner: R,
    probe: P,
}

impl<R, P> ServiceInstaller<R, P>
where
    R: CommandRunner,
    P: InstallProbe,
{
    /// Builds an installer for `executable` using the platform
    /// service-control utility.
    pub fn new(identity: ServiceIdentity, executable: PathBuf, runner: R, probe: P) -> Self {
        Self {
            identity,
            executable,
            control_utility: service_control_utility(),
            runner,
            probe,
        }
    }

    /// Builds an installer for the running executable.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Executable`] when the executable path cannot
    /// be determined.
    pub fn for_current_exe(
        identity: ServiceIdentity,
        runner: R,
        probe: P,
    ) -> Result<Self, InstallError> {
        let executable =
            env::current_exe().map_err(|source| InstallError::Executable { source })?;
        Ok(Self::new(identity, executable, runner, probe))
    }

    /// Overrides the service-control utility invoked by the installer.
    #[must_use]
    pub fn with_control_utility(mut self, utility: impl Into<PathBuf>) -> Self {
        self.control_utility = utility.into();
        self
    }

    /// Identity registered by this installer.
    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Service-control utility invoked by this installer.
    #[must_use]
    pub fn control_utility(&self) -> &Path {
        self.control_utility.as_path()
    }

    /// Queries the registration state without suppressing failures.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the state cannot be determined.
    pub fn query(&self) -> Result<InstallState, ProbeError> {
        self.probe.query(&self.identity)
    }

    /// Reports whether the service is registered.
    ///
    /// Query failures are logged and reported as not installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        match self.query() {
            Ok(state) => state == InstallState::Installed,
            Err(error) => {
                warn!(
                    target: INSTALLER_TARGET,
                    service = self.identity.name(),
                    error = %error,
                    "service state query failed; treating service as not installed"
                );
                false
            }
        }
    }

    /// Registers the executable as an auto-start service unless it is
    /// already registered.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Command`] when the service-control utility
    /// fails.
    pub fn install(&self) -> Result<(), InstallError> {
        if self.is_installed() {
            info!(
                target: INSTALLER_TARGET,
                service = self.identity.name(),
                "service already installed; nothing to do"
            );
            return Ok(());
        }
        self.runner
            .execute(&self.control_utility, &self.create_arguments())?;
        info!(
            target: INSTALLER_TARGET,
            service = self.identity.name(),
            executable = %self.executable.display(),
            "service installed"
        );
        Ok(())
    }

    /// Removes the service registration if present.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Command`] when the service-control utility
    /// fails.
    pub fn uninstall(&self) -> Result<(), InstallError> {
        if !self.is_installed() {
            info!(
                target: INSTALLER_TARGET,
                service = self.identity.name(),
                "service not installed; nothing to do"
            );
            return Ok(());
        }
        self.runner
            .execute(&self.control_utility, &self.delete_arguments())?;
        info!(
            target: INSTALLER_TARGET,
            service = self.identity.name(),
            "service uninstalled"
        );
        Ok(())
    }

    /// Arguments of `sc.exe create` for this service.
    #[must_use]
    pub fn create_arguments(&self) -> Vec<OsString> {
        let mut binary_path = self.executable.clone().into_os_string();
        binary_path.push(" ");
        binary_path.push(SERVICE_RUN_FLAG);
        vec![
            OsString::from("create"),
            OsString::from(self.identity.name()),
            OsString::from("binPath="),
            binary_path,
            OsString::from("start="),
            OsString::from("auto"),
            OsString::from("DisplayName="),
            OsString::from(self.identity.display_name()),
        ]
    }

    /// Arguments of `sc.exe delete` for this service.
    #[must_use]
    pub fn delete_arguments(&self) -> Vec<OsString> {
        vec![
            OsString::from("delete"),
            OsString::from(self.identity.name()),
        ]
    }
}

/// Location of `sc.exe` in the Windows system directory.
///
/// Uses `%SystemRoot%\System32` and falls back to resolving `sc.exe` through
/// the search path when the variable is missing.
#[must_use]
pub fn service_control_utility() -> PathBuf {
    env::var_os("SystemRoot")
        .filter(|root| !root.is_empty())
        .map_or_else(
            || PathBuf::from("sc.exe"),
            |root| PathBuf::from(root).join("System32").join("sc.exe"),
        )
}
