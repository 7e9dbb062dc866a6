//! Sequences configuration resolution, severity mapping and host start-up,
//! and exposes the one-shot install and uninstall operations.

use std::sync::Arc;

use azbridge_config::{Config, ConfigError, ConfigSearchPaths, Severity, Settings, resolve_config_path};
use thiserror::Error;

use crate::adapter::{AdapterError, ServiceAdapter, select_adapter};
use crate::health::{HostReporter, StructuredHostReporter};
use crate::host::{Host, HostError, HostedWorker};
use crate::identity::ServiceIdentity;
use crate::installer::{InstallError, ServiceInstaller, platform_probe};
use crate::placeholder_worker::IdleWorker;
use crate::process::SystemCommandRunner;

/// Errors surfaced while launching, installing or uninstalling the service.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// The supervisor adapter could not be prepared.
    #[error("failed to prepare service adapter: {source}")]
    Adapter {
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },
    /// The host failed to build or run.
    #[error(transparent)]
    Host(#[from] HostError),
    /// Service registration failed.
    #[error(transparent)]
    Install(#[from] InstallError),
}

impl From<ConfigError> for LaunchError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<AdapterError> for LaunchError {
    fn from(source: AdapterError) -> Self {
        Self::Adapter { source }
    }
}

/// How the process was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Started from a terminal; uses the console adapter.
    Interactive,
    /// Started by the platform service manager.
    Service,
}

impl LaunchMode {
    /// Mode matching the presence of the service flag.
    #[must_use]
    pub const fn from_service_flag(service: bool) -> Self {
        if service {
            Self::Service
        } else {
            Self::Interactive
        }
    }

    /// Whether the platform service manager started the process.
    #[must_use]
    pub const fn is_service(self) -> bool {
        matches!(self, Self::Service)
    }
}

/// Configuration snapshot and severity computed before the host exists.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Shared configuration.
    pub config: Arc<Config>,
    /// Effective severity threshold.
    pub severity: Severity,
}

/// Collaborators required to launch the service host.
pub struct LaunchPlan<W> {
    /// How the process was started.
    pub mode: LaunchMode,
    /// Names of the service.
    pub identity: ServiceIdentity,
    /// Command-line inputs.
    pub settings: Settings,
    /// Candidate configuration locations.
    pub search: ConfigSearchPaths,
    /// Work run by the host.
    pub worker: W,
    /// Lifecycle observer.
    pub reporter: Arc<dyn HostReporter>,
}

/// Runs the host using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration loading, adapter preparation or
/// the host run fails.
pub fn run_service(settings: Settings, mode: LaunchMode) -> Result<(), LaunchError> {
    run_with(LaunchPlan {
        mode,
        identity: ServiceIdentity::default(),
        settings,
        search: ConfigSearchPaths::platform(),
        worker: IdleWorker,
        reporter: Arc::new(StructuredHostReporter::new()),
    })
}

/// Runs the host with injected collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when configuration loading, adapter preparation or
/// the host run fails.
pub fn run_with<W>(plan: LaunchPlan<W>) -> Result<(), LaunchError>
where
    W: HostedWorker + 'static,
{
    let LaunchPlan {
        mode,
        identity,
        mut settings,
        search,
        worker,
        reporter,
    } = plan;
    let prepared = prepare(&mut settings, &search, mode)?;

    #[cfg(windows)]
    if mode.is_service() {
        return crate::adapter::windows::run_dispatcher(identity.clone(), move |adapter| {
            run_host(prepared, Box::new(adapter), identity, worker, reporter)
        });
    }

    let adapter = select_adapter(mode.is_service())?;
    run_host(prepared, adapter, identity, worker, reporter)
}

/// Resolves and loads the configuration, then fixes the severity threshold.
///
/// The service search order only applies to service runs; interactive runs
/// load the path given on the command line.
///
/// # Errors
///
/// Returns [`LaunchError::Config`] when the selected file cannot be loaded.
pub fn prepare(
    settings: &mut Settings,
    search: &ConfigSearchPaths,
    mode: LaunchMode,
) -> Result<Prepared, LaunchError> {
    // The host logs the selected file once the logging pipeline exists.
    if mode.is_service() {
        let _ = resolve_config_path(settings, search);
    }
    let config = Config::load(settings)?;
    let severity = config.severity(settings.quiet);
    Ok(Prepared {
        config: Arc::new(config),
        severity,
    })
}

/// Builds and runs the host around an already selected adapter.
///
/// # Errors
///
/// Returns [`LaunchError::Host`] when the host fails to build or run.
pub fn run_host<W>(
    prepared: Prepared,
    adapter: Box<dyn ServiceAdapter>,
    identity: ServiceIdentity,
    worker: W,
    reporter: Arc<dyn HostReporter>,
) -> Result<(), LaunchError>
where
    W: HostedWorker + 'static,
{
    let Prepared { config, severity } = prepared;
    Host::builder(config, severity)
        .identity(identity)
        .adapter(adapter)
        .worker(worker)
        .reporter(reporter)
        .build()?
        .run()?;
    Ok(())
}

/// Registers the running executable as an auto-start service.
///
/// # Errors
///
/// Returns [`LaunchError::Install`] when the executable cannot be located or
/// the registration command fails.
pub fn install_service(identity: ServiceIdentity) -> Result<(), LaunchError> {
    ServiceInstaller::for_current_exe(identity, SystemCommandRunner::new(), platform_probe())?
        .install()?;
    Ok(())
}

/// Removes the service registration.
///
/// # Errors
///
/// Returns [`LaunchError::Install`] when the executable cannot be located or
/// the removal command fails.
pub fn uninstall_service(identity: ServiceIdentity) -> Result<(), LaunchError> {
    ServiceInstaller::for_current_exe(identity, SystemCommandRunner::new(), platform_probe())?
        .uninstall()?;
    Ok(())
}
