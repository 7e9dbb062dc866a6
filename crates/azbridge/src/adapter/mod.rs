//! Platform glue between the host and the process supervisor.
//!
//! An adapter tells the supervisor when the host is ready and when it is
//! stopping, blocks until the supervisor asks the host to stop, and picks the
//! console log format the supervisor expects. Adapters never touch the
//! configuration or the severity threshold.

mod console;
mod launchd;
mod shutdown;
mod systemd;
#[cfg(windows)]
pub(crate) mod windows;

use std::fmt;
use std::io;

use thiserror::Error;

pub use console::ConsoleAdapter;
pub use launchd::LaunchdAdapter;
pub use shutdown::{ManualShutdownSignal, ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use systemd::{NOTIFY_SOCKET_ENV, SystemdAdapter, SystemdNotifier, running_under_systemd};
#[cfg(windows)]
pub use windows::WindowsServiceAdapter;

pub(crate) const ADAPTER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::adapter");

/// Supervisor integrations known to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Windows Service Control Manager.
    Windows,
    /// systemd with `sd_notify` readiness.
    Systemd,
    /// launchd and similar supervisors without a notification API.
    Launchd,
    /// Interactive console run.
    None,
}

impl AdapterKind {
    /// Adapter chosen for this build target.
    ///
    /// Interactive runs always use [`AdapterKind::None`]; service runs use the
    /// native supervisor of the target operating system.
    #[must_use]
    pub const fn for_build(service_mode: bool) -> Self {
        if !service_mode {
            return Self::None;
        }
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Systemd
        } else if cfg!(target_os = "macos") {
            Self::Launchd
        } else {
            Self::None
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Windows => "windows",
            Self::Systemd => "systemd",
            Self::Launchd => "launchd",
            Self::None => "none",
        };
        formatter.write_str(label)
    }
}

/// Console formatting expected by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStyle {
    /// Multi-field output with timestamps, coloured on a terminal.
    #[default]
    Full,
    /// One compact line per event without colour.
    SingleLine,
    /// Lines prefixed with a `<N>` syslog priority for journald.
    Journald,
}

/// Errors raised by adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Installing the stop signal listener failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// Sending a readiness notification failed.
    #[error("failed to notify the service manager: {source}")]
    Notify {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The Windows service control dispatcher rejected a request.
    #[error("service control manager request failed: {message}")]
    ServiceControl {
        /// Diagnostic reported by the dispatcher.
        message: String,
    },
}

/// Lifecycle hooks the host drives on the selected supervisor integration.
pub trait ServiceAdapter: Send + Sync {
    /// Supervisor this adapter integrates with.
    fn kind(&self) -> AdapterKind;

    /// Console format the supervisor expects.
    fn console_style(&self) -> ConsoleStyle {
        ConsoleStyle::Full
    }

    /// Reports that the host finished starting.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the supervisor cannot be notified.
    fn notify_started(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Reports that the host is shutting down.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the supervisor cannot be notified.
    fn notify_stopping(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Blocks until the supervisor asks the host to stop.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the stop source fails.
    fn wait_for_stop(&self) -> Result<(), AdapterError>;

    /// Returns a pending [`ServiceAdapter::wait_for_stop`] once the host no
    /// longer listens for stop requests.
    fn release(&self);
}

impl<T> ServiceAdapter for Box<T>
where
    T: ServiceAdapter + ?Sized,
{
    fn kind(&self) -> AdapterKind {
        (**self).kind()
    }

    fn console_style(&self) -> ConsoleStyle {
        (**self).console_style()
    }

    fn notify_started(&self) -> Result<(), AdapterError> {
        (**self).notify_started()
    }

    fn notify_stopping(&self) -> Result<(), AdapterError> {
        (**self).notify_stopping()
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        (**self).wait_for_stop()
    }

    fn release(&self) {
        (**self).release();
    }
}

/// Builds the adapter for a run that does not go through the Windows service
/// dispatcher.
///
/// Service runs on Linux fall back to the console adapter when the process was
/// not started by systemd.
///
/// # Errors
///
/// Returns [`AdapterError::Shutdown`] when signal handlers cannot be
/// installed.
pub fn select_adapter(service_mode: bool) -> Result<Box<dyn ServiceAdapter>, AdapterError> {
    let adapter: Box<dyn ServiceAdapter> = match AdapterKind::for_build(service_mode) {
        AdapterKind::Systemd if running_under_systemd() => Box::new(SystemdAdapter::install()?),
        AdapterKind::Systemd => {
            tracing::info!(
                target: ADAPTER_TARGET,
                "service mode requested outside systemd; using console adapter"
            );
            Box::new(ConsoleAdapter::install()?)
        }
        AdapterKind::Launchd => Box::new(LaunchdAdapter::install()?),
        AdapterKind::Windows | AdapterKind::None => Box::new(ConsoleAdapter::install()?),
    };
    Ok(adapter)
}
