//! Windows Service Control Manager integration.
//!
//! The dispatcher calls back into a plain function, so the pending entry point
//! and its outcome are parked in statics for the duration of the dispatch.

use std::ffi::OsString;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{error, info};
use windows_service::service::{
    ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus,
    ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::service_dispatcher;

use super::{ADAPTER_TARGET, AdapterError, AdapterKind, ServiceAdapter};
use crate::identity::ServiceIdentity;
use crate::launch::LaunchError;

const PENDING_WAIT_HINT: Duration = Duration::from_secs(10);
const FAILURE_EXIT_CODE: u32 = 1;

type ServiceEntry = Box<dyn FnOnce(WindowsServiceAdapter) -> Result<(), LaunchError> + Send>;

struct PendingService {
    identity: ServiceIdentity,
    entry: ServiceEntry,
}

/// Why a blocked stop waiter woke up.
enum Wake {
    Control,
    Released,
}

static PENDING: Mutex<Option<PendingService>> = Mutex::new(None);
static OUTCOME: Mutex<Option<Result<(), LaunchError>>> = Mutex::new(None);

windows_service::define_windows_service!(ffi_service_main, service_main);

/// Hands the process to the service control dispatcher and runs `entry` once
/// the service manager starts the service.
///
/// Blocks until the service has stopped and returns the outcome of `entry`.
///
/// # Errors
///
/// Returns [`LaunchError`] when the dispatcher cannot be started or when
/// `entry` fails.
pub(crate) fn run_dispatcher<F>(identity: ServiceIdentity, entry: F) -> Result<(), LaunchError>
where
    F: FnOnce(WindowsServiceAdapter) -> Result<(), LaunchError> + Send + 'static,
{
    let name = identity.name().to_owned();
    *PENDING.lock().unwrap_or_else(PoisonError::into_inner) = Some(PendingService {
        identity,
        entry: Box::new(entry),
    });
    service_dispatcher::start(&name, ffi_service_main).map_err(|error| {
        LaunchError::Adapter {
            source: AdapterError::ServiceControl {
                message: error.to_string(),
            },
        }
    })?;
    OUTCOME
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or(Ok(()))
}

fn service_main(_arguments: Vec<OsString>) {
    let outcome = run_pending();
    if let Err(launch_error) = &outcome {
        error!(
            target: ADAPTER_TARGET,
            error = %launch_error,
            "service entry point failed"
        );
    }
    *OUTCOME.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
}

fn run_pending() -> Result<(), LaunchError> {
    let pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner).take();
    let Some(PendingService { identity, entry }) = pending else {
        return Err(LaunchError::Adapter {
            source: AdapterError::ServiceControl {
                message: String::from("service started without a registered entry point"),
            },
        });
    };

    let (stop_tx, stop_rx) = mpsc::channel();
    let release = stop_tx.clone();
    let handler = move |control| match control {
        ServiceControl::Stop | ServiceControl::Shutdown => {
            // The host may already be gone; a closed channel is not an error.
            let _ = stop_tx.send(Wake::Control);
            ServiceControlHandlerResult::NoError
        }
        ServiceControl::Interrogate => ServiceControlHandlerResult::NoError,
        _ => ServiceControlHandlerResult::NotImplemented,
    };
    let status = service_control_handler::register(identity.name(), handler)
        .map_err(control_error)
        .map_err(|source| LaunchError::Adapter { source })?;

    let adapter = WindowsServiceAdapter {
        identity,
        status,
        stop: Mutex::new(stop_rx),
        release: Mutex::new(release),
    };
    adapter
        .set_state(ServiceState::StartPending, ServiceExitCode::Win32(0))
        .map_err(|source| LaunchError::Adapter { source })?;

    let outcome = entry(adapter);
    let exit_code = match outcome {
        Ok(()) => ServiceExitCode::Win32(0),
        Err(_) => ServiceExitCode::ServiceSpecific(FAILURE_EXIT_CODE),
    };
    if let Err(source) = set_status(&status, ServiceState::Stopped, exit_code) {
        error!(
            target: ADAPTER_TARGET,
            error = %source,
            "failed to report the stopped state"
        );
    }
    outcome
}

fn control_error(error: windows_service::Error) -> AdapterError {
    AdapterError::ServiceControl {
        message: error.to_string(),
    }
}

fn set_status(
    status: &ServiceStatusHandle,
    state: ServiceState,
    exit_code: ServiceExitCode,
) -> Result<(), AdapterError> {
    let controls_accepted = match state {
        ServiceState::Running => ServiceControlAccept::STOP | ServiceControlAccept::SHUTDOWN,
        _ => ServiceControlAccept::empty(),
    };
    let wait_hint = match state {
        ServiceState::StartPending | ServiceState::StopPending => PENDING_WAIT_HINT,
        _ => Duration::default(),
    };
    status
        .set_service_status(ServiceStatus {
            service_type: ServiceType::OWN_PROCESS,
            current_state: state,
            controls_accepted,
            exit_code,
            checkpoint: 0,
            wait_hint,
            process_id: None,
        })
        .map_err(control_error)
}

/// Adapter for processes started by the Windows Service Control Manager.
pub struct WindowsServiceAdapter {
    identity: ServiceIdentity,
    status: ServiceStatusHandle,
    stop: Mutex<Receiver<Wake>>,
    release: Mutex<Sender<Wake>>,
}

impl WindowsServiceAdapter {
    /// Identity the control handler is registered under.
    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    fn set_state(&self, state: ServiceState, exit_code: ServiceExitCode) -> Result<(), AdapterError> {
        set_status(&self.status, state, exit_code)
    }
}

impl ServiceAdapter for WindowsServiceAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Windows
    }

    fn notify_started(&self) -> Result<(), AdapterError> {
        self.set_state(ServiceState::Running, ServiceExitCode::Win32(0))
    }

    fn notify_stopping(&self) -> Result<(), AdapterError> {
        self.set_state(ServiceState::StopPending, ServiceExitCode::Win32(0))
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        let stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(Wake::Control) = stop.recv() {
            info!(
                target: ADAPTER_TARGET,
                service = self.identity.name(),
                "service control manager requested stop"
            );
        }
        Ok(())
    }

    fn release(&self) {
        let release = self.release.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = release.send(Wake::Released);
    }
}
