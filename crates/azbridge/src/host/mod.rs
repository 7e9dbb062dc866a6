//! Composes configuration, adapter, logging and worker into a running host.
//!
//! [`Host::run`] is the only long-lived suspension point of the process. It
//! blocks on a channel fed by two threads: the worker thread reports when the
//! worker returns, and the stop waiter reports when the adapter delivers a
//! stop request.

mod errors;
mod worker;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use azbridge_config::{Config, Severity};
use tracing::{debug, info, warn};

use crate::adapter::{AdapterError, ServiceAdapter};
use crate::health::{HostReporter, StructuredHostReporter};
use crate::identity::ServiceIdentity;
use crate::telemetry::{self, TelemetryHandle, TelemetrySettings};

pub use errors::HostError;
pub use worker::{HostedWorker, StopToken, WorkerError};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

enum HostEvent {
    WorkerExited,
    StopRequested(Result<(), AdapterError>),
}

/// Reports the worker's exit when dropped, including while unwinding from a
/// panic.
struct ExitNotice(Sender<HostEvent>);

impl Drop for ExitNotice {
    fn drop(&mut self) {
        // The host may have stopped listening already.
        let _ = self.0.send(HostEvent::WorkerExited);
    }
}

/// Collects the parts of a [`Host`].
pub struct HostBuilder {
    config: Arc<Config>,
    severity: Severity,
    identity: ServiceIdentity,
    adapter: Option<Box<dyn ServiceAdapter>>,
    worker: Option<Box<dyn HostedWorker>>,
    reporter: Arc<dyn HostReporter>,
}

impl HostBuilder {
    /// Starts a builder for a configuration and its effective severity.
    #[must_use]
    pub fn new(config: Arc<Config>, severity: Severity) -> Self {
        Self {
            config,
            severity,
            identity: ServiceIdentity::default(),
            adapter: None,
            worker: None,
            reporter: Arc::new(StructuredHostReporter::new()),
        }
    }

    /// Sets the service identity; it names the event log source.
    #[must_use]
    pub fn identity(mut self, identity: ServiceIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the supervisor adapter.
    #[must_use]
    pub fn adapter(mut self, adapter: Box<dyn ServiceAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Sets the worker run by the host.
    #[must_use]
    pub fn worker(mut self, worker: impl HostedWorker + 'static) -> Self {
        self.worker = Some(Box::new(worker));
        self
    }

    /// Replaces the lifecycle reporter.
    #[must_use]
    pub fn reporter(mut self, reporter: Arc<dyn HostReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Installs the logging pipeline and returns a host ready to run.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Incomplete`] when the adapter or worker is missing
    /// and [`HostError::Telemetry`] when a log sink cannot be opened.
    pub fn build(self) -> Result<Host, HostError> {
        let adapter = self.adapter.ok_or(HostError::Incomplete { part: "adapter" })?;
        let worker = self.worker.ok_or(HostError::Incomplete { part: "worker" })?;
        let telemetry = telemetry::initialise(&TelemetrySettings {
            severity: self.severity,
            console_style: adapter.console_style(),
            log_file: self.config.log_file(),
            event_source: self.identity.name(),
        })?;
        Ok(Host {
            config: self.config,
            severity: self.severity,
            adapter: Arc::from(adapter),
            worker,
            reporter: self.reporter,
            telemetry,
        })
    }
}

/// Running process abstraction owning the worker and the logging pipeline.
pub struct Host {
    config: Arc<Config>,
    severity: Severity,
    adapter: Arc<dyn ServiceAdapter>,
    worker: Box<dyn HostedWorker>,
    reporter: Arc<dyn HostReporter>,
    telemetry: TelemetryHandle,
}

impl Host {
    /// Starts a [`HostBuilder`].
    #[must_use]
    pub fn builder(config: Arc<Config>, severity: Severity) -> HostBuilder {
        HostBuilder::new(config, severity)
    }

    /// Severity threshold fixed at construction.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Configuration shared with the worker.
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Runs the worker and blocks until the adapter delivers a stop request.
    ///
    /// A worker that returns cleanly leaves the host waiting for the stop
    /// request; a failing worker ends the run immediately.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the worker fails or panics, when the adapter
    /// fails, or when a host thread cannot be spawned.
    pub fn run(self) -> Result<(), HostError> {
        let Self {
            config,
            severity,
            adapter,
            worker,
            reporter,
            telemetry,
        } = self;
        let kind = adapter.kind();
        reporter.host_starting(kind, severity);
        if let Some(path) = config.source() {
            info!(
                target: HOST_TARGET,
                path = %path.display(),
                "using configuration file"
            );
        }

        let stop = StopToken::new();
        let (events, inbox) = mpsc::channel();
        let mut worker_thread = Some(spawn_worker(worker, config, stop.clone(), events.clone())?);

        if let Err(source) = adapter.notify_started() {
            let error = HostError::Adapter { source };
            stop.cancel();
            let _ = worker_thread.take().map(join_worker);
            reporter.host_stopped(Some(&error));
            return Err(error);
        }
        reporter.host_started(kind);

        let mut failure = match spawn_stop_waiter(Arc::clone(&adapter), events) {
            Ok(()) => wait_for_shutdown(&inbox, &mut worker_thread, reporter.as_ref()),
            Err(error) => Some(error),
        };
        // Unblocks the stop waiter when the run ended for another reason.
        adapter.release();

        if let Err(source) = adapter.notify_stopping() {
            warn!(
                target: HOST_TARGET,
                error = %source,
                "failed to report stopping state"
            );
            failure.get_or_insert(HostError::Adapter { source });
        }
        stop.cancel();
        if let Some(handle) = worker_thread.take() {
            if let Err(error) = join_worker(handle) {
                failure.get_or_insert(error);
            }
        }

        reporter.host_stopped(failure.as_ref());
        drop(telemetry);
        failure.map_or(Ok(()), Err)
    }
}

fn spawn_worker(
    mut worker: Box<dyn HostedWorker>,
    config: Arc<Config>,
    stop: StopToken,
    events: Sender<HostEvent>,
) -> Result<JoinHandle<Result<(), WorkerError>>, HostError> {
    thread::Builder::new()
        .name(String::from("azbridge-worker"))
        .spawn(move || {
            let _notice = ExitNotice(events);
            worker.run(config, stop)
        })
        .map_err(|source| HostError::Spawn {
            thread: "worker",
            source,
        })
}

fn spawn_stop_waiter(
    adapter: Arc<dyn ServiceAdapter>,
    events: Sender<HostEvent>,
) -> Result<(), HostError> {
    thread::Builder::new()
        .name(String::from("azbridge-stop"))
        .spawn(move || {
            let _ = events.send(HostEvent::StopRequested(adapter.wait_for_stop()));
        })
        .map(drop)
        .map_err(|source| HostError::Spawn {
            thread: "stop waiter",
            source,
        })
}

fn wait_for_shutdown(
    inbox: &Receiver<HostEvent>,
    worker_thread: &mut Option<JoinHandle<Result<(), WorkerError>>>,
    reporter: &dyn HostReporter,
) -> Option<HostError> {
    loop {
        match inbox.recv() {
            Ok(HostEvent::WorkerExited) => {
                let Some(handle) = worker_thread.take() else {
                    continue;
                };
                match join_worker(handle) {
                    Ok(()) => reporter.worker_completed(),
                    Err(error) => {
                        if let HostError::Worker(worker_error) = &error {
                            reporter.worker_failed(worker_error);
                        }
                        return Some(error);
                    }
                }
            }
            Ok(HostEvent::StopRequested(Ok(()))) => {
                reporter.stop_requested();
                return None;
            }
            Ok(HostEvent::StopRequested(Err(source))) => {
                return Some(HostError::Adapter { source });
            }
            Err(_) => {
                debug!(target: HOST_TARGET, "host event channel closed");
                return None;
            }
        }
    }
}

fn join_worker(handle: JoinHandle<Result<(), WorkerError>>) -> Result<(), HostError> {
    match handle.join() {
        Ok(result) => result.map_err(HostError::from),
        Err(_) => Err(HostError::WorkerPanicked),
    }
}
