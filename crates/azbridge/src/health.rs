//! Structured reporting for host lifecycle events.

use std::sync::Arc;

use azbridge_config::Severity;

use crate::adapter::AdapterKind;
use crate::host::{HostError, WorkerError};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface host lifecycle events to telemetry sinks.
pub trait HostReporter: Send + Sync {
    /// Invoked before the worker is started.
    fn host_starting(&self, adapter: AdapterKind, severity: Severity);

    /// Invoked after the adapter acknowledged the start.
    fn host_started(&self, adapter: AdapterKind);

    /// Invoked when the adapter delivers a stop request.
    fn stop_requested(&self);

    /// Invoked when the worker returns cleanly before shutdown.
    fn worker_completed(&self);

    /// Invoked when the worker fails.
    fn worker_failed(&self, error: &WorkerError);

    /// Invoked once the host has torn down.
    fn host_stopped(&self, error: Option<&HostError>);
}

impl<T> HostReporter for Arc<T>
where
    T: HostReporter + ?Sized,
{
    fn host_starting(&self, adapter: AdapterKind, severity: Severity) {
        (**self).host_starting(adapter, severity);
    }

    fn host_started(&self, adapter: AdapterKind) {
        (**self).host_started(adapter);
    }

    fn stop_requested(&self) {
        (**self).stop_requested();
    }

    fn worker_completed(&self) {
        (**self).worker_completed();
    }

    fn worker_failed(&self, error: &WorkerError) {
        (**self).worker_failed(error);
    }

    fn host_stopped(&self, error: Option<&HostError>) {
        (**self).host_stopped(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHostReporter;

impl StructuredHostReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HostReporter for StructuredHostReporter {
    fn host_starting(&self, adapter: AdapterKind, severity: Severity) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "host_starting",
            adapter = %adapter,
            severity = %severity,
            "starting service host"
        );
    }

    fn host_started(&self, adapter: AdapterKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "host_started",
            adapter = %adapter,
            "service host running"
        );
    }

    fn stop_requested(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "stop_requested",
            "stop requested; shutting down"
        );
    }

    fn worker_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "worker_completed",
            "worker finished; waiting for stop request"
        );
    }

    fn worker_failed(&self, error: &WorkerError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "worker_failed",
            error = %error,
            "worker failed"
        );
    }

    fn host_stopped(&self, error: Option<&HostError>) {
        match error {
            Some(error) => tracing::error!(
                target: HEALTH_TARGET,
                event = "host_stopped",
                error = %error,
                "service host stopped with an error"
            ),
            None => tracing::info!(
                target: HEALTH_TARGET,
                event = "host_stopped",
                "service host stopped"
            ),
        }
    }
}
