use std::io;

use thiserror::Error;

use super::WorkerError;
use crate::adapter::AdapterError;
use crate::telemetry::TelemetryError;

/// Errors surfaced while building or running the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The builder was missing a required part.
    #[error("host builder is missing its {part}")]
    Incomplete {
        /// Name of the missing part.
        part: &'static str,
    },
    /// The logging pipeline could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The adapter failed to notify the supervisor or to wait for stop.
    #[error("service adapter failed: {source}")]
    Adapter {
        /// Underlying adapter error.
        #[source]
        source: AdapterError,
    },
    /// The worker reported a failure.
    #[error(transparent)]
    Worker(#[from] WorkerError),
    /// The worker thread panicked.
    #[error("worker thread panicked")]
    WorkerPanicked,
    /// A host thread could not be spawned.
    #[error("failed to spawn {thread} thread: {source}")]
    Spawn {
        /// Role of the thread.
        thread: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl From<AdapterError> for HostError {
    fn from(source: AdapterError) -> Self {
        Self::Adapter { source }
    }
}
