//! Stand-in worker used when no bridge engine is linked into the binary.

use std::sync::Arc;

use azbridge_config::Config;

use crate::host::{HostedWorker, StopToken, WorkerError};

const WORKER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::worker::idle");

/// Worker that idles until the host asks it to stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleWorker;

impl HostedWorker for IdleWorker {
    fn run(&mut self, config: Arc<Config>, stop: StopToken) -> Result<(), WorkerError> {
        tracing::warn!(
            target: WORKER_TARGET,
            config = ?config.source(),
            "bridge engine not linked into this build; idling until stop"
        );
        stop.wait();
        tracing::debug!(target: WORKER_TARGET, "idle worker released");
        Ok(())
    }
}
