use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command could not be started.
    #[error("failed to start '{command}': {source}")]
    Spawn {
        /// Command that failed to start.
        command: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The command ran but exited with a non-zero code.
    #[error("process '{command}' failed with exit code {exit_code}")]
    Failed {
        /// Command that failed.
        command: PathBuf,
        /// Exit code reported by the child.
        exit_code: i32,
    },
    /// The command was terminated without reporting an exit code.
    #[error("process '{command}' terminated without an exit code")]
    Terminated {
        /// Command that was terminated.
        command: PathBuf,
    },
}

impl ProcessError {
    /// Exit code carried by the failure, if the child reported one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { exit_code, .. } => Some(*exit_code),
            Self::Spawn { .. } | Self::Terminated { .. } => None,
        }
    }
}
