//! Contract between the host and the long-running bridge worker.

use std::error::Error;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use azbridge_config::Config;
use thiserror::Error;

/// Cooperative cancellation flag handed to the worker.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl StopToken {
    /// Builds an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes every waiter.
    pub fn cancel(&self) {
        let (flag, changed) = &*self.state;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        changed.notify_all();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.state;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until cancellation is requested.
    pub fn wait(&self) {
        let (flag, changed) = &*self.state;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*cancelled {
            cancelled = changed
                .wait(cancelled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Blocks until cancellation or until `timeout` elapses; returns whether
    /// cancellation was requested.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, changed) = &*self.state;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (cancelled, _) = changed
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}

/// Error reported by a hosted worker.
#[derive(Debug, Error)]
#[error("worker failed: {message}")]
pub struct WorkerError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl WorkerError {
    /// Builds an error from a description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error wrapping the underlying failure.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Long-running work executed by the host on its own thread.
///
/// Implementations should return promptly once `stop` is cancelled.
pub trait HostedWorker: Send {
    /// Runs until the work completes, fails, or `stop` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when the work fails; the host then shuts down
    /// and reports the error.
    fn run(&mut self, config: Arc<Config>, stop: StopToken) -> Result<(), WorkerError>;
}

impl<F> HostedWorker for F
where
    F: FnMut(Arc<Config>, StopToken) -> Result<(), WorkerError> + Send,
{
    fn run(&mut self, config: Arc<Config>, stop: StopToken) -> Result<(), WorkerError> {
        self(config, stop)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn cancel_releases_waiters() {
        let token = StopToken::new();
        let waiter = {
            let token = token.clone();
            thread::spawn(move || token.wait())
        };

        token.cancel();

        waiter.join().expect("waiter thread");
        assert!(token.is_cancelled());
    }

    #[test]
    fn wait_timeout_reports_uncancelled_token() {
        let token = StopToken::new();
        assert!(!token.wait_timeout(Duration::from_millis(10)));
        token.cancel();
        assert!(token.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn worker_error_keeps_its_source() {
        let io = std::io::Error::other("relay refused");
        let error = WorkerError::with_source("listener closed", io);

        assert_eq!(error.message(), "listener closed");
        assert_eq!(error.to_string(), "worker failed: listener closed");
        assert!(Error::source(&error).is_some());
    }
}
