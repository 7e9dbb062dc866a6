use std::io;
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use super::ADAPTER_TARGET;

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    fn wait(&self) -> Result<(), ShutdownError>;

    /// Releases a caller blocked in [`ShutdownSignal::wait`] without a
    /// shutdown request. Later calls to `wait` return immediately.
    fn close(&self);
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

#[cfg(unix)]
pub use unix::SystemShutdownSignal;

#[cfg(windows)]
pub use console::SystemShutdownSignal;

#[cfg(unix)]
mod unix {
    use super::{ADAPTER_TARGET, Mutex, ShutdownError, ShutdownSignal, info};

    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
    use signal_hook::iterator::{Handle, Signals};

    /// Shutdown listener that waits for termination signals.
    ///
    /// Handlers are installed on construction so signals delivered before
    /// [`ShutdownSignal::wait`] is called are not lost.
    pub struct SystemShutdownSignal {
        signals: Mutex<Signals>,
        handle: Handle,
    }

    impl SystemShutdownSignal {
        /// Installs handlers for SIGTERM, SIGINT, SIGQUIT and SIGHUP.
        ///
        /// # Errors
        ///
        /// Returns [`ShutdownError::Install`] when the handlers cannot be
        /// registered.
        pub fn install() -> Result<Self, ShutdownError> {
            let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
                .map_err(|source| ShutdownError::Install { source })?;
            Ok(Self {
                handle: signals.handle(),
                signals: Mutex::new(signals),
            })
        }
    }

    impl ShutdownSignal for SystemShutdownSignal {
        fn wait(&self) -> Result<(), ShutdownError> {
            let mut signals = self
                .signals
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(signal) = signals.forever().next() {
                info!(
                    target: ADAPTER_TARGET,
                    signal,
                    "shutdown signal received"
                );
            }
            Ok(())
        }

        fn close(&self) {
            self.handle.close();
        }
    }
}

#[cfg(windows)]
mod console {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::flag;

    use super::{ADAPTER_TARGET, ShutdownError, ShutdownSignal, info};

    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Shutdown listener for Windows consoles.
    ///
    /// Console interrupts are latched into a flag that `wait` polls.
    pub struct SystemShutdownSignal {
        requested: Arc<AtomicBool>,
        closed: AtomicBool,
    }

    impl SystemShutdownSignal {
        /// Installs handlers for console interrupt and termination.
        ///
        /// # Errors
        ///
        /// Returns [`ShutdownError::Install`] when the handlers cannot be
        /// registered.
        pub fn install() -> Result<Self, ShutdownError> {
            let requested = Arc::new(AtomicBool::new(false));
            for signal in [SIGINT, SIGTERM] {
                flag::register(signal, Arc::clone(&requested))
                    .map_err(|source| ShutdownError::Install { source })?;
            }
            Ok(Self {
                requested,
                closed: AtomicBool::new(false),
            })
        }
    }

    impl ShutdownSignal for SystemShutdownSignal {
        fn wait(&self) -> Result<(), ShutdownError> {
            while !self.requested.load(Ordering::SeqCst) {
                if self.closed.load(Ordering::SeqCst) {
                    return Ok(());
                }
                thread::sleep(POLL_INTERVAL);
            }
            info!(target: ADAPTER_TARGET, "console interrupt received");
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}

/// Signal that never needs OS support; used where the platform delivers stop
/// requests through another channel.
#[derive(Debug, Default)]
pub struct ManualShutdownSignal {
    requested: Mutex<bool>,
    changed: std::sync::Condvar,
}

impl ManualShutdownSignal {
    /// Builds an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases every caller blocked in [`ShutdownSignal::wait`].
    pub fn trigger(&self) {
        let mut requested = self
            .requested
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *requested = true;
        self.changed.notify_all();
    }
}

impl ShutdownSignal for ManualShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut requested = self
            .requested
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while !*requested {
            requested = self
                .changed
                .wait(requested)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        Ok(())
    }

    fn close(&self) {
        self.trigger();
    }
}

impl<T> ShutdownSignal for std::sync::Arc<T>
where
    T: ShutdownSignal + ?Sized,
{
    fn wait(&self) -> Result<(), ShutdownError> {
        (**self).wait()
    }

    fn close(&self) {
        (**self).close();
    }
}
