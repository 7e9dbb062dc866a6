use super::{
    AdapterError, AdapterKind, ServiceAdapter, ShutdownError, ShutdownSignal, SystemShutdownSignal,
};

/// Adapter for interactive runs without a supervisor.
///
/// Stops on a console interrupt or a termination signal.
pub struct ConsoleAdapter<S = SystemShutdownSignal> {
    shutdown: S,
}

impl ConsoleAdapter {
    /// Builds the adapter with the operating system's signal listener.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when signal handlers cannot be installed.
    pub fn install() -> Result<Self, ShutdownError> {
        SystemShutdownSignal::install().map(Self::with_signal)
    }
}

impl<S> ConsoleAdapter<S>
where
    S: ShutdownSignal,
{
    /// Builds the adapter around an explicit stop source.
    pub fn with_signal(shutdown: S) -> Self {
        Self { shutdown }
    }
}

impl<S> ServiceAdapter for ConsoleAdapter<S>
where
    S: ShutdownSignal,
{
    fn kind(&self) -> AdapterKind {
        AdapterKind::None
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        Ok(self.shutdown.wait()?)
    }

    fn release(&self) {
        self.shutdown.close();
    }
}
