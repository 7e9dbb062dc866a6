use super::{
    AdapterError, AdapterKind, ConsoleStyle, ServiceAdapter, ShutdownError, ShutdownSignal,
    SystemShutdownSignal,
};

/// Adapter for launchd.
///
/// launchd has no readiness protocol: it only needs compact single-line
/// console output and stops jobs with SIGTERM.
pub struct LaunchdAdapter<S = SystemShutdownSignal> {
    shutdown: S,
}

impl LaunchdAdapter {
    /// Builds the adapter with the operating system's signal listener.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when signal handlers cannot be installed.
    pub fn install() -> Result<Self, ShutdownError> {
        SystemShutdownSignal::install().map(Self::with_signal)
    }
}

impl<S> LaunchdAdapter<S>
where
    S: ShutdownSignal,
{
    /// Builds the adapter around an explicit stop source.
    pub fn with_signal(shutdown: S) -> Self {
        Self { shutdown }
    }
}

impl<S> ServiceAdapter for LaunchdAdapter<S>
where
    S: ShutdownSignal,
{
    fn kind(&self) -> AdapterKind {
        AdapterKind::Launchd
    }

    fn console_style(&self) -> ConsoleStyle {
        ConsoleStyle::SingleLine
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        Ok(self.shutdown.wait()?)
    }

    fn release(&self) {
        self.shutdown.close();
    }
}
