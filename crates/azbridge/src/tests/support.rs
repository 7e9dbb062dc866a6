//! Test doubles for the host behavioural suite.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use azbridge_config::Severity;
use tracing_subscriber::fmt::MakeWriter;

use crate::adapter::{AdapterError, AdapterKind, ManualShutdownSignal, ServiceAdapter, ShutdownSignal};
use crate::health::HostReporter;
use crate::host::{HostError, WorkerError};

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle events captured by [`RecordingHostReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedEvent {
    Starting(AdapterKind, Severity),
    Started(AdapterKind),
    StopRequested,
    WorkerCompleted,
    WorkerFailed(String),
    Stopped(Option<String>),
}

/// Records lifecycle events for assertions.
#[derive(Default)]
pub struct RecordingHostReporter {
    events: Mutex<Vec<ReportedEvent>>,
}

impl RecordingHostReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .clone()
    }

    /// Polls until `event` has been recorded.
    pub fn wait_for(&self, event: &ReportedEvent) {
        let deadline = Instant::now() + EVENT_TIMEOUT;
        while !self.events().contains(event) {
            assert!(Instant::now() < deadline, "timed out waiting for {event:?}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn record(&self, event: ReportedEvent) {
        self.events
            .lock()
            .expect("reporter mutex poisoned")
            .push(event);
    }
}

impl HostReporter for RecordingHostReporter {
    fn host_starting(&self, adapter: AdapterKind, severity: Severity) {
        self.record(ReportedEvent::Starting(adapter, severity));
    }

    fn host_started(&self, adapter: AdapterKind) {
        self.record(ReportedEvent::Started(adapter));
    }

    fn stop_requested(&self) {
        self.record(ReportedEvent::StopRequested);
    }

    fn worker_completed(&self) {
        self.record(ReportedEvent::WorkerCompleted);
    }

    fn worker_failed(&self, error: &WorkerError) {
        self.record(ReportedEvent::WorkerFailed(error.message().to_owned()));
    }

    fn host_stopped(&self, error: Option<&HostError>) {
        self.record(ReportedEvent::Stopped(error.map(ToString::to_string)));
    }
}

/// Notifications sent to the fake supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Started,
    Stopping,
}

#[derive(Default)]
struct FakeAdapterState {
    notifications: Mutex<Vec<Notification>>,
    stop: ManualShutdownSignal,
    fail_start: AtomicBool,
    released: AtomicBool,
}

/// Adapter whose stop request is triggered by the test.
#[derive(Clone, Default)]
pub struct FakeAdapter {
    state: Arc<FakeAdapterState>,
}

impl FakeAdapter {
    /// Makes the start notification fail.
    pub fn failing_start() -> Self {
        let adapter = Self::default();
        adapter.state.fail_start.store(true, Ordering::SeqCst);
        adapter
    }

    /// Delivers the stop request.
    pub fn request_stop(&self) {
        self.state.stop.trigger();
    }

    /// Notifications received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state
            .notifications
            .lock()
            .expect("adapter mutex poisoned")
            .clone()
    }

    /// Whether the host released the stop waiter.
    pub fn was_released(&self) -> bool {
        self.state.released.load(Ordering::SeqCst)
    }

    /// Boxes a handle sharing this adapter's state.
    pub fn boxed(&self) -> Box<dyn ServiceAdapter> {
        Box::new(self.clone())
    }

    fn record(&self, notification: Notification) {
        self.state
            .notifications
            .lock()
            .expect("adapter mutex poisoned")
            .push(notification);
    }
}

impl ServiceAdapter for FakeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::None
    }

    fn notify_started(&self) -> Result<(), AdapterError> {
        if self.state.fail_start.load(Ordering::SeqCst) {
            return Err(AdapterError::Notify {
                source: std::io::Error::other("supervisor unreachable"),
            });
        }
        self.record(Notification::Started);
        Ok(())
    }

    fn notify_stopping(&self) -> Result<(), AdapterError> {
        self.record(Notification::Stopping);
        Ok(())
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        Ok(self.state.stop.wait()?)
    }

    fn release(&self) {
        self.state.released.store(true, Ordering::SeqCst);
        self.state.stop.close();
    }
}

/// In-memory log sink for subscribers scoped to a test.
#[derive(Clone, Default)]
pub struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log mutex poisoned")).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
