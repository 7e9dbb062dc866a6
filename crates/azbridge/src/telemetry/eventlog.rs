//! Windows Application event log sink.

use std::fmt::{self, Write as _};
use std::io;
use std::ptr;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use widestring::U16CString;
use winapi::um::winbase::{DeregisterEventSource, RegisterEventSourceW, ReportEventW};
use winapi::um::winnt::{
    EVENTLOG_ERROR_TYPE, EVENTLOG_INFORMATION_TYPE, EVENTLOG_WARNING_TYPE, HANDLE,
};

/// Event source handle owned by the layer.
struct EventSource(HANDLE);

// Event log handles may be used from any thread.
unsafe impl Send for EventSource {}
unsafe impl Sync for EventSource {}

impl Drop for EventSource {
    fn drop(&mut self) {
        unsafe {
            DeregisterEventSource(self.0);
        }
    }
}

/// Layer that reports events to the Application log under a named source.
pub struct EventLogLayer {
    source: EventSource,
}

impl EventLogLayer {
    /// Registers `source_name` as the event source.
    ///
    /// # Errors
    ///
    /// Returns the operating system error when registration fails.
    pub fn register(source_name: &str) -> io::Result<Self> {
        let name = U16CString::from_str(source_name)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;
        let handle = unsafe { RegisterEventSourceW(ptr::null(), name.as_ptr()) };
        if handle.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            source: EventSource(handle),
        })
    }
}

fn event_type(level: &Level) -> u16 {
    match *level {
        Level::ERROR => EVENTLOG_ERROR_TYPE,
        Level::WARN => EVENTLOG_WARNING_TYPE,
        _ => EVENTLOG_INFORMATION_TYPE,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

impl<S> Layer<S> for EventLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let text = format!(
            "{}: {}{}",
            metadata.target(),
            visitor.message,
            visitor.fields
        );
        let wide = U16CString::from_str_truncate(text);
        let mut strings = [wide.as_ptr()];
        unsafe {
            ReportEventW(
                self.source.0,
                event_type(metadata.level()),
                0,
                0,
                ptr::null_mut(),
                1,
                0,
                strings.as_mut_ptr(),
                ptr::null_mut(),
            );
        }
    }
}
