//! Logging pipeline for the service host.
//!
//! One subscriber is installed per process. It fans events out to a console
//! sink formatted for the active supervisor, an optional daily rotating file
//! and, on Windows, the Application event log. Every sink shares the severity
//! threshold computed before the host starts.

#[cfg(windows)]
mod eventlog;
mod journald;
mod rolling;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use azbridge_config::Severity;
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::adapter::ConsoleStyle;

pub use journald::{JournaldFormat, syslog_priority};
pub use rolling::{Clock, DATE_TOKEN, DailyFileWriter, LocalClock, LogFileTemplate};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log file could not be opened.
    #[error("failed to open log file '{path}': {source}")]
    LogFile {
        /// Path of the file for the current date.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The event log source could not be registered.
    #[error("failed to register event log source '{source_name}': {source}")]
    EventLog {
        /// Event source name.
        source_name: String,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Inputs of the logging pipeline.
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySettings<'a> {
    /// Threshold shared by every sink.
    pub severity: Severity,
    /// Console format requested by the adapter.
    pub console_style: ConsoleStyle,
    /// Configured log file; `None` disables the file sink.
    pub log_file: Option<&'a Path>,
    /// Event log source name; ignored outside Windows.
    pub event_source: &'a str,
}

/// Handle returned when telemetry has been initialised.
///
/// Dropping the handle that installed the file sink flushes buffered lines.
#[derive(Debug, Default)]
pub struct TelemetryHandle {
    file_guard: Option<WorkerGuard>,
}

impl TelemetryHandle {
    /// Whether this handle owns the file sink's background writer.
    #[must_use]
    pub fn owns_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Level filter matching a severity threshold.
#[must_use]
pub const fn level_filter(severity: Severity) -> LevelFilter {
    match severity {
        Severity::Trace => LevelFilter::TRACE,
        Severity::Debug => LevelFilter::DEBUG,
        Severity::Information => LevelFilter::INFO,
        Severity::Warning => LevelFilter::WARN,
        Severity::Error | Severity::Critical => LevelFilter::ERROR,
        Severity::None => LevelFilter::OFF,
    }
}

/// Level filter of the event log sink: the stricter of the threshold and
/// `Warning`.
#[must_use]
pub fn event_log_filter(severity: Severity) -> LevelFilter {
    level_filter(severity.max(Severity::Warning))
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// subscriber; later calls return a handle without a file sink.
///
/// # Errors
///
/// Returns [`TelemetryError`] when a sink cannot be opened or the subscriber
/// cannot be installed.
pub fn initialise(settings: &TelemetrySettings<'_>) -> Result<TelemetryHandle, TelemetryError> {
    let mut file_guard = None;
    TELEMETRY_GUARD.get_or_try_init(|| {
        file_guard = install_subscriber(settings)?;
        Ok::<(), TelemetryError>(())
    })?;
    Ok(TelemetryHandle { file_guard })
}

fn install_subscriber(
    settings: &TelemetrySettings<'_>,
) -> Result<Option<WorkerGuard>, TelemetryError> {
    let level = level_filter(settings.severity);
    let mut layers: Vec<BoxedLayer> = vec![console_layer(settings.console_style, level)];

    let mut file_guard = None;
    if let Some(path) = settings.log_file {
        let (layer, guard) = file_layer(path, level)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    #[cfg(windows)]
    layers.push(event_log_layer(settings)?);

    let subscriber = tracing_subscriber::registry().with(layers);
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(file_guard)
}

fn console_layer(style: ConsoleStyle, level: LevelFilter) -> BoxedLayer {
    let base = fmt::layer().with_writer(io::stderr).with_target(true);
    match style {
        ConsoleStyle::Full => base
            // Colour only on interactive terminals.
            .with_ansi(io::stderr().is_terminal())
            .with_timer(UtcTime::rfc_3339())
            .with_filter(level)
            .boxed(),
        ConsoleStyle::SingleLine => base
            .compact()
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_filter(level)
            .boxed(),
        ConsoleStyle::Journald => base
            .with_ansi(false)
            .event_format(JournaldFormat)
            .with_filter(level)
            .boxed(),
    }
}

fn file_layer(path: &Path, level: LevelFilter) -> Result<(BoxedLayer, WorkerGuard), TelemetryError> {
    let template = LogFileTemplate::from_log_file(path);
    let writer = DailyFileWriter::open(template.clone()).map_err(|source| {
        TelemetryError::LogFile {
            path: template.path_for(LocalClock.today()),
            source,
        }
    })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);
    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_filter(level)
        .boxed();
    Ok((layer, guard))
}

#[cfg(windows)]
fn event_log_layer(settings: &TelemetrySettings<'_>) -> Result<BoxedLayer, TelemetryError> {
    let layer = eventlog::EventLogLayer::register(settings.event_source).map_err(|source| {
        TelemetryError::EventLog {
            source_name: settings.event_source.to_owned(),
            source,
        }
    })?;
    Ok(layer.with_filter(event_log_filter(settings.severity)).boxed())
}
