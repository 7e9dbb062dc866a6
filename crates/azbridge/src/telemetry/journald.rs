//! Console format understood by journald's stderr capture.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Prefixes each line with a `<N>` syslog priority so journald records the
/// event's severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct JournaldFormat;

/// Syslog priority for a tracing level.
#[must_use]
pub const fn syslog_priority(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

impl<S, N> FormatEvent<S, N> for JournaldFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "<{}>{}: ",
            syslog_priority(metadata.level()),
            metadata.target()
        )?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use rstest::rstest;
    use tracing_subscriber::fmt as subscriber_fmt;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("buffer lock")).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(Level::ERROR, 3)]
    #[case(Level::WARN, 4)]
    #[case(Level::INFO, 6)]
    #[case(Level::DEBUG, 7)]
    #[case(Level::TRACE, 7)]
    fn levels_map_to_syslog_priorities(#[case] level: Level, #[case] priority: u8) {
        assert_eq!(syslog_priority(&level), priority);
    }

    #[test]
    fn lines_carry_priority_prefix() {
        let captured = Captured::default();
        let writer = captured.clone();
        // ANSI has to be switched off while the builder still holds the
        // default formatter; the field formatter keeps the setting.
        let subscriber = subscriber_fmt()
            .with_ansi(false)
            .event_format(JournaldFormat)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "azbridge::test", relay = "db", "relay unavailable");
        });

        assert_eq!(
            captured.contents(),
            "<4>azbridge::test: relay unavailable relay=\"db\"\n"
        );
    }
}
