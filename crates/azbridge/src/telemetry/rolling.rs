//! Daily rotating log files named `<dir>/<stem>-<yyyyMMdd><ext>`.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::{Date, OffsetDateTime};

/// Placeholder replaced by the current date in [`LogFileTemplate::pattern`].
pub const DATE_TOKEN: &str = "{Date}";

/// Naming template derived from the configured log file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileTemplate {
    directory: PathBuf,
    stem: OsString,
    extension: Option<OsString>,
}

impl LogFileTemplate {
    /// Splits `path` into directory, stem and extension.
    #[must_use]
    pub fn from_log_file(path: &Path) -> Self {
        Self {
            directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            stem: path.file_stem().map(OsString::from).unwrap_or_default(),
            extension: path.extension().map(OsString::from),
        }
    }

    /// Directory the log files live in; empty for the working directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name pattern with the [`DATE_TOKEN`] placeholder.
    #[must_use]
    pub fn pattern(&self) -> PathBuf {
        self.file_path(DATE_TOKEN)
    }

    /// File that holds the entries written on `date`.
    #[must_use]
    pub fn path_for(&self, date: Date) -> PathBuf {
        self.file_path(&date_stamp(date))
    }

    fn file_path(&self, stamp: &str) -> PathBuf {
        let mut name = self.stem.clone();
        name.push("-");
        name.push(stamp);
        if let Some(extension) = &self.extension {
            name.push(".");
            name.push(extension);
        }
        self.directory.join(name)
    }
}

fn date_stamp(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Source of the current date used to pick the active file.
pub trait Clock: Send {
    /// Today's date.
    fn today(&self) -> Date;
}

/// Local calendar date, falling back to UTC when the offset is unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

/// Writer that appends to the file for the current date and switches files
/// when the date changes.
#[derive(Debug)]
pub struct DailyFileWriter<C = LocalClock> {
    template: LogFileTemplate,
    clock: C,
    current: Option<(Date, File)>,
}

impl DailyFileWriter {
    /// Opens today's file using the local clock.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the directory or file cannot be created.
    pub fn open(template: LogFileTemplate) -> io::Result<Self> {
        Self::with_clock(template, LocalClock)
    }
}

impl<C> DailyFileWriter<C>
where
    C: Clock,
{
    /// Opens today's file according to `clock`.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the directory or file cannot be created.
    pub fn with_clock(template: LogFileTemplate, clock: C) -> io::Result<Self> {
        let mut writer = Self {
            template,
            clock,
            current: None,
        };
        writer.active_file()?;
        Ok(writer)
    }

    /// Path of the file currently written to.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current
            .as_ref()
            .map(|(date, _)| self.template.path_for(*date))
    }

    fn active_file(&mut self) -> io::Result<&mut File> {
        let today = self.clock.today();
        let stale = self
            .current
            .as_ref()
            .is_none_or(|(date, _)| *date != today);
        if stale {
            let file = open_append(self.template.directory(), &self.template.path_for(today))?;
            self.current = Some((today, file));
        }
        match self.current.as_mut() {
            Some((_, file)) => Ok(file),
            None => Err(io::Error::other("log file not open")),
        }
    }
}

fn open_append(directory: &Path, path: &Path) -> io::Result<File> {
    if !directory.as_os_str().is_empty() {
        fs::create_dir_all(directory)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

impl<C> Write for DailyFileWriter<C>
where
    C: Clock,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.active_file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rstest::rstest;
    use tempfile::TempDir;
    use time::Month;

    use super::*;

    #[derive(Clone)]
    struct FixedClock(Arc<Mutex<Date>>);

    impl FixedClock {
        fn new(date: Date) -> Self {
            Self(Arc::new(Mutex::new(date)))
        }

        fn advance_to(&self, date: Date) {
            *self.0.lock().expect("clock lock") = date;
        }
    }

    impl Clock for FixedClock {
        fn today(&self) -> Date {
            *self.0.lock().expect("clock lock")
        }
    }

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).expect("valid date")
    }

    #[rstest]
    #[case("logs/bridge.log", "logs/bridge-20240131.log", "logs/bridge-{Date}.log")]
    #[case("bridge.log", "bridge-20240131.log", "bridge-{Date}.log")]
    #[case("/var/log/azbridge/trace", "/var/log/azbridge/trace-20240131", "/var/log/azbridge/trace-{Date}")]
    #[case("logs/bridge.2024.txt", "logs/bridge.2024-20240131.txt", "logs/bridge.2024-{Date}.txt")]
    fn template_inserts_date_before_extension(
        #[case] configured: &str,
        #[case] expected: &str,
        #[case] pattern: &str,
    ) {
        let template = LogFileTemplate::from_log_file(Path::new(configured));

        assert_eq!(
            template.path_for(date(2024, Month::January, 31)),
            PathBuf::from(expected)
        );
        assert_eq!(template.pattern(), PathBuf::from(pattern));
    }

    #[test]
    fn writer_creates_missing_directories() {
        let dir = TempDir::new().expect("create temporary directory");
        let template = LogFileTemplate::from_log_file(&dir.path().join("nested/logs/bridge.log"));
        let clock = FixedClock::new(date(2024, Month::March, 5));

        let mut writer = DailyFileWriter::with_clock(template, clock).expect("open writer");
        writer.write_all(b"first line\n").expect("write");
        writer.flush().expect("flush");

        let expected = dir.path().join("nested/logs/bridge-20240305.log");
        assert_eq!(writer.current_path(), Some(expected.clone()));
        assert_eq!(
            fs::read_to_string(expected).expect("read log"),
            "first line\n"
        );
    }

    #[test]
    fn writer_rolls_over_when_the_date_changes() {
        let dir = TempDir::new().expect("create temporary directory");
        let template = LogFileTemplate::from_log_file(&dir.path().join("bridge.log"));
        let clock = FixedClock::new(date(2024, Month::December, 31));

        let mut writer =
            DailyFileWriter::with_clock(template, clock.clone()).expect("open writer");
        writer.write_all(b"old year\n").expect("write");
        clock.advance_to(date(2025, Month::January, 1));
        writer.write_all(b"new year\n").expect("write");
        writer.flush().expect("flush");

        let first = fs::read_to_string(dir.path().join("bridge-20241231.log")).expect("read");
        let second = fs::read_to_string(dir.path().join("bridge-20250101.log")).expect("read");
        assert_eq!(first, "old year\n");
        assert_eq!(second, "new year\n");
    }

    #[test]
    fn writer_appends_to_existing_file() {
        let dir = TempDir::new().expect("create temporary directory");
        let existing = dir.path().join("bridge-20240131.log");
        fs::write(&existing, "earlier\n").expect("seed log");
        let template = LogFileTemplate::from_log_file(&dir.path().join("bridge.log"));
        let clock = FixedClock::new(date(2024, Month::January, 31));

        let mut writer = DailyFileWriter::with_clock(template, clock).expect("open writer");
        writer.write_all(b"later\n").expect("write");

        assert_eq!(
            fs::read_to_string(existing).expect("read log"),
            "earlier\nlater\n"
        );
    }
}
