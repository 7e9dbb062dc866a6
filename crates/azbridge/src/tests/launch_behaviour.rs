//! Behavioural tests for launch sequencing.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use azbridge_config::{ConfigError, ConfigSearchPaths, Severity, Settings};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::support::{FakeAdapter, RecordingHostReporter, ReportedEvent};
use crate::host::{StopToken, WorkerError};
use crate::identity::ServiceIdentity;
use crate::launch::{LaunchError, LaunchMode, prepare, run_host};

struct Layout {
    _dir: TempDir,
    system: PathBuf,
    fallback: PathBuf,
    caller: PathBuf,
}

impl Layout {
    fn search(&self) -> ConfigSearchPaths {
        ConfigSearchPaths::new(&self.system, Some(self.fallback.clone()))
    }

    fn settings(&self, quiet: Option<bool>) -> Settings {
        Settings {
            config_file: Some(self.caller.clone()),
            quiet,
        }
    }
}

#[fixture]
fn layout() -> Layout {
    let dir = TempDir::new().expect("create temporary directory");
    let system = dir.path().join("etc/azbridge_config.svc.yml");
    let fallback = dir.path().join("bin/azbridge_config.svc.yml");
    let caller = dir.path().join("caller.yml");
    fs::create_dir_all(dir.path().join("etc")).expect("create etc");
    fs::create_dir_all(dir.path().join("bin")).expect("create bin");
    fs::write(&caller, "LogLevel: INFO\n").expect("write caller config");
    Layout {
        _dir: dir,
        system,
        fallback,
        caller,
    }
}

#[rstest]
fn service_runs_prefer_the_system_file(layout: Layout) {
    fs::write(&layout.system, "LogLevel: VERBOSE\n").expect("write system config");
    let mut settings = layout.settings(None);

    let prepared =
        prepare(&mut settings, &layout.search(), LaunchMode::Service).expect("prepare");

    assert_eq!(settings.config_file.as_deref(), Some(layout.system.as_path()));
    assert_eq!(prepared.severity, Severity::Trace);
    assert_eq!(prepared.config.source(), Some(layout.system.as_path()));
}

#[rstest]
fn interactive_runs_keep_the_caller_file(layout: Layout) {
    fs::write(&layout.system, "LogLevel: VERBOSE\n").expect("write system config");
    let mut settings = layout.settings(None);

    let prepared =
        prepare(&mut settings, &layout.search(), LaunchMode::Interactive).expect("prepare");

    assert_eq!(settings.config_file.as_deref(), Some(layout.caller.as_path()));
    assert_eq!(prepared.severity, Severity::Information);
}

#[rstest]
fn service_runs_fall_back_to_the_executable_directory(layout: Layout) {
    fs::write(&layout.fallback, "LogLevel: DEBUG2\n").expect("write fallback config");
    let mut settings = layout.settings(None);

    let prepared =
        prepare(&mut settings, &layout.search(), LaunchMode::Service).expect("prepare");

    assert_eq!(prepared.severity, Severity::Debug);
}

#[rstest]
fn quiet_overrides_the_configured_level(layout: Layout) {
    let mut settings = layout.settings(Some(true));

    let prepared =
        prepare(&mut settings, &layout.search(), LaunchMode::Service).expect("prepare");

    assert_eq!(prepared.severity, Severity::None);
}

#[rstest]
fn missing_caller_file_is_a_config_error(layout: Layout) {
    fs::remove_file(&layout.caller).expect("remove caller config");
    let mut settings = layout.settings(None);

    let error = prepare(&mut settings, &layout.search(), LaunchMode::Service)
        .expect_err("prepare should fail");

    assert!(matches!(
        error,
        LaunchError::Config {
            source: ConfigError::NotFound { .. }
        }
    ));
}

#[rstest]
fn run_host_drives_the_prepared_host(layout: Layout) {
    let mut settings = layout.settings(None);
    let prepared =
        prepare(&mut settings, &layout.search(), LaunchMode::Interactive).expect("prepare");
    let adapter = FakeAdapter::default();
    let reporter = Arc::new(RecordingHostReporter::default());
    let trigger = adapter.clone();

    run_host(
        prepared,
        adapter.boxed(),
        ServiceIdentity::default(),
        move |_config: Arc<azbridge_config::Config>, stop: StopToken| -> Result<(), WorkerError> {
            trigger.request_stop();
            stop.wait();
            Ok(())
        },
        reporter.clone(),
    )
    .expect("host should stop cleanly");

    assert!(reporter.events().contains(&ReportedEvent::StopRequested));
}
