//! Service host for the Azure Relay Bridge.
//!
//! The crate turns the bridge executable into a managed background service on
//! Windows (Service Control Manager), Linux (systemd) and macOS (launchd), and
//! performs the one-shot registration and removal of that service.
//!
//! A run resolves the configuration file with
//! [`azbridge_config::resolve_config_path`], fixes the severity threshold,
//! selects a [`ServiceAdapter`] for the supervisor and then blocks inside
//! [`Host::run`] until the supervisor asks the process to stop. The bridge
//! engine itself plugs in through [`HostedWorker`].

mod adapter;
mod cli;
mod health;
mod host;
mod identity;
mod installer;
mod launch;
mod placeholder_worker;
mod process;
mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

pub use adapter::{
    AdapterError, AdapterKind, ConsoleAdapter, ConsoleStyle, LaunchdAdapter,
    ManualShutdownSignal, NOTIFY_SOCKET_ENV, ServiceAdapter, ShutdownError, ShutdownSignal,
    SystemShutdownSignal, SystemdAdapter, SystemdNotifier, running_under_systemd, select_adapter,
};
#[cfg(windows)]
pub use adapter::WindowsServiceAdapter;
pub use cli::{Cli, CliAction, normalise_args};
pub use health::{HostReporter, StructuredHostReporter};
pub use host::{Host, HostBuilder, HostError, HostedWorker, StopToken, WorkerError};
pub use identity::{DEFAULT_DISPLAY_NAME, DEFAULT_SERVICE_NAME, ServiceIdentity};
pub use installer::{
    AssumeInstalledProbe, InstallError, InstallProbe, InstallState, ProbeError, SERVICE_RUN_FLAG,
    ServiceInstaller, platform_probe, service_control_utility,
};
#[cfg(windows)]
pub use installer::ScmProbe;
pub use launch::{
    LaunchError, LaunchMode, LaunchPlan, Prepared, install_service, prepare, run_host,
    run_service, run_with, uninstall_service,
};
pub use placeholder_worker::IdleWorker;
pub use process::{CommandRunner, ProcessError, SystemCommandRunner};
pub use telemetry::{
    Clock, DATE_TOKEN, DailyFileWriter, JournaldFormat, LocalClock, LogFileTemplate,
    TelemetryError, TelemetryHandle, TelemetrySettings, event_log_filter, level_filter,
    syslog_priority,
};

/// Parses `args` and performs the requested action.
///
/// Errors are written to `stderr`; the returned code is non-zero on failure.
pub fn run<I, T, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    E: Write,
{
    let cli = match Cli::try_parse_normalised(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return if error.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let outcome = match cli.action() {
        CliAction::Install => install_service(ServiceIdentity::default()),
        CliAction::Uninstall => uninstall_service(ServiceIdentity::default()),
        CliAction::Run => run_service(cli.settings(), LaunchMode::Interactive),
        CliAction::RunService => run_service(cli.settings(), LaunchMode::Service),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "azbridge: {error}");
            exit_code_for(&error)
        }
    }
}

fn exit_code_for(error: &LaunchError) -> ExitCode {
    let code = match error {
        LaunchError::Install(InstallError::Command { source }) => source
            .exit_code()
            .and_then(|code| u8::try_from(code).ok())
            .filter(|code| *code != 0)
            .unwrap_or(1),
        _ => 1,
    };
    ExitCode::from(code)
}

#[cfg(test)]
mod tests;
