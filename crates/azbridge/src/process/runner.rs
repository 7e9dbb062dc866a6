//! Runs a child process to completion and maps its exit status.
//!
//! Output is captured so it never reaches the operator's console, and the
//! wait has no timeout: a child that never exits blocks the caller.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::PROCESS_TARGET;
use super::errors::ProcessError;

/// Executes external commands on behalf of the installer.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` with `args`, blocking until it exits.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Failed`] for a non-zero exit code and the other
    /// variants when the child cannot be started or is killed.
    fn execute(&self, command: &Path, args: &[OsString]) -> Result<(), ProcessError>;
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Builds a new runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn execute(&self, command: &Path, args: &[OsString]) -> Result<(), ProcessError> {
        info!(
            target: PROCESS_TARGET,
            command = %command.display(),
            args = ?args,
            "running external command"
        );
        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ProcessError::Spawn {
                command: command.to_path_buf(),
                source,
            })?;
        debug!(
            target: PROCESS_TARGET,
            command = %command.display(),
            status = %output.status,
            captured_bytes = output.stdout.len() + output.stderr.len(),
            "external command exited"
        );
        match output.status.code() {
            Some(0) => Ok(()),
            Some(exit_code) => Err(ProcessError::Failed {
                command: command.to_path_buf(),
                exit_code,
            }),
            None => Err(ProcessError::Terminated {
                command: command.to_path_buf(),
            }),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;

    fn shell(script: &str) -> Result<(), ProcessError> {
        SystemCommandRunner::new().execute(
            Path::new("/bin/sh"),
            &[OsString::from("-c"), OsString::from(script)],
        )
    }

    #[test]
    fn zero_exit_code_succeeds() {
        shell("exit 0").expect("command should succeed");
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(1060)]
    fn non_zero_exit_code_is_reported_verbatim(#[case] code: i32) {
        let error = shell(&format!("exit {code}")).expect_err("command should fail");

        // Unix truncates exit statuses to a byte.
        let expected = code & 0xff;
        assert_eq!(error.exit_code(), Some(expected));
        assert!(error.to_string().contains(&expected.to_string()));
    }

    #[test]
    fn exit_code_three_is_embedded_in_the_message() {
        let error = shell("exit 3").expect_err("command should fail");
        assert!(matches!(error, ProcessError::Failed { exit_code: 3, .. }));
        assert!(error.to_string().contains("exit code 3"));
    }

    #[test]
    fn captured_output_does_not_affect_the_result() {
        shell("echo noisy; echo louder >&2; exit 0").expect("command should succeed");
    }

    #[test]
    fn missing_binary_reports_spawn_failure() {
        let command = PathBuf::from("/nonexistent/azbridge-sc");
        let error = SystemCommandRunner::new()
            .execute(&command, &[])
            .expect_err("spawn should fail");
        assert!(matches!(error, ProcessError::Spawn { command: reported, .. } if reported == command));
    }

    #[test]
    fn killed_child_reports_termination() {
        let error = shell("kill -9 $$").expect_err("command should be killed");
        assert!(matches!(error, ProcessError::Terminated { .. }));
        assert_eq!(error.exit_code(), None);
    }
}
