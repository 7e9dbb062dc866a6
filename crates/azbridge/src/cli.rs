//! Command-line surface of the `azbridge` service host.

use std::ffi::OsString;
use std::path::PathBuf;

use azbridge_config::Settings;
use clap::Parser;

/// Single-dash spellings accepted for the service flags.
const LEGACY_FLAGS: [(&str, &str); 3] = [
    ("-svc", "--svc"),
    ("-svcinstall", "--svcinstall"),
    ("-svcuninstall", "--svcuninstall"),
];

/// Command-line interface of the service host.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "azbridge", about = "Azure Relay Bridge service host", version)]
pub struct Cli {
    /// Configuration file to load.
    #[arg(short = 'f', long = "config-file", value_name = "PATH")]
    pub config_file: Option<PathBuf>,
    /// Suppresses all log output.
    #[arg(short = 'q', long)]
    pub quiet: bool,
    /// Runs under the platform service manager.
    #[arg(long = "svc", conflicts_with_all = ["install", "uninstall"])]
    pub service: bool,
    /// Registers this executable as an auto-start service.
    #[arg(long = "svcinstall", conflicts_with = "uninstall")]
    pub install: bool,
    /// Removes the service registration.
    #[arg(long = "svcuninstall")]
    pub uninstall: bool,
}

/// Action selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliAction {
    /// Run the host in the foreground.
    Run,
    /// Run the host under the platform service manager.
    RunService,
    /// Register the service.
    Install,
    /// Remove the service registration.
    Uninstall,
}

impl Cli {
    /// Parses `args`, accepting the single-dash service flags.
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown or conflicting arguments.
    pub fn try_parse_normalised<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalise_args(args))
    }

    /// Action requested by the flags.
    #[must_use]
    pub fn action(&self) -> CliAction {
        if self.install {
            CliAction::Install
        } else if self.uninstall {
            CliAction::Uninstall
        } else if self.service {
            CliAction::RunService
        } else {
            CliAction::Run
        }
    }

    /// Settings handed to the configuration resolver.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            config_file: self.config_file.clone(),
            quiet: self.quiet.then_some(true),
        }
    }
}

/// Rewrites single-dash service flags to their long form.
pub fn normalise_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg == *legacy)
                .map_or(arg, |(_, long)| OsString::from(long))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["azbridge"], CliAction::Run)]
    #[case(&["azbridge", "-svc"], CliAction::RunService)]
    #[case(&["azbridge", "--svc"], CliAction::RunService)]
    #[case(&["azbridge", "--svcinstall"], CliAction::Install)]
    #[case(&["azbridge", "-svcuninstall"], CliAction::Uninstall)]
    fn flags_select_the_action(#[case] args: &[&str], #[case] expected: CliAction) {
        let cli = Cli::try_parse_normalised(args).expect("arguments should parse");
        assert_eq!(cli.action(), expected);
    }

    #[test]
    fn settings_carry_path_and_quiet() {
        let cli = Cli::try_parse_normalised(["azbridge", "-q", "-f", "bridge.yml"])
            .expect("arguments should parse");

        let settings = cli.settings();

        assert_eq!(settings.config_file, Some(PathBuf::from("bridge.yml")));
        assert_eq!(settings.quiet, Some(true));
    }

    #[test]
    fn quiet_is_unset_when_absent() {
        let cli = Cli::try_parse_normalised(["azbridge", "--config-file", "bridge.yml"])
            .expect("arguments should parse");
        assert_eq!(cli.settings().quiet, None);
    }

    #[test]
    fn install_conflicts_with_uninstall() {
        let result = Cli::try_parse_normalised(["azbridge", "--svcinstall", "--svcuninstall"]);
        assert!(result.is_err());
    }

    #[test]
    fn normalisation_leaves_other_arguments_alone() {
        let args = normalise_args(["azbridge", "-svc", "-f", "-svc.yml"]);
        assert_eq!(
            args,
            vec![
                OsString::from("azbridge"),
                OsString::from("--svc"),
                OsString::from("-f"),
                OsString::from("-svc.yml"),
            ]
        );
    }
}
