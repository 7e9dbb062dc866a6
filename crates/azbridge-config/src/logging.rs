//! Maps configured log-level tokens onto the effective logging severity.
//!
//! The bridge configuration names its verbosity with a small vocabulary of
//! tokens (`QUIET`, `FATAL`, `ERROR`, `INFO`, `VERBOSE`, `DEBUG`, `DEBUG1`,
//! `DEBUG2`, `DEBUG3`). The host needs a single severity threshold, so the
//! mapping below collapses the vocabulary onto [`Severity`] and never fails:
//! unknown or missing tokens fall back to [`Severity::Error`].

use strum::{Display, EnumString};

/// Minimum severity that the logging pipeline emits.
///
/// Variants are ordered from most to least detailed; `None` suppresses all
/// output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// Most detailed output, including wire-level tracing.
    Trace,
    /// Diagnostic output intended for developers.
    Debug,
    /// Routine operational messages.
    Information,
    /// Recoverable problems.
    Warning,
    /// Failures of a single operation.
    #[default]
    Error,
    /// Failures that take the whole process down.
    Critical,
    /// No output at all.
    None,
}

/// Log-level tokens accepted in configuration files.
///
/// Parsing is ASCII case-insensitive. The numbered debug tokens are accepted
/// for compatibility but carry no extra verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevelToken {
    /// Suppresses all output.
    Quiet,
    /// Only process-fatal failures.
    Fatal,
    /// Errors only.
    Error,
    /// Informational messages and above.
    Info,
    /// Everything, including trace output.
    Verbose,
    /// Debug output.
    #[strum(
        to_string = "DEBUG",
        serialize = "DEBUG1",
        serialize = "DEBUG2",
        serialize = "DEBUG3"
    )]
    Debug,
}

impl LogLevelToken {
    /// Severity threshold selected by this token.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Quiet => Severity::None,
            Self::Fatal => Severity::Critical,
            Self::Error => Severity::Error,
            Self::Info => Severity::Information,
            Self::Verbose => Severity::Trace,
            Self::Debug => Severity::Debug,
        }
    }
}

/// Computes the effective severity from the quiet override and the raw
/// configured log level.
///
/// A `quiet` value of `Some(true)` wins over any configured level. Otherwise
/// the raw token is parsed case-insensitively; missing or unrecognised
/// tokens yield [`Severity::Error`].
///
/// # Examples
///
/// ```ignore
/// use azbridge_config::{Severity, effective_severity};
///
/// assert_eq!(effective_severity(None, Some("verbose")), Severity::Trace);
/// assert_eq!(effective_severity(Some(true), Some("DEBUG")), Severity::None);
/// ```
#[must_use]
pub fn effective_severity(quiet: Option<bool>, raw_level: Option<&str>) -> Severity {
    if quiet == Some(true) {
        return Severity::None;
    }
    raw_level
        .and_then(|raw| raw.parse::<LogLevelToken>().ok())
        .map_or(Severity::default(), LogLevelToken::severity)
}
