//! Synchronous execution of external administrative commands.

mod errors;
mod runner;

pub use errors::ProcessError;
pub use runner::{CommandRunner, SystemCommandRunner};

#[cfg(test)]
pub(crate) use runner::MockCommandRunner;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
