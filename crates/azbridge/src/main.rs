//! Entry point of the Azure Relay Bridge service host.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Unlocked handle: host threads log to stderr while `run` blocks.
    azbridge::run(std::env::args_os(), &mut io::stderr())
}
