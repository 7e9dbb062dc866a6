//! Test suites for the service host.

mod launch_behaviour;
mod support;
