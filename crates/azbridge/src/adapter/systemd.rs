//! systemd integration through the `sd_notify` datagram protocol.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io;

use tracing::debug;

use super::{
    ADAPTER_TARGET, AdapterError, AdapterKind, ConsoleStyle, ServiceAdapter, ShutdownError,
    ShutdownSignal, SystemShutdownSignal,
};

/// Environment variable carrying the systemd notification socket.
pub const NOTIFY_SOCKET_ENV: &str = "NOTIFY_SOCKET";

const INVOCATION_ID_ENV: &str = "INVOCATION_ID";

/// Reports whether systemd started this process.
///
/// systemd exports `INVOCATION_ID` to every unit and `NOTIFY_SOCKET` to
/// `Type=notify` units.
#[must_use]
pub fn running_under_systemd() -> bool {
    [INVOCATION_ID_ENV, NOTIFY_SOCKET_ENV]
        .iter()
        .any(|name| env::var_os(name).is_some_and(|value| !value.is_empty()))
}

/// Sends state strings to the systemd notification socket.
#[derive(Debug, Clone, Default)]
pub struct SystemdNotifier {
    socket: Option<OsString>,
}

impl SystemdNotifier {
    /// Builds a notifier from `$NOTIFY_SOCKET`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env::var_os(NOTIFY_SOCKET_ENV))
    }

    /// Builds a notifier for an explicit socket address.
    ///
    /// Addresses starting with `@` name a Linux abstract socket. An empty or
    /// missing address disables notifications.
    #[must_use]
    pub fn new(socket: Option<OsString>) -> Self {
        Self {
            socket: socket.filter(|address| !address.is_empty()),
        }
    }

    /// Whether notifications are delivered anywhere.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.socket.is_some()
    }

    /// Sends a newline-separated list of `KEY=VALUE` assignments.
    ///
    /// # Errors
    ///
    /// Returns the socket error when the datagram cannot be delivered.
    pub fn notify(&self, state: &str) -> io::Result<()> {
        let Some(address) = self.socket.as_deref() else {
            debug!(
                target: ADAPTER_TARGET,
                state,
                "notification socket not set; skipping"
            );
            return Ok(());
        };
        send_datagram(address, state.as_bytes())
    }
}

#[cfg(unix)]
fn send_datagram(address: &OsStr, payload: &[u8]) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::net::UnixDatagram;

    let socket = UnixDatagram::unbound()?;
    match address.as_bytes().strip_prefix(b"@") {
        Some(name) => send_abstract(&socket, name, payload),
        None => socket.send_to(payload, address).map(drop),
    }
}

#[cfg(target_os = "linux")]
fn send_abstract(
    socket: &std::os::unix::net::UnixDatagram,
    name: &[u8],
    payload: &[u8],
) -> io::Result<()> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let address = SocketAddr::from_abstract_name(name)?;
    socket.send_to_addr(payload, &address).map(drop)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn send_abstract(
    _socket: &std::os::unix::net::UnixDatagram,
    _name: &[u8],
    _payload: &[u8],
) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract notification sockets require Linux",
    ))
}

#[cfg(not(unix))]
fn send_datagram(_address: &OsStr, _payload: &[u8]) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "systemd notification sockets require Unix",
    ))
}

/// Adapter for systemd units.
pub struct SystemdAdapter<S = SystemShutdownSignal> {
    notifier: SystemdNotifier,
    shutdown: S,
}

impl SystemdAdapter {
    /// Builds the adapter from `$NOTIFY_SOCKET` and the operating system's
    /// signal listener.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when signal handlers cannot be installed.
    pub fn install() -> Result<Self, ShutdownError> {
        let shutdown = SystemShutdownSignal::install()?;
        Ok(Self::with_parts(SystemdNotifier::from_env(), shutdown))
    }
}

impl<S> SystemdAdapter<S>
where
    S: ShutdownSignal,
{
    /// Builds the adapter from explicit parts.
    pub fn with_parts(notifier: SystemdNotifier, shutdown: S) -> Self {
        Self { notifier, shutdown }
    }

    fn send(&self, state: &str) -> Result<(), AdapterError> {
        self.notifier
            .notify(state)
            .map_err(|source| AdapterError::Notify { source })
    }
}

impl<S> ServiceAdapter for SystemdAdapter<S>
where
    S: ShutdownSignal,
{
    fn kind(&self) -> AdapterKind {
        AdapterKind::Systemd
    }

    fn console_style(&self) -> ConsoleStyle {
        ConsoleStyle::Journald
    }

    fn notify_started(&self) -> Result<(), AdapterError> {
        self.send(&format!("READY=1\nMAINPID={}", std::process::id()))
    }

    fn notify_stopping(&self) -> Result<(), AdapterError> {
        self.send("STOPPING=1")
    }

    fn wait_for_stop(&self) -> Result<(), AdapterError> {
        Ok(self.shutdown.wait()?)
    }

    fn release(&self) {
        self.shutdown.close();
    }
}
