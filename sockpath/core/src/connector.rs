//! Connector
//!
//! Client-side wrapper: opens a fresh Unix domain stream to the configured
//! path on every connect call. The host:port address a caller supplies is
//! accepted but never routed on; it is remembered only so the resulting
//! connection can echo it back. Collapsing every connect shape into that one
//! real behavior is what makes the adapter a drop-in replacement.

use std::io;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};

use crate::addr::{fake_address, AddressHint};
use crate::conn::UdsConnection;
use crate::error::ConnectError;
use crate::traits::{Channel, Connector};

/// Client-side connector for a Unix domain socket path.
///
/// Stateless across calls apart from the configured path and default
/// timeout; each connect is independent and produces its own connection, so
/// concurrent connects share nothing mutable.
#[derive(Clone, Debug)]
pub struct UdsConnector {
    path: PathBuf,
    default_timeout: Option<Duration>,
}

impl UdsConnector {
    /// Create a connector for a socket path, with no default timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_timeout: None,
        }
    }

    /// Set the timeout used by [`connect`](Self::connect) calls that do not
    /// carry their own. A zero duration means no timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// The socket path this connector dials.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    /// Connect using the configured default timeout.
    ///
    /// `hint` is stored on the resulting connection for address queries; it
    /// plays no part in routing.
    pub fn connect(&self, hint: AddressHint) -> Result<UdsConnection, ConnectError> {
        self.connect_opts(hint, self.default_timeout)
    }

    /// Connect with an explicit timeout (zero = no timeout).
    pub fn connect_timeout(
        &self,
        hint: AddressHint,
        timeout: Duration,
    ) -> Result<UdsConnection, ConnectError> {
        let timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self.connect_opts(hint, timeout)
    }

    /// Connect by hostname and port, the way name-based call sites do.
    pub fn connect_host(&self, host: &str, port: u16) -> Result<UdsConnection, ConnectError> {
        self.connect(AddressHint::new(host, port))
    }

    /// The single real connect behavior every public shape funnels into.
    fn connect_opts(
        &self,
        hint: AddressHint,
        timeout: Option<Duration>,
    ) -> Result<UdsConnection, ConnectError> {
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None).map_err(ConnectError::Io)?;
        let addr = SockAddr::unix(&self.path).map_err(ConnectError::Io)?;

        match timeout {
            Some(t) => socket
                .connect_timeout(&addr, t)
                .map_err(|e| self.map_connect_error(e, Some(t)))?,
            None => socket
                .connect(&addr)
                .map_err(|e| self.map_connect_error(e, None))?,
        }

        let stream: UnixStream = socket.into();
        tracing::debug!(path = ?self.path, remote = %hint, "connected");
        Ok(UdsConnection::new(stream, fake_address(&hint)))
    }

    /// Translate OS connect failures into the adapter's taxonomy.
    fn map_connect_error(&self, e: io::Error, timeout: Option<Duration>) -> ConnectError {
        match e.kind() {
            // Missing socket file and refused-by-kernel both mean the same
            // thing to callers: nothing is listening at this path.
            io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => {
                ConnectError::Refused(self.path.clone())
            }
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ConnectError::TimedOut {
                path: self.path.clone(),
                timeout: timeout.unwrap_or_default(),
            },
            io::ErrorKind::PermissionDenied => ConnectError::PermissionDenied {
                path: self.path.clone(),
                source: e,
            },
            _ => ConnectError::Io(e),
        }
    }
}

impl Connector for UdsConnector {
    fn connect(
        &self,
        hint: AddressHint,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn Channel>, ConnectError> {
        let timeout = timeout.or(self.default_timeout);
        self.connect_opts(hint, timeout)
            .map(|conn| Box::new(conn) as Box<dyn Channel>)
    }
}
