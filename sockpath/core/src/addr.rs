//! Address Translation
//!
//! Pure logic mapping between the host:port addresses callers supply and the
//! Unix domain socket path the adapter actually uses. Callers written against
//! a host:port socket API hand us an [`AddressHint`]; we never route by it.
//! It is captured verbatim and echoed back from address queries so those
//! callers keep seeing the address shape they expect.

use std::fmt;
use std::net::SocketAddr;
#[cfg(unix)]
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[cfg(unix)]
use crate::config::SocketConfig;

/// The port number reported where no real port exists.
///
/// A Unix domain socket has no port, so [`local_port`] answers with this
/// fixed sentinel regardless of the port in the bind-time hint. Callers must
/// not treat it as meaningful.
///
/// [`local_port`]: crate::listener::UdsListener::local_port
pub const SENTINEL_PORT: u16 = 1;

/// A network-style (host, port) address supplied by a caller.
///
/// Never used to route traffic. Captured at bind/connect time and held so
/// the adapter can echo a plausible address back to callers that query one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressHint {
    host: String,
    port: u16,
}

impl AddressHint {
    /// Create a hint from a host (name or numeric address) and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The host portion, exactly as supplied.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port portion, exactly as supplied.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl From<SocketAddr> for AddressHint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

impl From<(&str, u16)> for AddressHint {
    fn from((host, port): (&str, u16)) -> Self {
        Self::new(host, port)
    }
}

impl fmt::Display for AddressHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolve the transport endpoint for a configuration.
///
/// Always derived from the factory configuration, never from any address a
/// caller supplies.
#[cfg(unix)]
#[must_use]
pub fn transport_path(config: &SocketConfig) -> PathBuf {
    config.socket_path()
}

/// Synthesize the address a connection reports for its peer.
///
/// Currently the identity function: the hint captured at bind/connect time
/// is echoed unchanged. This exists as a named seam so a smarter peer
/// identity source (e.g. an `SO_PEERCRED` lookup, see
/// [`UdsConnection::peer_creds`]) can be plugged in without touching the
/// rest of the adapter.
///
/// [`UdsConnection::peer_creds`]: crate::conn::UdsConnection::peer_creds
#[must_use]
pub fn fake_address(hint: &AddressHint) -> AddressHint {
    hint.clone()
}
