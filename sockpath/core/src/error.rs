//! Error Taxonomy
//!
//! One error enum per failing operation: [`BindError`], [`AcceptError`],
//! [`ConnectError`], plus [`ConfigError`] for configuration loading. All
//! errors propagate directly to the caller of the failing operation; the
//! adapter performs no retries and suppresses nothing. Read/write failures
//! surface as plain [`std::io::Error`], exactly as the socket API being
//! impersonated does.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from binding a listening endpoint.
#[derive(Debug, Error)]
pub enum BindError {
    /// The socket path is already in use: another listener is bound to it,
    /// or a previous listener's socket file was left behind and not removed.
    #[error("socket path {0:?} is already in use")]
    AddressInUse(PathBuf),

    /// The process may not create the socket file at this path.
    #[error("permission denied binding socket at {path:?}")]
    PermissionDenied {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// `bind` was called a second time on an already-bound listener.
    #[error("listener is already bound")]
    AlreadyBound,

    /// `bind` was called on a listener that has been closed.
    #[error("listener is closed")]
    Closed,

    /// Any other transport-level bind failure.
    #[error("bind failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from accepting a connection.
#[derive(Debug, Error)]
pub enum AcceptError {
    /// `accept` was called before `bind`.
    #[error("listener is not bound")]
    NotBound,

    /// The listener was closed, either before the call or concurrently
    /// while the call was blocked.
    #[error("listener is closed")]
    Closed,

    /// Any other transport-level accept failure.
    #[error("accept failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from connecting to a listening endpoint.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No listener is currently bound at the socket path
    /// (connection-refused semantics; also raised when the socket file does
    /// not exist at all).
    #[error("connection refused at {0:?}: no listener bound")]
    Refused(PathBuf),

    /// The connect timeout elapsed before the connection was established.
    #[error("connect to {path:?} timed out after {timeout:?}")]
    TimedOut {
        /// The path being connected to.
        path: PathBuf,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The process may not connect to the socket at this path.
    #[error("permission denied connecting to {path:?}")]
    PermissionDenied {
        /// The path that could not be connected to.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Any other transport-level connect failure.
    #[error("connect failed: {0}")]
    Io(#[from] io::Error),
}

/// Errors from loading a [`SocketConfig`](crate::config::SocketConfig) file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path:?}")]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The config file could not be parsed as TOML.
    #[error("failed to parse config file {path:?}")]
    Parse {
        /// The file that could not be parsed.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = BindError::AddressInUse(PathBuf::from("/tmp/x.sock"));
        assert!(err.to_string().contains("already in use"));

        let err = BindError::AlreadyBound;
        assert!(err.to_string().contains("already bound"));
    }

    #[test]
    fn test_connect_error_display() {
        let err = ConnectError::Refused(PathBuf::from("/tmp/x.sock"));
        assert!(err.to_string().contains("refused"));

        let err = ConnectError::TimedOut {
            path: PathBuf::from("/tmp/x.sock"),
            timeout: Duration::from_millis(250),
        };
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_io_error_source_preserved() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err = AcceptError::from(io_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
