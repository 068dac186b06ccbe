//! Adapter Configuration
//!
//! Configuration for the socket factories: where the Unix domain socket
//! lives and how the endpoints built from it behave. Loadable from
//! defaults, environment variables, or a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default listen backlog when the caller does not choose one.
///
/// 50 is the default the impersonated server-socket API has always shipped
/// with, so drop-in callers see familiar queueing behavior.
pub const DEFAULT_BACKLOG: u32 = 50;

/// Configuration shared by the listener and connector factories.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Socket path (None = use [`default_socket_path`])
    pub path: Option<PathBuf>,

    /// Listen backlog used when a bind call does not supply one
    pub backlog: u32,

    /// Connect timeout in milliseconds (0 = no explicit timeout; connect
    /// blocks at the platform's discretion)
    pub connect_timeout_ms: u64,

    /// Whether to tighten socket file permissions to 0600 after bind
    ///
    /// Leaves connection access to the owning user only. Disable when a
    /// different filesystem-level access policy is wanted.
    pub restrict_permissions: bool,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            path: None,
            backlog: DEFAULT_BACKLOG,
            connect_timeout_ms: 0,
            restrict_permissions: true,
        }
    }
}

impl SocketConfig {
    /// Create a configuration for a specific socket path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SOCKPATH_SOCKET`: Path to the Unix socket
    /// - `SOCKPATH_BACKLOG`: Listen backlog
    /// - `SOCKPATH_CONNECT_TIMEOUT`: Connect timeout in ms (0 = none)
    /// - `SOCKPATH_RESTRICT_PERMS`: "0" or "false" to skip the 0600 chmod
    #[must_use]
    pub fn from_env() -> Self {
        let restrict_permissions = std::env::var("SOCKPATH_RESTRICT_PERMS")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            path: std::env::var("SOCKPATH_SOCKET").ok().map(PathBuf::from),
            backlog: std::env::var("SOCKPATH_BACKLOG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BACKLOG),
            connect_timeout_ms: std::env::var("SOCKPATH_CONNECT_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            restrict_permissions,
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults, so a file may configure
    /// only the socket path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The socket path this configuration resolves to.
    #[cfg(unix)]
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_socket_path)
    }

    /// The connect timeout, if one is configured (0 means none).
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connect_timeout_ms))
        }
    }
}

/// Get the default Unix socket path
///
/// Uses `XDG_RUNTIME_DIR` if available, otherwise /tmp/sockpath-$UID/
#[cfg(unix)]
#[must_use]
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir)
            .join("sockpath")
            .join("bridge.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/sockpath-{uid}/bridge.sock"))
    }
}
