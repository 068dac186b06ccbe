//! Socket Factories
//!
//! Stateless constructors binding a configured socket path to freshly
//! created listeners and connectors. They mirror the construction contract
//! of a generic socket factory, so existing call sites swap transports by
//! swapping the factory they are handed and nothing else.

use std::path::PathBuf;

use crate::config::SocketConfig;
use crate::connector::UdsConnector;
use crate::listener::UdsListener;
use crate::traits::{Connector, Listener};

/// Factory producing unbound [`UdsListener`]s for one socket path.
#[derive(Clone, Debug)]
pub struct ListenerFactory {
    config: SocketConfig,
}

impl ListenerFactory {
    /// Create a factory for a specific socket path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: SocketConfig::new(path),
        }
    }

    /// Create a factory from a full configuration.
    #[must_use]
    pub fn from_config(config: SocketConfig) -> Self {
        Self { config }
    }

    /// The socket path this factory's listeners bind to.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.config.socket_path()
    }

    /// Create a fresh, unbound listener.
    ///
    /// Each call yields an independent instance; the path invariant (one
    /// active bound listener per path) is enforced at bind time, not here.
    /// The configured backlog rides along as the listener's default for
    /// bind calls that do not supply one.
    #[must_use]
    pub fn create(&self) -> UdsListener {
        UdsListener::new(self.config.socket_path())
            .with_restricted_permissions(self.config.restrict_permissions)
            .with_default_backlog(self.config.backlog)
    }
}

/// Factory producing [`UdsConnector`]s for one socket path.
#[derive(Clone, Debug)]
pub struct ConnectorFactory {
    config: SocketConfig,
}

impl ConnectorFactory {
    /// Create a factory for a specific socket path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: SocketConfig::new(path),
        }
    }

    /// Create a factory from a full configuration.
    #[must_use]
    pub fn from_config(config: SocketConfig) -> Self {
        Self { config }
    }

    /// The socket path this factory's connectors dial.
    #[must_use]
    pub fn socket_path(&self) -> PathBuf {
        self.config.socket_path()
    }

    /// Create a connector carrying the configured default timeout.
    #[must_use]
    pub fn create(&self) -> UdsConnector {
        let connector = UdsConnector::new(self.config.socket_path());
        match self.config.connect_timeout() {
            Some(timeout) => connector.with_default_timeout(timeout),
            None => connector,
        }
    }
}

/// Create a boxed listener behind the [`Listener`] seam.
///
/// For call sites that hold transports as trait objects rather than
/// concrete types.
#[must_use]
pub fn create_listener(config: &SocketConfig) -> Box<dyn Listener> {
    Box::new(ListenerFactory::from_config(config.clone()).create())
}

/// Create a boxed connector behind the [`Connector`] seam.
#[must_use]
pub fn create_connector(config: &SocketConfig) -> Box<dyn Connector> {
    Box::new(ConnectorFactory::from_config(config.clone()).create())
}
