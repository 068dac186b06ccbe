//! sockpath Core - Host:Port Socket Impersonation over Unix Domain Sockets
//!
//! This crate lets code written against a conventional host:port socket
//! abstraction (bind, listen, accept, connect, read/write, close, address
//! queries) run unmodified over a filesystem-path-addressed Unix domain
//! socket. HTTP servers, clients, and anything else that assumes "socket
//! with an IP address and a port" can be redirected to low-latency local
//! IPC without their call sites changing.
//!
//! # Architecture
//!
//! ```text
//!  caller supplies (host, port)          configured filesystem path
//!        │   captured, never routed            │   always routed
//!        ▼                                     ▼
//!  ┌──────────────┐  bind/accept   ┌────────────────────────┐
//!  │ ListenerFactory ─────────────▶│ UdsListener            │
//!  └──────────────┘                │  /run/…/bridge.sock    │
//!  ┌──────────────┐  connect       └───────────┬────────────┘
//!  │ ConnectorFactory ────────────▶ UdsConnector│
//!  └──────────────┘                            ▼
//!                                   UdsConnection (byte stream,
//!                                   remote_addr() echoes the hint)
//! ```
//!
//! All translation work happens around bind/accept/connect and the address
//! queries; reads and writes are blocking pass-throughs to the transport.
//!
//! # Key Types
//!
//! - [`ListenerFactory`] / [`ConnectorFactory`]: bind a configured socket
//!   path to fresh endpoints
//! - [`UdsListener`]: server side; blocking accept, close unblocks it
//! - [`UdsConnector`]: client side; every connect shape funnels into one
//!   real behavior
//! - [`UdsConnection`]: one live channel with an impersonated identity
//! - [`AddressHint`]: the captured host:port, echoed byte-for-byte
//!
//! # Known, Deliberate Inaccuracies
//!
//! A Unix domain peer has no host:port identity, so the adapter substitutes
//! plausible placeholders rather than leaving them absent: accepted
//! connections report the server's own bind-time hint as their remote
//! address, connected ones report the hint the caller supplied, and
//! [`local_port`](listener::UdsListener::local_port) always answers the
//! [`SENTINEL_PORT`]. Callers that need truth use
//! [`peer_creds`](conn::UdsConnection::peer_creds).
//!
//! # Quick Start
//!
//! ```ignore
//! use sockpath_core::{AddressHint, ConnectorFactory, ListenerFactory};
//! use std::io::{Read, Write};
//!
//! let listener = ListenerFactory::new("/tmp/app.sock").create();
//! listener.bind(AddressHint::new("127.0.0.1", 8080), 50)?;
//!
//! std::thread::spawn(move || {
//!     while let Ok(mut conn) = listener.accept() {
//!         let mut buf = [0u8; 4096];
//!         if let Ok(n) = conn.read(&mut buf) {
//!             let _ = conn.write_all(&buf[..n]);
//!         }
//!     }
//! });
//!
//! let connector = ConnectorFactory::new("/tmp/app.sock").create();
//! let mut conn = connector.connect(AddressHint::new("127.0.0.1", 9090))?;
//! conn.write_all(b"ping")?;
//! ```
//!
//! # Module Overview
//!
//! - [`addr`]: address translation, the hint type, the sentinel port
//! - [`config`]: factory configuration (defaults, env, TOML)
//! - [`error`]: bind/accept/connect/config error taxonomy
//! - [`traits`]: object-safe seam traits for trait-object call sites
//! - [`listener`] / [`connector`] / [`conn`]: the endpoints themselves
//! - [`factory`]: listener and connector factories
//!
//! # Concurrency Contract
//!
//! Purely blocking, the same threading contract as the socket API being
//! impersonated: callers achieve concurrency with threads (one accept loop,
//! one worker per connection). The only cancellation primitive is `close`,
//! which promptly unblocks a parked accept/read/write on the same object.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod addr;
pub mod config;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod conn;
#[cfg(unix)]
pub mod connector;
#[cfg(unix)]
pub mod factory;
#[cfg(unix)]
pub mod listener;

// Re-exports for convenience
pub use addr::{fake_address, AddressHint, SENTINEL_PORT};
pub use config::{SocketConfig, DEFAULT_BACKLOG};
pub use error::{AcceptError, BindError, ConfigError, ConnectError};
pub use traits::{Channel, Connector, Listener};

#[cfg(unix)]
pub use addr::transport_path;
#[cfg(unix)]
pub use config::default_socket_path;
#[cfg(unix)]
pub use conn::UdsConnection;
#[cfg(all(unix, target_os = "linux"))]
pub use conn::PeerCredentials;
#[cfg(unix)]
pub use connector::UdsConnector;
#[cfg(unix)]
pub use factory::{create_connector, create_listener, ConnectorFactory, ListenerFactory};
#[cfg(unix)]
pub use listener::UdsListener;
