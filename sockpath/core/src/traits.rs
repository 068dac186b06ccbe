//! Seam Traits
//!
//! Object-safe traits reproducing the classic blocking socket API shape, so
//! call sites written against a generic "socket factory" keep working when a
//! factory hands them this adapter instead:
//! - [`Listener`]: server side (bind, accept, close, address queries)
//! - [`Connector`]: client side (connect)
//! - [`Channel`]: one live byte-stream connection
//!
//! Connections cross the seam boxed, so callers stay unaware of which
//! transport produced them.

use std::io::{self, Read, Write};
use std::time::Duration;

use crate::addr::AddressHint;
use crate::error::{AcceptError, BindError, ConnectError};

/// One live, byte-stream-capable channel with an impersonated identity.
///
/// Read and write are blocking pass-throughs to the underlying transport;
/// only the address query is synthesized.
pub trait Channel: Read + Write + Send {
    /// The address hint this channel reports as its peer.
    ///
    /// Echoes the hint captured at bind time (server side) or connect time
    /// (client side); never inspects the transport for a real peer identity.
    fn remote_addr(&self) -> AddressHint;

    /// Release the underlying transport, unblocking any blocked read or
    /// write on this channel. Safe to call more than once.
    fn close(&self) -> io::Result<()>;
}

/// Server side: a bindable endpoint producing channels via blocking accept.
pub trait Listener: Send + Sync {
    /// Bind and start listening. May be called at most once per instance;
    /// the hint is stored for echoing, never used to select the endpoint.
    fn bind(&self, hint: AddressHint, backlog: u32) -> Result<(), BindError>;

    /// Block until a connection arrives, or fail once the listener is
    /// closed (including a close that lands while this call is parked).
    fn accept(&self) -> Result<Box<dyn Channel>, AcceptError>;

    /// The fixed sentinel port. Never meaningful.
    fn local_port(&self) -> u16;

    /// The hint captured at bind time (None before bind).
    fn local_addr(&self) -> Option<AddressHint>;

    /// Stop listening. Idempotent; unblocks a parked accept.
    fn close(&self);
}

/// Client side: produces an independent channel per connect call.
pub trait Connector: Send + Sync {
    /// Connect to the configured endpoint. The hint is stored on the
    /// resulting channel for echoing; `timeout` of `None` (or zero) blocks
    /// at the platform's discretion.
    fn connect(
        &self,
        hint: AddressHint,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn Channel>, ConnectError>;
}
