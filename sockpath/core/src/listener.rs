//! Listening Endpoint
//!
//! Server-side wrapper: owns a bound, listening Unix domain socket at a
//! configured path and produces [`UdsConnection`]s via blocking accept,
//! while answering address queries with the host:port hint captured at bind
//! time instead of anything derived from the transport.
//!
//! Lifecycle: `unbound → bound-listening → closed`. There is no unbind;
//! `closed` is terminal. Closing does **not** unlink the socket file: the
//! path artifact belongs to the caller, and a stale file left in place makes
//! the next bind fail exactly like a live one would.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use socket2::{Domain, SockAddr, Socket, Type};

use crate::addr::{fake_address, AddressHint, SENTINEL_PORT};
use crate::config::DEFAULT_BACKLOG;
use crate::conn::UdsConnection;
use crate::error::{AcceptError, BindError};
use crate::traits::{Channel, Listener};

/// Listener lifecycle state plus the resources owned in each state.
enum Inner {
    /// Constructed, not yet bound.
    Unbound,
    /// Bound and listening.
    Listening {
        /// The native listening socket. Shared with in-flight accept calls
        /// only; close shuts it down rather than racing their fd away.
        listener: Arc<UnixListener>,
        /// Hint captured at bind time, echoed on every accepted connection.
        hint: AddressHint,
    },
    /// Terminal. Keeps the bind-time hint (if any) for address queries.
    Closed { hint: Option<AddressHint> },
}

/// Server-side listening endpoint for a Unix domain socket path.
///
/// Produced unbound by [`ListenerFactory`](crate::factory::ListenerFactory);
/// callers drive it through the classic bind/accept/close sequence.
pub struct UdsListener {
    path: PathBuf,
    restrict_permissions: bool,
    default_backlog: u32,
    inner: Mutex<Inner>,
}

impl UdsListener {
    /// Create an unbound listener for a socket path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            restrict_permissions: true,
            default_backlog: DEFAULT_BACKLOG,
            inner: Mutex::new(Inner::Unbound),
        }
    }

    /// Choose whether bind tightens the socket file to 0600.
    #[must_use]
    pub fn with_restricted_permissions(mut self, restrict: bool) -> Self {
        self.restrict_permissions = restrict;
        self
    }

    /// Set the backlog used by [`bind_default`](Self::bind_default).
    #[must_use]
    pub fn with_default_backlog(mut self, backlog: u32) -> Self {
        self.default_backlog = backlog;
        self
    }

    /// The backlog [`bind_default`](Self::bind_default) binds with.
    #[must_use]
    pub fn default_backlog(&self) -> u32 {
        self.default_backlog
    }

    /// The socket path this listener binds to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    /// Bind the socket path and start listening.
    ///
    /// May be called at most once per instance. `hint` is stored verbatim
    /// for address queries and accepted connections; it plays no part in
    /// selecting the real endpoint, which is always the configured path.
    ///
    /// # Errors
    ///
    /// [`BindError::AddressInUse`] when the path exists (bound by another
    /// listener, or a stale socket file that was never removed),
    /// [`BindError::PermissionDenied`] when the file cannot be created,
    /// [`BindError::AlreadyBound`] / [`BindError::Closed`] on lifecycle
    /// misuse.
    pub fn bind(&self, hint: AddressHint, backlog: u32) -> Result<(), BindError> {
        let mut inner = self.inner.lock();
        match *inner {
            Inner::Listening { .. } => return Err(BindError::AlreadyBound),
            Inner::Closed { .. } => return Err(BindError::Closed),
            Inner::Unbound => {}
        }

        let socket = Socket::new(Domain::UNIX, Type::STREAM, None).map_err(BindError::Io)?;
        let addr = SockAddr::unix(&self.path).map_err(BindError::Io)?;
        socket.bind(&addr).map_err(|e| match e.kind() {
            io::ErrorKind::AddrInUse => BindError::AddressInUse(self.path.clone()),
            io::ErrorKind::PermissionDenied => BindError::PermissionDenied {
                path: self.path.clone(),
                source: e,
            },
            _ => BindError::Io(e),
        })?;
        // The bind above created the socket file; a failure past this
        // point must not leave it behind to wedge a retry as AddressInUse.
        if let Err(e) = Self::finish_bind(&socket, backlog, self.restrict_permissions, &self.path) {
            self.remove_bind_artifact();
            return Err(e);
        }

        let listener: UnixListener = socket.into();
        tracing::info!(path = ?self.path, hint = %hint, backlog, "listener bound");
        *inner = Inner::Listening {
            listener: Arc::new(listener),
            hint,
        };
        Ok(())
    }

    /// Bind using the backlog carried from factory configuration.
    ///
    /// Thin shape over [`bind`](Self::bind), for call sites that do not
    /// choose a backlog themselves.
    pub fn bind_default(&self, hint: AddressHint) -> Result<(), BindError> {
        self.bind(hint, self.default_backlog)
    }

    /// Listen and tighten permissions on a freshly bound socket.
    fn finish_bind(
        socket: &Socket,
        backlog: u32,
        restrict_permissions: bool,
        path: &Path,
    ) -> Result<(), BindError> {
        socket.listen(backlog.min(i32::MAX as u32) as i32)?;
        if restrict_permissions {
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }
        Ok(())
    }

    /// Unlink the socket file created by a bind attempt that failed
    /// partway. Only ever called for this instance's own failed bind; a
    /// successfully bound socket file is never removed (that step belongs
    /// to the caller).
    fn remove_bind_artifact(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = ?self.path, error = %e, "failed to remove socket file after bind failure");
        }
    }

    /// Block until an incoming connection arrives.
    ///
    /// The returned connection reports the bind-time hint from its
    /// remote-address query. Connections are handed out in the order the OS
    /// queues them; each is independently owned thereafter, and closing
    /// this listener does not touch them.
    ///
    /// # Errors
    ///
    /// [`AcceptError::NotBound`] before bind, [`AcceptError::Closed`] once
    /// the listener is closed, including a close that lands while this
    /// call is parked, which unblocks it promptly.
    pub fn accept(&self) -> Result<UdsConnection, AcceptError> {
        let (listener, hint) = {
            let inner = self.inner.lock();
            match &*inner {
                Inner::Unbound => return Err(AcceptError::NotBound),
                Inner::Closed { .. } => return Err(AcceptError::Closed),
                Inner::Listening { listener, hint } => (Arc::clone(listener), hint.clone()),
            }
        };
        // The lock is released while parked; close() can land meanwhile.

        match listener.accept() {
            Ok((stream, _peer)) => {
                tracing::debug!(path = ?self.path, remote = %hint, "accepted connection");
                Ok(UdsConnection::new(stream, fake_address(&hint)))
            }
            Err(e) => {
                // A concurrent close shuts the socket down, failing the
                // parked accept; report that as Closed, not a raw IO fault.
                if self.is_closed() {
                    Err(AcceptError::Closed)
                } else {
                    Err(AcceptError::Io(e))
                }
            }
        }
    }

    /// The fixed sentinel port reported where no real port exists.
    ///
    /// Always [`SENTINEL_PORT`], regardless of the port in the bind-time
    /// hint. Callers must not treat it as meaningful.
    #[must_use]
    pub fn local_port(&self) -> u16 {
        SENTINEL_PORT
    }

    /// The hint captured at bind time, not a real bound address.
    ///
    /// `None` before bind. Survives close for late queries.
    #[must_use]
    pub fn local_addr(&self) -> Option<AddressHint> {
        match &*self.inner.lock() {
            Inner::Unbound => None,
            Inner::Listening { hint, .. } => Some(hint.clone()),
            Inner::Closed { hint } => hint.clone(),
        }
    }

    /// Whether this listener is bound and accepting.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        matches!(*self.inner.lock(), Inner::Listening { .. })
    }

    /// Whether this listener has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.inner.lock(), Inner::Closed { .. })
    }

    /// Stop listening and release the native socket. Idempotent.
    ///
    /// Any thread parked in [`accept`](Self::accept) fails promptly with
    /// [`AcceptError::Closed`]. Already-accepted connections are unaffected.
    /// The socket file is left on disk; removing it is the caller's step
    /// before the path can be bound again.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        let hint = match std::mem::replace(&mut *inner, Inner::Closed { hint: None }) {
            Inner::Closed { hint } => hint,
            Inner::Unbound => None,
            Inner::Listening { listener, hint } => {
                // Shut the listening socket down so a parked accept returns
                // instead of blocking until the fd is gone.
                unsafe {
                    libc::shutdown(listener.as_raw_fd(), libc::SHUT_RDWR);
                }
                tracing::info!(path = ?self.path, "listener closed");
                Some(hint)
            }
        };
        *inner = Inner::Closed { hint };
    }
}

impl Listener for UdsListener {
    fn bind(&self, hint: AddressHint, backlog: u32) -> Result<(), BindError> {
        UdsListener::bind(self, hint, backlog)
    }

    fn accept(&self) -> Result<Box<dyn Channel>, AcceptError> {
        UdsListener::accept(self).map(|conn| Box::new(conn) as Box<dyn Channel>)
    }

    fn local_port(&self) -> u16 {
        UdsListener::local_port(self)
    }

    fn local_addr(&self) -> Option<AddressHint> {
        UdsListener::local_addr(self)
    }

    fn close(&self) {
        UdsListener::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::config::DEFAULT_BACKLOG;

    fn hint() -> AddressHint {
        AddressHint::new("127.0.0.1", 8080)
    }

    #[test]
    fn test_bind_creates_socket_file_with_permissions() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();
        assert!(listener.is_listening());
        assert!(socket_path.exists());

        let metadata = std::fs::metadata(&socket_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_double_bind_fails() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();

        let result = listener.bind(hint(), DEFAULT_BACKLOG);
        assert!(matches!(result, Err(BindError::AlreadyBound)));
    }

    #[test]
    fn test_bind_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.close();

        let result = listener.bind(hint(), DEFAULT_BACKLOG);
        assert!(matches!(result, Err(BindError::Closed)));
    }

    #[test]
    fn test_second_listener_on_bound_path_fails_then_rebind_after_removal() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let first = UdsListener::new(&socket_path);
        first.bind(hint(), DEFAULT_BACKLOG).unwrap();

        // Second bind on the same unremoved path fails
        let second = UdsListener::new(&socket_path);
        let result = second.bind(hint(), DEFAULT_BACKLOG);
        assert!(matches!(result, Err(BindError::AddressInUse(_))));

        // Close alone is not enough; the stale file still blocks the path
        first.close();
        let third = UdsListener::new(&socket_path);
        let result = third.bind(hint(), DEFAULT_BACKLOG);
        assert!(matches!(result, Err(BindError::AddressInUse(_))));

        // After removing the path artifact, a fresh bind succeeds
        std::fs::remove_file(&socket_path).unwrap();
        let fourth = UdsListener::new(&socket_path);
        fourth.bind(hint(), DEFAULT_BACKLOG).unwrap();
    }

    #[test]
    fn test_bind_default_uses_carried_backlog() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path).with_default_backlog(8);
        assert_eq!(listener.default_backlog(), 8);

        listener.bind_default(hint()).unwrap();
        assert!(listener.is_listening());
    }

    #[test]
    fn test_failed_bind_attempt_does_not_wedge_retry() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);

        // Recreate the aftermath of a bind that failed after creating the
        // socket file: the file exists but the listener never reached
        // Listening.
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None).unwrap();
        let addr = SockAddr::unix(&socket_path).unwrap();
        socket.bind(&addr).unwrap();
        drop(socket);
        assert!(socket_path.exists());

        // The bind error branch unlinks its own artifact, so a retry on
        // the same instance binds cleanly instead of hitting AddressInUse
        listener.remove_bind_artifact();
        assert!(!socket_path.exists());
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();
        assert!(listener.is_listening());
    }

    #[test]
    fn test_accept_before_bind_fails() {
        let temp_dir = TempDir::new().unwrap();
        let listener = UdsListener::new(temp_dir.path().join("test.sock"));

        let result = listener.accept();
        assert!(matches!(result, Err(AcceptError::NotBound)));
    }

    #[test]
    fn test_accept_reports_bind_time_hint() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener
            .bind(AddressHint::new("127.0.0.1", 8080), DEFAULT_BACKLOG)
            .unwrap();

        let client_path = socket_path.clone();
        let client = std::thread::spawn(move || {
            let mut stream = UnixStream::connect(&client_path).unwrap();
            stream.write_all(b"ping").unwrap();
        });

        let mut conn = listener.accept().unwrap();
        // Server-side faking rule: the server's own hint, not the client's
        assert_eq!(*conn.remote_addr(), AddressHint::new("127.0.0.1", 8080));

        let mut buf = [0u8; 4];
        conn.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        client.join().unwrap();
    }

    #[test]
    fn test_local_port_is_sentinel_regardless_of_hint() {
        let temp_dir = TempDir::new().unwrap();
        let listener = UdsListener::new(temp_dir.path().join("test.sock"));
        assert_eq!(listener.local_port(), SENTINEL_PORT);

        listener
            .bind(AddressHint::new("127.0.0.1", 8080), DEFAULT_BACKLOG)
            .unwrap();
        assert_eq!(listener.local_port(), SENTINEL_PORT);
        assert_ne!(listener.local_port(), 8080);
    }

    #[test]
    fn test_local_addr_is_bind_time_hint() {
        let temp_dir = TempDir::new().unwrap();
        let listener = UdsListener::new(temp_dir.path().join("test.sock"));
        assert_eq!(listener.local_addr(), None);

        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();
        assert_eq!(listener.local_addr(), Some(hint()));

        // Survives close
        listener.close();
        assert_eq!(listener.local_addr(), Some(hint()));
    }

    #[test]
    fn test_close_unblocks_parked_accept() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = Arc::new(UdsListener::new(&socket_path));
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();

        let (tx, rx) = mpsc::channel();
        let parked = Arc::clone(&listener);
        std::thread::spawn(move || {
            tx.send(parked.accept().map(|_| ())).ok();
        });

        std::thread::sleep(Duration::from_millis(50));
        listener.close();

        let result = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("accept did not unblock after close");
        assert!(matches!(result, Err(AcceptError::Closed)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let listener = UdsListener::new(temp_dir.path().join("test.sock"));
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();

        listener.close();
        assert!(listener.is_closed());
        listener.close();
        assert!(listener.is_closed());
    }

    #[test]
    fn test_close_does_not_unlink_socket_file() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();
        listener.close();

        // Path artifact lifecycle belongs to the caller
        assert!(socket_path.exists());
    }

    #[test]
    fn test_accepted_connections_survive_listener_close() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();

        let client_path = socket_path.clone();
        let client = std::thread::spawn(move || {
            let mut stream = UnixStream::connect(&client_path).unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            buf
        });

        let mut conn = listener.accept().unwrap();
        listener.close();

        // The accepted connection is independently owned and still usable
        conn.write_all(b"still").unwrap();
        assert_eq!(&client.join().unwrap(), b"still");
    }

    #[test]
    fn test_sequential_accepts_yield_independent_connections() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("test.sock");

        let listener = UdsListener::new(&socket_path);
        listener.bind(hint(), DEFAULT_BACKLOG).unwrap();

        let client_path = socket_path.clone();
        let clients = std::thread::spawn(move || {
            let mut first = UnixStream::connect(&client_path).unwrap();
            let mut second = UnixStream::connect(&client_path).unwrap();

            let mut buf = [0u8; 1];
            // Second connection keeps working after the first is closed
            assert_eq!(first.read(&mut buf).unwrap(), 0);
            second.write_all(b"2").unwrap();
            second.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"2");
        });

        let first = listener.accept().unwrap();
        let mut second = listener.accept().unwrap();

        first.close().unwrap();

        let mut buf = [0u8; 1];
        second.read_exact(&mut buf).unwrap();
        second.write_all(&buf).unwrap();

        clients.join().unwrap();
    }
}
