//! Connection Wrapper
//!
//! Wraps one live Unix domain stream so that its reported peer identity is
//! the caller-supplied [`AddressHint`] while read/write/close pass straight
//! through to the transport. The wrapper exclusively owns its stream; no
//! other component may read or write it.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::addr::AddressHint;
use crate::traits::Channel;

/// Credentials of the process on the far end of a connection.
///
/// The genuine peer identity a Unix domain socket can offer, exposed
/// separately from the impersonated [`AddressHint`] so callers that want
/// truth instead of compatibility have somewhere to get it.
#[cfg(target_os = "linux")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerCredentials {
    /// Peer process user id.
    pub uid: u32,
    /// Peer process group id.
    pub gid: u32,
    /// Peer process id.
    pub pid: i32,
}

/// One accepted or connected Unix domain channel with a faked identity.
///
/// Standard blocking byte-stream semantics: `read` blocks until data,
/// end-of-stream, or error; `write` blocks until the transport accepts the
/// bytes or errors. Address queries return the stored hint and never
/// inspect the transport.
#[derive(Debug)]
pub struct UdsConnection {
    stream: UnixStream,
    remote: AddressHint,
    closed: AtomicBool,
}

impl UdsConnection {
    /// Wrap a live stream with the hint it should report as its peer.
    pub(crate) fn new(stream: UnixStream, remote: AddressHint) -> Self {
        Self {
            stream,
            remote,
            closed: AtomicBool::new(false),
        }
    }

    /// The address hint this connection reports as its peer.
    ///
    /// Server-side connections echo the hint captured at bind time; client
    /// side connections echo the hint supplied to connect. This is a
    /// deliberate approximation: a Unix domain peer has no host:port
    /// identity, so a plausible one is substituted rather than left absent.
    #[must_use]
    pub fn remote_addr(&self) -> &AddressHint {
        &self.remote
    }

    /// Whether close has been called on this connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Release the underlying channel.
    ///
    /// The first close shuts the stream down in both directions, which
    /// unblocks any thread parked in a read or write on this connection.
    /// Later calls are no-ops. The native handle itself is released when
    /// the connection is dropped.
    pub fn close(&self) -> io::Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!(remote = %self.remote, "connection closed");
        match self.stream.shutdown(Shutdown::Both) {
            // Peer already tore the stream down; nothing left to release.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    /// Set a read timeout on the underlying stream (None = block forever).
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Set a write timeout on the underlying stream (None = block forever).
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_write_timeout(timeout)
    }

    /// Look up the genuine peer credentials via `SO_PEERCRED`.
    ///
    /// This is the real identity the faked [`remote_addr`] deliberately
    /// does not report.
    ///
    /// [`remote_addr`]: Self::remote_addr
    #[cfg(target_os = "linux")]
    pub fn peer_creds(&self) -> io::Result<PeerCredentials> {
        use std::os::unix::io::AsRawFd;

        let fd = self.stream.as_raw_fd();
        let mut cred: libc::ucred = unsafe { std::mem::zeroed() };
        let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

        let result = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                std::ptr::addr_of_mut!(cred).cast::<libc::c_void>(),
                &mut len,
            )
        };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(PeerCredentials {
            uid: cred.uid,
            gid: cred.gid,
            pid: cred.pid,
        })
    }
}

impl Read for UdsConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.stream).read(buf)
    }
}

impl Write for UdsConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&self.stream).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&self.stream).flush()
    }
}

// Shared-reference impls, matching std's UnixStream, so one thread can sit
// in a blocking read while another closes the connection.
impl Read for &UdsConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.stream).read(buf)
    }
}

impl Write for &UdsConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&self.stream).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&self.stream).flush()
    }
}

impl Channel for UdsConnection {
    fn remote_addr(&self) -> AddressHint {
        self.remote.clone()
    }

    fn close(&self) -> io::Result<()> {
        UdsConnection::close(self)
    }
}
