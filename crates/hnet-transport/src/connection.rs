use std::io::{Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use tracing::trace;

use crate::error::Result;

/// A connected byte stream: implements Read + Write.
///
/// This is the handle every session runs over. It wraps either a TCP stream
/// or (on Unix) a Unix domain socket stream.
pub struct Connection {
    inner: ConnectionInner,
}

enum ConnectionInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ConnectionInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ConnectionInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            ConnectionInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.flush(),
        }
    }
}

impl From<TcpStream> for Connection {
    fn from(stream: TcpStream) -> Self {
        Self {
            inner: ConnectionInner::Tcp(stream),
        }
    }
}

#[cfg(unix)]
impl From<std::os::unix::net::UnixStream> for Connection {
    fn from(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: ConnectionInner::Unix(stream),
        }
    }
}

impl Connection {
    /// Switch the stream between blocking and non-blocking mode.
    ///
    /// Affects every subsequent read and write on this handle.
    pub fn set_blocking(&self, blocking: bool) -> Result<()> {
        trace!(blocking, "setting connection blocking mode");
        match &self.inner {
            ConnectionInner::Tcp(stream) => stream.set_nonblocking(!blocking)?,
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.set_nonblocking(!blocking)?,
        }
        Ok(())
    }

    /// Run `f` with the stream in blocking mode, then leave it non-blocking.
    ///
    /// Non-blocking mode is restored even when `f` fails.
    pub fn blocking_section<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<crate::TransportError>,
    {
        self.set_blocking(true)?;
        let result = f(self);
        self.set_blocking(false)?;
        result
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            ConnectionInner::Tcp(stream) => stream.set_read_timeout(timeout)?,
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.set_read_timeout(timeout)?,
        }
        Ok(())
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            ConnectionInner::Tcp(stream) => stream.set_write_timeout(timeout)?,
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => stream.set_write_timeout(timeout)?,
        }
        Ok(())
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            ConnectionInner::Tcp(stream) => Ok(Self::from(stream.try_clone()?)),
            #[cfg(unix)]
            ConnectionInner::Unix(stream) => Ok(Self::from(stream.try_clone()?)),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            ConnectionInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            ConnectionInner::Unix(_) => "unix-domain-socket",
        }
    }
}

/// Exposes the descriptor so callers can wait for readiness with their own
/// event loop before driving non-blocking reads.
#[cfg(unix)]
impl AsRawFd for Connection {
    fn as_raw_fd(&self) -> RawFd {
        match &self.inner {
            ConnectionInner::Tcp(stream) => stream.as_raw_fd(),
            ConnectionInner::Unix(stream) => stream.as_raw_fd(),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            ConnectionInner::Tcp(stream) => f
                .debug_struct("Connection")
                .field("type", &"tcp")
                .field("peer", &stream.peer_addr().ok())
                .finish(),
            #[cfg(unix)]
            ConnectionInner::Unix(_) => f
                .debug_struct("Connection")
                .field("type", &"unix")
                .finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::ErrorKind;
    use std::os::unix::net::UnixStream;

    use super::*;
    use crate::error::TransportError;
    use crate::wire::{recv_exact, send_exact, PartialRead};

    #[test]
    fn nonblocking_read_returns_zero_then_data() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut client = Connection::from(left);
        let mut server = Connection::from(right);

        client.set_blocking(false).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(client.recv_partial(&mut buf).unwrap(), 0);

        send_exact(&mut server, b"pong").unwrap();
        let mut got = 0;
        while got < 4 {
            got += client.recv_partial(&mut buf[got..]).unwrap();
        }
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn blocking_section_restores_nonblocking_mode() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut client = Connection::from(left);
        let mut server = Connection::from(right);

        client
            .blocking_section(|conn| send_exact(conn, b"req"))
            .unwrap();

        let mut buf = [0u8; 3];
        recv_exact(&mut server, &mut buf).unwrap();
        assert_eq!(&buf, b"req");

        // The stream must now be non-blocking: a raw read with nothing queued
        // reports WouldBlock instead of hanging.
        let mut byte = [0u8; 1];
        let err = client.read(&mut byte).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn raw_fd_is_the_wrapped_socket() {
        let (left, _right) = UnixStream::pair().unwrap();
        let fd = left.as_raw_fd();
        assert_eq!(Connection::from(left).as_raw_fd(), fd);
    }

    #[test]
    fn blocking_section_restores_mode_on_error() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut client = Connection::from(left);

        let result: std::result::Result<(), TransportError> =
            client.blocking_section(|_| Err(TransportError::Closed));
        assert!(matches!(result, Err(TransportError::Closed)));

        let mut byte = [0u8; 1];
        let err = client.read(&mut byte).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn try_clone_shares_the_stream() {
        let (left, right) = UnixStream::pair().unwrap();
        let client = Connection::from(left);
        let mut writer = client.try_clone().unwrap();
        let mut server = Connection::from(right);

        send_exact(&mut writer, b"dup").unwrap();
        let mut buf = [0u8; 3];
        recv_exact(&mut server, &mut buf).unwrap();
        assert_eq!(&buf, b"dup");
        assert_eq!(client.transport_name(), "unix-domain-socket");
    }
}
