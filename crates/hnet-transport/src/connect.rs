use std::net::{TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::connection::Connection;
use crate::error::{Result, TransportError};

/// Connect to `host:port` over TCP (blocking).
///
/// Every resolved address is tried in order; the last failure is reported
/// when none accepts the connection.
pub fn connect_tcp(host: &str, port: u16) -> Result<Connection> {
    let target = format!("{host}:{port}");
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            target: target.clone(),
            source,
        })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                debug!(%addr, "connected over tcp");
                return Ok(Connection::from(stream));
            }
            Err(err) => {
                debug!(%addr, error = %err, "tcp connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        target,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        }),
    })
}

/// Connect to a `host:port` string over TCP (blocking).
pub fn connect_hostport(hostport: &str) -> Result<Connection> {
    let (host, port) = hostport.rsplit_once(':').ok_or_else(|| {
        TransportError::InvalidAddress(format!("failed to determine port: {hostport}"))
    })?;
    let port = port.parse::<u16>().map_err(|_| {
        TransportError::InvalidAddress(format!("invalid port '{port}' in {hostport}"))
    })?;
    connect_tcp(host, port)
}

/// Connect to a listening Unix domain socket (blocking).
#[cfg(unix)]
pub fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Connection> {
    let path = path.as_ref();
    let stream =
        std::os::unix::net::UnixStream::connect(path).map_err(|source| TransportError::Connect {
            target: path.display().to_string(),
            source,
        })?;
    debug!(?path, "connected to unix domain socket");
    Ok(Connection::from(stream))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn hostport_without_port_is_rejected() {
        let err = connect_hostport("localhost").unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(ref m) if m.contains("failed to determine port")));
    }

    #[test]
    fn hostport_with_bad_port_is_rejected() {
        let err = connect_hostport("localhost:http").unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(_)));
    }

    #[test]
    fn connect_tcp_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut conn = connect_hostport(&format!("127.0.0.1:{port}")).unwrap();
        conn.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        conn.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        assert_eq!(conn.transport_name(), "tcp");

        server.join().unwrap();
    }

    #[test]
    fn connect_tcp_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect_tcp("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }

    #[test]
    #[cfg(unix)]
    fn connect_unix_missing_path() {
        let path = std::env::temp_dir().join(format!("hnet-missing-{}.sock", std::process::id()));
        let err = connect_unix(&path).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
