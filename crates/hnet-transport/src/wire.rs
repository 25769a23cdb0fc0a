use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// Write every byte of `bytes`, blocking as needed.
///
/// Interrupted writes are retried. A write that accepts zero bytes means the
/// peer is gone and is reported as [`TransportError::Closed`].
pub fn send_exact<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match w.write(&bytes[offset..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

/// Fill `buf` completely, blocking as needed.
///
/// Interrupted reads are retried. End of stream before `buf` is full is
/// reported as [`TransportError::Closed`].
pub fn recv_exact<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match r.read(&mut buf[offset..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

/// A source that can be read without blocking.
///
/// `recv_partial` makes a single read attempt and returns how many bytes it
/// placed at the start of `buf`. Zero means nothing is available right now,
/// never end of stream: a closed peer is an error.
pub trait PartialRead {
    fn recv_partial(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<R: Read + ?Sized> PartialRead for R {
    fn recv_partial(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.read(buf) {
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(err)
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::Interrupted =>
            {
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Cursor;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn send_and_recv_exact_over_pipe() {
        let (mut left, mut right) = UnixStream::pair().unwrap();

        send_exact(&mut left, b"hello, hnet").unwrap();
        let mut buf = [0u8; 11];
        recv_exact(&mut right, &mut buf).unwrap();

        assert_eq!(&buf, b"hello, hnet");
    }

    #[test]
    fn recv_exact_reports_early_close() {
        let mut reader = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 8];
        let err = recv_exact(&mut reader, &mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn recv_exact_handles_byte_by_byte_reader() {
        let mut reader = ByteByByteReader {
            bytes: b"slow".to_vec(),
            pos: 0,
        };
        let mut buf = [0u8; 4];
        recv_exact(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf, b"slow");
    }

    #[test]
    fn recv_exact_retries_interrupted() {
        let mut reader = ScriptedReader::new(vec![
            Step::Fail(ErrorKind::Interrupted),
            Step::Data(b"ok".to_vec()),
        ]);
        let mut buf = [0u8; 2];
        recv_exact(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf, b"ok");
    }

    #[test]
    fn send_exact_reports_zero_length_write() {
        let mut full = [0u8; 2];
        let mut writer: &mut [u8] = &mut full;
        let err = send_exact(&mut writer, b"too long").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn recv_partial_returns_zero_when_nothing_available() {
        let mut reader = ScriptedReader::new(vec![
            Step::Fail(ErrorKind::WouldBlock),
            Step::Fail(ErrorKind::Interrupted),
            Step::Data(b"abc".to_vec()),
        ]);
        let mut buf = [0u8; 8];

        assert_eq!(reader.recv_partial(&mut buf).unwrap(), 0);
        assert_eq!(reader.recv_partial(&mut buf).unwrap(), 0);
        assert_eq!(reader.recv_partial(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn recv_partial_reports_peer_close() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        let mut buf = [0u8; 4];
        let err = reader.recv_partial(&mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn recv_partial_with_empty_buffer_is_noop() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert_eq!(reader.recv_partial(&mut []).unwrap(), 0);
    }

    #[test]
    fn recv_partial_on_nonblocking_socket() {
        let (mut left, mut right) = UnixStream::pair().unwrap();
        right.set_nonblocking(true).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(right.recv_partial(&mut buf).unwrap(), 0);

        send_exact(&mut left, b"hi").unwrap();
        let mut got = 0;
        while got == 0 {
            got = right.recv_partial(&mut buf).unwrap();
        }
        assert_eq!(&buf[..got], b"hi");
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    enum Step {
        Fail(ErrorKind),
        Data(Vec<u8>),
    }

    struct ScriptedReader {
        steps: std::collections::VecDeque<Step>,
    }

    impl ScriptedReader {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.steps.pop_front() {
                None => Ok(0),
                Some(Step::Fail(kind)) => Err(std::io::Error::from(kind)),
                Some(Step::Data(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
            }
        }
    }
}
