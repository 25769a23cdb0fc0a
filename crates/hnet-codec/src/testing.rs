//! Helpers shared by the codec unit tests.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::io::{ErrorKind, Read};
use std::task::Poll;

use crate::codec::{from_bytes, to_bytes, Codec};

/// Hands out pre-split chunks, reporting "nothing available" after each one.
pub(crate) struct Chunked {
    chunks: VecDeque<Vec<u8>>,
    dry: bool,
}

impl Chunked {
    pub(crate) fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().filter(|c| !c.is_empty()).collect(),
            dry: false,
        }
    }

    pub(crate) fn bytes_left(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.dry {
            self.dry = false;
            return Err(std::io::Error::from(ErrorKind::WouldBlock));
        }
        match self.chunks.front_mut() {
            None => Err(std::io::Error::from(ErrorKind::WouldBlock)),
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                chunk.drain(..n);
                if chunk.is_empty() {
                    self.chunks.pop_front();
                    self.dry = true;
                }
                Ok(n)
            }
        }
    }
}

/// Split `bytes` into pieces of at most `size` bytes.
pub(crate) fn split(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

/// Feed `chunks` to a fresh decode, one resume call per chunk, until done.
pub(crate) fn resume_all<T: Codec>(chunks: Vec<Vec<u8>>) -> T {
    let mut src = Chunked::new(chunks);
    let limit = src.chunks.len() + 2;
    let mut state = T::prepare();
    for _ in 0..limit {
        if let Poll::Ready(value) = T::resume(&mut src, &mut state).unwrap() {
            assert_eq!(src.bytes_left(), 0, "decode finished with bytes left over");
            return value;
        }
    }
    panic!("decode did not complete after {limit} resume calls");
}

/// Check blocking and resumable decoding agree for a few chunkings.
pub(crate) fn assert_roundtrip<T: Codec + PartialEq + Debug>(value: &T) {
    let bytes = to_bytes(value).unwrap();

    assert_eq!(&from_bytes::<T>(&bytes).unwrap(), value, "blocking read");
    assert_eq!(&resume_all::<T>(vec![bytes.clone()]), value, "single chunk");
    assert_eq!(&resume_all::<T>(split(&bytes, 1)), value, "byte by byte");
    assert_eq!(&resume_all::<T>(split(&bytes, 3)), value, "three-byte chunks");
}
