use std::io::{Read, Write};
use std::task::Poll;

use hnet_transport::{recv_exact, send_exact, PartialRead};

use crate::desc::TypeDesc;
use crate::error::{CodecError, Result};

/// Read granularity for runs of raw bytes (strings, bulk arrays).
pub(crate) const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Upper bound on elements reserved up front from an announced length.
pub(crate) const MAX_PREALLOC: usize = 1024;

/// Most zero-width elements a sequence or map may announce.
pub const MAX_ZERO_WIDTH_LEN: usize = 1 << 20;

/// A type that can travel over an hnet connection.
///
/// Every implementation provides a blocking encoder/decoder pair and a
/// resumable decoder. The resumable side keeps all of its progress in
/// [`Codec::DecodeState`], so a decode can stop at any byte boundary and
/// pick up again later:
///
/// ```text
/// let mut state = T::prepare();
/// loop {
///     if let Poll::Ready(value) = T::resume(&mut conn, &mut state)? {
///         break value;
///     }
///     // wait for readiness, do other work...
/// }
/// ```
///
/// However the bytes are chunked across `resume` calls, the result equals
/// what [`Codec::read`] produces from the same bytes.
pub trait Codec: Sized {
    /// Progress record for a suspended decode.
    type DecodeState;

    /// Wire width of every value, for plain fixed-width types.
    ///
    /// Arrays and vectors of such types move their elements as one
    /// contiguous run of `len * width` bytes.
    const BULK_WIDTH: Option<usize> = None;

    /// Whether values occupy no bytes at all, like unit.
    ///
    /// A length prefix announcing more than [`MAX_ZERO_WIDTH_LEN`] such
    /// values is refused, since nothing on the wire bounds the work.
    const ZERO_WIDTH: bool = false;

    /// Structural description of this type, sent during the handshake.
    fn describe() -> TypeDesc;

    /// Serialize `self`, blocking until every byte is written.
    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()>;

    /// Deserialize a value, blocking until it has fully arrived.
    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self>;

    /// Initial state for a resumable decode.
    fn prepare() -> Self::DecodeState;

    /// Advance a decode using only the bytes `src` has available now.
    ///
    /// Returns `Poll::Ready` once the value is complete. With no bytes
    /// available this returns `Poll::Pending` and leaves `state` untouched,
    /// except that zero-width leading parts (unit fields) may complete
    /// without input.
    /// One call keeps consuming while bytes are available, so it may finish
    /// several nested parts at once.
    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>>;
}

/// Encode a value into a fresh buffer.
pub fn to_bytes<T: Codec>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    value.write(&mut buf)?;
    Ok(buf)
}

/// Decode a value from a complete buffer.
pub fn from_bytes<T: Codec>(mut bytes: &[u8]) -> Result<T> {
    T::read(&mut bytes)
}

/// Progress through a fixed-size run of `N` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteState<const N: usize> {
    buf: [u8; N],
    filled: usize,
}

impl<const N: usize> ByteState<N> {
    pub fn new() -> Self {
        Self {
            buf: [0u8; N],
            filled: 0,
        }
    }

    /// Bytes received so far.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Read whatever is available; true once all `N` bytes are present.
    pub fn fill<S: PartialRead + ?Sized>(&mut self, src: &mut S) -> Result<bool> {
        while self.filled < N {
            let n = src.recv_partial(&mut self.buf[self.filled..])?;
            if n == 0 {
                return Ok(false);
            }
            self.filled += n;
        }
        Ok(true)
    }

    pub fn bytes(&self) -> [u8; N] {
        self.buf
    }
}

impl<const N: usize> Default for ByteState<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress through a run of bytes whose length is known only at runtime.
///
/// Storage grows as bytes arrive, so a large announced length does not
/// allocate before the data is actually there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkState {
    total: usize,
    buf: Vec<u8>,
}

impl BulkState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            buf: Vec::with_capacity(total.min(READ_CHUNK_SIZE)),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Bytes received so far.
    pub fn filled(&self) -> usize {
        self.buf.len()
    }

    /// Read whatever is available; true once all bytes are present.
    pub fn fill<S: PartialRead + ?Sized>(&mut self, src: &mut S) -> Result<bool> {
        while self.buf.len() < self.total {
            let start = self.buf.len();
            let want = (self.total - start).min(READ_CHUNK_SIZE);
            self.buf.resize(start + want, 0);
            let n = match src.recv_partial(&mut self.buf[start..]) {
                Ok(n) => n,
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(err.into());
                }
            };
            self.buf.truncate(start + n);
            if n == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Write a length prefix (64-bit, native byte order).
pub(crate) fn write_len<W: Write + ?Sized>(w: &mut W, len: usize) -> Result<()> {
    send_exact(w, &(len as u64).to_ne_bytes())?;
    Ok(())
}

/// Read a length prefix written by [`write_len`].
pub(crate) fn read_len<R: Read + ?Sized>(r: &mut R) -> Result<usize> {
    let mut buf = [0u8; 8];
    recv_exact(r, &mut buf)?;
    wire_len(u64::from_ne_bytes(buf))
}

/// Refuse oversized runs of zero-width values before decoding any.
pub(crate) fn check_zero_width<T: Codec>(len: usize) -> Result<()> {
    if T::ZERO_WIDTH && len > MAX_ZERO_WIDTH_LEN {
        return Err(CodecError::ZeroWidthRun(len as u64));
    }
    Ok(())
}

pub(crate) fn wire_len(len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| CodecError::LengthOverflow(len))
}

/// Blocking read of `total` raw bytes, growing the buffer chunk by chunk.
pub(crate) fn read_run<R: Read + ?Sized>(r: &mut R, total: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(total.min(READ_CHUNK_SIZE));
    while buf.len() < total {
        let start = buf.len();
        let want = (total - start).min(READ_CHUNK_SIZE);
        buf.resize(start + want, 0);
        recv_exact(r, &mut buf[start..])?;
    }
    Ok(buf)
}
