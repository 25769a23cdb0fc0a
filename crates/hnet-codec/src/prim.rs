//! Fixed-width primitives and unit.

use std::io::{Read, Write};
use std::mem::size_of;
use std::task::Poll;

use hnet_transport::{recv_exact, send_exact, PartialRead};

use crate::codec::{wire_len, ByteState, Codec};
use crate::desc::TypeDesc;
use crate::error::{CodecError, Result};

macro_rules! number_codec {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl Codec for $ty {
            type DecodeState = ByteState<{ size_of::<$ty>() }>;

            const BULK_WIDTH: Option<usize> = Some(size_of::<$ty>());

            fn describe() -> TypeDesc {
                TypeDesc::prim($name)
            }

            fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
                send_exact(w, &self.to_ne_bytes())?;
                Ok(())
            }

            fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
                let mut buf = [0u8; size_of::<$ty>()];
                recv_exact(r, &mut buf)?;
                Ok(<$ty>::from_ne_bytes(buf))
            }

            fn prepare() -> Self::DecodeState {
                ByteState::new()
            }

            fn resume<S: PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> Result<Poll<Self>> {
                resume_fixed(src, state, <$ty>::from_ne_bytes)
            }
        }
    )*};
}

number_codec! {
    u8 => "byte",
    i8 => "char",
    i16 => "short",
    u16 => "short",
    i32 => "int",
    u32 => "int",
    i64 => "long",
    u64 => "long",
    f32 => "float",
    f64 => "double",
}

/// Shared resume step for values of a known byte width.
///
/// A full state means the value was already handed out.
pub(crate) fn resume_fixed<S, T, const N: usize>(
    src: &mut S,
    state: &mut ByteState<N>,
    decode: impl FnOnce([u8; N]) -> T,
) -> Result<Poll<T>>
where
    S: PartialRead + ?Sized,
{
    if N > 0 && state.filled() == N {
        return Err(CodecError::ResumeAfterComplete);
    }
    if state.fill(src)? {
        Ok(Poll::Ready(decode(state.bytes())))
    } else {
        Ok(Poll::Pending)
    }
}

impl Codec for bool {
    type DecodeState = ByteState<1>;

    const BULK_WIDTH: Option<usize> = Some(1);

    fn describe() -> TypeDesc {
        TypeDesc::prim("bool")
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        u8::from(*self).write(w)
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        Ok(u8::read(r)? != 0)
    }

    fn prepare() -> Self::DecodeState {
        ByteState::new()
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        resume_fixed(src, state, |[b]| b != 0)
    }
}

/// `usize` always travels as a 64-bit "long".
impl Codec for usize {
    type DecodeState = ByteState<8>;

    const BULK_WIDTH: Option<usize> = Some(8);

    fn describe() -> TypeDesc {
        TypeDesc::prim("long")
    }

    fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        (*self as u64).write(w)
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        wire_len(u64::read(r)?)
    }

    fn prepare() -> Self::DecodeState {
        ByteState::new()
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        match resume_fixed(src, state, u64::from_ne_bytes)? {
            Poll::Ready(n) => wire_len(n).map(Poll::Ready),
            Poll::Pending => Ok(Poll::Pending),
        }
    }
}

/// Unit is zero-width: nothing is written and decoding completes at once.
impl Codec for () {
    /// Set once the value has been produced.
    type DecodeState = bool;

    const ZERO_WIDTH: bool = true;

    fn describe() -> TypeDesc {
        TypeDesc::unit()
    }

    fn write<W: Write + ?Sized>(&self, _w: &mut W) -> Result<()> {
        Ok(())
    }

    fn read<R: Read + ?Sized>(_r: &mut R) -> Result<Self> {
        Ok(())
    }

    fn prepare() -> Self::DecodeState {
        false
    }

    fn resume<S: PartialRead + ?Sized>(
        _src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        if std::mem::replace(state, true) {
            return Err(CodecError::ResumeAfterComplete);
        }
        Ok(Poll::Ready(()))
    }
}
