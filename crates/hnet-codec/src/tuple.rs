//! Tuples, encoded as their fields back to back.
//!
//! A tuple `(A, B, C)` decodes as `A` followed by the tuple `(B, C)`, so
//! its resumable state nests one [`ConsState`] per field.

use std::io::{Read, Write};
use std::task::Poll;

use hnet_transport::PartialRead;

use crate::codec::Codec;
use crate::desc::TypeDesc;
use crate::error::{CodecError, Result};

/// Resumable progress through a head field followed by the remaining ones.
///
/// The state for the rest is created only once the head is complete.
pub enum ConsState<H: Codec, T: Codec> {
    First(H::DecodeState),
    Rest(H, T::DecodeState),
    Done,
}

impl<H: Codec, T: Codec> ConsState<H, T> {
    pub fn new() -> Self {
        Self::First(H::prepare())
    }

    /// Advance the cons cell, returning the head and tail once both are in.
    pub fn resume<S: PartialRead + ?Sized>(&mut self, src: &mut S) -> Result<Poll<(H, T)>> {
        loop {
            match self {
                Self::First(head) => match H::resume(src, head)? {
                    Poll::Ready(value) => *self = Self::Rest(value, T::prepare()),
                    Poll::Pending => return Ok(Poll::Pending),
                },
                Self::Rest(_, rest) => {
                    let tail = match T::resume(src, rest)? {
                        Poll::Ready(tail) => tail,
                        Poll::Pending => return Ok(Poll::Pending),
                    };
                    return match std::mem::replace(self, Self::Done) {
                        Self::Rest(head, _) => Ok(Poll::Ready((head, tail))),
                        _ => Err(CodecError::ResumeAfterComplete),
                    };
                }
                Self::Done => return Err(CodecError::ResumeAfterComplete),
            }
        }
    }
}

impl<H: Codec, T: Codec> Default for ConsState<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! tuple_codec {
    ($head:ident $(, $tail:ident)*) => {
        #[allow(non_snake_case)]
        impl<$head: Codec $(, $tail: Codec)*> Codec for ($head, $($tail,)*) {
            type DecodeState = ConsState<$head, ($($tail,)*)>;

            const ZERO_WIDTH: bool = $head::ZERO_WIDTH $(&& $tail::ZERO_WIDTH)*;

            fn describe() -> TypeDesc {
                TypeDesc::tuple(vec![$head::describe() $(, $tail::describe())*])
            }

            fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
                let ($head, $($tail,)*) = self;
                $head.write(w)?;
                $($tail.write(w)?;)*
                Ok(())
            }

            fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
                Ok(($head::read(r)?, $($tail::read(r)?,)*))
            }

            fn prepare() -> Self::DecodeState {
                ConsState::new()
            }

            fn resume<S: PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> Result<Poll<Self>> {
                Ok(state
                    .resume(src)?
                    .map(|($head, ($($tail,)*))| ($head, $($tail,)*)))
            }
        }
    };
}

tuple_codec!(A);
tuple_codec!(A, B);
tuple_codec!(A, B, C);
tuple_codec!(A, B, C, D);
tuple_codec!(A, B, C, D, E);
tuple_codec!(A, B, C, D, E, F);
tuple_codec!(A, B, C, D, E, F, G);
tuple_codec!(A, B, C, D, E, F, G, H);
tuple_codec!(A, B, C, D, E, F, G, H, I);
tuple_codec!(A, B, C, D, E, F, G, H, I, J);
tuple_codec!(A, B, C, D, E, F, G, H, I, J, K);
tuple_codec!(A, B, C, D, E, F, G, H, I, J, K, L);
