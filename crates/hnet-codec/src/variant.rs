//! Tagged unions and enumerations.
//!
//! A union travels as a 4-byte tag followed by the payload of the selected
//! case. An enumeration travels as its 4-byte enumerator value.

use std::convert::Infallible;
use std::io::{Read, Write};
use std::task::Poll;

use hnet_transport::PartialRead;

use crate::codec::{ByteState, Codec};
use crate::desc::{positional_name, TypeDesc};
use crate::error::{CodecError, Result};

/// Two-phase progress through a tagged union.
///
/// `P` holds the decode state of the selected case; it exists only once the
/// whole tag has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SumState<P> {
    Tag(ByteState<4>),
    Payload(P),
    Done,
}

impl<P> Default for SumState<P> {
    fn default() -> Self {
        Self::Tag(ByteState::new())
    }
}

pub fn write_tag<W: Write + ?Sized>(w: &mut W, tag: u32) -> Result<()> {
    tag.write(w)
}

pub fn read_tag<R: Read + ?Sized>(r: &mut R) -> Result<u32> {
    u32::read(r)
}

/// Resume a union decode.
///
/// `start` builds the payload state for a freshly read tag (or rejects the
/// tag), and `advance` resumes that payload.
pub fn resume_sum<S, P, T>(
    src: &mut S,
    state: &mut SumState<P>,
    start: impl FnOnce(u32) -> Result<P>,
    advance: impl FnOnce(&mut S, &mut P) -> Result<Poll<T>>,
) -> Result<Poll<T>>
where
    S: PartialRead + ?Sized,
{
    if let SumState::Tag(tag) = state {
        if !tag.fill(src)? {
            return Ok(Poll::Pending);
        }
        let tag = u32::from_ne_bytes(tag.bytes());
        *state = SumState::Payload(start(tag)?);
    }
    match state {
        SumState::Payload(payload) => {
            let poll = advance(src, payload)?;
            if poll.is_ready() {
                *state = SumState::Done;
            }
            Ok(poll)
        }
        SumState::Tag(_) | SumState::Done => Err(CodecError::ResumeAfterComplete),
    }
}

macro_rules! generic_variant {
    ($(#[$meta:meta])* $name:ident { $($case:ident($ty:ident) = $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name<$($ty),+> {
            $($case($ty)),+
        }

        impl<$($ty: Codec),+> Codec for $name<$($ty),+> {
            type DecodeState = SumState<$name<$($ty::DecodeState),+>>;

            fn describe() -> TypeDesc {
                TypeDesc::variant([$((positional_name($tag), $ty::describe())),+])
            }

            fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
                match self {
                    $(Self::$case(x) => {
                        write_tag(w, $tag)?;
                        x.write(w)
                    })+
                }
            }

            fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
                match read_tag(r)? {
                    $($tag => Ok(Self::$case($ty::read(r)?)),)+
                    tag => Err(CodecError::InvalidTag { tag, cases: [$($tag),+].len() as u32 }),
                }
            }

            fn prepare() -> Self::DecodeState {
                SumState::default()
            }

            fn resume<S: PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> Result<Poll<Self>> {
                resume_sum(
                    src,
                    state,
                    |tag| match tag {
                        $($tag => Ok($name::$case($ty::prepare())),)+
                        tag => Err(CodecError::InvalidTag { tag, cases: [$($tag),+].len() as u32 }),
                    },
                    |src, payload| {
                        Ok(match payload {
                            $($name::$case(s) => $ty::resume(src, s)?.map(Self::$case),)+
                        })
                    },
                )
            }
        }
    };
}

generic_variant! {
    /// A union of two anonymous cases, described as `.f0 | .f1`.
    Variant2 { F0(A) = 0, F1(B) = 1 }
}

generic_variant! {
    /// A union of three anonymous cases.
    Variant3 { F0(A) = 0, F1(B) = 1, F2(C) = 2 }
}

generic_variant! {
    /// A union of four anonymous cases.
    Variant4 { F0(A) = 0, F1(B) = 1, F2(C) = 2, F3(D) = 3 }
}

/// The union with no cases. It has no values, so every tag is invalid.
impl Codec for Infallible {
    type DecodeState = SumState<Infallible>;

    fn describe() -> TypeDesc {
        TypeDesc::prim("void")
    }

    fn write<W: Write + ?Sized>(&self, _w: &mut W) -> Result<()> {
        match *self {}
    }

    fn read<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        let tag = read_tag(r)?;
        Err(CodecError::InvalidTag { tag, cases: 0 })
    }

    fn prepare() -> Self::DecodeState {
        SumState::default()
    }

    fn resume<S: PartialRead + ?Sized>(
        src: &mut S,
        state: &mut Self::DecodeState,
    ) -> Result<Poll<Self>> {
        resume_sum(
            src,
            state,
            |tag| Err(CodecError::InvalidTag { tag, cases: 0 }),
            |_, payload| match *payload {},
        )
    }
}

/// Declare an enum whose cases each carry one payload, travelling as a
/// tagged union.
///
/// Tags are the case positions, starting at 0. Use `()` for a case with no
/// data.
///
/// ```
/// hnet_codec::wire_variant! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Event {
///         Tick(u64),
///         Message(String),
///         Stop(()),
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_variant {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($case:ident($ty:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($case($ty)),+
        }

        const _: () = {
            #[allow(non_camel_case_types, dead_code)]
            enum __Tag {
                $($case),+
            }

            const __CASES: u32 = [$(__Tag::$case),+].len() as u32;

            #[allow(non_camel_case_types)]
            pub enum __PayloadState {
                $($case(<$ty as $crate::Codec>::DecodeState)),+
            }

            impl $crate::Codec for $name {
                type DecodeState = $crate::SumState<__PayloadState>;

                fn describe() -> $crate::TypeDesc {
                    $crate::TypeDesc::variant([
                        $((stringify!($case), <$ty as $crate::Codec>::describe())),+
                    ])
                }

                fn write<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> $crate::Result<()> {
                    match self {
                        $(Self::$case(x) => {
                            $crate::write_tag(w, __Tag::$case as u32)?;
                            $crate::Codec::write(x, w)
                        })+
                    }
                }

                fn read<R: ::std::io::Read + ?Sized>(r: &mut R) -> $crate::Result<Self> {
                    let tag = $crate::read_tag(r)?;
                    $(
                        if tag == __Tag::$case as u32 {
                            return Ok(Self::$case(<$ty as $crate::Codec>::read(r)?));
                        }
                    )+
                    Err($crate::CodecError::InvalidTag { tag, cases: __CASES })
                }

                fn prepare() -> Self::DecodeState {
                    $crate::SumState::default()
                }

                fn resume<S: $crate::PartialRead + ?Sized>(
                    src: &mut S,
                    state: &mut Self::DecodeState,
                ) -> $crate::Result<::std::task::Poll<Self>> {
                    $crate::resume_sum(
                        src,
                        state,
                        |tag| {
                            $(
                                if tag == __Tag::$case as u32 {
                                    return Ok(__PayloadState::$case(
                                        <$ty as $crate::Codec>::prepare(),
                                    ));
                                }
                            )+
                            Err($crate::CodecError::InvalidTag { tag, cases: __CASES })
                        },
                        |src, payload| {
                            Ok(match payload {
                                $(__PayloadState::$case(s) => {
                                    <$ty as $crate::Codec>::resume(src, s)?.map(Self::$case)
                                })+
                            })
                        },
                    )
                }
            }
        };
    };
}

/// Declare a fieldless enum that travels as its explicit `u32` values.
///
/// ```
/// hnet_codec::wire_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Side {
///         Buy = 1,
///         Sell = 2,
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($case:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u32)]
        $vis enum $name {
            $($case = $value),+
        }

        impl $name {
            fn from_wire(value: u32) -> $crate::Result<Self> {
                match value {
                    $($value => Ok(Self::$case),)+
                    value => Err($crate::CodecError::InvalidEnumValue {
                        type_name: stringify!($name),
                        value,
                    }),
                }
            }

            fn to_wire(&self) -> u32 {
                match self {
                    $(Self::$case => $value),+
                }
            }
        }

        impl $crate::Codec for $name {
            type DecodeState = <u32 as $crate::Codec>::DecodeState;

            const BULK_WIDTH: Option<usize> = Some(4);

            fn describe() -> $crate::TypeDesc {
                $crate::TypeDesc::Enum {
                    name: stringify!($name).to_string(),
                    ctors: vec![$((stringify!($case).to_string(), $value)),+],
                }
            }

            fn write<W: ::std::io::Write + ?Sized>(&self, w: &mut W) -> $crate::Result<()> {
                $crate::Codec::write(&self.to_wire(), w)
            }

            fn read<R: ::std::io::Read + ?Sized>(r: &mut R) -> $crate::Result<Self> {
                Self::from_wire(<u32 as $crate::Codec>::read(r)?)
            }

            fn prepare() -> Self::DecodeState {
                <u32 as $crate::Codec>::prepare()
            }

            fn resume<S: $crate::PartialRead + ?Sized>(
                src: &mut S,
                state: &mut Self::DecodeState,
            ) -> $crate::Result<::std::task::Poll<Self>> {
                match <u32 as $crate::Codec>::resume(src, state)? {
                    ::std::task::Poll::Ready(value) => {
                        Self::from_wire(value).map(::std::task::Poll::Ready)
                    }
                    ::std::task::Poll::Pending => Ok(::std::task::Poll::Pending),
                }
            }
        }
    };
}
