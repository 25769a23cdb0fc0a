//! Type-directed binary codec for hnet.
//!
//! Every wire type implements [`Codec`], which pairs a blocking
//! encoder/decoder with a resumable decoder that can stop at any byte
//! boundary and continue later. Composite types build their resumable state
//! out of their parts' states, so a record of vectors of unions suspends and
//! resumes as naturally as an integer.
//!
//! Shapes covered:
//! - primitives, unit, `usize` as a 64-bit long
//! - tuples up to twelve fields, and named records via [`wire_record!`]
//! - fixed arrays, vectors, strings, `BTreeMap` and `HashMap`
//! - tagged unions ([`Variant2`]..[`Variant4`], [`wire_variant!`]) and
//!   enumerations ([`wire_enum!`])
//! - opaque aliases via [`wire_alias!`]
//!
//! All integers travel in native byte order. [`TypeDesc`] describes each
//! type structurally for the session handshake.

pub mod codec;
pub mod desc;
pub mod error;
pub mod prim;
pub mod record;
pub mod seq;
pub mod tuple;
pub mod variant;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{from_bytes, to_bytes, BulkState, ByteState, Codec, MAX_ZERO_WIDTH_LEN};
pub use desc::{positional_name, Ctor, Field, TypeDesc};
pub use error::{CodecError, Result};
pub use seq::{MapState, SeqState};
pub use tuple::ConsState;
pub use variant::{read_tag, resume_sum, write_tag, SumState, Variant2, Variant3, Variant4};

pub use hnet_transport::PartialRead;
