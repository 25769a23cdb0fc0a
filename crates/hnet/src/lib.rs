//! Structured communication with a remote expression evaluator.
//!
//! Values cross the wire in a compact, type-directed binary format. A
//! session registers each remote expression once, with descriptors of its
//! argument and result types, and then calls it by id.
//!
//! # Crate Structure
//!
//! - [`transport`]: connections and exact/partial byte I/O
//! - [`codec`]: type descriptors and the [`Codec`](codec::Codec) trait,
//!   with blocking and resumable decoding
//! - [`session`]: handshake, invocation and the sync/async clients
//!   (behind the `session` feature)
//! - [`logging`]: `tracing` subscriber setup (behind the `logging` feature)

/// Re-export transport types.
pub mod transport {
    pub use hnet_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use hnet_codec::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use hnet_session::*;
}

#[cfg(feature = "logging")]
pub mod logging;

pub use hnet_codec::{wire_alias, wire_enum, wire_record, wire_variant};
#[cfg(feature = "session")]
pub use hnet_session::{async_net_client, net_client};
