//! Byte-stream primitives for hnet.
//!
//! This is the lowest layer. It knows nothing about types or sessions, only
//! how to move bytes over a connected stream:
//! - blocking full-buffer transfer ([`send_exact`], [`recv_exact`])
//! - non-blocking partial reads ([`PartialRead`])
//! - blocking-mode control on a [`Connection`]
//!
//! Everything else builds on top of these.

pub mod connect;
pub mod connection;
pub mod error;
pub mod wire;

pub use connect::{connect_hostport, connect_tcp};
pub use connection::Connection;
pub use error::{Result, TransportError};
pub use wire::{recv_exact, send_exact, PartialRead};

#[cfg(unix)]
pub use connect::connect_unix;
