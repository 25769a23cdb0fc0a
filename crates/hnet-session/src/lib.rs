//! Sessions with a remote expression evaluator.
//!
//! A session starts with a handshake: the client announces the protocol
//! version, then registers each expression it will call under a numeric id
//! together with descriptors of its argument and result types. After that,
//! every call is `[INVOKE][id][args]` and the result comes back in call
//! order with no framing.
//!
//! [`Client`] waits for each result. [`AsyncClient`] pipelines calls and
//! delivers results to continuations as they arrive. [`net_client!`] and
//! [`async_net_client!`] generate typed wrappers around either.

pub mod async_client;
pub mod binding;
pub mod client;
pub mod error;
pub mod handshake;
pub mod invoke;
mod macros;
pub mod scheduler;
pub mod serve;

pub use async_client::AsyncClient;
pub use binding::{Binding, Rpc, NULL_ID};
pub use client::{Client, ClientBuilder};
pub use error::{Result, SessionError};
pub use handshake::{
    init_session, SessionConfig, CMD_DEFINE, CMD_INVOKE, PROTOCOL_VERSION, RESULT_FAIL,
    RESULT_OK,
};
pub use invoke::{encode_invoke, invoke, write_invoke};
pub use scheduler::{PendingCall, PendingRead, Scheduler};
pub use serve::{Request, ServerSession};

pub use hnet_transport::{connect_hostport, connect_tcp, Connection};
#[cfg(unix)]
pub use hnet_transport::connect_unix;
