//! Server side of a session.
//!
//! A [`ServerSession`] reads the client's version, then hands each incoming
//! command to the caller: definitions to accept or reject, and invocations
//! whose arguments the caller decodes and whose result it writes back.
//! Evaluating the bound expressions is up to the caller.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use bytes::Bytes;
use hnet_codec::{Codec, CodecError};
use hnet_transport::send_exact;
use tracing::{debug, warn};

use crate::binding::Binding;
use crate::error::{Result, SessionError};
use crate::handshake::{SessionConfig, CMD_DEFINE, CMD_INVOKE, RESULT_FAIL, RESULT_OK};

/// A command received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// The client wants `binding` registered; answer with
    /// [`ServerSession::accept_define`] or [`ServerSession::reject_define`].
    Define(Binding),
    /// The client invokes binding `id`; its argument tuple follows.
    Invoke { id: u32 },
}

/// An accepted session, seen from the server.
#[derive(Debug)]
pub struct ServerSession<S> {
    stream: S,
    bindings: BTreeMap<u32, Binding>,
}

impl<S: Read + Write> ServerSession<S> {
    /// Read and check the client's protocol version.
    pub fn accept(mut stream: S, config: &SessionConfig) -> Result<Self> {
        let got = u32::read(&mut stream)?;
        if got != config.protocol_version {
            warn!(
                expected = config.protocol_version,
                got, "rejecting session with wrong protocol version"
            );
            return Err(SessionError::VersionMismatch {
                expected: config.protocol_version,
                got,
            });
        }
        debug!(version = got, "session accepted");
        Ok(Self {
            stream,
            bindings: BTreeMap::new(),
        })
    }

    /// Wait for the next command.
    ///
    /// Returns `None` when the client closed the connection between
    /// commands.
    pub fn next_request(&mut self) -> Result<Option<Request>> {
        let cmd = match u8::read(&mut self.stream) {
            Ok(cmd) => cmd,
            Err(CodecError::ConnectionClosed) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match cmd {
            CMD_DEFINE => {
                let id = u32::read(&mut self.stream)?;
                let expr = String::read(&mut self.stream)?;
                let input = Bytes::from(Vec::<u8>::read(&mut self.stream)?);
                let output = Bytes::from(Vec::<u8>::read(&mut self.stream)?);
                Ok(Some(Request::Define(Binding {
                    id,
                    expr,
                    input,
                    output,
                })))
            }
            CMD_INVOKE => {
                let id = u32::read(&mut self.stream)?;
                Ok(Some(Request::Invoke { id }))
            }
            other => Err(SessionError::UnknownCommand(other)),
        }
    }

    /// Register `binding` and tell the client it succeeded.
    pub fn accept_define(&mut self, binding: Binding) -> Result<()> {
        RESULT_OK.write(&mut self.stream)?;
        debug!(id = binding.id, expr = %binding.expr, "binding defined");
        self.bindings.insert(binding.id, binding);
        Ok(())
    }

    /// Refuse the pending definition with a message for the client.
    pub fn reject_define(&mut self, reason: &str) -> Result<()> {
        let mut msg = vec![RESULT_FAIL];
        reason.to_string().write(&mut msg)?;
        send_exact(&mut self.stream, &msg)?;
        Ok(())
    }

    /// Decode the argument tuple of the current invocation.
    pub fn read_args<A: Codec>(&mut self) -> Result<A> {
        Ok(A::read(&mut self.stream)?)
    }

    /// Send the result of the current invocation.
    ///
    /// Unit results are zero-width, so nothing goes on the wire for them.
    pub fn write_result<R: Codec>(&mut self, value: &R) -> Result<()> {
        let mut buf = Vec::new();
        value.write(&mut buf)?;
        send_exact(&mut self.stream, &buf)?;
        Ok(())
    }

    /// A binding accepted earlier in this session.
    pub fn binding(&self, id: u32) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
