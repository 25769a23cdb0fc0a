use std::io::{Read, Write};
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use hnet_codec::Codec;
use hnet_transport::{send_exact, Connection};
use tracing::{debug, info, warn};

use crate::binding::Binding;
use crate::error::{Result, SessionError};

/// Protocol version sent first on every session.
pub const PROTOCOL_VERSION: u32 = 0x0001_0000;

/// Command byte: register a binding.
pub const CMD_DEFINE: u8 = 0;
/// Command byte: invoke a binding.
pub const CMD_INVOKE: u8 = 2;

/// Result byte for a refused definition. Any other value is success.
pub const RESULT_FAIL: u8 = 0;
pub const RESULT_OK: u8 = 1;

/// Configuration for session setup.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Version announced (client) or required (server).
    pub protocol_version: u32,
    /// Read/write timeout for blocking phases. `None` waits indefinitely.
    pub io_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            io_timeout: None,
        }
    }
}

/// Run the client side of the handshake over a blocking stream.
///
/// Sends the version, then defines each binding in order, waiting for the
/// server's verdict before sending the next. The first refusal aborts the
/// handshake.
pub fn init_session<S: Read + Write + ?Sized>(
    stream: &mut S,
    bindings: &[Binding],
    config: &SessionConfig,
) -> Result<()> {
    config.protocol_version.write(stream)?;

    for binding in bindings {
        debug!(id = binding.id, expr = %binding.expr, "defining binding");
        send_exact(stream, &encode_define(binding))?;

        if u8::read(stream)? == RESULT_FAIL {
            let reason = String::read(stream)?;
            warn!(id = binding.id, expr = %binding.expr, %reason, "binding rejected");
            return Err(SessionError::DefineRejected {
                expr: binding.expr.clone(),
                id: binding.id,
                reason,
            });
        }
    }

    info!(bindings = bindings.len(), "session established");
    Ok(())
}

/// One DEFINE message: command, id, then length-prefixed expression and
/// signature descriptors.
fn encode_define(binding: &Binding) -> BytesMut {
    let mut dst = BytesMut::with_capacity(
        1 + 4 + 3 * 8 + binding.expr.len() + binding.input.len() + binding.output.len(),
    );
    dst.put_u8(CMD_DEFINE);
    dst.put_u32_ne(binding.id);
    for blob in [
        binding.expr.as_bytes(),
        binding.input.as_ref(),
        binding.output.as_ref(),
    ] {
        dst.put_u64_ne(blob.len() as u64);
        dst.put_slice(blob);
    }
    dst
}

/// Prepare a connection for the handshake and run it.
///
/// Leaves the connection in blocking mode with the configured timeouts.
pub(crate) fn establish(
    conn: &mut Connection,
    bindings: &[Binding],
    config: &SessionConfig,
) -> Result<()> {
    conn.set_blocking(true)?;
    conn.set_read_timeout(config.io_timeout)?;
    conn.set_write_timeout(config.io_timeout)?;
    debug!(transport = conn.transport_name(), "starting handshake");
    init_session(conn, bindings, config)
}
