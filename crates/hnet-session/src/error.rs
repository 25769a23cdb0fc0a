/// Errors that can occur while establishing or using a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] hnet_transport::TransportError),

    /// Encoding or decoding a value failed.
    #[error("codec error: {0}")]
    Codec(#[from] hnet_codec::CodecError),

    /// The server refused a binding during the handshake.
    #[error("while trying to define '{expr}' with id={id}: {reason}")]
    DefineRejected { expr: String, id: u32, reason: String },

    /// The peer speaks a different protocol version.
    #[error("protocol version mismatch: expected {expected:#x}, got {got:#x}")]
    VersionMismatch { expected: u32, got: u32 },

    /// The peer sent a command byte outside the protocol.
    #[error("unknown command byte {0}")]
    UnknownCommand(u8),

    /// A call used a handle that was not registered on this client.
    #[error("no binding with id={0} on this session")]
    UnknownBinding(u32),
}

pub type Result<T> = std::result::Result<T, SessionError>;
