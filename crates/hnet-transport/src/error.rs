/// Errors that can occur while moving bytes over a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to resolve the requested address.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("cannot connect to {target}: {source}")]
    Connect {
        target: String,
        source: std::io::Error,
    },

    /// The address string could not be interpreted.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The remote process closed the stream before the transfer completed.
    #[error("remote process closed session prematurely")]
    Closed,

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
