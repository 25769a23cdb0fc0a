use hnet_transport::TransportError;

/// Errors that can occur while encoding or decoding values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream ended in the middle of a value.
    #[error("remote process closed session prematurely")]
    ConnectionClosed,

    /// An I/O error occurred while reading or writing a value.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A tagged union carried a tag outside its declared cases.
    #[error("invalid variant tag {tag} (type has {cases} cases)")]
    InvalidTag { tag: u32, cases: u32 },

    /// An enumeration carried a value that names no enumerator.
    #[error("invalid value {value} for enum {type_name}")]
    InvalidEnumValue { type_name: &'static str, value: u32 },

    /// A string payload was not valid UTF-8.
    #[error("invalid UTF-8 in string payload: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A length prefix does not fit in memory on this host.
    #[error("length {0} does not fit on this host")]
    LengthOverflow(u64),

    /// A sequence announced more zero-width elements than allowed.
    #[error("sequence of {0} zero-width elements exceeds the limit")]
    ZeroWidthRun(u64),

    /// `resume` was called again on a state that already produced its value.
    #[error("decode state already completed")]
    ResumeAfterComplete,

    /// An encoded type descriptor could not be parsed.
    #[error("malformed type descriptor: {0}")]
    MalformedDescriptor(String),
}

impl From<TransportError> for CodecError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => CodecError::ConnectionClosed,
            TransportError::Io(io) => CodecError::Io(io),
            TransportError::Resolve { source, .. } | TransportError::Connect { source, .. } => {
                CodecError::Io(source)
            }
            other => CodecError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
