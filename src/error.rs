//! Error types for rankset.
//!
//! Every fallible operation returns [`Result`]. Absent members are not errors:
//! lookups that can miss return `Option`.

/// Result type alias for rankset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred during communication.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store answered with an error reply.
    #[error("server error: {0}")]
    Server(String),

    /// The RESP data was malformed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The reply type did not match what the command returns.
    #[error("unexpected response type: expected {expected}, got {actual}")]
    UnexpectedResponse {
        /// The expected type description.
        expected: &'static str,
        /// The actual type description.
        actual: String,
    },

    /// The connection to the store was closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A caller-supplied argument violates a documented constraint.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if the error originated from the backing store or the
    /// link to it, as opposed to a rejected argument or bad configuration.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Server(_)
                | Error::Protocol(_)
                | Error::UnexpectedResponse { .. }
                | Error::ConnectionClosed
        )
    }

    /// Returns true for a `WRONGTYPE` reply, i.e. the key holds another type.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Error::Server(msg) if msg.starts_with("WRONGTYPE"))
    }

    #[cold]
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
