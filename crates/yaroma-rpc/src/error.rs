//! Error types for the RPC layer.

use yaroma_protocol::{ProtocolError, RpcErrorObject};
use yaroma_transport::TransportError;

/// Fallback message when a failed call carries no message of its own.
pub const DEFAULT_CALL_ERROR: &str = "RPC call failed";

/// Fallback message when a failed authentication carries no message.
pub const DEFAULT_AUTH_ERROR: &str = "authentication failed";

/// Errors that can occur while talking to the server.
///
/// Nothing in this crate swallows these: every variant reaches the
/// caller, which decides what the user sees.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The server refused the credentials, or answered the
    /// authentication request with an error.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server answered a call with an `error` object. The display
    /// form is the server's message, verbatim.
    #[error("{message}")]
    Remote { code: i64, message: String },

    /// The request could not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request or response could not be encoded/decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The call succeeded but its result doesn't have the expected shape
    /// (e.g. `search_count` returning a string).
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

impl RpcError {
    /// Builds a [`RpcError::Remote`] from the server's error object,
    /// falling back to [`DEFAULT_CALL_ERROR`].
    pub fn remote(error: &RpcErrorObject) -> Self {
        Self::Remote {
            code: error.code,
            message: error
                .remote_message()
                .unwrap_or(DEFAULT_CALL_ERROR)
                .to_string(),
        }
    }
}
