//! Error types for the protocol layer.
//!
//! A `ProtocolError` means the problem is in the shape of the bytes, not
//! in the network or in what the server decided.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into JSON bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or a body that isn't a JSON-RPC response at all (an HTML error
    /// page from a reverse proxy, for instance).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but breaks protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A domain expression is malformed: unknown operator, a term that
    /// isn't a 3-element array, or a prefix operator missing operands.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
}
