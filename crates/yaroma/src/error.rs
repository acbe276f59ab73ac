//! Unified error type for Yaroma.

use yaroma_protocol::ProtocolError;
use yaroma_rpc::RpcError;
use yaroma_session::SessionError;
use yaroma_stock::StockError;
use yaroma_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `yaroma` crate you deal with this single error type
/// instead of importing errors from each layer. The `#[from]` attribute
/// on each variant lets `?` convert them automatically.
#[derive(Debug, thiserror::Error)]
pub enum YaromaError {
    /// A transport-level error (network, HTTP status, bad URL).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid domain).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, storage, not authenticated).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An RPC error (authentication, remote error, unexpected result).
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// A stock service error.
    #[error(transparent)]
    Stock(#[from] StockError),

    /// The configuration file is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}
