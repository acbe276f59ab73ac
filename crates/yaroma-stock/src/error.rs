//! Error types for the stock services.

use yaroma_rpc::RpcError;

#[derive(Debug, thiserror::Error)]
pub enum StockError {
    /// The underlying call failed. The RPC error is kept intact so the
    /// caller still sees the server's message.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("{model} {id} not found")]
    NotFound { model: &'static str, id: i64 },
}
