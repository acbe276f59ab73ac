//! Wire protocol for Yaroma.
//!
//! This crate defines the JSON-RPC "language" the client speaks with the
//! Odoo server:
//!
//! - **Types** ([`RpcRequest`], [`RpcResponse`], [`RpcErrorObject`], ...) —
//!   the envelopes that travel on the wire.
//! - **Domains** ([`Domain`], [`Operator`]) — search filters in the
//!   server's prefix notation, with a local evaluator.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how envelopes are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the RPC
//! client (typed calls). It knows nothing about sessions or products.
//!
//! ```text
//! Transport (bytes) → Protocol (RpcResponse) → RPC client (Value / typed)
//! ```

mod codec;
mod domain;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use domain::{Domain, DomainItem, Operator, Term};
pub use error::ProtocolError;
pub use types::{
    AUTHENTICATE_PATH, AuthParams, AuthResult, CALL_KW_PATH, CallContext,
    CallParams, JSONRPC_VERSION, RequestId, RpcErrorData, RpcErrorObject,
    RpcRequest, RpcResponse,
};
