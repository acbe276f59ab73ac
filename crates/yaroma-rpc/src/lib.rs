//! Authenticated JSON-RPC client for the Odoo server behind Yaroma.
//!
//! # How it fits in the stack
//!
//! ```text
//! Domain services (yaroma-stock)  ← search_read / create / write ...
//!     ↕
//! RPC client (this crate)  ← identity, envelopes, error mapping
//!     ↕
//! Protocol (yaroma-protocol)  ← JSON-RPC types, domains, codec
//!     ↕
//! Transport (yaroma-transport)  ← HTTP POST
//! ```
//!
//! The client authenticates lazily: the first call without an identity
//! triggers it, and every later call reuses it. [`RpcAuthenticator`]
//! plugs the same client into the session layer so the application's
//! login goes to the server.

mod authenticator;
mod client;
mod config;
mod error;
mod identity;

pub use authenticator::RpcAuthenticator;
pub use client::RpcClient;
pub use config::{RpcConfig, SearchOptions};
pub use error::{DEFAULT_AUTH_ERROR, DEFAULT_CALL_ERROR, RpcError};
pub use identity::{Identity, IdentityCache};
