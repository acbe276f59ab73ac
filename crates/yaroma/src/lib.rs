//! # Yaroma
//!
//! Stock-management client for an Odoo server.
//!
//! Yaroma talks JSON-RPC to the server, keeps track of who is logged in
//! on the client side, and exposes product and category operations as
//! typed services. Everything is wired from one [`AppConfig`] by
//! [`Yaroma::builder`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use yaroma::prelude::*;
//!
//! # async fn run() -> Result<(), YaromaError> {
//! let yaroma = Yaroma::builder(AppConfig::from_file("yaroma.json")?).build()?;
//!
//! if yaroma.login("admin@yaroma.com", "admin123", false).await.is_success() {
//!     let stats = yaroma.products().get_stats().await?;
//!     println!("{} products, {} out of stock", stats.total, stats.out_of_stock);
//! }
//! yaroma.logout()?;
//! # Ok(())
//! # }
//! ```

mod app;
mod config;
mod error;

pub use app::{Backend, Yaroma, YaromaBuilder};
pub use config::{
    AppConfig, AppSettings, Mode, OdooSettings, PaginationSettings, SessionSettings,
};
pub use error::YaromaError;

pub use yaroma_protocol as protocol;
pub use yaroma_rpc as rpc;
pub use yaroma_session as session;
pub use yaroma_stock as stock;
pub use yaroma_transport as transport;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// For binaries; libraries never install a subscriber. Calling it twice
/// is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Convenient re-exports for applications.
pub mod prelude {
    pub use crate::{AppConfig, Mode, Yaroma, YaromaError};
    pub use yaroma_protocol::{Domain, Operator};
    pub use yaroma_rpc::{RpcClient, RpcConfig, SearchOptions};
    pub use yaroma_session::{LoginOutcome, NewAccount, ProfileUpdate, Role, UserProfile};
    pub use yaroma_stock::{
        NewProduct, Pagination, ProductFilter, ProductStats, ProductUpdate, StockConfig,
        StockLevel,
    };
}
