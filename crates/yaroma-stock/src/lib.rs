//! Product, category and stock-level services for Yaroma.
//!
//! Each service holds an `Arc` of the shared [`RpcClient`](yaroma_rpc::RpcClient)
//! and fixes the model and field projections of its queries; callers
//! pass structured filters, never raw domains.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use yaroma_rpc::{RpcClient, RpcConfig};
//! use yaroma_stock::{ProductService, StockConfig};
//! use yaroma_transport::HttpTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("https://erp.example.com")?;
//! let client = Arc::new(RpcClient::new(transport, RpcConfig::default()));
//! let products = ProductService::new(client, StockConfig::default());
//!
//! let stats = products.get_stats().await?;
//! println!("{} products, {} low on stock", stats.total, stats.low_stock);
//! # Ok(())
//! # }
//! ```

mod category;
mod error;
mod level;
mod product;

pub use category::{CATEGORY_MODEL, CategoryService};
pub use error::StockError;
pub use level::{StockConfig, StockLevel};
pub use product::{
    NewProduct, PRODUCT_MODEL, Pagination, ProductFields, ProductFilter, ProductService,
    ProductStats, ProductType, ProductUpdate, TEMPLATE_MODEL,
};
