//! Product categories.

use std::sync::Arc;

use serde_json::Value;
use yaroma_protocol::Domain;
use yaroma_rpc::{RpcClient, SearchOptions};
use yaroma_transport::Transport;

use crate::StockError;

pub const CATEGORY_MODEL: &str = "product.category";

const CATEGORY_FIELDS: &[&str] = &["id", "name", "parent_id", "product_count"];
const CATEGORIES_LIMIT: u32 = 100;

pub struct CategoryService<T: Transport> {
    client: Arc<RpcClient<T>>,
}

impl<T: Transport> CategoryService<T> {
    pub fn new(client: Arc<RpcClient<T>>) -> Self {
        Self { client }
    }

    /// Every category, by name.
    pub async fn get_all(&self) -> Result<Vec<Value>, StockError> {
        let options = SearchOptions::new(Domain::new())
            .fields(CATEGORY_FIELDS)
            .limit(CATEGORIES_LIMIT)
            .order("name ASC");

        Ok(self.client.search_read(CATEGORY_MODEL, &options).await?)
    }
}
