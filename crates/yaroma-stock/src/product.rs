//! Product queries and mutations.
//!
//! Reads go to `product.product` (variants, which carry stock
//! quantities); creation goes to `product.template`, which spawns the
//! default variant on the server side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use yaroma_protocol::{Domain, Operator};
use yaroma_rpc::{RpcClient, SearchOptions};
use yaroma_transport::Transport;

use crate::{StockConfig, StockError};

/// Model holding sellable variants and their quantities.
pub const PRODUCT_MODEL: &str = "product.product";

/// Model holding product templates.
pub const TEMPLATE_MODEL: &str = "product.template";

const VARIANTS_LIMIT: u32 = 100;
const ALERTS_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Field projections
// ---------------------------------------------------------------------------

/// Which fields each query reads.
///
/// The defaults match a stock server; deployments with custom fields can
/// override any list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub list: Vec<String>,
    pub detail: Vec<String>,
    pub by_category: Vec<String>,
    pub variants: Vec<String>,
    /// Used by the low-stock and out-of-stock queries.
    pub alerts: Vec<String>,
}

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

impl Default for ProductFields {
    fn default() -> Self {
        Self {
            list: owned(&[
                "id",
                "name",
                "default_code",
                "list_price",
                "standard_price",
                "qty_available",
                "virtual_available",
                "categ_id",
                "uom_id",
                "product_tmpl_id",
                "image_128",
                "active",
                "type",
            ]),
            detail: owned(&[
                "id",
                "name",
                "default_code",
                "description",
                "description_sale",
                "list_price",
                "standard_price",
                "qty_available",
                "virtual_available",
                "categ_id",
                "uom_id",
                "uom_po_id",
                "product_tmpl_id",
                "product_variant_ids",
                "attribute_line_ids",
                "image_1920",
                "active",
                "type",
                "weight",
                "volume",
            ]),
            by_category: owned(&[
                "id",
                "name",
                "default_code",
                "list_price",
                "standard_price",
                "qty_available",
                "categ_id",
                "uom_id",
                "image_128",
            ]),
            variants: owned(&[
                "id",
                "name",
                "default_code",
                "list_price",
                "standard_price",
                "qty_available",
                "product_template_attribute_value_ids",
                "image_128",
            ]),
            alerts: owned(&[
                "id",
                "name",
                "default_code",
                "qty_available",
                "categ_id",
                "list_price",
            ]),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Narrows [`ProductService::get_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Matched case-insensitively against the name and the internal
    /// reference. Blank means no filter.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }
}

/// A page request. `limit: None` uses the client's default page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Pagination {
    /// The `page`-th page (zero-based) of `size` records.
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            limit: Some(size),
            offset: page.saturating_mul(size),
        }
    }
}

/// How the server tracks a product's stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    /// Quantities are tracked.
    #[default]
    Product,
    /// Consumed without tracking.
    Consu,
    Service,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Consu => "consu",
            Self::Service => "service",
        }
    }
}

/// Data for [`ProductService::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub code: Option<String>,
    pub sale_price: f64,
    pub cost_price: f64,
    pub category_id: Option<i64>,
    pub product_type: ProductType,
    pub description: Option<String>,
}

impl NewProduct {
    /// The values written to the template. Unset optional fields are
    /// sent as `false`, the server's "empty".
    fn to_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("name".into(), self.name.clone().into());
        values.insert("default_code".into(), or_false(self.code.clone()));
        values.insert("list_price".into(), self.sale_price.into());
        values.insert("standard_price".into(), self.cost_price.into());
        values.insert("categ_id".into(), or_false(self.category_id));
        values.insert("type".into(), self.product_type.as_str().into());
        values.insert("description".into(), or_false(self.description.clone()));
        values.insert("sale_ok".into(), true.into());
        values.insert("purchase_ok".into(), true.into());
        values
    }
}

fn or_false<V: Into<Value>>(value: Option<V>) -> Value {
    value.map_or(Value::Bool(false), Into::into)
}

/// A partial update for [`ProductService::update`]. `None` fields are
/// left untouched on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    /// Ignored when blank.
    pub name: Option<String>,
    pub code: Option<String>,
    pub sale_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
}

impl ProductUpdate {
    fn to_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        if let Some(name) = self.name.as_ref().filter(|n| !n.trim().is_empty()) {
            values.insert("name".into(), name.clone().into());
        }
        if let Some(code) = &self.code {
            values.insert("default_code".into(), code.clone().into());
        }
        if let Some(price) = self.sale_price {
            values.insert("list_price".into(), price.into());
        }
        if let Some(price) = self.cost_price {
            values.insert("standard_price".into(), price.into());
        }
        if let Some(id) = self.category_id {
            values.insert("categ_id".into(), id.into());
        }
        if let Some(description) = &self.description {
            values.insert("description".into(), description.clone().into());
        }
        values
    }
}

/// Headline counts for a dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStats {
    /// Active, sellable products.
    pub total: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
}

// ---------------------------------------------------------------------------
// ProductService
// ---------------------------------------------------------------------------

/// Product operations over a shared [`RpcClient`].
pub struct ProductService<T: Transport> {
    client: Arc<RpcClient<T>>,
    stock: StockConfig,
    fields: ProductFields,
}

impl<T: Transport> ProductService<T> {
    pub fn new(client: Arc<RpcClient<T>>, stock: StockConfig) -> Self {
        Self {
            client,
            stock,
            fields: ProductFields::default(),
        }
    }

    pub fn with_fields(mut self, fields: ProductFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn stock_config(&self) -> &StockConfig {
        &self.stock
    }

    /// Sellable products, by name.
    pub async fn get_all(
        &self,
        filter: &ProductFilter,
        page: Pagination,
    ) -> Result<Vec<Value>, StockError> {
        let mut domain = sellable();
        if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            domain = domain
                .or()
                .term("name", Operator::ILike, term)
                .term("default_code", Operator::ILike, term);
        }

        let mut options = SearchOptions::new(domain)
            .fields(&refs(&self.fields.list))
            .offset(page.offset)
            .order("name ASC");
        options.limit = page.limit;

        Ok(self.client.search_read(PRODUCT_MODEL, &options).await?)
    }

    /// The product with full detail, or `None` if it doesn't exist (or
    /// isn't visible to the current user).
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Value>, StockError> {
        let records = self
            .client
            .read(PRODUCT_MODEL, &[id], &refs(&self.fields.detail))
            .await?;
        Ok(records.into_iter().next())
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing product is an
    /// error.
    pub async fn require(&self, id: i64) -> Result<Value, StockError> {
        self.get_by_id(id).await?.ok_or(StockError::NotFound {
            model: PRODUCT_MODEL,
            id,
        })
    }

    pub async fn get_by_category(
        &self,
        category_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, StockError> {
        let domain = Domain::new()
            .term("categ_id", Operator::Eq, category_id)
            .term("sale_ok", Operator::Eq, true);
        let mut options = SearchOptions::new(domain)
            .fields(&refs(&self.fields.by_category))
            .order("name ASC");
        options.limit = limit;

        Ok(self.client.search_read(PRODUCT_MODEL, &options).await?)
    }

    /// The variants of a product template.
    pub async fn get_variants(&self, template_id: i64) -> Result<Vec<Value>, StockError> {
        let options = SearchOptions::new(Domain::new().term(
            "product_tmpl_id",
            Operator::Eq,
            template_id,
        ))
        .fields(&refs(&self.fields.variants))
        .limit(VARIANTS_LIMIT)
        .order("name ASC");

        Ok(self.client.search_read(PRODUCT_MODEL, &options).await?)
    }

    /// Stocked products with `0 < qty_available <= threshold`, lowest
    /// first.
    pub async fn get_low_stock(&self, threshold: f64) -> Result<Vec<Value>, StockError> {
        let options = SearchOptions::new(low_stock(threshold).extend(sellable()))
            .fields(&refs(&self.fields.alerts))
            .limit(ALERTS_LIMIT)
            .order("qty_available ASC");

        Ok(self.client.search_read(PRODUCT_MODEL, &options).await?)
    }

    /// Stocked products with nothing on hand.
    pub async fn get_out_of_stock(&self) -> Result<Vec<Value>, StockError> {
        let options = SearchOptions::new(out_of_stock().extend(sellable()))
            .fields(&refs(&self.fields.alerts))
            .limit(ALERTS_LIMIT)
            .order("name ASC");

        Ok(self.client.search_read(PRODUCT_MODEL, &options).await?)
    }

    /// Creates a sellable, purchasable product and returns the template id.
    pub async fn create(&self, product: &NewProduct) -> Result<i64, StockError> {
        let id = self
            .client
            .create(TEMPLATE_MODEL, product.to_values())
            .await?;
        tracing::info!(id, name = %product.name, "product created");
        Ok(id)
    }

    /// Writes the set fields of `update`. Nothing is sent when no field
    /// is set.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> Result<bool, StockError> {
        let values = update.to_values();
        if values.is_empty() {
            tracing::debug!(id, "empty product update skipped");
            return Ok(true);
        }

        let written = self.client.write(PRODUCT_MODEL, &[id], values).await?;
        tracing::info!(id, "product updated");
        Ok(written)
    }

    /// Archives the product. Records are never unlinked: stock moves and
    /// past orders keep pointing at them.
    pub async fn delete(&self, id: i64) -> Result<bool, StockError> {
        let mut values = Map::new();
        values.insert("active".into(), false.into());
        let written = self.client.write(PRODUCT_MODEL, &[id], values).await?;
        tracing::info!(id, "product archived");
        Ok(written)
    }

    /// Counts for the dashboard, fetched concurrently.
    pub async fn get_stats(&self) -> Result<ProductStats, StockError> {
        let total_domain = Domain::new()
            .term("sale_ok", Operator::Eq, true)
            .term("active", Operator::Eq, true);
        let low_domain = low_stock(self.stock.low_stock_threshold);
        let out_domain = out_of_stock();

        let (total, low_stock, out_of_stock) = tokio::try_join!(
            self.client.search_count(PRODUCT_MODEL, &total_domain),
            self.client.search_count(PRODUCT_MODEL, &low_domain),
            self.client.search_count(PRODUCT_MODEL, &out_domain),
        )?;

        Ok(ProductStats {
            total,
            low_stock,
            out_of_stock,
        })
    }
}

fn sellable() -> Domain {
    Domain::new().term("sale_ok", Operator::Eq, true)
}

fn low_stock(threshold: f64) -> Domain {
    Domain::new()
        .term("qty_available", Operator::Le, threshold)
        .term("qty_available", Operator::Gt, 0)
        .term("type", Operator::Eq, ProductType::Product.as_str())
}

fn out_of_stock() -> Domain {
    Domain::new()
        .term("qty_available", Operator::Le, 0)
        .term("type", Operator::Eq, ProductType::Product.as_str())
}

fn refs(fields: &[String]) -> Vec<&str> {
    fields.iter().map(String::as_str).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_product_to_values_defaults() {
        let values = NewProduct {
            name: "Savon".into(),
            sale_price: 500.0,
            ..NewProduct::default()
        }
        .to_values();

        assert_eq!(
            Value::Object(values),
            json!({
                "name": "Savon",
                "default_code": false,
                "list_price": 500.0,
                "standard_price": 0.0,
                "categ_id": false,
                "type": "product",
                "description": false,
                "sale_ok": true,
                "purchase_ok": true,
            })
        );
    }

    #[test]
    fn test_product_update_only_set_fields() {
        let values = ProductUpdate {
            sale_price: Some(750.0),
            code: Some(String::new()),
            ..ProductUpdate::default()
        }
        .to_values();

        assert_eq!(
            Value::Object(values),
            json!({"list_price": 750.0, "default_code": ""})
        );
    }

    #[test]
    fn test_product_update_blank_name_ignored() {
        let values = ProductUpdate {
            name: Some("  ".into()),
            ..ProductUpdate::default()
        }
        .to_values();
        assert!(values.is_empty());
    }

    #[test]
    fn test_low_stock_domain_wire_form() {
        assert_eq!(
            low_stock(10.0).to_value(),
            json!([
                ["qty_available", "<=", 10.0],
                ["qty_available", ">", 0],
                ["type", "=", "product"]
            ])
        );
    }

    #[test]
    fn test_pagination_page() {
        assert_eq!(Pagination::page(2, 20), Pagination { limit: Some(20), offset: 40 });
    }

    #[test]
    fn test_product_type_serde() {
        assert_eq!(serde_json::to_value(ProductType::Consu).unwrap(), "consu");
        assert_eq!(ProductType::default().as_str(), "product");
    }
}
