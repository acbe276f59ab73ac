//! Client configuration and per-call option structures.

use serde_json::{Map, Value};
use yaroma_protocol::{CallContext, Domain};

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Everything the client needs besides a transport.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Database name on the server.
    pub database: String,

    /// Login used when the client authenticates on its own.
    pub username: String,

    pub password: String,

    /// Locale context sent with every call.
    pub context: CallContext,

    /// Page size for searches that don't set one. Default: 80.
    pub default_limit: u32,

    /// Upper bound on any page size. Default: 1000.
    pub max_limit: u32,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            username: String::new(),
            password: String::new(),
            context: CallContext::default(),
            default_limit: 80,
            max_limit: 1000,
        }
    }
}

impl RpcConfig {
    /// Resolves a requested page size: the default when unset, never
    /// above `max_limit`.
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

// ---------------------------------------------------------------------------
// SearchOptions
// ---------------------------------------------------------------------------

/// Options of `search` and `search_read`.
///
/// ```rust
/// use yaroma_protocol::{Domain, Operator};
/// use yaroma_rpc::SearchOptions;
///
/// let options = SearchOptions::new(Domain::new().term("sale_ok", Operator::Eq, true))
///     .fields(&["id", "name"])
///     .limit(20)
///     .order("name ASC");
/// assert_eq!(options.limit, Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub domain: Domain,
    /// Fields to return (`search_read` only). Empty means all fields.
    pub fields: Vec<String>,
    /// `None` means the client's default page size.
    pub limit: Option<u32>,
    pub offset: u32,
    /// e.g. `"name ASC"`. `None` leaves ordering to the server.
    pub order: Option<String>,
}

impl SearchOptions {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// The paging keyword arguments shared by `search` and `search_read`.
    pub(crate) fn paging_kwargs(&self, config: &RpcConfig) -> Map<String, Value> {
        let mut kwargs = Map::new();
        kwargs.insert("limit".into(), config.effective_limit(self.limit).into());
        kwargs.insert("offset".into(), self.offset.into());
        kwargs.insert(
            "order".into(),
            self.order.clone().unwrap_or_default().into(),
        );
        kwargs
    }
}
