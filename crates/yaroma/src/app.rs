//! The `Yaroma` context: every layer wired together from one
//! [`AppConfig`].
//!
//! ```text
//!                 AppConfig
//!                     │
//!   durable store ────┼──── volatile store
//!         │           │           │
//!   IdentityCache  RpcClient  SessionStore
//!         └─────────┬─┘           │
//!     ProductService│    AuthService<Backend>
//!    CategoryService┘        (Test | Odoo)
//! ```

use std::sync::Arc;

use yaroma_rpc::{IdentityCache, RpcAuthenticator, RpcClient};
use yaroma_session::{
    AuthService, Authenticator, JsonFileStore, KeyValueStore, LoginOutcome, MemoryStore,
    NewAccount, SessionError, SessionStore, TestAccounts, UserProfile, Verified,
};
use yaroma_stock::{CategoryService, Pagination, ProductService, StockLevel};
use yaroma_transport::{HttpTransport, Transport};

use crate::{AppConfig, Mode, YaromaError};

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// The authenticator selected by [`Mode`].
pub enum Backend<T: Transport> {
    Test(TestAccounts),
    Odoo(RpcAuthenticator<T>),
}

impl<T: Transport> Authenticator for Backend<T> {
    async fn verify(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Verified, SessionError> {
        match self {
            Self::Test(accounts) => accounts.verify(identifier, secret).await,
            Self::Odoo(remote) => remote.verify(identifier, secret).await,
        }
    }

    async fn register(&self, account: NewAccount) -> Result<UserProfile, SessionError> {
        match self {
            Self::Test(accounts) => accounts.register(account).await,
            Self::Odoo(remote) => remote.register(account).await,
        }
    }

    fn on_login(&self, remember: bool) {
        match self {
            Self::Test(accounts) => accounts.on_login(remember),
            Self::Odoo(remote) => remote.on_login(remember),
        }
    }

    fn on_logout(&self) {
        match self {
            Self::Test(accounts) => accounts.on_logout(),
            Self::Odoo(remote) => remote.on_logout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`Yaroma`] context.
///
/// # Example
///
/// ```rust,no_run
/// use yaroma::prelude::*;
///
/// # async fn run() -> Result<(), YaromaError> {
/// let config = AppConfig::from_file("yaroma.json")?;
/// let yaroma = Yaroma::builder(config).build()?;
///
/// let outcome = yaroma.login("stock@example.com", "secret", true).await;
/// println!("{}", outcome.message());
/// # Ok(())
/// # }
/// ```
pub struct YaromaBuilder {
    config: AppConfig,
    durable: Option<Arc<dyn KeyValueStore>>,
    volatile: Option<Arc<dyn KeyValueStore>>,
    accounts: Option<TestAccounts>,
}

impl YaromaBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            durable: None,
            volatile: None,
            accounts: None,
        }
    }

    /// Overrides the durable scope. By default it is a [`JsonFileStore`]
    /// at `session.storage_path`, or memory when no path is set.
    pub fn durable_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.durable = Some(store);
        self
    }

    /// Overrides the volatile scope. Default: a fresh [`MemoryStore`].
    pub fn volatile_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.volatile = Some(store);
        self
    }

    /// Accounts for test mode. Default: [`TestAccounts::seeded`].
    pub fn test_accounts(mut self, accounts: TestAccounts) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Builds a context talking HTTP to `odoo.url`.
    pub fn build(self) -> Result<Yaroma<HttpTransport>, YaromaError> {
        let transport = HttpTransport::new(&self.config.odoo.url)?;
        self.build_with_transport(transport)
    }

    /// Builds a context over any transport.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<Yaroma<T>, YaromaError> {
        let config = self.config;

        let durable: Arc<dyn KeyValueStore> = match (self.durable, &config.session.storage_path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(JsonFileStore::open(path.clone())?),
            (None, None) => Arc::new(MemoryStore::new()),
        };
        let volatile = self
            .volatile
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let cache = IdentityCache::with_keys(
            durable.clone(),
            config.session.uid_key.clone(),
            config.session.server_session_key.clone(),
        );
        let client = Arc::new(RpcClient::new(transport, config.rpc_config()).with_cache(cache));

        let backend = match config.mode {
            Mode::Test => Backend::Test(self.accounts.unwrap_or_default()),
            Mode::Odoo => Backend::Odoo(RpcAuthenticator::new(client.clone())),
        };
        let session_config = config.session_config();
        let store = SessionStore::new(durable, volatile, session_config.keys.clone());
        let auth = AuthService::new(backend, store, session_config);

        tracing::info!(
            mode = ?config.mode,
            url = %config.odoo.url,
            database = %config.odoo.database,
            "yaroma ready"
        );

        Ok(Yaroma {
            products: ProductService::new(client.clone(), config.alerts),
            categories: CategoryService::new(client.clone()),
            client,
            auth,
            config,
        })
    }
}

// ---------------------------------------------------------------------------
// Yaroma
// ---------------------------------------------------------------------------

/// The application context.
///
/// Owns the shared client, the auth service and the domain services.
/// Nothing is global: a process can hold several contexts against
/// different servers.
pub struct Yaroma<T: Transport = HttpTransport> {
    config: AppConfig,
    client: Arc<RpcClient<T>>,
    auth: AuthService<Backend<T>>,
    products: ProductService<T>,
    categories: CategoryService<T>,
}

impl Yaroma {
    pub fn builder(config: AppConfig) -> YaromaBuilder {
        YaromaBuilder::new(config)
    }
}

impl<T: Transport> Yaroma<T> {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<RpcClient<T>> {
        &self.client
    }

    pub fn auth(&self) -> &AuthService<Backend<T>> {
        &self.auth
    }

    pub fn products(&self) -> &ProductService<T> {
        &self.products
    }

    pub fn categories(&self) -> &CategoryService<T> {
        &self.categories
    }

    pub async fn login(&self, identifier: &str, secret: &str, remember: bool) -> LoginOutcome {
        self.auth.login(identifier, secret, remember).await
    }

    pub async fn signup(&self, account: NewAccount) -> LoginOutcome {
        self.auth.signup(account).await
    }

    /// Ends the session and forgets the server identity, so the next
    /// call authenticates afresh. An expired session is ended the same
    /// way by [`is_authenticated`](Self::is_authenticated).
    pub fn logout(&self) -> Result<(), YaromaError> {
        self.auth.logout()?;
        self.client.clear_identity();
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.auth.current_user()
    }

    pub fn require_auth(&self) -> Result<UserProfile, YaromaError> {
        Ok(self.auth.require_auth()?)
    }

    /// The `page`-th page (zero-based) at the configured page size.
    pub fn page(&self, page: u32) -> Pagination {
        Pagination::page(page, self.config.pagination.default_limit)
    }

    /// Classifies a quantity against the configured alert thresholds.
    pub fn stock_level(&self, qty: f64) -> StockLevel {
        StockLevel::classify(qty, &self.config.alerts)
    }
}
