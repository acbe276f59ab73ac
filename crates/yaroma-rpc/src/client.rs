//! The authenticated JSON-RPC client.
//!
//! # Call flow
//!
//! ```text
//! call(model, method, args, kwargs)
//!   ├─ identity in memory?        → use it
//!   ├─ identity in cache scope?   → load it
//!   └─ otherwise                  → POST /web/session/authenticate
//!   POST /web/dataset/call_kw {model, method, args, kwargs + context}
//!   ├─ error member → RpcError::Remote (even if a result is present)
//!   └─ result       → Value
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use yaroma_protocol::{
    AUTHENTICATE_PATH, AuthParams, AuthResult, CALL_KW_PATH, CallParams, Codec,
    Domain, JsonCodec, RequestId, RpcRequest, RpcResponse,
};
use yaroma_session::KeyValueStore;
use yaroma_transport::Transport;

use crate::{DEFAULT_AUTH_ERROR, Identity, IdentityCache, RpcConfig, RpcError, SearchOptions};

/// Exclusive upper bound of generated request ids.
const REQUEST_ID_RANGE: u64 = 1_000_000;

/// A client for one server database.
///
/// Generic over the [`Transport`] so tests can swap the network for a
/// [`MockTransport`](yaroma_transport::MockTransport). Share it behind an
/// `Arc`; every method takes `&self`.
pub struct RpcClient<T: Transport> {
    transport: T,
    config: RpcConfig,
    codec: JsonCodec,
    identity: Mutex<Option<Identity>>,
    cache: Option<IdentityCache>,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T, config: RpcConfig) -> Self {
        Self {
            transport,
            config,
            codec: JsonCodec,
            identity: Mutex::new(None),
            cache: None,
        }
    }

    /// Persists the identity in `store` so a new client can reuse it
    /// without authenticating again.
    pub fn with_identity_cache(self, store: Arc<dyn KeyValueStore>) -> Self {
        self.with_cache(IdentityCache::new(store))
    }

    /// Like [`with_identity_cache`](Self::with_identity_cache), with
    /// custom keys.
    pub fn with_cache(mut self, cache: IdentityCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The current identity, if the client has one in memory.
    pub fn identity(&self) -> Option<Identity> {
        self.slot().clone()
    }

    /// `true` if an identity is held in memory or in the cache scope.
    pub fn is_authenticated(&self) -> bool {
        self.known_identity().is_some()
    }

    /// Forgets the identity, in memory and in the cache scope. The next
    /// call authenticates again.
    pub fn clear_identity(&self) {
        *self.slot() = None;
        self.uncache_identity();
    }

    /// Drops the cached identity but keeps the one in memory, so it
    /// does not outlive the process.
    pub fn uncache_identity(&self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                tracing::warn!(error = %e, "could not clear cached identity");
            }
        }
    }

    /// Puts back an identity taken from [`known_identity`](Self::known_identity),
    /// in memory and in the cache scope. `None` clears both.
    pub fn restore_identity(&self, previous: Option<Identity>) {
        match previous {
            Some(identity) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.save(&identity) {
                        tracing::warn!(error = %e, "could not cache identity");
                    }
                }
                *self.slot() = Some(identity);
            }
            None => self.clear_identity(),
        }
    }

    /// The identity in memory, else the one in the cache scope.
    pub fn known_identity(&self) -> Option<Identity> {
        self.identity()
            .or_else(|| self.cache.as_ref().and_then(IdentityCache::load))
    }

    /// Authenticates with the configured credentials.
    pub async fn authenticate(&self) -> Result<Identity, RpcError> {
        let username = self.config.username.clone();
        let password = self.config.password.clone();
        self.authenticate_as(&username, &password).await
    }

    /// Authenticates with explicit credentials and makes the result the
    /// client's identity.
    ///
    /// # Errors
    /// - [`RpcError::Auth`] if the server answers with an error or grants
    ///   no uid
    /// - [`RpcError::Transport`] / [`RpcError::Protocol`] if the exchange
    ///   itself fails
    pub async fn authenticate_as(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Identity, RpcError> {
        let request = RpcRequest::authenticate(AuthParams {
            db: self.config.database.clone(),
            login: login.to_string(),
            password: password.to_string(),
        });

        let response = self.send(AUTHENTICATE_PATH, &request).await?;
        let result = response.into_result().map_err(|err| {
            let message = err.remote_message().unwrap_or(DEFAULT_AUTH_ERROR);
            tracing::warn!(login, code = err.code, error = message, "authentication refused");
            RpcError::Auth(message.to_string())
        })?;

        let auth: AuthResult = if result.is_null() {
            AuthResult::default()
        } else {
            serde_json::from_value(result).map_err(|e| RpcError::UnexpectedResult(e.to_string()))?
        };
        let Some(uid) = auth.uid() else {
            tracing::warn!(login, "authentication granted no uid");
            return Err(RpcError::Auth("invalid credentials".to_string()));
        };

        let identity = Identity {
            uid,
            session_id: auth.session_id,
        };
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&identity) {
                tracing::warn!(error = %e, "could not cache identity");
            }
        }
        *self.slot() = Some(identity.clone());

        tracing::info!(uid, login, "authenticated");
        Ok(identity)
    }

    /// Runs `method` on `model`, authenticating first if needed.
    ///
    /// The locale context is merged into `kwargs`; a `context` key the
    /// caller passes replaces it.
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        self.ensure_identity().await?;

        let mut merged = Map::new();
        merged.insert(
            "context".to_string(),
            serde_json::to_value(&self.config.context)
                .map_err(|e| RpcError::UnexpectedResult(e.to_string()))?,
        );
        merged.extend(kwargs);

        let id = RequestId(rand::rng().random_range(0..REQUEST_ID_RANGE));
        let request = RpcRequest::call(
            CallParams {
                model: model.to_string(),
                method: method.to_string(),
                args,
                kwargs: merged,
            },
            id,
        );

        tracing::debug!(model, method, %id, "call");
        let response = self.send(CALL_KW_PATH, &request).await?;
        response.into_result().map_err(|err| {
            let error = RpcError::remote(&err);
            tracing::error!(model, method, code = err.code, error = %error, "call failed");
            error
        })
    }

    // -- Convenience operations --------------------------------------------

    /// Ids of the records matching `options.domain`.
    pub async fn search(
        &self,
        model: &str,
        options: &SearchOptions,
    ) -> Result<Vec<i64>, RpcError> {
        let kwargs = options.paging_kwargs(&self.config);
        let result = self
            .call(model, "search", vec![options.domain.to_value()], kwargs)
            .await?;
        decode(result)
    }

    /// Reads `fields` of the records `ids`. Empty `fields` reads all.
    pub async fn read(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<Value>, RpcError> {
        let args: Vec<Value> = vec![ids.into(), fields.into()];
        let result = self.call(model, "read", args, Map::new()).await?;
        decode(result)
    }

    /// Searches and reads in one round trip.
    pub async fn search_read(
        &self,
        model: &str,
        options: &SearchOptions,
    ) -> Result<Vec<Value>, RpcError> {
        let mut kwargs = options.paging_kwargs(&self.config);
        kwargs.insert("domain".to_string(), options.domain.to_value());
        kwargs.insert("fields".to_string(), options.fields.clone().into());
        let result = self.call(model, "search_read", Vec::new(), kwargs).await?;
        decode(result)
    }

    /// Creates a record and returns its id.
    pub async fn create(
        &self,
        model: &str,
        values: Map<String, Value>,
    ) -> Result<i64, RpcError> {
        let result = self
            .call(model, "create", vec![Value::Object(values)], Map::new())
            .await?;
        decode(result)
    }

    /// Writes `values` to the records `ids`.
    pub async fn write(
        &self,
        model: &str,
        ids: &[i64],
        values: Map<String, Value>,
    ) -> Result<bool, RpcError> {
        let args: Vec<Value> = vec![ids.into(), Value::Object(values)];
        let result = self.call(model, "write", args, Map::new()).await?;
        decode(result)
    }

    /// Deletes the records `ids` for good.
    pub async fn unlink(&self, model: &str, ids: &[i64]) -> Result<bool, RpcError> {
        let result = self
            .call(model, "unlink", vec![ids.into()], Map::new())
            .await?;
        decode(result)
    }

    /// Number of records matching `domain`.
    pub async fn search_count(&self, model: &str, domain: &Domain) -> Result<u64, RpcError> {
        let result = self
            .call(model, "search_count", vec![domain.to_value()], Map::new())
            .await?;
        decode(result)
    }

    /// Field metadata of `model`, keyed by field name.
    pub async fn fields_get(
        &self,
        model: &str,
        fields: &[&str],
        attributes: &[&str],
    ) -> Result<Map<String, Value>, RpcError> {
        let args: Vec<Value> = vec![fields.into(), attributes.into()];
        let result = self.call(model, "fields_get", args, Map::new()).await?;
        decode(result)
    }

    // -- Internals ----------------------------------------------------------

    fn slot(&self) -> MutexGuard<'_, Option<Identity>> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn ensure_identity(&self) -> Result<Identity, RpcError> {
        if let Some(identity) = self.identity() {
            return Ok(identity);
        }

        if let Some(identity) = self.cache.as_ref().and_then(IdentityCache::load) {
            tracing::debug!(uid = identity.uid, "reusing cached identity");
            *self.slot() = Some(identity.clone());
            return Ok(identity);
        }

        self.authenticate().await
    }

    async fn send<P: Serialize + Sync>(
        &self,
        path: &str,
        request: &RpcRequest<P>,
    ) -> Result<RpcResponse, RpcError> {
        let body = self.codec.encode(request)?;
        let bytes = self.transport.post(path, body).await.map_err(|e| {
            tracing::error!(path, error = %e, "transport failure");
            RpcError::from(e)
        })?;
        let response: RpcResponse = self.codec.decode(&bytes)?;
        response.check_version()?;
        Ok(response)
    }
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::UnexpectedResult(e.to_string()))
}
