//! The remote identity and its durable cache.

use std::sync::Arc;

use yaroma_session::{KeyValueStore, SessionError};

/// Who the client is authenticated as on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: i64,
    /// The server session id, when the server reports one. The HTTP
    /// transport also carries it as a cookie.
    pub session_id: Option<String>,
}

/// Keeps the identity in a storage scope so a restarted client can skip
/// authentication.
#[derive(Clone)]
pub struct IdentityCache {
    store: Arc<dyn KeyValueStore>,
    uid_key: String,
    session_key: String,
}

impl IdentityCache {
    /// A cache in `store` under the default keys `yaroma_odoo_uid` and
    /// `yaroma_odoo_session`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(store, "yaroma_odoo_uid", "yaroma_odoo_session")
    }

    pub fn with_keys(
        store: Arc<dyn KeyValueStore>,
        uid_key: impl Into<String>,
        session_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            uid_key: uid_key.into(),
            session_key: session_key.into(),
        }
    }

    /// Loads the cached identity. An unparseable uid counts as no cache.
    pub fn load(&self) -> Option<Identity> {
        let raw = self.store.get(&self.uid_key)?;
        let uid = match raw.trim().parse::<i64>() {
            Ok(uid) if uid > 0 => uid,
            _ => {
                tracing::warn!(raw = %raw, "ignoring unreadable cached uid");
                return None;
            }
        };
        Some(Identity {
            uid,
            session_id: self.store.get(&self.session_key),
        })
    }

    pub fn save(&self, identity: &Identity) -> Result<(), SessionError> {
        self.store.set(&self.uid_key, &identity.uid.to_string())?;
        match &identity.session_id {
            Some(sid) => self.store.set(&self.session_key, sid),
            None => self.store.remove(&self.session_key),
        }
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(&self.uid_key)?;
        self.store.remove(&self.session_key)
    }
}
