//! Session types and the two-scope session store.
//!
//! A "session" is the client's record of who is logged in. It tracks:
//! - WHO the user is ([`UserProfile`])
//! - HOW requests prove it (an opaque token)
//! - WHERE it is kept ([`Scope`]: durable or volatile)
//! - UNTIL WHEN it is valid (an expiry, durable sessions only)

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{KeyValueStore, SessionError};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Names of the entries a session occupies in a storage scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Serialized [`UserProfile`].
    pub user: String,
    pub token: String,
    /// `"true"` when the session was saved with "remember me".
    pub remember: String,
    /// Expiry in milliseconds since the Unix epoch. Durable scope only.
    pub expiry: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            user: "yaroma_user".to_string(),
            token: "yaroma_token".to_string(),
            remember: "yaroma_remember".to_string(),
            expiry: "yaroma_session_expiry".to_string(),
        }
    }
}

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a remembered session stays valid.
    ///
    /// Default: 30 days. Sessions that aren't remembered never expire
    /// on their own; they die with the volatile scope.
    pub duration: Duration,

    pub keys: StorageKeys,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30 * 24 * 60 * 60),
            keys: StorageKeys::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// What a user is allowed to do in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// The identity a session asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A partial profile: only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Applies the set fields to `profile`.
    pub fn apply(&self, profile: &mut UserProfile) {
        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = Some(avatar.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Which storage scope holds a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Survives restarts. Used for "remember me".
    Durable,
    /// Lives as long as the process.
    Volatile,
}

/// A stored session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile: UserProfile,
    pub token: String,
    pub scope: Scope,
    /// Milliseconds since the Unix epoch. Always `None` for volatile
    /// sessions.
    pub expires_at: Option<u64>,
}

impl Session {
    /// Returns `true` if the session has an expiry and `now_ms` is past it.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|at| now_ms > at)
    }
}

/// The state of the single session slot.
///
/// ```text
///   Anonymous ──(login / signup)──→ Authenticated
///       ↑                                │
///       └──────(logout / expiry)─────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Session),
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Reads and writes the session entries of both scopes.
///
/// The durable scope is always consulted first. Saving a session clears
/// both scopes beforehand, so at most one scope holds a session.
#[derive(Clone)]
pub struct SessionStore {
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl SessionStore {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            durable,
            volatile,
            keys,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    fn scope(&self, scope: Scope) -> &dyn KeyValueStore {
        match scope {
            Scope::Durable => self.durable.as_ref(),
            Scope::Volatile => self.volatile.as_ref(),
        }
    }

    /// The scope whose user entry is set, durable first.
    fn holder(&self) -> Option<Scope> {
        [Scope::Durable, Scope::Volatile]
            .into_iter()
            .find(|s| self.scope(*s).get(&self.keys.user).is_some())
    }

    /// Writes a session into `scope`, then clears the other scope.
    ///
    /// The user entry is written last, and a failed write removes what
    /// was written, so a half-saved session is never loaded.
    /// `expires_at` is only recorded for the durable scope.
    pub fn save(
        &self,
        profile: &UserProfile,
        token: &str,
        scope: Scope,
        expires_at: Option<u64>,
    ) -> Result<(), SessionError> {
        let user = serde_json::to_string(profile)
            .map_err(|e| SessionError::Storage(e.to_string()))?;

        let store = self.scope(scope);
        if let Err(e) = self.write_entries(store, &user, token, scope, expires_at) {
            if let Err(cleanup) = self.clear_scope(store) {
                tracing::warn!(error = %cleanup, "could not remove partial session");
            }
            return Err(e);
        }

        let other = match scope {
            Scope::Durable => Scope::Volatile,
            Scope::Volatile => Scope::Durable,
        };
        self.clear_scope(self.scope(other))
    }

    fn write_entries(
        &self,
        store: &dyn KeyValueStore,
        user: &str,
        token: &str,
        scope: Scope,
        expires_at: Option<u64>,
    ) -> Result<(), SessionError> {
        store.set(&self.keys.token, token)?;
        match (scope, expires_at) {
            (Scope::Durable, Some(at)) => {
                store.set(&self.keys.remember, "true")?;
                store.set(&self.keys.expiry, &at.to_string())?;
            }
            (Scope::Durable, None) => {
                store.set(&self.keys.remember, "true")?;
                store.remove(&self.keys.expiry)?;
            }
            (Scope::Volatile, _) => {
                store.remove(&self.keys.remember)?;
                store.remove(&self.keys.expiry)?;
            }
        }
        store.set(&self.keys.user, user)
    }

    /// Loads the stored session, if a complete one exists.
    ///
    /// Returns `None` when the user or token entry is missing, or the
    /// user entry can't be parsed. An unparseable expiry yields a session
    /// that is already expired, so the next validity check clears it.
    pub fn load(&self) -> Option<Session> {
        let scope = self.holder()?;
        let store = self.scope(scope);

        let profile = self.parse_user(store.get(&self.keys.user)?)?;
        let token = store.get(&self.keys.token)?;

        let expires_at = match scope {
            Scope::Volatile => None,
            Scope::Durable => match store.get(&self.keys.expiry) {
                None => None,
                Some(raw) => Some(raw.trim().parse::<u64>().unwrap_or_else(|_| {
                    tracing::warn!(raw = %raw, "unreadable session expiry, treating as expired");
                    0
                })),
            },
        };

        Some(Session {
            profile,
            token,
            scope,
            expires_at,
        })
    }

    /// The stored profile, regardless of token or expiry.
    pub fn current_user(&self) -> Option<UserProfile> {
        let scope = self.holder()?;
        self.parse_user(self.scope(scope).get(&self.keys.user)?)
    }

    /// The stored token, durable scope first.
    pub fn token(&self) -> Option<String> {
        self.durable
            .get(&self.keys.token)
            .or_else(|| self.volatile.get(&self.keys.token))
    }

    /// Merges `update` into the stored profile, in whichever scope holds
    /// it. Returns the updated profile, or `None` if no profile is stored.
    pub fn update_user(
        &self,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, SessionError> {
        let Some(scope) = self.holder() else {
            return Ok(None);
        };
        let store = self.scope(scope);
        let Some(mut profile) = store
            .get(&self.keys.user)
            .and_then(|raw| self.parse_user(raw))
        else {
            return Ok(None);
        };

        update.apply(&mut profile);
        let raw = serde_json::to_string(&profile)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        store.set(&self.keys.user, &raw)?;
        Ok(Some(profile))
    }

    /// Removes every session entry from both scopes.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.clear_scope(self.durable.as_ref())?;
        self.clear_scope(self.volatile.as_ref())
    }

    fn clear_scope(&self, store: &dyn KeyValueStore) -> Result<(), SessionError> {
        store.remove(&self.keys.user)?;
        store.remove(&self.keys.token)?;
        store.remove(&self.keys.remember)?;
        store.remove(&self.keys.expiry)
    }

    fn parse_user(&self, raw: String) -> Option<UserProfile> {
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable stored user, ignoring session");
                None
            }
        }
    }
}
