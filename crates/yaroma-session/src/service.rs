//! The auth service: login, signup, logout and session validity.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Checking credentials through an [`Authenticator`]
//! - Issuing a token and saving the session in the right scope
//! - Answering "is anyone logged in?", expiring stale sessions as a
//!   side effect
//! - Clearing everything on logout
//!
//! # Lifecycle
//!
//! ```text
//! login(remember = true)  ──→ durable scope, expiry = now + duration
//! login(remember = false) ──→ volatile scope, no expiry
//!                                   │
//!              is_authenticated() ──┤── expired? ──→ logout() ──→ Anonymous
//!                                   │
//!                        logout() ──┴──────────────────────────→ Anonymous
//! ```

use rand::Rng;
use serde::Serialize;

use crate::session::now_millis;
use crate::{
    Authenticator, NewAccount, ProfileUpdate, Scope, SessionConfig,
    SessionError, SessionState, SessionStore, UserProfile,
};

/// What a login or signup attempt produced.
///
/// Failures are values, not errors: the message is meant to be shown to
/// the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoginOutcome {
    Success {
        message: String,
        user: UserProfile,
        token: String,
    },
    Failure {
        message: String,
    },
}

impl LoginOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message } => message,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Success { user, .. } => Some(user),
            Self::Failure { .. } => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Success { token, .. } => Some(token),
            Self::Failure { .. } => None,
        }
    }
}

/// Manages the single session slot on behalf of the application.
///
/// Owns its [`Authenticator`] and a [`SessionStore`]; holds no other
/// state, so every answer reflects what is in storage right now.
pub struct AuthService<A: Authenticator> {
    authenticator: A,
    store: SessionStore,
    config: SessionConfig,
}

impl<A: Authenticator> AuthService<A> {
    pub fn new(authenticator: A, store: SessionStore, config: SessionConfig) -> Self {
        Self {
            authenticator,
            store,
            config,
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Logs a user in.
    ///
    /// On success the session is saved in the durable scope with an
    /// expiry when `remember` is set, otherwise in the volatile scope.
    /// On failure nothing is written.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        remember: bool,
    ) -> LoginOutcome {
        let verified = match self.authenticator.verify(identifier, secret).await {
            Ok(verified) => verified,
            Err(SessionError::AuthFailed(message)) => {
                tracing::info!(identifier, "login rejected");
                return LoginOutcome::failure(message);
            }
            Err(e) => {
                tracing::error!(identifier, error = %e, "login failed");
                return LoginOutcome::failure(e.to_string());
            }
        };

        let token = verified.token.unwrap_or_else(generate_token);
        let (scope, expires_at) = if remember {
            let ttl = self.config.duration.as_millis() as u64;
            (Scope::Durable, Some(now_millis().saturating_add(ttl)))
        } else {
            (Scope::Volatile, None)
        };

        if let Err(e) = self.store.save(&verified.profile, &token, scope, expires_at) {
            tracing::error!(error = %e, "could not save session");
            self.authenticator.on_logout();
            return LoginOutcome::failure(e.to_string());
        }
        self.authenticator.on_login(remember);

        tracing::info!(
            user_id = verified.profile.id,
            role = %verified.profile.role,
            remember,
            "login successful"
        );
        LoginOutcome::Success {
            message: "login successful".to_string(),
            user: verified.profile,
            token,
        }
    }

    /// Creates an account and logs it in for this process only.
    pub async fn signup(&self, account: NewAccount) -> LoginOutcome {
        let email = account.email.clone();
        let profile = match self.authenticator.register(account).await {
            Ok(profile) => profile,
            Err(SessionError::EmailInUse(_)) => {
                return LoginOutcome::failure("email already in use");
            }
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "signup failed");
                return LoginOutcome::failure(e.to_string());
            }
        };

        let token = generate_token();
        if let Err(e) = self.store.save(&profile, &token, Scope::Volatile, None) {
            tracing::error!(error = %e, "could not save session");
            return LoginOutcome::failure(e.to_string());
        }

        tracing::info!(user_id = profile.id, "signup successful");
        LoginOutcome::Success {
            message: "signup successful".to_string(),
            user: profile,
            token,
        }
    }

    /// Clears every session entry from both scopes and tells the
    /// authenticator the session is over.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.authenticator.on_logout();
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Returns `true` if a complete, unexpired session is stored.
    ///
    /// Not a pure read: finding an expired session logs the user out.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated(_))
    }

    /// The current state of the session slot, expiring it if due.
    pub fn state(&self) -> SessionState {
        let Some(session) = self.store.load() else {
            return SessionState::Anonymous;
        };

        if session.is_expired(now_millis()) {
            tracing::info!(user_id = session.profile.id, "session expired");
            if let Err(e) = self.logout() {
                tracing::warn!(error = %e, "could not clear expired session");
            }
            return SessionState::Anonymous;
        }

        SessionState::Authenticated(session)
    }

    /// The stored profile, or `None`.
    pub fn current_user(&self) -> Option<UserProfile> {
        self.store.current_user()
    }

    /// The stored token, or `None`.
    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// Returns the current profile, or [`SessionError::NotAuthenticated`].
    pub fn require_auth(&self) -> Result<UserProfile, SessionError> {
        match self.state() {
            SessionState::Authenticated(session) => Ok(session.profile),
            SessionState::Anonymous => Err(SessionError::NotAuthenticated),
        }
    }

    /// Merges `update` into the stored profile. No-op without a session.
    pub fn update_user(&self, update: ProfileUpdate) -> Result<(), SessionError> {
        if let Some(profile) = self.store.update_user(&update)? {
            tracing::debug!(user_id = profile.id, "profile updated");
        }
        Ok(())
    }
}

/// Generates an opaque session token: `tok_`, 32 random hex characters
/// (128 bits), then the current time in base 36.
///
/// Client-side bookkeeping only; nothing authorizes on it.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let random: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("tok_{random}{}", to_base36(now_millis()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_has_prefix_and_random_part() {
        let token = generate_token();
        assert!(token.starts_with("tok_"));
        let random = &token[4..36];
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(token.len() > 36, "timestamp suffix should follow");
    }

    #[test]
    fn test_generate_token_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_296), "100");
    }

    #[test]
    fn test_login_outcome_serializes_with_status_tag() {
        let outcome = LoginOutcome::failure("invalid email or password");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"status": "failure", "message": "invalid email or password"})
        );
        assert!(!outcome.is_success());
        assert!(outcome.user().is_none());
    }
}
