//! Login delegated to the remote server.

use std::sync::Arc;

use serde_json::Value;
use yaroma_session::{Authenticator, Role, SessionError, UserProfile, Verified};
use yaroma_transport::Transport;

use crate::{RpcClient, RpcError};

/// Model holding the server's user accounts.
const USERS_MODEL: &str = "res.users";

/// An [`Authenticator`] that checks credentials against the server.
///
/// A successful check also becomes the shared client's identity, so the
/// services using the same client run as the logged-in user.
pub struct RpcAuthenticator<T: Transport> {
    client: Arc<RpcClient<T>>,
}

impl<T: Transport> RpcAuthenticator<T> {
    pub fn new(client: Arc<RpcClient<T>>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<RpcClient<T>> {
        &self.client
    }
}

impl<T: Transport> Authenticator for RpcAuthenticator<T> {
    /// Authenticates as the user, then reads their profile. If the read
    /// fails the client gets its previous identity back.
    async fn verify(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Verified, SessionError> {
        let previous = self.client.known_identity();
        let identity = self
            .client
            .authenticate_as(identifier, secret)
            .await
            .map_err(auth_failed)?;

        let record = match self.read_profile(identity.uid).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(uid = identity.uid, error = %e, "profile read failed");
                self.client.restore_identity(previous);
                return Err(e);
            }
        };

        Ok(Verified {
            profile: profile_from_record(identity.uid, identifier, &record),
            token: identity.session_id,
        })
    }

    /// A session that dies with the process leaves no identity on disk.
    fn on_login(&self, remember: bool) {
        if !remember {
            self.client.uncache_identity();
        }
    }

    fn on_logout(&self) {
        self.client.clear_identity();
    }
}

impl<T: Transport> RpcAuthenticator<T> {
    async fn read_profile(&self, uid: i64) -> Result<Value, SessionError> {
        let records = self
            .client
            .read(USERS_MODEL, &[uid], &["id", "name", "login", "email"])
            .await
            .map_err(auth_failed)?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::AuthFailed(format!("user {uid} not found")))
    }
}

fn auth_failed(error: RpcError) -> SessionError {
    match error {
        RpcError::Auth(message) => SessionError::AuthFailed(message),
        other => SessionError::AuthFailed(other.to_string()),
    }
}

/// Builds a profile from a `res.users` record. The server sends `false`
/// for empty fields.
fn profile_from_record(uid: i64, identifier: &str, record: &Value) -> UserProfile {
    let text = |field: &str| {
        record
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let login = text("login").unwrap_or_else(|| identifier.to_string());
    UserProfile {
        id: record.get("id").and_then(Value::as_i64).unwrap_or(uid),
        email: text("email").unwrap_or_else(|| login.clone()),
        display_name: text("name").unwrap_or(login),
        role: Role::User,
        avatar: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_record_full() {
        let record = json!({"id": 2, "name": "Awa", "login": "awa", "email": "awa@yaroma.com"});
        let profile = profile_from_record(2, "awa", &record);
        assert_eq!(profile.email, "awa@yaroma.com");
        assert_eq!(profile.display_name, "Awa");
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn test_profile_from_record_email_false_falls_back_to_login() {
        let record = json!({"id": 2, "name": "Awa", "login": "awa", "email": false});
        let profile = profile_from_record(2, "awa", &record);
        assert_eq!(profile.email, "awa");
    }

    #[test]
    fn test_profile_from_record_missing_fields() {
        let profile = profile_from_record(9, "someone", &json!({}));
        assert_eq!(profile.id, 9);
        assert_eq!(profile.email, "someone");
        assert_eq!(profile.display_name, "someone");
    }

    #[test]
    fn test_auth_failed_keeps_auth_message() {
        let err = auth_failed(RpcError::Auth("invalid credentials".into()));
        assert!(matches!(err, SessionError::AuthFailed(m) if m == "invalid credentials"));
    }
}
