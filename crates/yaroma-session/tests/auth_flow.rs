//! Integration tests for the login → check → logout flow.
//!
//! Every test builds an `AuthService` over two shared `MemoryStore`s, so
//! it can both drive the service and look directly at what landed in
//! each scope.

use std::sync::Arc;
use std::time::Duration;

use yaroma_session::{
    AuthService, Authenticator, KeyValueStore, LoginOutcome, MemoryStore, NewAccount,
    ProfileUpdate, Role, Scope, SessionConfig, SessionError, SessionState,
    SessionStore, StorageKeys, TestAccounts, Verified,
};

// =========================================================================
// Helpers
// =========================================================================

struct Harness {
    durable: Arc<MemoryStore>,
    volatile: Arc<MemoryStore>,
    auth: AuthService<TestAccounts>,
}

fn harness_with(config: SessionConfig) -> Harness {
    let durable = Arc::new(MemoryStore::new());
    let volatile = Arc::new(MemoryStore::new());
    let store = SessionStore::new(durable.clone(), volatile.clone(), config.keys.clone());
    Harness {
        durable,
        volatile,
        auth: AuthService::new(TestAccounts::seeded(), store, config),
    }
}

fn harness() -> Harness {
    harness_with(SessionConfig::default())
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

// =========================================================================
// login()
// =========================================================================

#[tokio::test]
async fn test_login_every_seed_account_matches_seed_profile() {
    let h = harness();

    for account in h.auth.authenticator().accounts() {
        let outcome = h.auth.login(&account.email, &account.password, false).await;

        assert!(outcome.is_success(), "{} should log in", account.email);
        let user = outcome.user().unwrap();
        assert_eq!(user.id, account.id);
        assert_eq!(user.email, account.email);
        assert_eq!(user.display_name, account.display_name);
        assert_eq!(user.role, account.role);
        assert_eq!(h.auth.current_user().as_ref(), Some(user));
    }
}

#[tokio::test]
async fn test_login_admin_scenario() {
    let h = harness();

    let outcome = h.auth.login("admin@yaroma.com", "admin123", false).await;

    let LoginOutcome::Success { user, token, .. } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(user.email, "admin@yaroma.com");
    assert_eq!(user.role, Role::Admin);
    assert!(token.starts_with("tok_"));
    assert_eq!(h.auth.current_user().as_ref(), Some(user));
    assert_eq!(h.auth.token().as_deref(), Some(token.as_str()));

    h.auth.logout().unwrap();
    assert!(h.auth.current_user().is_none());
}

#[tokio::test]
async fn test_login_bad_credentials_writes_nothing() {
    let h = harness();
    let attempts = [
        ("admin@yaroma.com", "wrong"),
        ("nobody@yaroma.com", "admin123"),
        ("", ""),
        ("user@yaroma.com", "admin123"),
    ];

    for (identifier, secret) in attempts {
        for remember in [false, true] {
            let outcome = h.auth.login(identifier, secret, remember).await;
            assert_eq!(
                outcome,
                LoginOutcome::Failure {
                    message: "invalid email or password".into()
                }
            );
            assert!(h.durable.is_empty(), "durable scope must stay empty");
            assert!(h.volatile.is_empty(), "volatile scope must stay empty");
        }
    }
    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn test_login_remembered_goes_to_durable_scope_with_expiry() {
    let h = harness();
    let before = now_ms();

    h.auth.login("user@yaroma.com", "user123", true).await;

    let keys = StorageKeys::default();
    assert!(h.volatile.is_empty());
    assert_eq!(h.durable.get(&keys.remember).as_deref(), Some("true"));
    let expiry: u64 = h.durable.get(&keys.expiry).unwrap().parse().unwrap();
    let thirty_days = 30 * 24 * 60 * 60 * 1000;
    assert!(expiry >= before + thirty_days);
    assert!(expiry <= now_ms() + thirty_days);
}

#[tokio::test]
async fn test_login_not_remembered_goes_to_volatile_scope_without_expiry() {
    let h = harness();

    h.auth.login("user@yaroma.com", "user123", false).await;

    assert!(h.durable.is_empty());
    let SessionState::Authenticated(session) = h.auth.state() else {
        panic!("should be authenticated");
    };
    assert_eq!(session.scope, Scope::Volatile);
    assert_eq!(session.expires_at, None);
}

#[tokio::test]
async fn test_login_overwrites_previous_session() {
    let h = harness();
    h.auth.login("admin@yaroma.com", "admin123", true).await;

    h.auth.login("test@test.com", "test123", false).await;

    assert!(h.durable.is_empty(), "remembered session should be replaced");
    assert_eq!(h.auth.current_user().unwrap().email, "test@test.com");
}

// =========================================================================
// is_authenticated() / expiry
// =========================================================================

#[tokio::test]
async fn test_is_authenticated_remembered_before_and_after_expiry() {
    let h = harness();
    h.auth.login("admin@yaroma.com", "admin123", true).await;
    assert!(h.auth.is_authenticated(), "fresh session should be valid");

    // Move the recorded expiry into the past.
    let keys = StorageKeys::default();
    h.durable.set(&keys.expiry, &(now_ms() - 1_000).to_string()).unwrap();

    assert!(!h.auth.is_authenticated(), "expired session should be rejected");
    assert!(h.durable.is_empty(), "expiry should clear storage");
    assert!(h.auth.current_user().is_none());
}

#[tokio::test]
async fn test_is_authenticated_zero_duration_expires() {
    let h = harness_with(SessionConfig {
        duration: Duration::ZERO,
        ..SessionConfig::default()
    });
    h.auth.login("admin@yaroma.com", "admin123", true).await;

    // Expiry is "now"; any elapsed millisecond makes it stale.
    std::thread::sleep(Duration::from_millis(5));

    assert!(!h.auth.is_authenticated());
    assert!(h.durable.is_empty());
}

#[tokio::test]
async fn test_is_authenticated_volatile_session_never_expires() {
    let h = harness_with(SessionConfig {
        duration: Duration::ZERO,
        ..SessionConfig::default()
    });
    h.auth.login("admin@yaroma.com", "admin123", false).await;

    std::thread::sleep(Duration::from_millis(5));

    assert!(h.auth.is_authenticated());
    assert!(h.auth.is_authenticated(), "check must be repeatable");
}

#[tokio::test]
async fn test_is_authenticated_requires_token() {
    let h = harness();
    h.auth.login("admin@yaroma.com", "admin123", false).await;
    h.volatile.remove(&StorageKeys::default().token).unwrap();

    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn test_is_authenticated_unparseable_user_is_anonymous() {
    let h = harness();
    let keys = StorageKeys::default();
    h.volatile.set(&keys.user, "not json at all").unwrap();
    h.volatile.set(&keys.token, "tok_x").unwrap();

    assert!(!h.auth.is_authenticated());
    assert!(h.auth.current_user().is_none());
    assert!(matches!(h.auth.require_auth(), Err(SessionError::NotAuthenticated)));
}

// =========================================================================
// logout()
// =========================================================================

#[tokio::test]
async fn test_logout_always_leaves_anonymous() {
    // From every reachable starting state.
    for start in ["anonymous", "volatile", "durable"] {
        let h = harness();
        match start {
            "volatile" => {
                h.auth.login("user@yaroma.com", "user123", false).await;
            }
            "durable" => {
                h.auth.login("user@yaroma.com", "user123", true).await;
            }
            _ => {}
        }

        h.auth.logout().unwrap();

        assert!(!h.auth.is_authenticated(), "after logout from {start}");
        assert_eq!(h.auth.state(), SessionState::Anonymous);
        assert!(h.auth.token().is_none());
    }
}

// =========================================================================
// signup() / update_user()
// =========================================================================

#[tokio::test]
async fn test_signup_then_login_with_new_account() {
    let h = harness();

    let outcome = h
        .auth
        .signup(NewAccount {
            email: "fatou@yaroma.com".into(),
            password: "s3cret".into(),
            display_name: "Fatou".into(),
        })
        .await;
    assert!(outcome.is_success());
    assert_eq!(outcome.user().unwrap().id, 4);
    assert!(h.durable.is_empty(), "signup sessions are never remembered");
    assert!(h.auth.is_authenticated());

    h.auth.logout().unwrap();
    assert!(h.auth.login("fatou@yaroma.com", "s3cret", false).await.is_success());
}

#[tokio::test]
async fn test_signup_existing_email_fails_without_session() {
    let h = harness();

    let outcome = h
        .auth
        .signup(NewAccount {
            email: "admin@yaroma.com".into(),
            password: "x".into(),
            display_name: "Impostor".into(),
        })
        .await;

    assert_eq!(outcome.message(), "email already in use");
    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn test_update_user_keeps_session_valid() {
    let h = harness();
    h.auth.login("admin@yaroma.com", "admin123", true).await;

    h.auth
        .update_user(ProfileUpdate {
            display_name: Some("Chef de stock".into()),
            avatar: Some("avatars/1.png".into()),
            ..ProfileUpdate::default()
        })
        .unwrap();

    let user = h.auth.require_auth().unwrap();
    assert_eq!(user.display_name, "Chef de stock");
    assert_eq!(user.avatar.as_deref(), Some("avatars/1.png"));
    assert_eq!(user.email, "admin@yaroma.com");
    assert!(h.volatile.is_empty());
}

#[tokio::test]
async fn test_update_user_without_session_is_noop() {
    let h = harness();

    h.auth
        .update_user(ProfileUpdate {
            email: Some("ghost@yaroma.com".into()),
            ..ProfileUpdate::default()
        })
        .unwrap();

    assert!(h.durable.is_empty());
    assert!(h.volatile.is_empty());
}

// =========================================================================
// Authenticator hooks
// =========================================================================

/// Wraps the seed accounts and records the lifecycle hooks it receives.
#[derive(Default)]
struct Recording {
    accounts: TestAccounts,
    events: std::sync::Mutex<Vec<String>>,
}

impl Authenticator for Recording {
    async fn verify(&self, identifier: &str, secret: &str) -> Result<Verified, SessionError> {
        self.accounts.verify(identifier, secret).await
    }

    fn on_login(&self, remember: bool) {
        self.events.lock().unwrap().push(format!("login remember={remember}"));
    }

    fn on_logout(&self) {
        self.events.lock().unwrap().push("logout".to_string());
    }
}

#[tokio::test]
async fn test_hooks_follow_login_logout_and_expiry() {
    let durable = Arc::new(MemoryStore::new());
    let volatile = Arc::new(MemoryStore::new());
    let config = SessionConfig::default();
    let store = SessionStore::new(durable.clone(), volatile, config.keys.clone());
    let auth = AuthService::new(Recording::default(), store, config.clone());

    auth.login("user@yaroma.com", "user123", false).await;
    auth.login("user@yaroma.com", "wrong", false).await;
    auth.logout().unwrap();
    auth.login("user@yaroma.com", "user123", true).await;
    durable.set(&config.keys.expiry, "1").unwrap();
    assert!(!auth.is_authenticated());

    let events = auth.authenticator().events.lock().unwrap().clone();
    assert_eq!(
        events,
        ["login remember=false", "logout", "login remember=true", "logout"]
    );
}
