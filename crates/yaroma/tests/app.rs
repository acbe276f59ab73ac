//! End-to-end tests for the `Yaroma` context over a scripted server.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use yaroma::prelude::*;
use yaroma::session::{KeyValueStore, MemoryStore};
use yaroma::transport::MockTransport;
use yaroma_protocol::{AUTHENTICATE_PATH, CALL_KW_PATH};

// =========================================================================
// Helpers
// =========================================================================

/// Knows the service account (`admin`/`admin`, uid 1) and one user
/// (`stock@yaroma.bf`/`pass`, uid 7).
fn server() -> MockTransport {
    MockTransport::new(|path, body| {
        let params = &body["params"];
        Ok(match path {
            AUTHENTICATE_PATH => {
                let grant = match (params["login"].as_str(), params["password"].as_str()) {
                    (Some("admin"), Some("admin")) => json!({"uid": 1, "session_id": "svc"}),
                    (Some("stock@yaroma.bf"), Some("pass")) => {
                        json!({"uid": 7, "session_id": "user-sess"})
                    }
                    _ => json!({"uid": false}),
                };
                json!({"jsonrpc": "2.0", "result": grant})
            }
            CALL_KW_PATH => {
                let result = match params["method"].as_str() {
                    Some("read") => json!([{
                        "id": params["args"][0][0].clone(),
                        "name": "Magasinier",
                        "login": "stock@yaroma.bf",
                        "email": false,
                    }]),
                    Some("search_count") => json!(3),
                    _ => json!([]),
                };
                json!({"jsonrpc": "2.0", "id": body["id"].clone(), "result": result})
            }
            other => panic!("unexpected path {other}"),
        })
    })
}

fn config(mode: Mode) -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = mode;
    config
}

struct Harness {
    transport: MockTransport,
    durable: Arc<MemoryStore>,
    volatile: Arc<MemoryStore>,
    yaroma: Yaroma<MockTransport>,
}

fn harness(config: AppConfig) -> Harness {
    let transport = server();
    let durable = Arc::new(MemoryStore::new());
    let volatile = Arc::new(MemoryStore::new());
    let yaroma = Yaroma::builder(config)
        .durable_store(durable.clone())
        .volatile_store(volatile.clone())
        .build_with_transport(transport.clone())
        .unwrap();
    Harness {
        transport,
        durable,
        volatile,
        yaroma,
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("yaroma-app-{}-{name}.json", std::process::id()))
}

// =========================================================================
// Test mode
// =========================================================================

#[tokio::test]
async fn test_test_mode_login_uses_seed_accounts_without_server() {
    let h = harness(config(Mode::Test));

    let outcome = h.yaroma.login("admin@yaroma.com", "admin123", false).await;

    assert!(outcome.is_success());
    let user = h.yaroma.current_user().unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.email, "admin@yaroma.com");
    assert!(h.transport.requests().is_empty());

    h.yaroma.logout().unwrap();
    assert!(h.yaroma.current_user().is_none());
    assert!(!h.yaroma.is_authenticated());
}

#[tokio::test]
async fn test_test_mode_signup_then_login() {
    let h = harness(config(Mode::Test));

    let outcome = h
        .yaroma
        .signup(NewAccount {
            email: "awa@yaroma.bf".into(),
            password: "pw".into(),
            display_name: "Awa".into(),
        })
        .await;
    assert!(outcome.is_success());
    h.yaroma.logout().unwrap();

    assert!(h.yaroma.login("awa@yaroma.bf", "pw", false).await.is_success());
}

// =========================================================================
// Odoo mode
// =========================================================================

#[tokio::test]
async fn test_odoo_mode_login_delegates_to_server() {
    let h = harness(config(Mode::Odoo));

    let outcome = h.yaroma.login("stock@yaroma.bf", "pass", true).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(outcome.token(), Some("user-sess"));
    let user = h.yaroma.require_auth().unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.email, "stock@yaroma.bf", "email falls back to login");
    assert_eq!(user.display_name, "Magasinier");
    assert_eq!(h.yaroma.client().identity().unwrap().uid, 7);
    assert_eq!(h.durable.get("yaroma_odoo_uid").as_deref(), Some("7"));
    assert!(h.volatile.is_empty());
}

#[tokio::test]
async fn test_odoo_mode_bad_credentials_write_nothing() {
    let h = harness(config(Mode::Odoo));

    let outcome = h.yaroma.login("stock@yaroma.bf", "wrong", true).await;

    assert_eq!(outcome.message(), "invalid credentials");
    assert!(h.durable.is_empty());
    assert!(h.volatile.is_empty());
    assert!(!h.yaroma.client().is_authenticated());
}

#[tokio::test]
async fn test_odoo_mode_signup_is_refused() {
    let h = harness(config(Mode::Odoo));

    let outcome = h
        .yaroma
        .signup(NewAccount {
            email: "x@y.z".into(),
            password: "p".into(),
            display_name: "X".into(),
        })
        .await;

    assert!(!outcome.is_success());
    assert!(outcome.message().contains("not supported"));
}

#[tokio::test]
async fn test_logout_clears_server_identity() {
    let h = harness(config(Mode::Odoo));
    h.yaroma.login("stock@yaroma.bf", "pass", true).await;

    h.yaroma.logout().unwrap();

    assert!(!h.yaroma.client().is_authenticated());
    assert!(h.durable.is_empty(), "session and identity keys are all gone");

    // The next call authenticates again, as the service account.
    h.yaroma.products().get_stats().await.unwrap();
    let auths = h.transport.requests_to(AUTHENTICATE_PATH);
    assert_eq!(auths.last().unwrap().body["params"]["login"], "admin");
}

#[tokio::test]
async fn test_expired_session_clears_server_identity() {
    let h = harness(config(Mode::Odoo));
    assert!(h.yaroma.login("stock@yaroma.bf", "pass", true).await.is_success());
    h.durable.set("yaroma_session_expiry", "1").unwrap();

    assert!(!h.yaroma.is_authenticated());

    assert_eq!(h.yaroma.client().identity(), None);
    assert!(h.durable.get("yaroma_odoo_uid").is_none());
    h.yaroma.products().get_stats().await.unwrap();
    let auths = h.transport.requests_to(AUTHENTICATE_PATH);
    assert_eq!(auths.len(), 2);
    assert_eq!(auths[1].body["params"]["login"], "admin");
}

#[tokio::test]
async fn test_odoo_mode_login_without_remember_caches_nothing() {
    let h = harness(config(Mode::Odoo));

    assert!(h.yaroma.login("stock@yaroma.bf", "pass", false).await.is_success());

    assert_eq!(h.yaroma.client().identity().unwrap().uid, 7);
    assert!(h.durable.is_empty(), "neither session nor identity on disk");
    assert!(h.volatile.get("yaroma_token").is_some());
}

// =========================================================================
// Services and settings
// =========================================================================

#[tokio::test]
async fn test_stats_through_context() {
    let h = harness(config(Mode::Test));

    let stats = h.yaroma.products().get_stats().await.unwrap();

    assert_eq!(
        stats,
        ProductStats {
            total: 3,
            low_stock: 3,
            out_of_stock: 3
        }
    );
    let calls = h.transport.requests_to(CALL_KW_PATH);
    assert_eq!(calls[0].body["params"]["kwargs"]["context"]["lang"], "fr_FR");
}

#[tokio::test]
async fn test_page_and_stock_level_follow_config() {
    let mut config = config(Mode::Test);
    config.pagination.default_limit = 25;
    config.alerts.low_stock_threshold = 50.0;
    let h = harness(config);

    assert_eq!(h.yaroma.page(2), Pagination { limit: Some(25), offset: 50 });
    assert_eq!(h.yaroma.stock_level(30.0), StockLevel::Low);
    assert_eq!(h.yaroma.stock_level(0.0), StockLevel::OutOfStock);
}

#[tokio::test]
async fn test_custom_storage_keys_are_used() {
    let mut config = config(Mode::Test);
    config.session.keys.token = "shop_token".into();
    let h = harness(config);

    h.yaroma.login("user@yaroma.com", "user123", false).await;

    assert!(h.volatile.get("shop_token").is_some());
    assert!(h.volatile.get("yaroma_token").is_none());
}

#[tokio::test]
async fn test_remembered_session_survives_restart_with_file_store() {
    let path = temp_path("restart");
    let _ = std::fs::remove_file(&path);
    let mut config = config(Mode::Test);
    config.session.storage_path = Some(path.clone());

    let first = Yaroma::builder(config.clone())
        .build_with_transport(server())
        .unwrap();
    assert!(first.login("user@yaroma.com", "user123", true).await.is_success());
    drop(first);

    let second = Yaroma::builder(config)
        .build_with_transport(server())
        .unwrap();
    assert!(second.is_authenticated());
    assert_eq!(second.current_user().unwrap().email, "user@yaroma.com");

    second.logout().unwrap();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_build_rejects_bad_url() {
    let mut config = config(Mode::Odoo);
    config.odoo.url = "erp.example.com".into();

    let result = Yaroma::builder(config).build();

    assert!(matches!(result, Err(YaromaError::Transport(_))));
}
