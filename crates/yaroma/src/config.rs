//! Application settings.
//!
//! [`AppConfig`] is the single settings object: every layer's
//! configuration is derived from it. It deserializes from JSON with every
//! section optional, so a file only needs the values that differ from
//! the defaults.
//!
//! ```json
//! {
//!   "odoo": { "url": "https://erp.example.com", "database": "yaroma",
//!             "username": "stock", "password": "secret" },
//!   "mode": "odoo",
//!   "session": { "duration_secs": 604800, "storage_path": "session.json" },
//!   "alerts": { "low_stock_threshold": 20 }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use yaroma_protocol::CallContext;
use yaroma_rpc::RpcConfig;
use yaroma_session::{SessionConfig, StorageKeys};
use yaroma_stock::StockConfig;

use crate::YaromaError;

/// Where logins are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Built-in development accounts; the server is only used for data.
    Test,
    /// Logins go to the server.
    #[default]
    Odoo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdooSettings {
    pub url: String,
    pub database: String,
    /// Account the client authenticates as until a user logs in.
    pub username: String,
    pub password: String,
}

impl Default for OdooSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8069".to_string(),
            database: "yaroma".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    /// BCP 47 tag, e.g. `fr-FR`.
    pub locale: String,
    pub currency: String,
    pub timezone: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "YAROMA Service".to_string(),
            locale: "fr-FR".to_string(),
            currency: "XOF".to_string(),
            timezone: "Africa/Ouagadougou".to_string(),
        }
    }
}

impl AppSettings {
    /// The server's spelling of the locale: `fr-FR` → `fr_FR`.
    pub fn server_lang(&self) -> String {
        self.locale.replace('-', "_")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Lifetime of a remembered session. Default: 30 days.
    pub duration_secs: u64,
    /// File backing the durable scope. Without one, the durable scope
    /// lives in memory and dies with the process.
    pub storage_path: Option<PathBuf>,
    pub keys: StorageKeys,
    pub uid_key: String,
    pub server_session_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_secs: 30 * 24 * 60 * 60,
            storage_path: None,
            keys: StorageKeys::default(),
            uid_key: "yaroma_odoo_uid".to_string(),
            server_session_key: "yaroma_odoo_session".to_string(),
        }
    }
}

/// Page sizes for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_limit: u32,
    /// Also caps every search the client sends.
    pub max_limit: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub odoo: OdooSettings,
    pub mode: Mode,
    pub app: AppSettings,
    pub session: SessionSettings,
    pub pagination: PaginationSettings,
    pub alerts: StockConfig,
}

impl AppConfig {
    /// Reads a JSON config file.
    ///
    /// # Errors
    /// [`YaromaError::Config`] if the file can't be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, YaromaError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| YaromaError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| YaromaError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(raw: &str) -> Result<Self, YaromaError> {
        serde_json::from_str(raw).map_err(|e| YaromaError::Config(e.to_string()))
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            database: self.odoo.database.clone(),
            username: self.odoo.username.clone(),
            password: self.odoo.password.clone(),
            context: CallContext {
                lang: self.app.server_lang(),
                tz: self.app.timezone.clone(),
            },
            max_limit: self.pagination.max_limit,
            ..RpcConfig::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            duration: Duration::from_secs(self.session.duration_secs),
            keys: self.session.keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_empty_object_is_default() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.mode, Mode::Odoo);
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.alerts.critical_stock_threshold, 5.0);
    }

    #[test]
    fn test_from_json_partial_sections() {
        let config = AppConfig::from_json(
            r#"{"mode": "test", "odoo": {"url": "https://erp.example.com"},
                "session": {"keys": {"token": "custom_token"}}}"#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Test);
        assert_eq!(config.odoo.url, "https://erp.example.com");
        assert_eq!(config.odoo.database, "yaroma");
        assert_eq!(config.session.keys.token, "custom_token");
        assert_eq!(config.session.keys.user, "yaroma_user");
    }

    #[test]
    fn test_from_json_malformed_is_config_error() {
        let result = AppConfig::from_json(r#"{"mode": "staging"}"#);
        assert!(matches!(result, Err(YaromaError::Config(_))));
    }

    #[test]
    fn test_from_file_missing_is_config_error() {
        let result = AppConfig::from_file("/definitely/not/here.json");
        let err = result.unwrap_err();
        assert!(matches!(err, YaromaError::Config(_)));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn test_rpc_config_converts_locale() {
        let mut config = AppConfig::default();
        config.app.locale = "en-US".into();
        config.app.timezone = "UTC".into();

        let rpc = config.rpc_config();

        assert_eq!(rpc.context.lang, "en_US");
        assert_eq!(rpc.context.tz, "UTC");
        assert_eq!(rpc.max_limit, 100);
        assert_eq!(rpc.default_limit, 80);
    }

    #[test]
    fn test_session_config_duration() {
        let mut config = AppConfig::default();
        config.session.duration_secs = 60;
        assert_eq!(config.session_config().duration, Duration::from_secs(60));
    }
}
