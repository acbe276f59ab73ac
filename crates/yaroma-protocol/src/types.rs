//! JSON-RPC 2.0 envelopes spoken by the Odoo web controllers.
//!
//! Two endpoints are used:
//!
//! ```text
//! POST /web/session/authenticate   {jsonrpc, params: {db, login, password}}
//! POST /web/dataset/call_kw        {jsonrpc, method: "call", params: {model, method, args, kwargs}, id}
//! ```
//!
//! Both answer with `{jsonrpc, id, result}` or `{jsonrpc, id, error}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

/// The only JSON-RPC version the server speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// Path of the session authentication endpoint.
pub const AUTHENTICATE_PATH: &str = "/web/session/authenticate";

/// Path of the generic model/method endpoint.
pub const CALL_KW_PATH: &str = "/web/dataset/call_kw";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier attached to a `call_kw` request.
///
/// The server echoes it back; nothing on our side correlates on it since
/// every request waits for its own response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A JSON-RPC request envelope.
///
/// `method` and `id` are optional because the authentication endpoint is
/// called without them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub params: P,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl RpcRequest<AuthParams> {
    /// Builds the envelope for `/web/session/authenticate`.
    pub fn authenticate(params: AuthParams) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: None,
            params,
            id: None,
        }
    }
}

impl RpcRequest<CallParams> {
    /// Builds the envelope for `/web/dataset/call_kw`.
    pub fn call(params: CallParams, id: RequestId) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: Some("call".to_string()),
            params,
            id: Some(id),
        }
    }
}

/// Parameters of an authentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
    pub db: String,
    pub login: String,
    pub password: String,
}

/// Locale context sent with every model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub lang: String,
    pub tz: String,
}

impl Default for CallContext {
    fn default() -> Self {
        Self {
            lang: "fr_FR".to_string(),
            tz: "Africa/Ouagadougou".to_string(),
        }
    }
}

/// Parameters of a `call_kw` request: which method to run on which model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A JSON-RPC response envelope.
///
/// The server is expected to set exactly one of `result` and `error`,
/// but the client never relies on that: see [`RpcResponse::into_result`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Unwraps the payload.
    ///
    /// An `error` field wins over `result`: a response carrying both is a
    /// failure. A response carrying neither yields `null`.
    pub fn into_result(self) -> Result<Value, RpcErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Rejects responses that announce a JSON-RPC version other than
    /// 2.0. A missing `jsonrpc` member is tolerated.
    pub fn check_version(&self) -> Result<(), ProtocolError> {
        match self.jsonrpc.as_deref() {
            Some(version) if version != JSONRPC_VERSION => Err(ProtocolError::InvalidMessage(
                format!("unsupported jsonrpc version {version:?}"),
            )),
            _ => Ok(()),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Server-side details of an error. `message` is the human-readable
/// reason ("Access Denied", a validation message, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcErrorData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub debug: Option<String>,
}

impl RpcErrorObject {
    /// The most specific non-empty message the server gave, if any:
    /// `data.message` first, then the top-level `message`.
    pub fn remote_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .filter(|m| !m.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()))
    }
}

/// The `result` of a successful authentication.
///
/// `uid` is `false` (not `null`) when the server rejects the
/// credentials without raising, so it is kept as a raw value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthResult {
    #[serde(default)]
    pub uid: Value,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl AuthResult {
    /// Returns the authenticated user id, or `None` if the server did not
    /// grant one (`null`, `false`, zero or a non-integer).
    pub fn uid(&self) -> Option<i64> {
        self.uid.as_i64().filter(|uid| *uid > 0)
    }
}
