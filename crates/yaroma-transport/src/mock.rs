//! In-memory transport for tests.
//!
//! A [`MockTransport`] hands every request to a responder closure and
//! records what was sent, so tests can assert on the exact envelopes the
//! client produced without a server.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::{Transport, TransportError};

type Responder =
    dyn Fn(&str, &Value) -> Result<Value, TransportError> + Send + Sync;

/// One request seen by a [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

/// A [`Transport`] that answers from a closure instead of the network.
///
/// Cloning shares the request log, so a test can keep a handle after
/// moving the transport into a client.
#[derive(Clone)]
pub struct MockTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Creates a transport that calls `responder(path, body)` for every
    /// request and serializes whatever it returns.
    pub fn new(
        responder: impl Fn(&str, &Value) -> Result<Value, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the requests sent to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Transport for MockTransport {
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let body: Value = serde_json::from_slice(&body)
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                path: path.to_string(),
                body: body.clone(),
            });

        let reply = (self.responder)(path, &body)?;
        serde_json::to_vec(&reply)
            .map_err(|e| TransportError::RequestFailed(e.to_string()))
    }
}
