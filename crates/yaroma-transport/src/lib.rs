//! Transport abstraction layer for Yaroma.
//!
//! Provides the [`Transport`] trait: POST a JSON body to a path on the
//! remote server and get the raw response bytes back. Everything above
//! this layer (envelopes, authentication, domain services) is written
//! against the trait, so tests can swap the network for a scripted fake.
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTP transport via `reqwest`, with a cookie store
//!   so the server's session cookie survives between calls
//! - `mock` — [`MockTransport`], an in-memory transport for tests

mod error;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;
#[cfg(feature = "mock")]
pub use mock::{MockTransport, RecordedRequest};

use std::future::Future;

/// Sends request bodies to the remote server.
///
/// One call is one request/response exchange. No retry, no timeout:
/// a request that hangs blocks the caller until the peer gives up.
pub trait Transport: Send + Sync + 'static {
    /// Posts `body` (already-encoded JSON) to `path` and returns the
    /// response body.
    ///
    /// `path` is relative to the endpoint the transport was built with,
    /// e.g. `/web/dataset/call_kw`.
    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display_includes_status() {
        let err = TransportError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "server returned HTTP 502: bad gateway");
    }

    #[test]
    fn test_transport_error_display_request_failed() {
        let err = TransportError::RequestFailed("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
