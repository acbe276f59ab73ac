//! HTTP transport implementation using `reqwest`.

use reqwest::header::CONTENT_TYPE;

use crate::{Transport, TransportError};

/// An HTTP [`Transport`] bound to one server base URL.
///
/// The underlying client keeps cookies, which is how the server ties
/// `call_kw` requests to the session opened by `/web/session/authenticate`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport for the server at `base_url`
    /// (e.g. `http://192.168.1.10:8069`). A trailing slash is ignored.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        tracing::debug!(base_url, "HTTP transport ready");
        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    /// Returns the base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "non-success HTTP status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let t = HttpTransport::new("http://localhost:8069/").unwrap();
        assert_eq!(t.base_url(), "http://localhost:8069");
    }

    #[test]
    fn test_new_rejects_relative_url() {
        let result = HttpTransport::new("localhost:8069");
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_accepts_https() {
        assert!(HttpTransport::new("https://erp.example.com").is_ok());
    }
}
