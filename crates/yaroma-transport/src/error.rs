/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, TLS, reset).
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint URL is not an absolute http(s) URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}
