//! Error types for the session layer.

/// Errors that can occur during authentication and session bookkeeping.
///
/// Bad credentials are *not* surfaced through this type by
/// [`AuthService::login`](crate::AuthService::login); they come back as a
/// [`LoginOutcome::Failure`](crate::LoginOutcome::Failure) so the caller can
/// show the message directly.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The authenticator rejected the credentials, or the backend it
    /// delegates to failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// An account with this email already exists.
    #[error("email already in use: {0}")]
    EmailInUse(String),

    /// The authenticator doesn't support the requested operation
    /// (e.g. signup against a remote server).
    #[error("{0} is not supported by this backend")]
    Unsupported(String),

    /// No valid session is stored.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Reading or writing a storage scope failed.
    #[error("storage error: {0}")]
    Storage(String),
}
