//! Authentication hook for validating user credentials.
//!
//! The session layer doesn't decide who a user is; an [`Authenticator`]
//! does. Two implementations exist:
//!
//! - [`TestAccounts`] (here) — a fixed in-memory account list, for
//!   development and demos
//! - `RpcAuthenticator` (in `yaroma-rpc`) — delegates to the remote server
//!
//! The [`AuthService`](crate::AuthService) is generic over the trait, so
//! swapping one for the other never touches session code.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::{Role, SessionError, UserProfile};

/// The result of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub profile: UserProfile,
    /// A token issued by the backend, if it issues one. When `None`
    /// the session layer generates its own.
    pub token: Option<String>,
}

/// Data for creating a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Validates credentials and returns the user's identity.
///
/// # Trait bounds
///
/// - `Send + Sync` → the authenticator can be shared across async tasks.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the service that owns it.
///
/// # Example
///
/// ```rust
/// use yaroma_session::{Authenticator, Role, SessionError, UserProfile, Verified};
///
/// /// Accepts any password for "guest". Development only!
/// struct GuestAuthenticator;
///
/// impl Authenticator for GuestAuthenticator {
///     async fn verify(&self, identifier: &str, _secret: &str) -> Result<Verified, SessionError> {
///         if identifier != "guest" {
///             return Err(SessionError::AuthFailed("unknown user".into()));
///         }
///         Ok(Verified {
///             profile: UserProfile {
///                 id: 0,
///                 email: "guest@example.com".into(),
///                 display_name: "Guest".into(),
///                 role: Role::User,
///                 avatar: None,
///             },
///             token: None,
///         })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Checks `identifier`/`secret`.
    ///
    /// # Returns
    /// - `Ok(Verified)` — the credentials are good, here's who they are
    /// - `Err(SessionError::AuthFailed)` — bad credentials or backend failure
    fn verify(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<Verified, SessionError>> + Send;

    /// Creates an account and returns its profile.
    ///
    /// Backends that can't create accounts keep the default, which fails
    /// with [`SessionError::Unsupported`].
    fn register(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<UserProfile, SessionError>> + Send {
        let _ = account;
        async { Err(SessionError::Unsupported("signup".to_string())) }
    }

    /// Called once a verified login is saved. `remember` tells whether
    /// the session outlives the process.
    fn on_login(&self, remember: bool) {
        let _ = remember;
    }

    /// Called whenever the session ends: on logout, on expiry, or when a
    /// verified login could not be saved.
    fn on_logout(&self) {}
}

// ---------------------------------------------------------------------------
// TestAccounts
// ---------------------------------------------------------------------------

/// An account known to [`TestAccounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
}

impl Account {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            avatar: None,
        }
    }
}

/// An in-memory account list.
///
/// Starts from a seed set; [`register`](Authenticator::register) appends
/// to it for the lifetime of the value. Nothing is persisted.
#[derive(Debug)]
pub struct TestAccounts {
    accounts: Mutex<Vec<Account>>,
}

impl TestAccounts {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    /// The three built-in development accounts.
    pub fn seeded() -> Self {
        let seed = [
            (1, "admin@yaroma.com", "admin123", "Administrateur YAROMA", Role::Admin),
            (2, "user@yaroma.com", "user123", "Utilisateur Test", Role::User),
            (3, "test@test.com", "test123", "Compte Test", Role::User),
        ];
        Self::new(
            seed.into_iter()
                .map(|(id, email, password, name, role)| Account {
                    id,
                    email: email.to_string(),
                    password: password.to_string(),
                    display_name: name.to_string(),
                    role,
                })
                .collect(),
        )
    }

    /// A snapshot of the current account list.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for TestAccounts {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Authenticator for TestAccounts {
    async fn verify(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<Verified, SessionError> {
        // Exact match on both; the first hit wins.
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        accounts
            .iter()
            .find(|a| a.email == identifier && a.password == secret)
            .map(|a| Verified {
                profile: a.profile(),
                token: None,
            })
            .ok_or_else(|| SessionError::AuthFailed("invalid email or password".to_string()))
    }

    async fn register(
        &self,
        account: NewAccount,
    ) -> Result<UserProfile, SessionError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(SessionError::EmailInUse(account.email));
        }

        let created = Account {
            id: accounts.len() as i64 + 1,
            email: account.email,
            password: account.password,
            display_name: account.display_name,
            role: Role::User,
        };
        let profile = created.profile();
        accounts.push(created);
        Ok(profile)
    }
}
