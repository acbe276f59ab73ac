//! Client-side session management for Yaroma.
//!
//! This crate handles who is logged in:
//!
//! 1. **Authentication** — checking credentials ([`Authenticator`] trait,
//!    [`TestAccounts`] for development)
//! 2. **Session storage** — two scopes, durable and volatile
//!    ([`KeyValueStore`], [`SessionStore`])
//! 3. **Session lifecycle** — login, signup, logout and expiry
//!    ([`AuthService`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Domain services (above)  ← ask whether someone is logged in
//!     ↕
//! Session layer (this crate)  ← user identity and session storage
//!     ↕
//! Storage (below)  ← MemoryStore / JsonFileStore
//! ```

mod auth;
mod error;
mod service;
mod session;
mod store;

pub use auth::{Account, Authenticator, NewAccount, TestAccounts, Verified};
pub use error::SessionError;
pub use service::{AuthService, LoginOutcome};
pub use session::{
    ProfileUpdate, Role, Scope, Session, SessionConfig, SessionState,
    SessionStore, StorageKeys, UserProfile,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
