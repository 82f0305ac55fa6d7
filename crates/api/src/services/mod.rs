//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Credential store, session tokens and the account service
//! - `stores` - Ownership-scoped store management and the public catalog

pub mod auth;
pub mod stores;

pub use auth::{AccountService, AuthError, CredentialStore, PasswordHasher, TokenService};
pub use stores::{SaveOutcome, StoreError, StoreService};
