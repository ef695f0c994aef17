//! `sweetshop-auth` — credentials, session tokens and role enforcement.
//!
//! This crate is intentionally decoupled from HTTP and storage: persistence,
//! password hashing and mail delivery are reached through the ports declared
//! here and implemented by adapters elsewhere.

pub mod account;
pub mod claims;
pub mod guard;
pub mod issuer;
pub mod notifier;
pub mod password;
pub mod principal;
pub mod roles;
pub mod store;
pub mod token;

pub use account::Account;
pub use claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
pub use guard::{AccessGuard, extract_bearer, require_role};
pub use issuer::{CredentialIssuer, LoginSession, RESET_REQUESTED_MESSAGE};
pub use notifier::{NotifyError, ResetNotifier};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use principal::Identity;
pub use roles::Role;
pub use store::CredentialStore;
pub use token::{IssuedToken, TokenError, TokenSigner};
