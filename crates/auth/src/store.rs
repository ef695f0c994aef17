use async_trait::async_trait;

use sweetshop_core::{AccountId, DomainResult};

use crate::Account;

/// Account persistence port.
///
/// Backend failures surface as `DomainError::Internal`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>>;

    /// Fails with `DomainError::Conflict` when the email is already registered.
    /// Uniqueness must hold even for concurrent inserts.
    async fn insert(&self, account: Account) -> DomainResult<()>;

    /// Replace the stored hash. Returns `false` when no account has `id`.
    async fn update_password_hash(&self, id: AccountId, password_hash: String) -> DomainResult<bool>;
}
