use sweetshop_core::AccountId;

use crate::Role;

/// A registered account as held by the credential store.
///
/// `email` is unique and compared exactly as stored. Only `password_hash`
/// ever changes after registration.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub display_name: String,
}

impl Account {
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            display_name: display_name.into(),
        }
    }
}

// Hashes stay out of logs.
impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .finish()
    }
}
