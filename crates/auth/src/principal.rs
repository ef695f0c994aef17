use serde::{Deserialize, Serialize};

use sweetshop_core::AccountId;

use crate::Role;

/// Authenticated caller, as decoded from a verified session token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: AccountId,
    pub role: Role,
}

impl Identity {
    pub fn new(subject_id: AccountId, role: Role) -> Self {
        Self { subject_id, role }
    }
}
