use core::str::FromStr;

use serde::{Deserialize, Serialize};

use sweetshop_core::DomainError;

/// Coarse permission tier, fixed per account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Registration-time normalisation: anything other than a case-insensitive
    /// `admin` (including no value at all) becomes `user`.
    pub fn normalize(requested: Option<&str>) -> Self {
        match requested {
            Some(r) if r.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    /// Case-insensitive match against a caller-supplied role name.
    pub fn matches(&self, requested: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(requested.trim())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
