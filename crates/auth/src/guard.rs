//! Access Guard: bearer token → authenticated identity.
//!
//! - No IO
//! - No shared mutable state (verification is a pure computation)

use std::sync::Arc;

use chrono::{DateTime, Utc};

use sweetshop_core::{DomainError, DomainResult};

use crate::{Identity, Role, TokenSigner};

#[derive(Debug, Clone)]
pub struct AccessGuard {
    signer: Arc<TokenSigner>,
}

impl AccessGuard {
    pub fn new(signer: Arc<TokenSigner>) -> Self {
        Self { signer }
    }

    /// Authenticate the raw value of an `Authorization` header.
    pub fn authenticate(&self, authorization: Option<&str>, now: DateTime<Utc>) -> DomainResult<Identity> {
        let token = extract_bearer(authorization)?;
        self.signer.verify_session(token, now).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            DomainError::unauthenticated("invalid or expired token")
        })
    }
}

/// Pull the token out of `Bearer <token>`. The scheme is case-insensitive.
pub fn extract_bearer(header: Option<&str>) -> DomainResult<&str> {
    let header = header.ok_or_else(|| DomainError::unauthenticated("missing bearer token"))?;

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| DomainError::unauthenticated("missing bearer token"))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(DomainError::unauthenticated("missing bearer token"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(DomainError::unauthenticated("missing bearer token"));
    }

    Ok(token)
}

/// Composable "require role X" check, applied after `authenticate`.
pub fn require_role(identity: &Identity, required: Role) -> DomainResult<()> {
    if identity.role == required {
        Ok(())
    } else {
        Err(DomainError::forbidden(format!("{required} role required")))
    }
}
