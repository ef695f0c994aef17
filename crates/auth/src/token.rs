//! HS256 signing and verification for session and password-reset tokens.
//!
//! Tokens are stateless: nothing is recorded server-side, so expiry is the only
//! way a token stops working.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use sweetshop_core::{AccountId, DomainError};

use crate::claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
use crate::{Identity, Role};

/// Shortest secret accepted for HMAC signing.
pub const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("token is malformed or its signature is invalid: {0}")]
    Invalid(String),

    #[error("token kind mismatch: expected {expected:?}, got {actual:?}")]
    WrongKind { expected: TokenKind, actual: TokenKind },

    #[error("session token carries no role")]
    MissingRole,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Signing(msg) => DomainError::internal(msg),
            TokenError::WeakSecret => DomainError::internal(value.to_string()),
            other => DomainError::unauthenticated(other.to_string()),
        }
    }
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with one process-wide HMAC secret.
///
/// There is deliberately no `Default`: the secret must come from configuration.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenSigner {
    /// Lifetime of a session token.
    pub const SESSION_TTL_MINUTES: i64 = 120;
    /// Lifetime of a password-reset token.
    pub const RESET_TTL_MINUTES: i64 = 15;

    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            session_ttl: Duration::minutes(Self::SESSION_TTL_MINUTES),
            reset_ttl: Duration::minutes(Self::RESET_TTL_MINUTES),
        })
    }

    pub fn issue_session(
        &self,
        subject: AccountId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenKind::Session, Some(role), self.session_ttl, now)
    }

    pub fn issue_reset(&self, subject: AccountId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenKind::PasswordReset, None, self.reset_ttl, now)
    }

    /// Verify a session token and return the identity it carries.
    pub fn verify_session(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let claims = self.verify(token, TokenKind::Session, now)?;
        let role = claims.role.ok_or(TokenError::MissingRole)?;
        Ok(Identity::new(claims.sub, role))
    }

    /// Verify a password-reset token and return the account it targets.
    pub fn verify_reset(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, TokenError> {
        Ok(self.verify(token, TokenKind::PasswordReset, now)?.sub)
    }

    fn issue(
        &self,
        subject: AccountId,
        kind: TokenKind,
        role: Option<Role>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        // Claims carry whole seconds; truncate so `exp - iat` is exactly the TTL.
        let iat = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let claims = TokenClaims {
            sub: subject,
            kind,
            role,
            iat,
            exp: iat + ttl,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }

    fn verify(&self, token: &str, expected: TokenKind, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        // Expiry is judged by `validate_claims` against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;
        let claims = data.claims;

        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

impl core::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("session_ttl", &self.session_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish_non_exhaustive()
    }
}
