//! Credential Issuer: registration, login and the password-reset exchange.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use sweetshop_core::{AccountId, DomainError, DomainResult};

use crate::{Account, CredentialStore, PasswordHasher, ResetNotifier, Role, TokenSigner};

/// Response text for every reset request, whether or not the email is known.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the email exists, a reset link has been sent. (Check Inbox or Spam)";

const RESET_SUBJECT: &str = "Password Reset - Sweet Shop";
const DEFAULT_RESET_LINK_BASE: &str = "http://localhost:5173/reset-password";

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub role: Role,
    pub display_name: String,
}

pub struct CredentialIssuer {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<TokenSigner>,
    notifier: Arc<dyn ResetNotifier>,
    reset_link_base: String,
}

impl CredentialIssuer {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<TokenSigner>,
        notifier: Arc<dyn ResetNotifier>,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
            notifier,
            reset_link_base: DEFAULT_RESET_LINK_BASE.to_string(),
        }
    }

    /// URL prefix the reset token is appended to in the notice body.
    pub fn with_reset_link_base(mut self, base: impl Into<String>) -> Self {
        self.reset_link_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Register a new account and return the role it was given.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> DomainResult<Role> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(DomainError::validation("All fields are required."));
        }

        let role = Role::normalize(role);

        if self.store.find_by_email(email).await?.is_some() {
            return Err(DomainError::conflict("User already exists."));
        }

        let password_hash = self.hash(password).await?;
        self.store
            .insert(Account::new(email, password_hash, role, name))
            .await?;

        info!(%role, "registered account");
        Ok(role)
    }

    /// Verify credentials and the requested role, then issue a session token.
    ///
    /// Unknown email and wrong password produce the same error.
    #[instrument(skip_all, fields(email = %email, requested_role = %role))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<LoginSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() || role.trim().is_empty() {
            return Err(DomainError::validation("Email, password, and role are required."));
        }

        let Some(account) = self.store.find_by_email(email).await? else {
            info!("login rejected: unknown email");
            return Err(DomainError::unauthenticated("Invalid credentials."));
        };

        if !self.verify(password, &account.password_hash).await? {
            info!("login rejected: password mismatch");
            return Err(DomainError::unauthenticated("Invalid credentials."));
        }

        if !account.role.matches(role) {
            info!(stored_role = %account.role, "login rejected: role mismatch");
            return Err(DomainError::forbidden(format!(
                "Access denied. You are not a {}.",
                role.trim()
            )));
        }

        let issued = self.signer.issue_session(account.id, account.role, now)?;
        info!(account_id = %account.id, "login succeeded");

        Ok(LoginSession {
            token: issued.token,
            expires_at: issued.expires_at,
            role: account.role,
            display_name: account.display_name,
        })
    }

    /// Issue a reset token and hand it to the notifier, if the account exists.
    ///
    /// The outcome is the same for known and unknown emails; only storage and
    /// signing failures are reported.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn request_password_reset(&self, email: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("Email is required."));
        }

        let Some(account) = self.store.find_by_email(email).await? else {
            info!("reset requested for unknown email");
            return Ok(());
        };

        let issued = self.signer.issue_reset(account.id, now)?;
        let link = format!("{}/{}", self.reset_link_base, issued.token);
        let body = reset_notice_body(&account.display_name, &link);

        match self.notifier.notify(&account.email, RESET_SUBJECT, &body).await {
            Ok(()) => info!(account_id = %account.id, "reset notice sent"),
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "reset notice delivery failed");
                tracing::debug!(%link, "undelivered reset link");
            }
        }

        Ok(())
    }

    /// Exchange a reset token for a new password hash.
    ///
    /// The token is not consumed: it stays redeemable until it expires.
    #[instrument(skip_all)]
    pub async fn complete_password_reset(
        &self,
        reset_token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if new_password.is_empty() {
            return Err(DomainError::validation("New password is required."));
        }

        let account_id: AccountId = self.signer.verify_reset(reset_token, now).map_err(|e| {
            info!(error = %e, "reset token rejected");
            DomainError::validation("Invalid or expired reset token.")
        })?;

        let password_hash = self.hash(new_password).await?;
        if !self.store.update_password_hash(account_id, password_hash).await? {
            return Err(DomainError::validation("Invalid or expired reset token."));
        }

        info!(%account_id, "password updated");
        Ok(())
    }

    async fn hash(&self, password: &str) -> DomainResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("hashing task failed: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> DomainResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("verification task failed: {e}")))
    }
}

fn reset_notice_body(display_name: &str, link: &str) -> String {
    format!(
        "Hello {display_name},\n\n\
         Use the link below to reset your Sweet Shop password. It expires in {} minutes.\n\n\
         {link}\n\n\
         If you didn't request this, ignore this email.\n",
        TokenSigner::RESET_TTL_MINUTES
    )
}
