use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound channel for password-reset notices.
///
/// Failures are reported to the caller, which logs and suppresses them: a
/// reset request never fails because mail could not be delivered.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}
