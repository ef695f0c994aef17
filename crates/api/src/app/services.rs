//! Service wiring: stores, token signer, notifier, issuer and dispatcher.
//!
//! Backend selection:
//! - `DATABASE_URL` set: Postgres stores (schema is bootstrapped on connect)
//! - otherwise: in-memory stores (state is lost on restart)

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use sweetshop_auth::{
    AccessGuard, Argon2PasswordHasher, CredentialIssuer, CredentialStore, ResetNotifier, TokenError, TokenSigner,
};
use sweetshop_infra::store::{self, InMemoryCredentialStore, InMemoryItemStore, PostgresCredentialStore, PostgresItemStore};
use sweetshop_infra::{AppConfig, LogNotifier, MutationDispatcher, SmtpNotifier};
use sweetshop_inventory::{InventoryLedger, ItemStore};

pub struct AppServices {
    pub issuer: CredentialIssuer,
    pub dispatcher: MutationDispatcher,
    pub guard: AccessGuard,
}

impl AppServices {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        items: Arc<dyn ItemStore>,
        signer: Arc<TokenSigner>,
        notifier: Arc<dyn ResetNotifier>,
        reset_link_base: &str,
    ) -> Self {
        let issuer = CredentialIssuer::new(credentials, Arc::new(Argon2PasswordHasher::new()), signer.clone(), notifier)
            .with_reset_link_base(reset_link_base);

        Self {
            issuer,
            dispatcher: MutationDispatcher::new(InventoryLedger::new(items)),
            guard: AccessGuard::new(signer),
        }
    }

    /// In-memory stores with the default reset link base.
    pub fn in_memory(jwt_secret: &[u8], notifier: Arc<dyn ResetNotifier>) -> Result<Self, TokenError> {
        let signer = Arc::new(TokenSigner::new(jwt_secret)?);
        Ok(Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryItemStore::new()),
            signer,
            notifier,
            "http://localhost:5173/reset-password",
        ))
    }

    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let signer = Arc::new(TokenSigner::new(config.jwt_secret_bytes()).context("invalid JWT_SECRET")?);

        let (credentials, items): (Arc<dyn CredentialStore>, Arc<dyn ItemStore>) = match &config.database {
            Some(db) => {
                let pool = store::connect(db).await.context("failed to connect to postgres")?;
                (
                    Arc::new(PostgresCredentialStore::new(pool.clone())),
                    Arc::new(PostgresItemStore::new(pool)),
                )
            }
            None => {
                info!("DATABASE_URL not set; using in-memory stores");
                (Arc::new(InMemoryCredentialStore::new()), Arc::new(InMemoryItemStore::new()))
            }
        };

        let notifier: Arc<dyn ResetNotifier> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpNotifier::new(smtp).context("failed to configure SMTP")?),
            None => {
                info!("SMTP_HOST not set; reset notices are logged only");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::new(credentials, items, signer, notifier, &config.reset_link_base))
    }
}
