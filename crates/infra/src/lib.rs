//! Infrastructure layer: storage adapters, mail delivery, configuration and
//! the mutation dispatcher that fronts the inventory ledger.

pub mod command_dispatcher;
pub mod config;
pub mod notifier;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use command_dispatcher::{Access, DispatchOutcome, MutationDispatcher, required_access};
pub use config::{AppConfig, ConfigError, DatabaseConfig, SmtpConfig};
pub use notifier::{LogNotifier, SmtpNotifier};
pub use store::{InMemoryCredentialStore, InMemoryItemStore, PostgresCredentialStore, PostgresItemStore};
