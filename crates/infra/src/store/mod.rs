//! Storage adapters for the credential and item ports.

mod in_memory;
mod postgres;

pub use in_memory::{InMemoryCredentialStore, InMemoryItemStore};
pub use postgres::{PostgresCredentialStore, PostgresItemStore, connect, ensure_schema};
