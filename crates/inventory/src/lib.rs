//! Inventory domain module.
//!
//! Business rules for the catalog (validation, the ledger's operations) are
//! kept here; the atomic check-and-modify steps are delegated to an
//! [`ItemStore`] implementation.

pub mod command;
pub mod item;
pub mod ledger;
pub mod store;

pub use command::{InventoryCommand, Operation};
pub use item::{InventoryItem, ItemPatch, NewItem};
pub use ledger::InventoryLedger;
pub use store::{ItemStore, PurchaseOutcome};
