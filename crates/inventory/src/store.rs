use async_trait::async_trait;

use sweetshop_core::{DomainResult, ItemId};

use crate::item::{InventoryItem, ItemPatch};

/// Result of an atomic conditional decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Quantity was at least 1 and has been reduced by exactly 1.
    Purchased(InventoryItem),
    /// The item exists but its quantity is 0. Nothing changed.
    OutOfStock,
    /// No item with that id.
    Missing,
}

/// Persistence port for catalog items.
///
/// Implementations must make [`ItemStore::increment_quantity`] and
/// [`ItemStore::decrement_if_in_stock`] atomic with respect to each other and
/// to every other mutation of the same item: concurrent callers never lose an
/// update and never observe a negative quantity.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items, in a stable order (creation order).
    async fn list(&self) -> DomainResult<Vec<InventoryItem>>;

    async fn get(&self, id: ItemId) -> DomainResult<Option<InventoryItem>>;

    /// Persist a new item and return it as stored.
    async fn insert(&self, item: InventoryItem) -> DomainResult<InventoryItem>;

    /// Overwrite the provided fields. `None` when the item does not exist.
    async fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> DomainResult<Option<InventoryItem>>;

    /// Add `amount` to the quantity. `None` when the item does not exist.
    ///
    /// Fails with a validation error if the sum would overflow.
    async fn increment_quantity(&self, id: ItemId, amount: i64) -> DomainResult<Option<InventoryItem>>;

    /// Reduce the quantity by one if and only if it is at least one.
    async fn decrement_if_in_stock(&self, id: ItemId) -> DomainResult<PurchaseOutcome>;

    /// Remove the item. `false` when it did not exist.
    async fn delete(&self, id: ItemId) -> DomainResult<bool>;
}
