use std::sync::Arc;

use tracing::{info, instrument};

use sweetshop_core::{DomainError, DomainResult, ItemId};

use crate::item::{InventoryItem, ItemPatch, NewItem};
use crate::store::{ItemStore, PurchaseOutcome};

pub const OUT_OF_STOCK_MESSAGE: &str = "Out of stock!";

/// Catalog operations. Role checks happen before the ledger is reached.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn ItemStore>,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> DomainResult<Vec<InventoryItem>> {
        self.store.list().await
    }

    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create(&self, input: NewItem) -> DomainResult<InventoryItem> {
        let item = self.store.insert(input.into_item()?).await?;
        info!(item_id = %item.id, quantity = item.quantity, "item created");
        Ok(item)
    }

    #[instrument(skip(self, patch), fields(item_id = %id))]
    pub async fn update_fields(&self, id: ItemId, patch: ItemPatch) -> DomainResult<InventoryItem> {
        let patch = patch.validated()?;
        let item = self
            .store
            .update_fields(id, &patch)
            .await?
            .ok_or_else(|| item_not_found(id))?;
        info!("item updated");
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn restock(&self, id: ItemId, amount: i64) -> DomainResult<InventoryItem> {
        if amount <= 0 {
            return Err(DomainError::validation("restock amount must be a positive integer"));
        }
        let item = self
            .store
            .increment_quantity(id, amount)
            .await?
            .ok_or_else(|| item_not_found(id))?;
        info!(quantity = item.quantity, "item restocked");
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn purchase(&self, id: ItemId) -> DomainResult<InventoryItem> {
        match self.store.decrement_if_in_stock(id).await? {
            PurchaseOutcome::Purchased(item) => {
                info!(quantity = item.quantity, "item purchased");
                Ok(item)
            }
            PurchaseOutcome::OutOfStock => Err(DomainError::conflict(OUT_OF_STOCK_MESSAGE)),
            PurchaseOutcome::Missing => Err(item_not_found(id)),
        }
    }

    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete(&self, id: ItemId) -> DomainResult<()> {
        if !self.store.delete(id).await? {
            return Err(item_not_found(id));
        }
        info!("item deleted");
        Ok(())
    }
}

impl core::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InventoryLedger").finish_non_exhaustive()
    }
}

fn item_not_found(id: ItemId) -> DomainError {
    DomainError::not_found(format!("item {id} not found"))
}
