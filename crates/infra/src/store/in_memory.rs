use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use sweetshop_auth::{Account, CredentialStore};
use sweetshop_core::{AccountId, DomainError, DomainResult, ItemId};
use sweetshop_inventory::{InventoryItem, ItemPatch, ItemStore, PurchaseOutcome};

fn poisoned() -> DomainError {
    DomainError::internal("lock poisoned")
}

/// In-memory item store.
///
/// Intended for tests/dev. Every check-and-modify runs under a single write
/// lock, so stock changes are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    // Insertion order doubles as the listing order.
    items: RwLock<Vec<InventoryItem>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self) -> DomainResult<Vec<InventoryItem>> {
        Ok(self.items.read().map_err(|_| poisoned())?.clone())
    }

    async fn get(&self, id: ItemId) -> DomainResult<Option<InventoryItem>> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, item: InventoryItem) -> DomainResult<InventoryItem> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        if items.iter().any(|i| i.id == item.id) {
            return Err(DomainError::conflict(format!("item {} already exists", item.id)));
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> DomainResult<Option<InventoryItem>> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        Ok(items.iter_mut().find(|i| i.id == id).map(|item| {
            patch.apply_to(item);
            item.clone()
        }))
    }

    async fn increment_quantity(&self, id: ItemId, amount: i64) -> DomainResult<Option<InventoryItem>> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        item.quantity = item
            .quantity
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("restock amount too large"))?;
        Ok(Some(item.clone()))
    }

    async fn decrement_if_in_stock(&self, id: ItemId) -> DomainResult<PurchaseOutcome> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(PurchaseOutcome::Missing);
        };
        if item.quantity <= 0 {
            return Ok(PurchaseOutcome::OutOfStock);
        }
        item.quantity -= 1;
        Ok(PurchaseOutcome::Purchased(item.clone()))
    }

    async fn delete(&self, id: ItemId) -> DomainResult<bool> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }
}

/// In-memory account store keyed by id, with an email index.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Accounts>,
}

#[derive(Debug, Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    by_email: HashMap<String, AccountId>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|a| a.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let accounts = self.inner.read().map_err(|_| poisoned())?;
        Ok(accounts
            .by_email
            .get(email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn insert(&self, account: Account) -> DomainResult<()> {
        let mut accounts = self.inner.write().map_err(|_| poisoned())?;
        if accounts.by_email.contains_key(&account.email) {
            return Err(DomainError::conflict("User already exists."));
        }
        accounts.by_email.insert(account.email.clone(), account.id);
        accounts.by_id.insert(account.id, account);
        Ok(())
    }

    async fn update_password_hash(&self, id: AccountId, password_hash: String) -> DomainResult<bool> {
        let mut accounts = self.inner.write().map_err(|_| poisoned())?;
        match accounts.by_id.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
