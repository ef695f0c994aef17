use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use sweetshop_core::{DomainError, DomainResult, ItemId};

/// A catalog item.
///
/// # Invariants
/// - `name` and `category` are non-empty (after trimming).
/// - `price >= 0`, with at most two decimal places.
/// - `quantity >= 0`, at every observable point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
}

/// Input for creating an item. Validated by [`NewItem::into_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
}

impl NewItem {
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            quantity: 0,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Validate and assign a fresh id.
    pub fn into_item(self) -> DomainResult<InventoryItem> {
        let name = non_empty("name", &self.name)?;
        let category = non_empty("category", &self.category)?;
        ensure_price(self.price)?;
        ensure_quantity(self.quantity)?;

        Ok(InventoryItem {
            id: ItemId::new(),
            name,
            category,
            price: self.price,
            quantity: self.quantity,
        })
    }
}

/// Partial field overwrite. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.price.is_none() && self.quantity.is_none()
    }

    /// Check provided fields against the item invariants and normalise text fields.
    pub fn validated(self) -> DomainResult<Self> {
        let name = self.name.as_deref().map(|n| non_empty("name", n)).transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|c| non_empty("category", c))
            .transpose()?;
        if let Some(price) = self.price {
            ensure_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            ensure_quantity(quantity)?;
        }

        Ok(Self {
            name,
            category,
            price: self.price,
            quantity: self.quantity,
        })
    }

    /// Overwrite the provided fields on `item`. Call on a validated patch.
    pub fn apply_to(&self, item: &mut InventoryItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(quantity) = self.quantity {
            item.quantity = quantity;
        }
    }
}

fn non_empty(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Most decimal places a price may carry. Storage keeps exactly this many.
const PRICE_SCALE: u32 = 2;

fn ensure_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(DomainError::validation(format!(
            "price must have at most {PRICE_SCALE} decimal places"
        )));
    }
    Ok(())
}

fn ensure_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity must be a non-negative integer"));
    }
    Ok(())
}
