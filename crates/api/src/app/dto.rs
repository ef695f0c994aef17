use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sweetshop_auth::Role;
use sweetshop_core::{DomainError, DomainResult};
use sweetshop_inventory::{InventoryItem, ItemPatch, NewItem};

// -------------------------
// Request DTOs
// -------------------------
//
// Text fields default to empty so that a missing field reaches the domain
// validation (and its message) instead of failing JSON extraction.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// `price` and `quantity` accept JSON numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateItemRequest {
    pub name: String,
    pub category: String,
    pub price: Option<Value>,
    pub quantity: Option<Value>,
}

impl CreateItemRequest {
    pub fn into_new_item(self) -> DomainResult<NewItem> {
        let price = match &self.price {
            Some(raw) => parse_decimal("price", raw)?,
            None => return Err(DomainError::validation("price is required")),
        };
        let quantity = self
            .quantity
            .as_ref()
            .map(|raw| parse_integer("quantity", raw))
            .transpose()?
            .unwrap_or(0);

        Ok(NewItem::new(self.name, self.category, price).with_quantity(quantity))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Value>,
    pub quantity: Option<Value>,
}

impl UpdateItemRequest {
    pub fn into_patch(self) -> DomainResult<ItemPatch> {
        Ok(ItemPatch {
            name: self.name,
            category: self.category,
            price: self.price.as_ref().map(|raw| parse_decimal("price", raw)).transpose()?,
            quantity: self
                .quantity
                .as_ref()
                .map(|raw| parse_integer("quantity", raw))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RestockRequest {
    pub amount: Option<Value>,
}

impl RestockRequest {
    pub fn amount(&self) -> DomainResult<i64> {
        match &self.amount {
            Some(raw) => parse_integer("amount", raw),
            None => Err(DomainError::validation("amount is required")),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub message: &'static str,
    pub item: InventoryItem,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub role: Role,
    pub name: String,
}

// -------------------------
// Numeric field parsing
// -------------------------

fn parse_decimal(field: &str, raw: &Value) -> DomainResult<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(DomainError::validation(format!("{field} must be a number"))),
    };
    Decimal::from_str(&text).map_err(|_| DomainError::validation(format!("{field} must be a number")))
}

fn parse_integer(field: &str, raw: &Value) -> DomainResult<i64> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DomainError::validation(format!("{field} must be an integer")))
}
