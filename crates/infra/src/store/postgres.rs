//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | DomainError | Scenario |
//! |------------|----------------------|-------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate email |
//! | Database (check constraint violation) | `23514` | `Validation` | Negative price or quantity |
//! | Database (numeric out of range) | `22003` | `Validation` | Restock overflows `bigint`, price too large |
//! | Anything else | Any other | `Internal` | Connection, pool and protocol failures |
//!
//! ## Atomic stock changes
//!
//! Restock and purchase are single `UPDATE ... RETURNING` statements. Purchase
//! carries its stock guard in the `WHERE` clause, so the row lock taken by the
//! update serialises concurrent buyers across every process sharing the
//! database.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{error, info, instrument};
use uuid::Uuid;

use sweetshop_auth::{Account, CredentialStore, Role};
use sweetshop_core::{AccountId, DomainError, DomainResult, ItemId};
use sweetshop_inventory::{InventoryItem, ItemPatch, ItemStore, PurchaseOutcome};

use crate::config::DatabaseConfig;

const ITEM_COLUMNS: &str = "id, name, category, price, quantity";
const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, display_name";

/// Open a pool and make sure the schema exists.
pub async fn connect(config: &DatabaseConfig) -> DomainResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    ensure_schema(&pool).await?;
    info!(max_connections = config.max_connections, "connected to postgres");
    Ok(pool)
}

/// Idempotent schema bootstrap.
pub async fn ensure_schema(pool: &PgPool) -> DomainResult<()> {
    for statement in [
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id            UUID PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role          TEXT NOT NULL CHECK (role IN ('admin', 'user')),
            display_name  TEXT NOT NULL,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS inventory_items (
            id         UUID PRIMARY KEY,
            name       TEXT NOT NULL CHECK (length(btrim(name)) > 0),
            category   TEXT NOT NULL CHECK (length(btrim(category)) > 0),
            price      NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
            quantity   BIGINT NOT NULL DEFAULT 0 CHECK (quantity >= 0),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: ItemId) -> DomainResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM inventory_items WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_exists", e))
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> DomainResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    async fn get(&self, id: ItemId) -> DomainResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn insert(&self, item: InventoryItem) -> DomainResult<InventoryItem> {
        let row = sqlx::query(&format!(
            "INSERT INTO inventory_items (id, name, category, price, quantity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price)
        .bind(item.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        item_from_row(&row)
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    async fn update_fields(&self, id: ItemId, patch: &ItemPatch) -> DomainResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items SET
                name       = COALESCE($2, name),
                category   = COALESCE($3, category),
                price      = COALESCE($4, price),
                quantity   = COALESCE($5, quantity),
                updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.category.as_deref())
        .bind(patch.price)
        .bind(patch.quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn increment_quantity(&self, id: ItemId, amount: i64) -> DomainResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET quantity = quantity + $2, updated_at = now()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("restock_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn decrement_if_in_stock(&self, id: ItemId) -> DomainResult<PurchaseOutcome> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE inventory_items
            SET quantity = quantity - 1, updated_at = now()
            WHERE id = $1 AND quantity > 0
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("purchase_item", e))?;

        match row {
            Some(row) => Ok(PurchaseOutcome::Purchased(item_from_row(&row)?)),
            None if self.exists(id).await? => Ok(PurchaseOutcome::OutOfStock),
            None => Ok(PurchaseOutcome::Missing),
        }
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: ItemId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account_by_email", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert(&self, account: Account) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, role, display_name) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id.as_uuid())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.display_name)
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_account", e) {
            DomainError::Conflict(_) => DomainError::conflict("User already exists."),
            other => other,
        })?;
        Ok(())
    }

    #[instrument(skip(self, password_hash), fields(account_id = %id), err)]
    async fn update_password_hash(&self, id: AccountId, password_hash: String) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_password_hash", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn item_from_row(row: &PgRow) -> DomainResult<InventoryItem> {
    let decode = |e: sqlx::Error| DomainError::internal(format!("failed to decode item row: {e}"));
    Ok(InventoryItem {
        id: ItemId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        price: row.try_get::<Decimal, _>("price").map_err(decode)?,
        quantity: row.try_get("quantity").map_err(decode)?,
    })
}

fn account_from_row(row: &PgRow) -> DomainResult<Account> {
    let decode = |e: sqlx::Error| DomainError::internal(format!("failed to decode account row: {e}"));
    let role: String = row.try_get("role").map_err(decode)?;
    Ok(Account {
        id: AccountId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role: Role::from_str(&role).map_err(|_| DomainError::internal(format!("unknown stored role '{role}'")))?,
        display_name: row.try_get("display_name").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => DomainError::Conflict(msg),
                Some("23514") => DomainError::Validation(msg),
                Some("22003") => DomainError::Validation(msg),
                _ => {
                    error!(%msg, "database error");
                    DomainError::Internal(msg)
                }
            }
        }
        sqlx::Error::PoolClosed => {
            error!(operation, "connection pool closed");
            DomainError::internal(format!("connection pool closed in {operation}"))
        }
        other => {
            error!(operation, error = %other, "sqlx error");
            DomainError::internal(format!("sqlx error in {operation}: {other}"))
        }
    }
}
