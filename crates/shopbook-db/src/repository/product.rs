//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD scoped to the owning user
//! - Partial update via `COALESCE`
//! - Conditional stock decrement for the sale workflow
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET quantity = quantity - ?q                       │
//! │  WHERE id = ? AND user_id = ? AND quantity >= ?q                    │
//! │                                                                     │
//! │  1 row  → applied, RETURNING the remaining quantity                 │
//! │  0 rows → stock ran out since it was checked (or product deleted)   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//! This is the only guard on `quantity`; there is no read-modify-write.

use chrono::{DateTime, Utc};
use shopbook_core::{Product, ProductPatch};
use shopbook_ledger::ListOrder;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::order_by;
use crate::error::DbResult;

pub(crate) const PRODUCT_COLUMNS: &str = "id, user_id, name, quantity, cost_price_cents, \
     selling_price_cents, low_stock_alert, created_at, updated_at";

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    Applied { remaining: i64 },
    Insufficient { available: i64 },
    Missing,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists a user's products by creation time.
    pub async fn list(&self, user_id: &str, order: ListOrder) -> DbResult<Vec<Product>> {
        debug!(user_id = %user_id, "Listing products");

        let sql = format!(
            "SELECT {} FROM products WHERE user_id = ?1 ORDER BY {}",
            PRODUCT_COLUMNS,
            order_by(order)
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND user_id = ?2",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts a new product. The id is generated by the caller.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, user_id, name, quantity, cost_price_cents,
                selling_price_cents, low_stock_alert, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.cost_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.low_stock_alert)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a partial update; absent fields keep their stored value.
    ///
    /// Returns the updated product, or `None` if the user has no such product.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Product>> {
        debug!(id = %id, "Updating product");

        let sql = format!(
            r#"
            UPDATE products SET
                name = COALESCE(?3, name),
                quantity = COALESCE(?4, quantity),
                cost_price_cents = COALESCE(?5, cost_price_cents),
                selling_price_cents = COALESCE(?6, selling_price_cents),
                low_stock_alert = COALESCE(?7, low_stock_alert),
                updated_at = ?8
            WHERE id = ?1 AND user_id = ?2
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(patch.name.as_deref().map(str::trim))
            .bind(patch.quantity)
            .bind(patch.cost_price_cents)
            .bind(patch.selling_price_cents)
            .bind(patch.low_stock_alert)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Hard-deletes a product. Sales keep their snapshot columns.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrements stock by `quantity` only if at least that much remains.
    ///
    /// Runs on the caller's connection so it can share a transaction with
    /// the journal update.
    pub(crate) async fn decrement_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Decrement> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity = quantity - ?3, updated_at = ?4
            WHERE id = ?1 AND user_id = ?2 AND quantity >= ?3
            RETURNING quantity
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(remaining) = remaining {
            debug!(id = %id, quantity, remaining, "Stock decremented");
            return Ok(Decrement::Applied { remaining });
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1 AND user_id = ?2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(match available {
            Some(available) => Decrement::Insufficient { available },
            None => Decrement::Missing,
        })
    }
}
