//! # Sale Repository
//!
//! Sales are immutable once written. They are inserted only together with
//! their journal entry (see [`super::journal`]).

use shopbook_core::Sale;
use shopbook_ledger::ListOrder;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::order_by;
use crate::error::DbResult;

const SALE_COLUMNS: &str = "id, user_id, product_id, product_name, quantity, unit_price_cents, \
     total_amount_cents, customer_name, customer_phone, is_paid, is_debt, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn list(&self, user_id: &str, order: ListOrder) -> DbResult<Vec<Sale>> {
        debug!(user_id = %user_id, "Listing sales");

        let sql = format!(
            "SELECT {} FROM sales WHERE user_id = ?1 ORDER BY {}",
            SALE_COLUMNS,
            order_by(order)
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1 AND user_id = ?2", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, product_id = %sale.product_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, user_id, product_id, product_name, quantity,
                unit_price_cents, total_amount_cents,
                customer_name, customer_phone, is_paid, is_debt, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.product_id)
        .bind(&sale.product_name)
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(sale.total_amount_cents)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(sale.is_paid)
        .bind(sale.is_debt)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
