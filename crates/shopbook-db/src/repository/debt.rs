//! # Debt Repository
//!
//! Debts are created by the sale journal and only ever change by being
//! settled.

use chrono::{DateTime, Utc};
use shopbook_core::Debt;
use shopbook_ledger::ListOrder;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::order_by;
use crate::error::DbResult;

const DEBT_COLUMNS: &str = "id, user_id, sale_id, customer_name, customer_phone, amount_cents, \
     description, is_paid, created_at, paid_at";

/// Repository for debt database operations.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    /// Lists a user's debts, optionally only paid or only unpaid ones.
    pub async fn list(&self, user_id: &str, is_paid: Option<bool>, order: ListOrder) -> DbResult<Vec<Debt>> {
        debug!(user_id = %user_id, is_paid = ?is_paid, "Listing debts");

        let sql = format!(
            "SELECT {} FROM debts WHERE user_id = ?1 AND (?2 IS NULL OR is_paid = ?2) ORDER BY {}",
            DEBT_COLUMNS,
            order_by(order)
        );
        let debts = sqlx::query_as::<_, Debt>(&sql)
            .bind(user_id)
            .bind(is_paid)
            .fetch_all(&self.pool)
            .await?;

        Ok(debts)
    }

    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<Debt>> {
        let sql = format!("SELECT {} FROM debts WHERE id = ?1 AND user_id = ?2", DEBT_COLUMNS);
        let debt = sqlx::query_as::<_, Debt>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(debt)
    }

    /// Marks a debt paid if it is not already.
    ///
    /// An already-paid debt keeps its original `paid_at`. Returns the debt
    /// as stored afterwards and whether this call changed it, or `None` if
    /// the user has no such debt.
    pub async fn settle(
        &self,
        user_id: &str,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> DbResult<Option<(Debt, bool)>> {
        let result = sqlx::query(
            "UPDATE debts SET is_paid = 1, paid_at = ?3 WHERE id = ?1 AND user_id = ?2 AND is_paid = 0",
        )
        .bind(id)
        .bind(user_id)
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        let changed = result.rows_affected() > 0;
        debug!(id = %id, changed, "Settle debt");
        Ok(self.get_by_id(user_id, id).await?.map(|debt| (debt, changed)))
    }

    pub(crate) async fn insert_in(conn: &mut SqliteConnection, debt: &Debt) -> DbResult<()> {
        debug!(id = %debt.id, sale_id = ?debt.sale_id, "Inserting debt");

        sqlx::query(
            r#"
            INSERT INTO debts (
                id, user_id, sale_id, customer_name, customer_phone,
                amount_cents, description, is_paid, created_at, paid_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.user_id)
        .bind(&debt.sale_id)
        .bind(&debt.customer_name)
        .bind(&debt.customer_phone)
        .bind(debt.amount_cents)
        .bind(&debt.description)
        .bind(debt.is_paid)
        .bind(debt.created_at)
        .bind(debt.paid_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
