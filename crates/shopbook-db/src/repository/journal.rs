//! # Sale Journal Repository
//!
//! Compound writes of the sale workflow. Each method runs in one
//! transaction, so the journal flags always match what was applied.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin_sale          BEGIN; INSERT sales; INSERT sale_journal; COMMIT   │
//! │                                                                         │
//! │  apply_decrement     BEGIN; UPDATE sale_journal SET stock_applied = 1   │
//! │                             WHERE stock_applied = 0                     │
//! │                        0 rows ─► AlreadyApplied / NotFound              │
//! │                      UPDATE products ... quantity >= ?                  │
//! │                        0 rows ─► ROLLBACK, Insufficient / Missing       │
//! │                      COMMIT                                             │
//! │                                                                         │
//! │  attach_debt         BEGIN; UPDATE sale_journal ... RETURNING debt_id   │
//! │                        debt_id set? ─► ROLLBACK, return it              │
//! │                      INSERT debts; UPDATE sale_journal; COMMIT          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transaction opens with a write, so SQLite takes the write lock
//! (waiting up to `busy_timeout`) before any read. A deferred transaction
//! that reads first cannot upgrade once another connection has committed.

use chrono::{DateTime, Utc};
use shopbook_core::{Debt, JournalStatus, Sale, SaleJournalEntry};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::debt::DebtRepository;
use super::product::{Decrement, ProductRepository};
use super::sale::SaleRepository;
use crate::error::{DbError, DbResult};

const JOURNAL_COLUMNS: &str = "id, user_id, sale_id, product_id, quantity, debt_required, \
     stock_applied, debt_id, status, attempts, last_error, created_at, updated_at";

/// Outcome of [`JournalRepository::apply_decrement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalDecrement {
    Applied { remaining: i64 },
    AlreadyApplied,
    Insufficient { available: i64 },
    ProductMissing,
}

/// Repository for sale journal operations.
#[derive(Debug, Clone)]
pub struct JournalRepository {
    pool: SqlitePool,
}

impl JournalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        JournalRepository { pool }
    }

    /// Inserts a sale and its journal entry atomically.
    pub async fn begin_sale(&self, sale: &Sale, journal: &SaleJournalEntry) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        SaleRepository::insert_in(&mut tx, sale).await?;
        insert_entry(&mut tx, journal).await?;

        tx.commit().await?;
        debug!(sale_id = %sale.id, journal_id = %journal.id, "Sale and journal written");
        Ok(())
    }

    /// Applies the journal's stock decrement once.
    pub async fn apply_decrement(&self, user_id: &str, journal_id: &str) -> DbResult<JournalDecrement> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // First statement writes, so the transaction holds the write lock
        // before anything is read.
        let claimed: Option<(String, i64)> = sqlx::query_as(
            r#"
            UPDATE sale_journal SET
                stock_applied = 1,
                status = CASE
                    WHEN debt_required = 0 OR debt_id IS NOT NULL THEN 'completed'
                    ELSE status
                END,
                updated_at = ?3
            WHERE id = ?1 AND user_id = ?2 AND stock_applied = 0
            RETURNING product_id, quantity
            "#,
        )
        .bind(journal_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((product_id, quantity)) = claimed else {
            let exists = fetch_entry(&mut tx, user_id, journal_id).await?.is_some();
            tx.rollback().await?;
            return if exists {
                Ok(JournalDecrement::AlreadyApplied)
            } else {
                Err(DbError::not_found("sale journal", journal_id))
            };
        };

        match ProductRepository::decrement_in(&mut tx, user_id, &product_id, quantity, now).await? {
            Decrement::Applied { remaining } => {
                tx.commit().await?;
                Ok(JournalDecrement::Applied { remaining })
            }
            Decrement::Insufficient { available } => {
                tx.rollback().await?;
                Ok(JournalDecrement::Insufficient { available })
            }
            Decrement::Missing => {
                tx.rollback().await?;
                Ok(JournalDecrement::ProductMissing)
            }
        }
    }

    /// Inserts `debt` and links it to the journal, unless a debt is
    /// already linked; returns the linked debt id either way.
    pub async fn attach_debt(&self, user_id: &str, journal_id: &str, debt: &Debt) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Touch the entry first to take the write lock, reading its link.
        let linked: Option<Option<String>> = sqlx::query_scalar(
            "UPDATE sale_journal SET updated_at = ?3 WHERE id = ?1 AND user_id = ?2 RETURNING debt_id",
        )
        .bind(journal_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        match linked {
            None => {
                tx.rollback().await?;
                return Err(DbError::not_found("sale journal", journal_id));
            }
            Some(Some(existing)) => {
                tx.rollback().await?;
                debug!(journal_id = %journal_id, debt_id = %existing, "Debt already attached");
                return Ok(existing);
            }
            Some(None) => {}
        }

        DebtRepository::insert_in(&mut tx, debt).await?;

        sqlx::query(
            r#"
            UPDATE sale_journal SET
                debt_id = ?2,
                status = CASE WHEN stock_applied = 1 THEN 'completed' ELSE status END,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(journal_id)
        .bind(&debt.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(debt.id.clone())
    }

    /// Records a failed attempt and the status it leaves the entry in.
    pub async fn flag(
        &self,
        user_id: &str,
        journal_id: &str,
        status: JournalStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sale_journal SET
                status = ?3,
                last_error = ?4,
                attempts = attempts + 1,
                updated_at = ?5
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(journal_id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(reason)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("sale journal", journal_id));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, user_id: &str, journal_id: &str) -> DbResult<Option<SaleJournalEntry>> {
        let mut conn = self.pool.acquire().await?;
        fetch_entry(&mut conn, user_id, journal_id).await
    }

    /// Entries not yet completed, oldest first.
    pub async fn list_open(&self, user_id: &str) -> DbResult<Vec<SaleJournalEntry>> {
        let sql = format!(
            "SELECT {} FROM sale_journal WHERE user_id = ?1 AND status != 'completed' \
             ORDER BY created_at ASC, rowid ASC",
            JOURNAL_COLUMNS
        );
        let entries = sqlx::query_as::<_, SaleJournalEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }
}

async fn fetch_entry(
    conn: &mut SqliteConnection,
    user_id: &str,
    journal_id: &str,
) -> DbResult<Option<SaleJournalEntry>> {
    let sql = format!(
        "SELECT {} FROM sale_journal WHERE id = ?1 AND user_id = ?2",
        JOURNAL_COLUMNS
    );
    let entry = sqlx::query_as::<_, SaleJournalEntry>(&sql)
        .bind(journal_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(entry)
}

async fn insert_entry(conn: &mut SqliteConnection, entry: &SaleJournalEntry) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_journal (
            id, user_id, sale_id, product_id, quantity, debt_required,
            stock_applied, debt_id, status, attempts, last_error,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.user_id)
    .bind(&entry.sale_id)
    .bind(&entry.product_id)
    .bind(entry.quantity)
    .bind(entry.debt_required)
    .bind(entry.stock_applied)
    .bind(&entry.debt_id)
    .bind(entry.status.as_str())
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
