//! # Persistence Collaborator
//!
//! The ledger never touches storage directly. A backend implements these
//! traits; [`crate::memory::MemoryStore`] and the SQLite `Database` in
//! `shopbook-db` are the two in this workspace.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • Every call is scoped to ctx.user_id. Rows of other users are        │
//! │    invisible (reads return None / empty, writes touch nothing).        │
//! │  • Each method is atomic. Methods on SaleJournalStore write the        │
//! │    entity row and the journal row together or not at all.            │
//! │  • apply_stock_decrement is conditional: quantity -= q only where      │
//! │    quantity >= q. It is the only guard on Product.quantity.           │
//! │  • Journal steps are idempotent: repeating one reports it as          │
//! │    already applied instead of applying it again.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopbook_core::{Debt, JournalStatus, Product, ProductPatch, Sale, SaleJournalEntry};

use crate::error::StoreResult;
use crate::session::SessionContext;

/// Sort order for list reads, by `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Outcome of the conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock reduced; `remaining` units left.
    Applied { remaining: i64 },
    /// The journal already records this decrement; nothing changed.
    AlreadyApplied,
    /// Fewer than the sold quantity left; nothing changed.
    Insufficient { available: i64 },
    /// The product no longer exists; nothing changed.
    ProductMissing,
}

/// Outcome of settling a debt, carrying the debt as stored afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// This call marked the debt paid.
    Settled(Debt),
    /// The debt was already paid; nothing changed.
    AlreadyPaid(Debt),
}

impl Settlement {
    pub fn debt(&self) -> &Debt {
        match self {
            Settlement::Settled(debt) | Settlement::AlreadyPaid(debt) => debt,
        }
    }

    pub fn into_debt(self) -> Debt {
        match self {
            Settlement::Settled(debt) | Settlement::AlreadyPaid(debt) => debt,
        }
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Product>>;

    async fn get_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Product>>;

    /// Inserts a fully built product. Its `user_id` must be the session's.
    async fn create_product(&self, ctx: &SessionContext, product: &Product) -> StoreResult<()>;

    /// Partial update by id; `None` when the product does not exist.
    async fn update_product(
        &self,
        ctx: &SessionContext,
        id: &str,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Product>>;

    /// Returns `false` when nothing was deleted.
    async fn delete_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<bool>;
}

/// Sales are written only through [`SaleJournalStore::begin_sale`] and are
/// never edited or deleted.
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn list_sales(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Sale>>;

    async fn get_sale(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Sale>>;
}

#[async_trait]
pub trait DebtStore: Send + Sync {
    /// Lists debts, optionally only those with the given `is_paid` value.
    async fn list_debts(
        &self,
        ctx: &SessionContext,
        is_paid: Option<bool>,
        order: ListOrder,
    ) -> StoreResult<Vec<Debt>>;

    async fn get_debt(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Debt>>;

    /// Sets `is_paid` and `paid_at` where the debt is not yet paid.
    ///
    /// `None` when the debt does not exist.
    async fn settle_debt(
        &self,
        ctx: &SessionContext,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Settlement>>;
}

/// Compound writes of the sale workflow, each tracked by a journal entry.
#[async_trait]
pub trait SaleJournalStore: Send + Sync {
    /// Inserts the sale and its pending journal entry together.
    async fn begin_sale(
        &self,
        ctx: &SessionContext,
        sale: &Sale,
        journal: &SaleJournalEntry,
    ) -> StoreResult<()>;

    /// Decrements the journal's product by the journal's quantity where
    /// enough stock remains, marking `stock_applied` in the same write.
    async fn apply_stock_decrement(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<StockDecrement>;

    /// Inserts `debt` and records its id on the journal in the same write.
    ///
    /// If the journal already has a debt, nothing is inserted and the
    /// existing debt id is returned.
    async fn attach_debt(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        debt: &Debt,
    ) -> StoreResult<String>;

    /// Sets the journal status and records `reason`, counting an attempt.
    async fn flag_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        status: JournalStatus,
        reason: &str,
    ) -> StoreResult<()>;

    async fn get_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<Option<SaleJournalEntry>>;

    /// Entries not yet completed, oldest first.
    async fn list_open_journal(&self, ctx: &SessionContext) -> StoreResult<Vec<SaleJournalEntry>>;
}

/// Everything the ledger needs from a backend.
pub trait LedgerStore: ProductStore + SaleStore + DebtStore + SaleJournalStore {}

impl<T> LedgerStore for T where T: ProductStore + SaleStore + DebtStore + SaleJournalStore {}
