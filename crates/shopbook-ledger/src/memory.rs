//! # In-Memory Store
//!
//! A complete backend held in process memory, used by tests and demos.
//!
//! All collections sit behind one `tokio::sync::RwLock`, so each trait
//! method runs under a single write guard and is atomic with respect to
//! every other call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopbook_core::{
    Debt, JournalStatus, Product, ProductPatch, ProfileUpdate, Sale, SaleJournalEntry, UserProfile,
};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::session::{IdentityService, SessionContext};
use crate::store::{
    DebtStore, ListOrder, ProductStore, SaleJournalStore, SaleStore, Settlement, StockDecrement,
};

#[derive(Debug, Default)]
struct MemoryState {
    profiles: Vec<UserProfile>,
    products: Vec<Product>,
    sales: Vec<Sale>,
    debts: Vec<Debt>,
    journal: Vec<SaleJournalEntry>,
}

/// Thread-safe in-memory implementation of every collaborator trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all data.
    pub async fn clear(&self) {
        *self.state.write().await = MemoryState::default();
    }
}

/// Clones the rows owned by `user_id`, sorted by `created_at`.
fn owned<T: Clone>(
    rows: &[T],
    user_id: &str,
    owner: impl Fn(&T) -> &str,
    created: impl Fn(&T) -> DateTime<Utc>,
    order: ListOrder,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|r| owner(*r) == user_id).cloned().collect();
    match order {
        ListOrder::NewestFirst => out.sort_by(|a, b| created(b).cmp(&created(a))),
        ListOrder::OldestFirst => out.sort_by_key(|r| created(r)),
    }
    out
}

fn check_owner(ctx: &SessionContext, user_id: &str) -> StoreResult<()> {
    if ctx.user_id != user_id {
        return Err(StoreError::Unauthorized(format!(
            "row belongs to another user than {}",
            ctx.user_id
        )));
    }
    Ok(())
}

// =============================================================================
// Products
// =============================================================================

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Product>> {
        let state = self.state.read().await;
        Ok(owned(&state.products, &ctx.user_id, |p| p.user_id.as_str(), |p| p.created_at, order))
    }

    async fn get_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|p| p.id == id && p.user_id == ctx.user_id)
            .cloned())
    }

    async fn create_product(&self, ctx: &SessionContext, product: &Product) -> StoreResult<()> {
        check_owner(ctx, &product.user_id)?;
        let mut state = self.state.write().await;
        if state.products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Conflict(format!("product {} already exists", product.id)));
        }
        state.products.push(product.clone());
        Ok(())
    }

    async fn update_product(
        &self,
        ctx: &SessionContext,
        id: &str,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Product>> {
        let mut state = self.state.write().await;
        let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == id && p.user_id == ctx.user_id)
        else {
            return Ok(None);
        };
        patch.apply_to(product, now);
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| !(p.id == id && p.user_id == ctx.user_id));
        Ok(state.products.len() != before)
    }
}

// =============================================================================
// Sales
// =============================================================================

#[async_trait]
impl SaleStore for MemoryStore {
    async fn list_sales(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Sale>> {
        let state = self.state.read().await;
        Ok(owned(&state.sales, &ctx.user_id, |s| s.user_id.as_str(), |s| s.created_at, order))
    }

    async fn get_sale(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Sale>> {
        let state = self.state.read().await;
        Ok(state
            .sales
            .iter()
            .find(|s| s.id == id && s.user_id == ctx.user_id)
            .cloned())
    }
}

// =============================================================================
// Debts
// =============================================================================

#[async_trait]
impl DebtStore for MemoryStore {
    async fn list_debts(
        &self,
        ctx: &SessionContext,
        is_paid: Option<bool>,
        order: ListOrder,
    ) -> StoreResult<Vec<Debt>> {
        let state = self.state.read().await;
        let mut debts = owned(&state.debts, &ctx.user_id, |d| d.user_id.as_str(), |d| d.created_at, order);
        if let Some(paid) = is_paid {
            debts.retain(|d| d.is_paid == paid);
        }
        Ok(debts)
    }

    async fn get_debt(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Debt>> {
        let state = self.state.read().await;
        Ok(state
            .debts
            .iter()
            .find(|d| d.id == id && d.user_id == ctx.user_id)
            .cloned())
    }

    async fn settle_debt(
        &self,
        ctx: &SessionContext,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Settlement>> {
        let mut state = self.state.write().await;
        let Some(debt) = state
            .debts
            .iter_mut()
            .find(|d| d.id == id && d.user_id == ctx.user_id)
        else {
            return Ok(None);
        };
        if debt.settle(paid_at) {
            Ok(Some(Settlement::Settled(debt.clone())))
        } else {
            Ok(Some(Settlement::AlreadyPaid(debt.clone())))
        }
    }
}

// =============================================================================
// Sale Journal
// =============================================================================

impl MemoryState {
    fn journal_mut(&mut self, ctx: &SessionContext, id: &str) -> StoreResult<&mut SaleJournalEntry> {
        self.journal
            .iter_mut()
            .find(|j| j.id == id && j.user_id == ctx.user_id)
            .ok_or_else(|| StoreError::not_found("sale journal", id))
    }
}

#[async_trait]
impl SaleJournalStore for MemoryStore {
    async fn begin_sale(
        &self,
        ctx: &SessionContext,
        sale: &Sale,
        journal: &SaleJournalEntry,
    ) -> StoreResult<()> {
        check_owner(ctx, &sale.user_id)?;
        check_owner(ctx, &journal.user_id)?;
        let mut state = self.state.write().await;
        if state.sales.iter().any(|s| s.id == sale.id) {
            return Err(StoreError::Conflict(format!("sale {} already exists", sale.id)));
        }
        state.sales.push(sale.clone());
        state.journal.push(journal.clone());
        Ok(())
    }

    async fn apply_stock_decrement(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<StockDecrement> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let entry = state.journal_mut(ctx, journal_id)?;
        if entry.stock_applied {
            return Ok(StockDecrement::AlreadyApplied);
        }
        let (product_id, quantity) = (entry.product_id.clone(), entry.quantity);

        let Some(product) = state
            .products
            .iter_mut()
            .find(|p| p.id == product_id && p.user_id == ctx.user_id)
        else {
            return Ok(StockDecrement::ProductMissing);
        };
        if product.quantity < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.quantity,
            });
        }
        product.quantity -= quantity;
        let remaining = product.quantity;

        let now = Utc::now();
        product.updated_at = now;
        let entry = state.journal_mut(ctx, journal_id)?;
        entry.stock_applied = true;
        entry.status = entry.derived_status();
        entry.updated_at = now;

        Ok(StockDecrement::Applied { remaining })
    }

    async fn attach_debt(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        debt: &Debt,
    ) -> StoreResult<String> {
        check_owner(ctx, &debt.user_id)?;
        let mut state = self.state.write().await;

        let entry = state.journal_mut(ctx, journal_id)?;
        if let Some(existing) = &entry.debt_id {
            return Ok(existing.clone());
        }
        entry.debt_id = Some(debt.id.clone());
        entry.status = entry.derived_status();
        entry.updated_at = Utc::now();

        state.debts.push(debt.clone());
        Ok(debt.id.clone())
    }

    async fn flag_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        status: JournalStatus,
        reason: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let entry = state.journal_mut(ctx, journal_id)?;
        entry.status = status;
        entry.last_error = Some(reason.to_string());
        entry.attempts += 1;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn get_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<Option<SaleJournalEntry>> {
        let state = self.state.read().await;
        Ok(state
            .journal
            .iter()
            .find(|j| j.id == journal_id && j.user_id == ctx.user_id)
            .cloned())
    }

    async fn list_open_journal(&self, ctx: &SessionContext) -> StoreResult<Vec<SaleJournalEntry>> {
        let state = self.state.read().await;
        let mut open = owned(
            &state.journal,
            &ctx.user_id,
            |j| j.user_id.as_str(),
            |j| j.created_at,
            ListOrder::OldestFirst,
        );
        open.retain(|j| j.status != JournalStatus::Completed);
        Ok(open)
    }
}

// =============================================================================
// Identity
// =============================================================================

#[async_trait]
impl IdentityService for MemoryStore {
    async fn profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn create_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StoreError::Conflict(format!("profile {} already exists", profile.id)));
        }
        state.profiles.push(profile.clone());
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserProfile>> {
        let mut state = self.state.write().await;
        let Some(profile) = state.profiles.iter_mut().find(|p| p.id == user_id) else {
            return Ok(None);
        };
        update.apply_to(profile, now);
        Ok(Some(profile.clone()))
    }
}
