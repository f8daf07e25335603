//! # Shop Ledger Facade
//!
//! One handle that owns the store and configuration and exposes every
//! ledger operation to the UI layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ShopLedger<S>                                               │
//! │                                                              │
//! │   writes ──► workflow / inventory ──► S: LedgerStore         │
//! │                                                              │
//! │   reads  ──► snapshot ──┬─ list_products ─┐                  │
//! │                         ├─ list_sales ────┼─► try_join!      │
//! │                         └─ list_debts ────┘                  │
//! │                               │                              │
//! │                               ▼                              │
//! │              shopbook_core::{reports, debts}                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopbook_core::debts::{self, CustomerBalance, DebtFilter};
use shopbook_core::reports::{self, DashboardSummary, PeriodReport, ReportPeriod};
use shopbook_core::{Debt, NewProduct, Product, ProductPatch, Sale, UserProfile};
use tracing::debug;
use ts_rs::TS;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, WorkflowStep};
use crate::inventory;
use crate::session::{self, IdentityService, SessionContext};
use crate::store::{ListOrder, LedgerStore};
use crate::workflow::{self, ReconcileOutcome, ReconcileReport, SaleRequest};

/// Everything the screens read, loaded in one pass. Lists are newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LedgerSnapshot {
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub debts: Vec<Debt>,
}

pub struct ShopLedger<S: ?Sized> {
    config: LedgerConfig,
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ShopLedger<S> {
    fn clone(&self) -> Self {
        ShopLedger {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ShopLedger<S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        ShopLedger { config, store }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn record_sale(&self, ctx: &SessionContext, request: SaleRequest) -> LedgerResult<Sale> {
        workflow::record_sale(self.store.as_ref(), ctx, request).await
    }

    pub async fn mark_debt_paid(&self, ctx: &SessionContext, debt_id: &str) -> LedgerResult<Debt> {
        workflow::mark_debt_paid(self.store.as_ref(), ctx, debt_id).await
    }

    pub async fn reconcile_pending(&self, ctx: &SessionContext) -> LedgerResult<ReconcileReport> {
        workflow::reconcile_pending(self.store.as_ref(), ctx).await
    }

    pub async fn resume_sale(&self, ctx: &SessionContext, journal_id: &str) -> LedgerResult<ReconcileOutcome> {
        workflow::resume_sale(self.store.as_ref(), ctx, journal_id).await
    }

    pub async fn add_product(&self, ctx: &SessionContext, input: NewProduct) -> LedgerResult<Product> {
        inventory::add_product(self.store.as_ref(), ctx, input, self.config.default_low_stock_alert).await
    }

    pub async fn update_product(
        &self,
        ctx: &SessionContext,
        id: &str,
        patch: &ProductPatch,
    ) -> LedgerResult<Product> {
        inventory::update_product(self.store.as_ref(), ctx, id, patch).await
    }

    pub async fn delete_product(&self, ctx: &SessionContext, id: &str) -> LedgerResult<()> {
        inventory::delete_product(self.store.as_ref(), ctx, id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads products, sales and debts concurrently.
    ///
    /// Fails as a whole if any of the three reads fails.
    pub async fn snapshot(&self, ctx: &SessionContext) -> LedgerResult<LedgerSnapshot> {
        let store = self.store.as_ref();
        let (products, sales, debts) = tokio::try_join!(
            store.list_products(ctx, ListOrder::NewestFirst),
            store.list_sales(ctx, ListOrder::NewestFirst),
            store.list_debts(ctx, None, ListOrder::NewestFirst),
        )
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

        debug!(
            user_id = %ctx.user_id,
            products = products.len(),
            sales = sales.len(),
            debts = debts.len(),
            "Snapshot loaded"
        );
        Ok(LedgerSnapshot { products, sales, debts })
    }

    pub async fn dashboard(&self, ctx: &SessionContext) -> LedgerResult<DashboardSummary> {
        let snap = self.snapshot(ctx).await?;
        Ok(reports::dashboard_summary(
            &snap.products,
            &snap.sales,
            &snap.debts,
            Utc::now(),
            self.config.business_offset(),
        ))
    }

    pub async fn report(&self, ctx: &SessionContext, period: ReportPeriod) -> LedgerResult<PeriodReport> {
        let store = self.store.as_ref();
        let (products, sales) = tokio::try_join!(
            store.list_products(ctx, ListOrder::NewestFirst),
            store.list_sales(ctx, ListOrder::NewestFirst),
        )
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

        Ok(reports::period_report(
            &sales,
            &products,
            period,
            Utc::now(),
            self.config.business_offset(),
            self.config.top_products_limit,
        ))
    }

    /// Debts matching `filter` and the customer `search`, newest first.
    pub async fn debts(&self, ctx: &SessionContext, filter: DebtFilter, search: &str) -> LedgerResult<Vec<Debt>> {
        let all = self
            .store
            .list_debts(ctx, filter.is_paid(), ListOrder::NewestFirst)
            .await
            .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

        Ok(debts::filter_debts(&all, filter, search).into_iter().cloned().collect())
    }

    pub async fn customer_balances(&self, ctx: &SessionContext) -> LedgerResult<Vec<CustomerBalance>> {
        let all = self
            .store
            .list_debts(ctx, None, ListOrder::NewestFirst)
            .await
            .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

        Ok(debts::customer_balances(&all))
    }

    pub async fn low_stock(&self, ctx: &SessionContext) -> LedgerResult<Vec<Product>> {
        let products = self
            .store
            .list_products(ctx, ListOrder::NewestFirst)
            .await
            .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

        Ok(reports::low_stock_items(&products).into_iter().cloned().collect())
    }

    /// Formats an amount with the configured currency.
    pub fn format_currency(&self, cents: i64) -> String {
        self.config.format_currency(cents)
    }
}

// =============================================================================
// Identity
// =============================================================================

impl<S> ShopLedger<S>
where
    S: LedgerStore + IdentityService + ?Sized,
{
    pub async fn open_session(&self, user_id: &str) -> LedgerResult<SessionContext> {
        session::open_session(self.store.as_ref(), user_id).await
    }

    pub async fn register_profile(&self, user_id: &str, phone: &str, business_name: &str) -> LedgerResult<UserProfile> {
        session::register_profile(self.store.as_ref(), user_id, phone, business_name).await
    }

    pub async fn update_profile(
        &self,
        ctx: &SessionContext,
        update: &shopbook_core::ProfileUpdate,
    ) -> LedgerResult<UserProfile> {
        session::update_profile(self.store.as_ref(), ctx, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use crate::testing::{ada, ctx, Fault, FlakyStore};
    use shopbook_core::Money;

    fn rice() -> NewProduct {
        NewProduct {
            name: "Rice bag".to_string(),
            quantity: 10,
            cost_price_cents: 100_000,
            selling_price_cents: 150_000,
            low_stock_alert: Some(2),
        }
    }

    fn ledger() -> ShopLedger<MemoryStore> {
        ShopLedger::new(Arc::new(MemoryStore::new()), LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_rice_bag_day() {
        let shop = ledger();
        let owner = ctx("u-1");
        let product = shop.add_product(&owner, rice()).await.unwrap();

        shop.record_sale(&owner, SaleRequest::on_credit(&product.id, 3, ada()))
            .await
            .unwrap();
        shop.record_sale(&owner, SaleRequest::paid(&product.id, 5)).await.unwrap();

        let summary = shop.dashboard(&owner).await.unwrap();
        assert_eq!(summary.todays_count, 2);
        assert_eq!(summary.todays_total, Money::from_minor(1_200_000));
        assert_eq!(summary.outstanding_debt, Money::from_minor(450_000));
        assert_eq!(summary.unpaid_debt_count, 1);
        // 2 left, alert at 2
        assert_eq!(summary.low_stock.len(), 1);

        let report = shop.report(&owner, ReportPeriod::Daily).await.unwrap();
        assert_eq!(report.sales_count, 2);
        assert_eq!(report.total_profit, Money::from_minor(400_000));
        assert_eq!(report.total_debts, Money::from_minor(450_000));
        assert_eq!(report.top_products[0].quantity, 8);

        let unpaid = shop.debts(&owner, DebtFilter::Unpaid, "ada").await.unwrap();
        assert_eq!(unpaid.len(), 1);
        shop.mark_debt_paid(&owner, &unpaid[0].id).await.unwrap();
        assert!(shop.debts(&owner, DebtFilter::Unpaid, "").await.unwrap().is_empty());

        let balances = shop.customer_balances(&owner).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].outstanding, Money::zero());
    }

    #[tokio::test]
    async fn test_large_amounts_keep_dashboard_totals() {
        let shop = ledger();
        let owner = ctx("u-1");

        let too_dear = NewProduct {
            selling_price_cents: i64::MAX / 2 + 1,
            ..rice()
        };
        let err = shop.add_product(&owner, too_dear).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));

        let dearest = NewProduct {
            cost_price_cents: 0,
            selling_price_cents: shopbook_core::MAX_AMOUNT_CENTS,
            ..rice()
        };
        let product = shop.add_product(&owner, dearest).await.unwrap();
        for _ in 0..2 {
            shop.record_sale(&owner, SaleRequest::paid(&product.id, 1)).await.unwrap();
        }

        let summary = shop.dashboard(&owner).await.unwrap();
        assert_eq!(summary.todays_total, Money::from_minor(2 * shopbook_core::MAX_AMOUNT_CENTS));
        let report = shop.report(&owner, ReportPeriod::Daily).await.unwrap();
        assert_eq!(report.total_profit, Money::from_minor(2 * shopbook_core::MAX_AMOUNT_CENTS));
    }

    #[tokio::test]
    async fn test_snapshot_is_scoped_and_ordered() {
        let shop = ledger();
        let owner = ctx("u-1");
        let product = shop.add_product(&owner, rice()).await.unwrap();
        let first = shop.record_sale(&owner, SaleRequest::paid(&product.id, 1)).await.unwrap();
        let second = shop.record_sale(&owner, SaleRequest::paid(&product.id, 1)).await.unwrap();

        let snap = shop.snapshot(&owner).await.unwrap();
        assert_eq!(snap.products.len(), 1);
        assert_eq!(snap.sales.len(), 2);
        if first.created_at != second.created_at {
            assert_eq!(snap.sales[0].id, second.id);
        }

        let other = shop.snapshot(&ctx("u-2")).await.unwrap();
        assert_eq!(other, LedgerSnapshot::default());
    }

    #[tokio::test]
    async fn test_snapshot_fails_as_a_whole() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        let shop = ShopLedger::new(Arc::clone(&store), LedgerConfig::default());
        store.fail(Fault::ListSales, StoreError::Unavailable("offline".into()));

        let err = shop.snapshot(&ctx("u-1")).await.unwrap_err();
        assert_eq!(err.failed_step(), Some(WorkflowStep::Load));
        assert!(err.is_safe_to_retry());

        store.heal();
        assert!(shop.snapshot(&ctx("u-1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_session_through_facade() {
        let shop = ledger();
        let err = shop.open_session("u-9").await.unwrap_err();
        assert!(matches!(err, LedgerError::Unauthenticated));

        shop.register_profile("u-9", "+234 800 123 4567", "Mama Ada Store")
            .await
            .unwrap();
        let session = shop.open_session("u-9").await.unwrap();
        assert_eq!(session.business_name, "Mama Ada Store");
        assert_eq!(shop.format_currency(450_000), "₦4500.00");
    }
}
