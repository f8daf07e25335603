//! # Ledger Store Implementation
//!
//! Implements the `shopbook-ledger` persistence traits for [`Database`],
//! so the sale workflow runs unchanged against SQLite.
//!
//! Every call passes `ctx.user_id` down to the repositories, which filter
//! on it. Writes carrying a row owned by someone else are refused before
//! touching the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopbook_core::{Debt, JournalStatus, Product, ProductPatch, ProfileUpdate, Sale, SaleJournalEntry, UserProfile};
use shopbook_ledger::{
    DebtStore, IdentityService, ListOrder, ProductStore, SaleJournalStore, SaleStore, SessionContext,
    Settlement, StockDecrement, StoreError, StoreResult,
};

use crate::pool::Database;
use crate::repository::journal::JournalDecrement;

fn check_owner(ctx: &SessionContext, user_id: &str) -> StoreResult<()> {
    if ctx.user_id != user_id {
        return Err(StoreError::Unauthorized(format!(
            "row belongs to another user than {}",
            ctx.user_id
        )));
    }
    Ok(())
}

#[async_trait]
impl ProductStore for Database {
    async fn list_products(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Product>> {
        Ok(self.products().list(&ctx.user_id, order).await?)
    }

    async fn get_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products().get_by_id(&ctx.user_id, id).await?)
    }

    async fn create_product(&self, ctx: &SessionContext, product: &Product) -> StoreResult<()> {
        check_owner(ctx, &product.user_id)?;
        Ok(self.products().insert(product).await?)
    }

    async fn update_product(
        &self,
        ctx: &SessionContext,
        id: &str,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Product>> {
        Ok(self.products().update(&ctx.user_id, id, patch, now).await?)
    }

    async fn delete_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<bool> {
        Ok(self.products().delete(&ctx.user_id, id).await?)
    }
}

#[async_trait]
impl SaleStore for Database {
    async fn list_sales(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Sale>> {
        Ok(self.sales().list(&ctx.user_id, order).await?)
    }

    async fn get_sale(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.sales().get_by_id(&ctx.user_id, id).await?)
    }
}

#[async_trait]
impl DebtStore for Database {
    async fn list_debts(
        &self,
        ctx: &SessionContext,
        is_paid: Option<bool>,
        order: ListOrder,
    ) -> StoreResult<Vec<Debt>> {
        Ok(self.debts().list(&ctx.user_id, is_paid, order).await?)
    }

    async fn get_debt(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Debt>> {
        Ok(self.debts().get_by_id(&ctx.user_id, id).await?)
    }

    async fn settle_debt(
        &self,
        ctx: &SessionContext,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Settlement>> {
        let settled = self.debts().settle(&ctx.user_id, id, paid_at).await?;
        Ok(settled.map(|(debt, changed)| {
            if changed {
                Settlement::Settled(debt)
            } else {
                Settlement::AlreadyPaid(debt)
            }
        }))
    }
}

#[async_trait]
impl SaleJournalStore for Database {
    async fn begin_sale(
        &self,
        ctx: &SessionContext,
        sale: &Sale,
        journal: &SaleJournalEntry,
    ) -> StoreResult<()> {
        check_owner(ctx, &sale.user_id)?;
        check_owner(ctx, &journal.user_id)?;
        Ok(self.journal().begin_sale(sale, journal).await?)
    }

    async fn apply_stock_decrement(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<StockDecrement> {
        let outcome = match self.journal().apply_decrement(&ctx.user_id, journal_id).await? {
            JournalDecrement::Applied { remaining } => StockDecrement::Applied { remaining },
            JournalDecrement::AlreadyApplied => StockDecrement::AlreadyApplied,
            JournalDecrement::Insufficient { available } => StockDecrement::Insufficient { available },
            JournalDecrement::ProductMissing => StockDecrement::ProductMissing,
        };
        Ok(outcome)
    }

    async fn attach_debt(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        debt: &Debt,
    ) -> StoreResult<String> {
        check_owner(ctx, &debt.user_id)?;
        Ok(self.journal().attach_debt(&ctx.user_id, journal_id, debt).await?)
    }

    async fn flag_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        status: JournalStatus,
        reason: &str,
    ) -> StoreResult<()> {
        Ok(self
            .journal()
            .flag(&ctx.user_id, journal_id, status, reason, Utc::now())
            .await?)
    }

    async fn get_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<Option<SaleJournalEntry>> {
        Ok(self.journal().get_by_id(&ctx.user_id, journal_id).await?)
    }

    async fn list_open_journal(&self, ctx: &SessionContext) -> StoreResult<Vec<SaleJournalEntry>> {
        Ok(self.journal().list_open(&ctx.user_id).await?)
    }
}

#[async_trait]
impl IdentityService for Database {
    async fn profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles().get_by_id(user_id).await?)
    }

    async fn create_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        Ok(self.profiles().insert(profile).await?)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles().update(user_id, update, now).await?)
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shopbook_core::debts::DebtFilter;
    use shopbook_core::reports::ReportPeriod;
    use shopbook_core::{Customer, Money, NewProduct};
    use shopbook_ledger::{LedgerConfig, LedgerError, ReconcileOutcome, ReconcileReport, SaleRequest, ShopLedger, WorkflowStep};

    use super::*;
    use crate::pool::DbConfig;

    fn ada() -> Customer {
        Customer {
            name: "Ada".to_string(),
            phone: "08001234567".to_string(),
        }
    }

    fn rice_bag() -> NewProduct {
        NewProduct {
            name: "Rice bag".to_string(),
            quantity: 10,
            cost_price_cents: 100_000,
            selling_price_cents: 150_000,
            low_stock_alert: Some(2),
        }
    }

    async fn shop() -> (ShopLedger<Database>, SessionContext) {
        let db = Database::in_memory().await.unwrap();
        let ledger = ShopLedger::new(Arc::new(db), LedgerConfig::default());
        ledger
            .register_profile("u-1", "08009998888", "Mama Ada Store")
            .await
            .unwrap();
        let ctx = ledger.open_session("u-1").await.unwrap();
        (ledger, ctx)
    }

    #[tokio::test]
    async fn test_credit_sale_creates_one_debt() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();

        let sale = shop
            .record_sale(&ctx, SaleRequest::on_credit(&rice.id, 3, ada()))
            .await
            .unwrap();
        assert_eq!(sale.total_amount_cents, 450_000);
        assert!(sale.is_debt);

        let stock = shop.store().get_product(&ctx, &rice.id).await.unwrap().unwrap();
        assert_eq!(stock.quantity, 7);

        let debts = shop.debts(&ctx, DebtFilter::Unpaid, "").await.unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].amount_cents, 450_000);
        assert_eq!(debts[0].description, "3x Rice bag");
        assert_eq!(debts[0].sale_id.as_deref(), Some(sale.id.as_str()));

        assert!(shop.store().list_open_journal(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_paid_sale_creates_no_debt() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();

        shop.record_sale(&ctx, SaleRequest::paid(&rice.id, 10)).await.unwrap();

        let snap = shop.snapshot(&ctx).await.unwrap();
        assert!(snap.debts.is_empty());
        assert_eq!(snap.products[0].quantity, 0);
        assert_eq!(snap.sales.len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();

        let err = shop
            .record_sale(&ctx, SaleRequest::on_credit(&rice.id, 11, ada()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 10,
                requested: 11,
                ..
            }
        ));

        let snap = shop.snapshot(&ctx).await.unwrap();
        assert!(snap.sales.is_empty());
        assert!(snap.debts.is_empty());
        assert_eq!(snap.products[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_mark_debt_paid_is_idempotent() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        shop.record_sale(&ctx, SaleRequest::on_credit(&rice.id, 3, ada()))
            .await
            .unwrap();
        let debt = shop.debts(&ctx, DebtFilter::All, "ada").await.unwrap().remove(0);

        let first = shop.mark_debt_paid(&ctx, &debt.id).await.unwrap();
        let second = shop.mark_debt_paid(&ctx, &debt.id).await.unwrap();
        assert!(first.is_paid && second.is_paid);
        assert_eq!(first.paid_at, second.paid_at);

        assert!(shop.debts(&ctx, DebtFilter::Unpaid, "").await.unwrap().is_empty());
        let summary = shop.dashboard(&ctx).await.unwrap();
        assert_eq!(summary.outstanding_debt, Money::zero());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_sales_on_file_database() {
        let path = std::env::temp_dir().join(format!("shopbook-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
            .await
            .unwrap();
        let shop = ShopLedger::new(Arc::new(db), LedgerConfig::default());
        shop.register_profile("u-1", "08009998888", "Mama Ada Store")
            .await
            .unwrap();
        let ctx = shop.open_session("u-1").await.unwrap();
        let rice = shop
            .add_product(
                &ctx,
                NewProduct {
                    quantity: 1000,
                    ..rice_bag()
                },
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..40 {
            let shop = shop.clone();
            let ctx = ctx.clone();
            let product_id = rice.id.clone();
            handles.push(tokio::spawn(async move {
                let request = if i % 4 == 0 {
                    SaleRequest::on_credit(&product_id, 1, ada())
                } else {
                    SaleRequest::paid(&product_id, 1)
                };
                shop.record_sale(&ctx, request).await
            }));
        }

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "failed sales: {:?}", failures);

        let stock = shop.store().get_product(&ctx, &rice.id).await.unwrap().unwrap();
        assert_eq!(stock.quantity, 960);
        let snap = shop.snapshot(&ctx).await.unwrap();
        assert_eq!(snap.sales.len(), 40);
        assert_eq!(snap.debts.len(), 10);
        assert!(shop.store().list_open_journal(&ctx).await.unwrap().is_empty());

        shop.store().close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test]
    async fn test_settle_reports_changed_row() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        shop.record_sale(&ctx, SaleRequest::on_credit(&rice.id, 1, ada()))
            .await
            .unwrap();
        let debt = shop.debts(&ctx, DebtFilter::Unpaid, "").await.unwrap().remove(0);
        let paid_at = Utc::now();

        let first = shop.store().settle_debt(&ctx, &debt.id, paid_at).await.unwrap().unwrap();
        assert!(matches!(first, Settlement::Settled(_)));

        let second = shop.store().settle_debt(&ctx, &debt.id, paid_at).await.unwrap().unwrap();
        assert!(matches!(second, Settlement::AlreadyPaid(_)));
        assert_eq!(second.debt().paid_at, first.debt().paid_at);

        assert!(shop.store().settle_debt(&ctx, "nope", paid_at).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_journal_steps_are_idempotent() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        let db = shop.store();

        // a sale whose follow-up steps never ran
        let sale = Sale {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            product_id: rice.id.clone(),
            product_name: rice.name.clone(),
            quantity: 4,
            unit_price_cents: 150_000,
            total_amount_cents: 600_000,
            customer_name: Some("Ada".to_string()),
            customer_phone: Some("08001234567".to_string()),
            is_paid: false,
            is_debt: true,
            created_at: Utc::now(),
        };
        let journal = SaleJournalEntry::open("j-1".to_string(), &sale);
        db.begin_sale(&ctx, &sale, &journal).await.unwrap();

        let report = shop.reconcile_pending(&ctx).await.unwrap();
        assert_eq!(report.completed, vec!["s-1".to_string()]);

        assert_eq!(
            db.apply_stock_decrement(&ctx, "j-1").await.unwrap(),
            StockDecrement::AlreadyApplied
        );
        let entry = db.get_journal(&ctx, "j-1").await.unwrap().unwrap();
        assert_eq!(entry.status, JournalStatus::Completed);
        let debt_id = entry.debt_id.clone().unwrap();

        let again = Debt {
            id: "d-other".to_string(),
            user_id: "u-1".to_string(),
            sale_id: Some("s-1".to_string()),
            customer_name: "Ada".to_string(),
            customer_phone: "08001234567".to_string(),
            amount_cents: 600_000,
            description: "4x Rice bag".to_string(),
            is_paid: false,
            created_at: sale.created_at,
            paid_at: None,
        };
        assert_eq!(db.attach_debt(&ctx, "j-1", &again).await.unwrap(), debt_id);

        let stock = db.get_product(&ctx, &rice.id).await.unwrap().unwrap().quantity;
        assert_eq!(stock, 6);
        assert_eq!(db.list_debts(&ctx, None, ListOrder::NewestFirst).await.unwrap().len(), 1);
        assert_eq!(shop.reconcile_pending(&ctx).await.unwrap(), ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_stock_exhausted_at_commit_needs_attention() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        let db = shop.store();

        let sale = Sale {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            product_id: rice.id.clone(),
            product_name: rice.name.clone(),
            quantity: 8,
            unit_price_cents: 150_000,
            total_amount_cents: 1_200_000,
            customer_name: None,
            customer_phone: None,
            is_paid: true,
            is_debt: false,
            created_at: Utc::now(),
        };
        db.begin_sale(&ctx, &sale, &SaleJournalEntry::open("j-1".to_string(), &sale))
            .await
            .unwrap();

        // another sale takes most of the stock first
        shop.record_sale(&ctx, SaleRequest::paid(&rice.id, 5)).await.unwrap();

        let outcome = shop.resume_sale(&ctx, "j-1").await.unwrap();
        assert!(matches!(
            outcome,
            ReconcileOutcome::NeedsAttention {
                step: WorkflowStep::DecrementStock,
                ..
            }
        ));
        let entry = db.get_journal(&ctx, "j-1").await.unwrap().unwrap();
        assert_eq!(entry.status, JournalStatus::NeedsAttention);
        assert_eq!(entry.attempts, 1);
        assert!(!entry.stock_applied);

        let stock = db.get_product(&ctx, &rice.id).await.unwrap().unwrap().quantity;
        assert_eq!(stock, 5);

        let report = shop.reconcile_pending(&ctx).await.unwrap();
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_rows_are_scoped_to_user() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        shop.record_sale(&ctx, SaleRequest::on_credit(&rice.id, 2, ada()))
            .await
            .unwrap();

        let stranger = SessionContext::new("u-2", "Other Shop");
        let snap = shop.snapshot(&stranger).await.unwrap();
        assert!(snap.products.is_empty() && snap.sales.is_empty() && snap.debts.is_empty());

        let err = shop
            .record_sale(&stranger, SaleRequest::paid(&rice.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));

        let mut foreign = rice.clone();
        foreign.id = "p-2".to_string();
        let err = shop.store().create_product(&stranger, &foreign).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_reports_match_rice_bag_day() {
        let (shop, ctx) = shop().await;
        let rice = shop.add_product(&ctx, rice_bag()).await.unwrap();
        shop.record_sale(&ctx, SaleRequest::on_credit(&rice.id, 3, ada()))
            .await
            .unwrap();
        shop.record_sale(&ctx, SaleRequest::paid(&rice.id, 5)).await.unwrap();

        let report = shop.report(&ctx, ReportPeriod::Monthly).await.unwrap();
        assert_eq!(report.sales_count, 2);
        assert_eq!(report.total_sales, Money::from_minor(1_200_000));
        assert_eq!(report.total_paid, Money::from_minor(750_000));
        assert_eq!(report.total_debts, Money::from_minor(450_000));
        assert_eq!(report.total_profit, Money::from_minor(400_000));

        let low = shop.low_stock(&ctx).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].quantity, 2);

        let balances = shop.customer_balances(&ctx).await.unwrap();
        assert_eq!(balances[0].outstanding, Money::from_minor(450_000));
    }

    #[tokio::test]
    async fn test_profile_update() {
        let (shop, ctx) = shop().await;
        let update = ProfileUpdate {
            business_name: Some(" Ada Provisions ".to_string()),
            is_pro: Some(true),
        };
        let profile = shop.update_profile(&ctx, &update).await.unwrap();
        assert_eq!(profile.business_name, "Ada Provisions");
        assert!(profile.is_pro);

        let session = shop.open_session("u-1").await.unwrap();
        assert!(session.is_pro);
    }
}
