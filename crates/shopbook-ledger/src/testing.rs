//! Test fixtures and a fault-injecting store wrapper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shopbook_core::{
    Customer, Debt, JournalStatus, Product, ProductPatch, Sale, SaleJournalEntry,
};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::session::SessionContext;
use crate::store::{
    DebtStore, ListOrder, ProductStore, SaleJournalStore, SaleStore, Settlement, StockDecrement,
};

pub fn ctx(user_id: &str) -> SessionContext {
    SessionContext::new(user_id, "Mama Ada Store")
}

pub fn ada() -> Customer {
    Customer {
        name: "Ada".to_string(),
        phone: "08001234567".to_string(),
    }
}

/// A product costing 1000.00 and selling at 1500.00, alert at 2.
pub fn product(user_id: &str, name: &str, quantity: i64) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        quantity,
        cost_price_cents: 100_000,
        selling_price_cents: 150_000,
        low_stock_alert: 2,
        created_at: now,
        updated_at: now,
    }
}

pub fn sale_for(product: &Product, quantity: i64, paid: bool) -> Sale {
    let customer = (!paid).then(ada);
    Sale {
        id: Uuid::new_v4().to_string(),
        user_id: product.user_id.clone(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit_price_cents: product.selling_price_cents,
        total_amount_cents: product.selling_price_cents * quantity,
        customer_name: customer.as_ref().map(|c| c.name.clone()),
        customer_phone: customer.map(|c| c.phone),
        is_paid: paid,
        is_debt: !paid,
        created_at: Utc::now(),
    }
}

/// Store calls that [`FlakyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    GetProduct,
    BeginSale,
    DecrementStock,
    AttachDebt,
    SettleDebt,
    ListSales,
}

/// Wraps a [`MemoryStore`], failing selected calls until healed.
pub struct FlakyStore {
    inner: MemoryStore,
    faults: Mutex<HashMap<Fault, StoreError>>,
    drain: Mutex<Option<(String, i64)>>,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        FlakyStore {
            inner,
            faults: Mutex::new(HashMap::new()),
            drain: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail(&self, fault: Fault, err: StoreError) {
        self.faults.lock().unwrap().insert(fault, err);
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    /// Before the next stock decrement, removes `units` of `product_id`
    /// as a concurrent sale would.
    pub fn drain_before_decrement(&self, product_id: &str, units: i64) {
        *self.drain.lock().unwrap() = Some((product_id.to_string(), units));
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, fault: Fault) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.faults.lock().unwrap().get(&fault) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductStore for FlakyStore {
    async fn list_products(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Product>> {
        self.tick();
        self.inner.list_products(ctx, order).await
    }

    async fn get_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Product>> {
        self.check(Fault::GetProduct)?;
        self.inner.get_product(ctx, id).await
    }

    async fn create_product(&self, ctx: &SessionContext, product: &Product) -> StoreResult<()> {
        self.tick();
        self.inner.create_product(ctx, product).await
    }

    async fn update_product(
        &self,
        ctx: &SessionContext,
        id: &str,
        patch: &ProductPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Product>> {
        self.tick();
        self.inner.update_product(ctx, id, patch, now).await
    }

    async fn delete_product(&self, ctx: &SessionContext, id: &str) -> StoreResult<bool> {
        self.tick();
        self.inner.delete_product(ctx, id).await
    }
}

#[async_trait]
impl SaleStore for FlakyStore {
    async fn list_sales(&self, ctx: &SessionContext, order: ListOrder) -> StoreResult<Vec<Sale>> {
        self.check(Fault::ListSales)?;
        self.inner.list_sales(ctx, order).await
    }

    async fn get_sale(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Sale>> {
        self.tick();
        self.inner.get_sale(ctx, id).await
    }
}

#[async_trait]
impl DebtStore for FlakyStore {
    async fn list_debts(
        &self,
        ctx: &SessionContext,
        is_paid: Option<bool>,
        order: ListOrder,
    ) -> StoreResult<Vec<Debt>> {
        self.tick();
        self.inner.list_debts(ctx, is_paid, order).await
    }

    async fn get_debt(&self, ctx: &SessionContext, id: &str) -> StoreResult<Option<Debt>> {
        self.tick();
        self.inner.get_debt(ctx, id).await
    }

    async fn settle_debt(
        &self,
        ctx: &SessionContext,
        id: &str,
        paid_at: DateTime<Utc>,
    ) -> StoreResult<Option<Settlement>> {
        self.check(Fault::SettleDebt)?;
        self.inner.settle_debt(ctx, id, paid_at).await
    }
}

#[async_trait]
impl SaleJournalStore for FlakyStore {
    async fn begin_sale(
        &self,
        ctx: &SessionContext,
        sale: &Sale,
        journal: &SaleJournalEntry,
    ) -> StoreResult<()> {
        self.check(Fault::BeginSale)?;
        self.inner.begin_sale(ctx, sale, journal).await
    }

    async fn apply_stock_decrement(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<StockDecrement> {
        self.check(Fault::DecrementStock)?;
        let drain = self.drain.lock().unwrap().take();
        if let Some((product_id, units)) = drain {
            if let Some(current) = self.inner.get_product(ctx, &product_id).await? {
                let patch = ProductPatch {
                    quantity: Some(current.quantity - units),
                    ..Default::default()
                };
                self.inner.update_product(ctx, &product_id, &patch, Utc::now()).await?;
            }
        }
        self.inner.apply_stock_decrement(ctx, journal_id).await
    }

    async fn attach_debt(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        debt: &Debt,
    ) -> StoreResult<String> {
        self.check(Fault::AttachDebt)?;
        self.inner.attach_debt(ctx, journal_id, debt).await
    }

    async fn flag_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
        status: JournalStatus,
        reason: &str,
    ) -> StoreResult<()> {
        self.tick();
        self.inner.flag_journal(ctx, journal_id, status, reason).await
    }

    async fn get_journal(
        &self,
        ctx: &SessionContext,
        journal_id: &str,
    ) -> StoreResult<Option<SaleJournalEntry>> {
        self.tick();
        self.inner.get_journal(ctx, journal_id).await
    }

    async fn list_open_journal(&self, ctx: &SessionContext) -> StoreResult<Vec<SaleJournalEntry>> {
        self.tick();
        self.inner.list_open_journal(ctx).await
    }
}
