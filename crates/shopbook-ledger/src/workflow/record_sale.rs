//! Sale recording.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopbook_core::validation::{validate_credit_customer, validate_quantity};
use shopbook_core::{Customer, PaymentStatus, Sale, SaleJournalEntry, ValidationError, MAX_AMOUNT_CENTS};
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{apply_outstanding, flag_failure};
use crate::error::{LedgerError, LedgerResult, PartialSale, WorkflowStep};
use crate::session::SessionContext;
use crate::store::LedgerStore;

/// A sale as entered on the "Record Sale" form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
    pub payment: PaymentStatus,
    /// Required when `payment` is unpaid; optional otherwise.
    pub customer: Option<Customer>,
}

impl SaleRequest {
    pub fn paid(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleRequest {
            product_id: product_id.into(),
            quantity,
            payment: PaymentStatus::Paid,
            customer: None,
        }
    }

    pub fn on_credit(product_id: impl Into<String>, quantity: i64, customer: Customer) -> Self {
        SaleRequest {
            product_id: product_id.into(),
            quantity,
            payment: PaymentStatus::Unpaid,
            customer: Some(customer),
        }
    }
}

/// Records a sale, decrements stock and, for credit sales, opens a debt.
///
/// ## Outcomes
/// - `Ok(sale)`: every step applied.
/// - `InvalidInput`, `NotFound`, `InsufficientStock`,
///   `PersistenceFailure`: nothing was written.
/// - `PartialCompletion`: the sale exists but a later step failed; its
///   journal entry is left open for [`super::reconcile_pending`].
pub async fn record_sale<S>(store: &S, ctx: &SessionContext, request: SaleRequest) -> LedgerResult<Sale>
where
    S: LedgerStore + ?Sized,
{
    let SaleRequest {
        product_id,
        quantity,
        payment,
        customer,
    } = request;

    // Input-only checks, before any call to the store
    validate_quantity(quantity)?;
    if !payment.is_paid() {
        validate_credit_customer(customer.as_ref())?;
    }

    let product = store
        .get_product(ctx, &product_id)
        .await
        .map_err(|e| {
            error!(product_id = %product_id, error = %e, "Product lookup failed");
            LedgerError::from_store(WorkflowStep::Validate, e)
        })?
        .ok_or_else(|| LedgerError::not_found("product", &product_id))?;

    if product.ensure_can_sell(quantity).is_err() {
        debug!(product_id = %product.id, available = product.quantity, requested = quantity, "Sale rejected: insufficient stock");
        return Err(LedgerError::InsufficientStock {
            product_id: product.id,
            product_name: product.name,
            available: product.quantity,
            requested: quantity,
        });
    }

    let total = product
        .selling_price()
        .checked_mul_quantity(quantity)
        .filter(|total| total.minor_units() <= MAX_AMOUNT_CENTS)
        .ok_or(ValidationError::Overflow {
            field: "total amount".to_string(),
        })?;

    let (customer_name, customer_phone) = match customer {
        Some(c) => (Some(c.name.trim().to_string()), Some(c.phone.trim().to_string())),
        None => (None, None),
    };

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        user_id: ctx.user_id.clone(),
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        quantity,
        unit_price_cents: product.selling_price_cents,
        total_amount_cents: total.minor_units(),
        customer_name,
        customer_phone,
        is_paid: payment.is_paid(),
        is_debt: !payment.is_paid(),
        created_at: Utc::now(),
    };
    let journal = SaleJournalEntry::open(Uuid::new_v4().to_string(), &sale);

    store.begin_sale(ctx, &sale, &journal).await.map_err(|e| {
        error!(sale_id = %sale.id, error = %e, "Failed to record sale");
        LedgerError::persistence(WorkflowStep::RecordSale, e)
    })?;

    let mut completed = vec![WorkflowStep::Validate, WorkflowStep::RecordSale];
    if let Err(failure) = apply_outstanding(store, ctx, &journal, &sale, &mut completed).await {
        let status = flag_failure(store, ctx, &journal.id, &failure).await;
        warn!(
            sale_id = %sale.id,
            journal_id = %journal.id,
            failed_step = %failure.step,
            cause = %failure.cause,
            journal_status = status.as_str(),
            "Sale partially recorded"
        );
        return Err(LedgerError::PartialCompletion(Box::new(PartialSale {
            sale,
            journal_id: journal.id,
            completed_steps: completed,
            failed_step: failure.step,
            cause: failure.cause,
        })));
    }

    info!(
        sale_id = %sale.id,
        product = %sale.product_name,
        quantity = sale.quantity,
        total = %sale.total_amount(),
        paid = sale.is_paid,
        "Sale recorded"
    );
    Ok(sale)
}

// =============================================================================
// Unit Tests
// =============================================================================
