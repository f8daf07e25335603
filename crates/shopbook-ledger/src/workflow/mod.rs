//! # Workflow Operations
//!
//! Multi-record writes: recording a sale, settling a debt and resuming
//! interrupted sales.
//!
//! The steps that follow a persisted sale (stock decrement, debt creation)
//! are shared by [`record_sale`] and [`reconcile_pending`]; both drive them
//! through the sale's journal entry, so a step is never applied twice.

mod reconcile;
mod record_sale;
mod settle_debt;

pub use reconcile::{reconcile_pending, resume_sale, ReconcileOutcome, ReconcileReport};
pub use record_sale::{record_sale, SaleRequest};
pub use settle_debt::mark_debt_paid;

use shopbook_core::{Debt, JournalStatus, Sale, SaleJournalEntry};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PartialCause, WorkflowStep};
use crate::session::SessionContext;
use crate::store::{SaleJournalStore, StockDecrement};

/// A post-sale step that could not be applied.
#[derive(Debug)]
pub(crate) struct StepFailure {
    pub step: WorkflowStep,
    pub cause: PartialCause,
}

impl StepFailure {
    /// Journal status to record for this failure.
    pub fn journal_status(&self) -> JournalStatus {
        if self.cause.is_transient() {
            JournalStatus::Pending
        } else {
            JournalStatus::NeedsAttention
        }
    }
}

/// Builds the debt owed for an unpaid sale.
pub(crate) fn debt_for_sale(sale: &Sale) -> Debt {
    Debt {
        id: Uuid::new_v4().to_string(),
        user_id: sale.user_id.clone(),
        sale_id: Some(sale.id.clone()),
        customer_name: sale.customer_name.clone().unwrap_or_default(),
        customer_phone: sale.customer_phone.clone().unwrap_or_default(),
        amount_cents: sale.total_amount_cents,
        description: Debt::describe(sale.quantity, &sale.product_name),
        is_paid: false,
        created_at: sale.created_at,
        paid_at: None,
    }
}

/// Applies every step the journal entry still owes, in order.
///
/// Steps applied by this call are pushed onto `completed`.
pub(crate) async fn apply_outstanding<S>(
    store: &S,
    ctx: &SessionContext,
    journal: &SaleJournalEntry,
    sale: &Sale,
    completed: &mut Vec<WorkflowStep>,
) -> Result<(), StepFailure>
where
    S: SaleJournalStore + ?Sized,
{
    if !journal.stock_applied {
        let outcome = store
            .apply_stock_decrement(ctx, &journal.id)
            .await
            .map_err(|e| StepFailure {
                step: WorkflowStep::DecrementStock,
                cause: PartialCause::Persistence(e),
            })?;

        match outcome {
            StockDecrement::Applied { remaining } => {
                debug!(product_id = %journal.product_id, quantity = journal.quantity, remaining, "Stock decremented");
            }
            StockDecrement::AlreadyApplied => {
                debug!(journal_id = %journal.id, "Stock decrement already applied");
            }
            StockDecrement::Insufficient { available } => {
                return Err(StepFailure {
                    step: WorkflowStep::DecrementStock,
                    cause: PartialCause::StockExhausted { available },
                });
            }
            StockDecrement::ProductMissing => {
                return Err(StepFailure {
                    step: WorkflowStep::DecrementStock,
                    cause: PartialCause::ProductMissing,
                });
            }
        }
        completed.push(WorkflowStep::DecrementStock);
    }

    if journal.debt_required && journal.debt_id.is_none() {
        let debt = debt_for_sale(sale);
        let debt_id = store
            .attach_debt(ctx, &journal.id, &debt)
            .await
            .map_err(|e| StepFailure {
                step: WorkflowStep::CreateDebt,
                cause: PartialCause::Persistence(e),
            })?;
        debug!(debt_id = %debt_id, sale_id = %sale.id, amount = %debt.amount(), "Debt recorded");
        completed.push(WorkflowStep::CreateDebt);
    }

    Ok(())
}

/// Records a step failure on the journal. Best effort: a failure to flag
/// is logged and otherwise ignored.
pub(crate) async fn flag_failure<S>(
    store: &S,
    ctx: &SessionContext,
    journal_id: &str,
    failure: &StepFailure,
) -> JournalStatus
where
    S: SaleJournalStore + ?Sized,
{
    let status = failure.journal_status();
    let reason = format!("{}: {}", failure.step, failure.cause);
    if let Err(e) = store.flag_journal(ctx, journal_id, status, &reason).await {
        warn!(journal_id = %journal_id, error = %e, "Could not flag sale journal");
    }
    status
}
