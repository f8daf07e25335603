//! Debt settlement.

use chrono::Utc;
use shopbook_core::Debt;
use tracing::{debug, error, info};

use crate::error::{LedgerError, LedgerResult, WorkflowStep};
use crate::session::SessionContext;
use crate::store::{DebtStore, Settlement};

/// Marks a debt as paid.
///
/// Settling an already-paid debt succeeds and returns it unchanged; its
/// `paid_at` keeps the first settlement time. The originating sale is not
/// touched.
pub async fn mark_debt_paid<S>(store: &S, ctx: &SessionContext, debt_id: &str) -> LedgerResult<Debt>
where
    S: DebtStore + ?Sized,
{
    let now = Utc::now();
    let settlement = store
        .settle_debt(ctx, debt_id, now)
        .await
        .map_err(|e| {
            error!(debt_id = %debt_id, error = %e, "Failed to settle debt");
            LedgerError::from_store(WorkflowStep::SettleDebt, e)
        })?
        .ok_or_else(|| LedgerError::not_found("debt", debt_id))?;

    match &settlement {
        Settlement::Settled(debt) => {
            info!(debt_id = %debt.id, customer = %debt.customer_name, amount = %debt.amount(), "Debt settled")
        }
        Settlement::AlreadyPaid(debt) => debug!(debt_id = %debt.id, "Debt was already settled"),
    }
    Ok(settlement.into_debt())
}
