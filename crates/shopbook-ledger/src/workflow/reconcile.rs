//! Reconciliation of sales left incomplete by an interrupted workflow.
//!
//! ```text
//!  journal entry (pending)
//!        │
//!        ├── stock_applied? ──no──► apply_stock_decrement
//!        │                              │ Insufficient / ProductMissing
//!        │                              └──────────► needs_attention
//!        ├── debt_required && no debt_id? ──► attach_debt
//!        ▼
//!     completed
//! ```
//!
//! Nothing here runs on its own; the caller decides when to reconcile.

use serde::{Deserialize, Serialize};
use shopbook_core::{JournalStatus, SaleJournalEntry};
use tracing::{info, warn};
use ts_rs::TS;

use super::{apply_outstanding, flag_failure, StepFailure};
use crate::error::{LedgerError, LedgerResult, PartialCause, StoreError, WorkflowStep};
use crate::session::SessionContext;
use crate::store::LedgerStore;

/// Result of resuming one journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "outcome")]
#[ts(export)]
pub enum ReconcileOutcome {
    /// Every outstanding step is now applied.
    Completed,
    /// A transient failure; a later run may finish it.
    StillPending { step: WorkflowStep, reason: String },
    /// Needs the owner (restock, or the product was deleted).
    NeedsAttention { step: WorkflowStep, reason: String },
}

/// Summary of a [`reconcile_pending`] run, listing sale ids per outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReconcileReport {
    pub examined: usize,
    pub completed: Vec<String>,
    pub still_pending: Vec<String>,
    pub needs_attention: Vec<String>,
    /// Entries already flagged for attention and left alone.
    pub skipped: usize,
}

/// Resumes every pending sale journal entry of the session's user.
///
/// Entries already flagged `needs_attention` are skipped; use
/// [`resume_sale`] for those once the owner has fixed the cause.
pub async fn reconcile_pending<S>(store: &S, ctx: &SessionContext) -> LedgerResult<ReconcileReport>
where
    S: LedgerStore + ?Sized,
{
    let open = store
        .list_open_journal(ctx)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?;

    let mut report = ReconcileReport::default();
    for entry in open {
        if entry.status == JournalStatus::NeedsAttention {
            report.skipped += 1;
            continue;
        }
        report.examined += 1;
        match resume_entry(store, ctx, &entry).await {
            ReconcileOutcome::Completed => report.completed.push(entry.sale_id),
            ReconcileOutcome::StillPending { .. } => report.still_pending.push(entry.sale_id),
            ReconcileOutcome::NeedsAttention { .. } => report.needs_attention.push(entry.sale_id),
        }
    }

    info!(
        user_id = %ctx.user_id,
        examined = report.examined,
        completed = report.completed.len(),
        still_pending = report.still_pending.len(),
        needs_attention = report.needs_attention.len(),
        skipped = report.skipped,
        "Reconciliation finished"
    );
    Ok(report)
}

/// Resumes a single journal entry regardless of its status.
pub async fn resume_sale<S>(
    store: &S,
    ctx: &SessionContext,
    journal_id: &str,
) -> LedgerResult<ReconcileOutcome>
where
    S: LedgerStore + ?Sized,
{
    let entry = store
        .get_journal(ctx, journal_id)
        .await
        .map_err(|e| LedgerError::from_store(WorkflowStep::Load, e))?
        .ok_or_else(|| LedgerError::not_found("sale journal", journal_id))?;

    Ok(resume_entry(store, ctx, &entry).await)
}

async fn resume_entry<S>(store: &S, ctx: &SessionContext, entry: &SaleJournalEntry) -> ReconcileOutcome
where
    S: LedgerStore + ?Sized,
{
    if entry.is_settled() {
        return ReconcileOutcome::Completed;
    }

    let failure = match store.get_sale(ctx, &entry.sale_id).await {
        Ok(Some(sale)) => {
            let mut applied = Vec::new();
            match apply_outstanding(store, ctx, entry, &sale, &mut applied).await {
                Ok(()) => {
                    info!(sale_id = %sale.id, journal_id = %entry.id, steps = ?applied, "Sale reconciled");
                    return ReconcileOutcome::Completed;
                }
                Err(failure) => failure,
            }
        }
        Ok(None) => StepFailure {
            step: WorkflowStep::RecordSale,
            cause: PartialCause::Persistence(StoreError::not_found("sale", entry.sale_id.as_str())),
        },
        Err(e) => StepFailure {
            step: WorkflowStep::Load,
            cause: PartialCause::Persistence(e),
        },
    };

    let status = flag_failure(store, ctx, &entry.id, &failure).await;
    let reason = failure.cause.to_string();
    warn!(
        sale_id = %entry.sale_id,
        journal_id = %entry.id,
        failed_step = %failure.step,
        cause = %reason,
        "Sale could not be reconciled"
    );

    match status {
        JournalStatus::Pending => ReconcileOutcome::StillPending {
            step: failure.step,
            reason,
        },
        _ => ReconcileOutcome::NeedsAttention {
            step: failure.step,
            reason,
        },
    }
}
