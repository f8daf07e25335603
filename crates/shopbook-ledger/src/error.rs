//! # Ledger Error Types
//!
//! Two layers of failure:
//!
//! - [`StoreError`] comes back from a persistence or identity collaborator.
//! - [`LedgerError`] is what a workflow operation returns to its caller.
//!
//! ## Retry Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Variant              Writes made?        Safe to re-submit?           │
//! │  ───────────────────  ──────────────────  ───────────────────────────  │
//! │  InvalidInput         none                after fixing the input       │
//! │  NotFound             none                no                           │
//! │  InsufficientStock    none                after restocking             │
//! │  PersistenceFailure   none                if `retryable`               │
//! │  PartialCompletion    Sale (+ maybe more) NO: reconcile instead        │
//! │  Unauthenticated      none                after signing in             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use shopbook_core::{Sale, ValidationError};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a persistence or identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Row does not exist or is not visible to the acting user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The session may not touch this row.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend unreachable, busy or timed out.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Constraint violation or concurrent modification.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded.
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True for transient failures where repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Conflict(_))
    }
}

/// Result alias for collaborator calls.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Workflow Step
// =============================================================================

/// Stage of a ledger operation at which a failure happened.
///
/// The first four are the ordered steps of sale recording; the rest name
/// the single write (or read) of the other operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WorkflowStep {
    /// Input checks, product lookup and stock check (reads only).
    Validate,
    /// Sale row and journal entry written.
    RecordSale,
    /// Product quantity reduced.
    DecrementStock,
    /// Debt row written for an unpaid sale.
    CreateDebt,
    /// Debt marked as paid.
    SettleDebt,
    /// Product created, edited or deleted.
    SaveProduct,
    /// Profile created or edited.
    SaveProfile,
    /// Read for display (lists, reports, session lookup).
    Load,
}

impl WorkflowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Validate => "validate",
            WorkflowStep::RecordSale => "record_sale",
            WorkflowStep::DecrementStock => "decrement_stock",
            WorkflowStep::CreateDebt => "create_debt",
            WorkflowStep::SettleDebt => "settle_debt",
            WorkflowStep::SaveProduct => "save_product",
            WorkflowStep::SaveProfile => "save_profile",
            WorkflowStep::Load => "load",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Partial Completion
// =============================================================================

/// Why a step after the sale record could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialCause {
    #[error("{0}")]
    Persistence(StoreError),

    /// Another sale took the stock between the check and the decrement.
    #[error("stock exhausted at commit time: {available} left")]
    StockExhausted { available: i64 },

    /// The product was deleted between the check and the decrement.
    #[error("product no longer exists")]
    ProductMissing,
}

impl PartialCause {
    /// True when reconciliation can be expected to finish the sale unaided.
    pub fn is_transient(&self) -> bool {
        match self {
            PartialCause::Persistence(err) => err.is_retryable(),
            PartialCause::StockExhausted { .. } | PartialCause::ProductMissing => false,
        }
    }
}

/// State of a sale whose workflow stopped after the sale was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSale {
    /// The sale as persisted.
    pub sale: Sale,
    /// Journal entry tracking the outstanding steps.
    pub journal_id: String,
    pub completed_steps: Vec<WorkflowStep>,
    pub failed_step: WorkflowStep,
    pub cause: PartialCause,
}

impl fmt::Display for PartialSale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sale {} recorded but {} failed: {}",
            self.sale.id, self.failed_step, self.cause
        )
    }
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Outcome of a failed workflow operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input rejected before any persistence call.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Referenced record does not exist for this user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested quantity exceeds current stock. Nothing was written.
    ///
    /// ## When This Occurs
    /// ```text
    /// Rice bag: 10 in stock
    /// record_sale(qty: 11) ──► InsufficientStock { available: 10, requested: 11 }
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// A collaborator failed before any write of this invocation succeeded.
    #[error("Persistence failure during {step}: {source}")]
    PersistenceFailure {
        step: WorkflowStep,
        retryable: bool,
        #[source]
        source: StoreError,
    },

    /// The sale was persisted but a later step failed.
    ///
    /// Re-submitting would record the sale twice; run reconciliation.
    #[error("Partial completion: {0}")]
    PartialCompletion(Box<PartialSale>),

    /// No profile exists for the session's user.
    #[error("Not authenticated")]
    Unauthenticated,
}

impl LedgerError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Wraps a collaborator failure that happened before any write.
    pub fn persistence(step: WorkflowStep, source: StoreError) -> Self {
        LedgerError::PersistenceFailure {
            step,
            retryable: source.is_retryable(),
            source,
        }
    }

    /// Maps a collaborator failure at `step`, surfacing missing rows as
    /// [`LedgerError::NotFound`].
    pub fn from_store(step: WorkflowStep, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            other => LedgerError::persistence(step, other),
        }
    }

    /// True when re-submitting the same request cannot duplicate anything.
    pub fn is_safe_to_retry(&self) -> bool {
        match self {
            LedgerError::PersistenceFailure { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Step that failed, for workflow errors that have one.
    pub fn failed_step(&self) -> Option<WorkflowStep> {
        match self {
            LedgerError::PersistenceFailure { step, .. } => Some(*step),
            LedgerError::PartialCompletion(partial) => Some(partial.failed_step),
            _ => None,
        }
    }
}

/// Result alias for workflow operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
