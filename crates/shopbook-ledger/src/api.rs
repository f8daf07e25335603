//! # API Error Type
//!
//! Serializable error payload for the web frontend.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoreError ──► LedgerError ──► ApiError ──► JSON ──► Frontend          │
//! │                                                                         │
//! │  {                                                                      │
//! │    "code": "PARTIAL_COMPLETION",                                        │
//! │    "message": "Sale saved, but the debt could not be recorded yet.",    │
//! │    "retryable": false,                                                  │
//! │    "failedStep": "create_debt"                                          │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `retryable` tells the UI whether re-submitting the same form is safe.
//! A partial completion is never retryable: the sale already exists.

use serde::Serialize;
use tracing::error;
use ts_rs::TS;

use crate::error::{LedgerError, PartialCause, WorkflowStep};

/// Error returned to the frontend when an operation fails.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Whether re-submitting the same request is safe
    pub retryable: bool,

    /// Step that failed, for persistence failures and partial completions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<WorkflowStep>,
}

/// Error codes for API responses.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'INSUFFICIENT_STOCK': showStockWarning(e.message); break;
///   case 'PARTIAL_COMPLETION': showReconcileBanner(); break;
///   case 'VALIDATION_ERROR':   showForm(e.message); break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Record not found
    NotFound,

    /// Not enough stock for the sale
    InsufficientStock,

    /// Storage failed before anything was written
    PersistenceError,

    /// Sale saved but a follow-up step failed
    PartialCompletion,

    /// No signed-in owner
    Unauthenticated,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retryable: false,
            failed_step: None,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let retryable = err.is_safe_to_retry();
        let failed_step = err.failed_step();

        let (code, message) = match err {
            LedgerError::InvalidInput(e) => (ErrorCode::ValidationError, capitalize(&e.to_string())),
            LedgerError::NotFound { entity, id } => {
                (ErrorCode::NotFound, format!("{} not found: {}", capitalize(&entity), id))
            }
            LedgerError::InsufficientStock {
                product_name,
                available,
                requested,
                ..
            } => (
                ErrorCode::InsufficientStock,
                format!(
                    "Not enough {} in stock: {} available, {} requested",
                    product_name, available, requested
                ),
            ),
            LedgerError::PersistenceFailure { step, source, .. } => {
                // Log the actual error but return a generic message
                error!(step = %step, error = %source, "Persistence failure");
                (ErrorCode::PersistenceError, "Could not save. Please try again.".to_string())
            }
            LedgerError::PartialCompletion(partial) => {
                let message = match (&partial.failed_step, &partial.cause) {
                    (_, PartialCause::StockExhausted { available }) => format!(
                        "Sale saved, but only {} left in stock. Restock to complete it.",
                        available
                    ),
                    (_, PartialCause::ProductMissing) => {
                        "Sale saved, but the product was deleted.".to_string()
                    }
                    (WorkflowStep::CreateDebt, _) => {
                        "Sale saved, but the debt could not be recorded yet.".to_string()
                    }
                    _ => "Sale saved, but stock could not be updated yet.".to_string(),
                };
                (ErrorCode::PartialCompletion, message)
            }
            LedgerError::Unauthenticated => {
                (ErrorCode::Unauthenticated, "Please sign in again.".to_string())
            }
        };

        ApiError {
            code,
            message,
            retryable,
            failed_step,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PartialSale, StoreError};
    use crate::testing::{product, sale_for};
    use shopbook_core::ValidationError;

    #[test]
    fn test_validation_error_payload() {
        let api: ApiError = LedgerError::InvalidInput(ValidationError::required("customer name")).into();
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Customer name is required");
        assert_eq!(json["retryable"], false);
        assert!(json.get("failedStep").is_none());
    }

    #[test]
    fn test_persistence_failure_is_retryable() {
        let api: ApiError = LedgerError::persistence(
            WorkflowStep::RecordSale,
            StoreError::Unavailable("timeout".into()),
        )
        .into();

        assert_eq!(api.code, ErrorCode::PersistenceError);
        assert!(api.retryable);
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["failedStep"], "record_sale");
    }

    #[test]
    fn test_partial_completion_payload() {
        let rice = product("u-1", "Rice bag", 10);
        let partial = PartialSale {
            sale: sale_for(&rice, 3, false),
            journal_id: "j-1".to_string(),
            completed_steps: vec![
                WorkflowStep::Validate,
                WorkflowStep::RecordSale,
                WorkflowStep::DecrementStock,
            ],
            failed_step: WorkflowStep::CreateDebt,
            cause: PartialCause::Persistence(StoreError::Unavailable("offline".into())),
        };
        let api: ApiError = LedgerError::PartialCompletion(Box::new(partial)).into();

        assert_eq!(api.code, ErrorCode::PartialCompletion);
        assert!(!api.retryable);
        assert_eq!(api.failed_step, Some(WorkflowStep::CreateDebt));
        assert!(api.message.contains("debt could not be recorded"));
    }

    #[test]
    fn test_insufficient_stock_message() {
        let api: ApiError = LedgerError::InsufficientStock {
            product_id: "p-1".to_string(),
            product_name: "Rice bag".to_string(),
            available: 10,
            requested: 11,
        }
        .into();
        assert_eq!(api.message, "Not enough Rice bag in stock: 10 available, 11 requested");
        assert_eq!(api.to_string(), "[InsufficientStock] Not enough Rice bag in stock: 10 available, 11 requested");
    }
}
