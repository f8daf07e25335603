//! # shopbook-ledger: Sale, Inventory and Debt Workflow
//!
//! Everything in Shopbook that writes more than one record lives here. The
//! crate owns no storage; it drives the persistence and identity
//! collaborators through the traits in [`store`] and [`session`].
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record_sale()                                     │
//! │                                                                         │
//! │  Validate ──► product lookup ──► stock check                           │
//! │     │               (reads only; any failure here writes nothing)      │
//! │     ▼                                                                   │
//! │  ① begin_sale        Sale + pending journal entry (atomic)             │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ② apply_stock_decrement   quantity -= q WHERE quantity >= q           │
//! │     │                      + journal.stock_applied (atomic)            │
//! │     ▼                                                                   │
//! │  ③ attach_debt (unpaid only)  Debt + journal.debt_id (atomic)          │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Ok(Sale)                                                               │
//! │                                                                         │
//! │  Failure after ① ──► LedgerError::PartialCompletion                    │
//! │                      journal stays open for reconcile_pending()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`workflow`] - record_sale, mark_debt_paid, reconcile_pending
//! - [`inventory`] - product create / edit / delete
//! - [`store`] - persistence collaborator traits
//! - [`session`] - identity collaborator and [`SessionContext`]
//! - [`memory`] - in-memory store for tests and demos
//! - [`service`] - [`ShopLedger`] facade used by the UI layer
//! - [`config`] - runtime settings
//! - [`api`] - serializable error payloads
//! - [`error`] - workflow error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod inventory;
pub mod memory;
pub mod service;
pub mod session;
pub mod store;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{ApiError, ErrorCode};
pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, LedgerResult, PartialCause, PartialSale, StoreError, StoreResult, WorkflowStep};
pub use memory::MemoryStore;
pub use service::{LedgerSnapshot, ShopLedger};
pub use session::{IdentityService, SessionContext};
pub use store::{
    DebtStore, LedgerStore, ListOrder, ProductStore, SaleJournalStore, SaleStore, Settlement,
    StockDecrement,
};
pub use workflow::{ReconcileOutcome, ReconcileReport, SaleRequest};
