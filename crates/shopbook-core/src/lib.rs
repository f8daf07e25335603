//! # shopbook-core: Pure Business Logic for Shopbook
//!
//! This crate holds the domain of a small-shop bookkeeping app as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │   Inventory ──► Record Sale ──► Debts ──► Dashboard / Reports   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopbook-ledger (workflow)                      │   │
//! │  │    record_sale, mark_debt_paid, reconcile_pending, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  reports  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ low stock │  │   rules   │  │   │
//! │  │   │ Sale/Debt │  │ half-up   │  │  profit   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Sale, Debt, SaleJournalEntry, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`reports`] - Stock and sales derivations for dashboard and reports
//! - [`debts`] - Debt ledger filtering and per-customer balances
//!
//! ## Example Usage
//!
//! ```rust
//! use shopbook_core::money::Money;
//!
//! // Prices arrive as decimal text from forms and are rounded half-up
//! let price = Money::parse("1500").unwrap();
//! let total = price.checked_mul_quantity(3).unwrap();
//!
//! assert_eq!(total.minor_units(), 450_000);
//! assert_eq!(total.to_string(), "4500.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod debts;
pub mod error;
pub mod money;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Low-stock threshold applied when a product is entered without one.
pub const DEFAULT_LOW_STOCK_ALERT: i64 = 5;

/// Number of products listed in the "top sellers" section of reports.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Maximum length of a customer or business name.
pub const MAX_PARTY_NAME_LEN: usize = 120;

/// Largest price or sale total accepted, in minor units (10 trillion major).
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;
