//! # Repository Module
//!
//! Database repository implementations for Shopbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger store trait call (crate::store)                                │
//! │       │                                                                 │
//! │       │  db.products().list(user_id, order)                            │
//! │       ▼                                                                 │
//! │  ProductRepository / SaleRepository / DebtRepository / ...             │
//! │       │                                                                 │
//! │       │  SQL, always filtered by user_id                               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Compound steps (JournalRepository) open one transaction and call the  │
//! │  `*_in(&mut conn, ..)` helpers of the other repositories inside it.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and conditional decrement
//! - [`sale::SaleRepository`] - Sale reads and inserts
//! - [`debt::DebtRepository`] - Debt reads, inserts and settlement
//! - [`journal::JournalRepository`] - Sale journal compound steps
//! - [`profile::ProfileRepository`] - Owner profiles

use shopbook_ledger::ListOrder;

pub mod debt;
pub mod journal;
pub mod product;
pub mod profile;
pub mod sale;

/// `ORDER BY` clause for a creation-time listing. `rowid` breaks ties
/// between rows created in the same instant.
pub(crate) fn order_by(order: ListOrder) -> &'static str {
    match order {
        ListOrder::NewestFirst => "created_at DESC, rowid DESC",
        ListOrder::OldestFirst => "created_at ASC, rowid ASC",
    }
}
