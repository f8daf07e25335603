//! # shopbook-db: Database Layer for Shopbook
//!
//! SQLite persistence for the ledger. [`Database`] implements every
//! `shopbook-ledger` store trait plus `IdentityService`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopbook Data Flow                               │
//! │                                                                         │
//! │  ShopLedger::record_sale(ctx, request)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    shopbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 0001_initial │  │   │
//! │  │   │ store.rs      │    │ DebtRepo      │    │ _schema.sql  │  │   │
//! │  │   │ (trait impls) │    │ JournalRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/shopbook/shopbook.db (or SHOPBOOK_DB_PATH)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-table repositories
//! - [`store`] - Ledger trait implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopbook_db::{Database, DbConfig};
//! use shopbook_ledger::{LedgerConfig, ShopLedger};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let ledger = ShopLedger::new(Arc::new(db), LedgerConfig::from_env()?);
//!
//! let ctx = ledger.open_session(&user_id).await?;
//! let summary = ledger.dashboard(&ctx).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::debt::DebtRepository;
pub use repository::journal::JournalRepository;
pub use repository::product::ProductRepository;
pub use repository::profile::ProfileRepository;
pub use repository::sale::SaleRepository;
