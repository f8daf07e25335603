//! # Domain Types
//!
//! Core domain types used throughout Shopbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │      Debt       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  sale_id (opt)  │──►Sale│
//! │  │  quantity       │   │  name snapshot  │   │  customer       │       │
//! │  │  cost / selling │   │  unit price     │   │  amount         │       │
//! │  │  low_stock_alert│   │  total, is_paid │   │  is_paid/paid_at│       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐                         │
//! │  │  SaleJournalEntry   │   │  UserProfile    │                         │
//! │  │  ─────────────────  │   │  ─────────────  │                         │
//! │  │  sale_id            │   │  phone          │                         │
//! │  │  stock_applied      │   │  business_name  │                         │
//! │  │  debt_id            │   │  is_pro         │                         │
//! │  │  status             │   └─────────────────┘                         │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every persisted entity carries the `user_id` of the shop owner it belongs
//! to; stores never return rows owned by another user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// An inventory item with stock quantity and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shop owner this product belongs to.
    pub user_id: String,

    /// Display name, also snapshotted onto every sale.
    pub name: String,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Purchase cost per unit in minor units.
    pub cost_price_cents: i64,

    /// Selling price per unit in minor units.
    pub selling_price_cents: i64,

    /// Threshold at or below which the product is flagged for restocking.
    pub low_stock_alert: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_minor(self.cost_price_cents)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_minor(self.selling_price_cents)
    }

    /// True when stock is at or below the alert threshold (boundary included).
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_alert
    }

    /// Markup over cost as a percentage; `None` when the cost is zero.
    pub fn margin_percent(&self) -> Option<f64> {
        if self.cost_price_cents == 0 {
            return None;
        }
        Some((self.selling_price() - self.cost_price()).percent_of(self.cost_price()))
    }

    /// Checks that `quantity` units can be taken from stock.
    pub fn ensure_can_sell(&self, quantity: i64) -> CoreResult<()> {
        if quantity > self.quantity {
            return Err(CoreError::InsufficientStock {
                product: self.name.clone(),
                available: self.quantity,
                requested: quantity,
            });
        }
        Ok(())
    }
}

/// Fields supplied when entering a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i64,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    /// Falls back to [`crate::DEFAULT_LOW_STOCK_ALERT`] when absent.
    pub low_stock_alert: Option<i64>,
}

/// Partial update of a product; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub cost_price_cents: Option<i64>,
    pub selling_price_cents: Option<i64>,
    pub low_stock_alert: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.cost_price_cents.is_none()
            && self.selling_price_cents.is_none()
            && self.low_stock_alert.is_none()
    }

    /// Applies the patch to an in-memory product.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(cost) = self.cost_price_cents {
            product.cost_price_cents = cost;
        }
        if let Some(selling) = self.selling_price_cents {
            product.selling_price_cents = selling;
        }
        if let Some(alert) = self.low_stock_alert {
            product.low_stock_alert = alert;
        }
        product.updated_at = now;
    }
}

// =============================================================================
// Payment & Customer
// =============================================================================

/// Whether the customer paid at the counter or bought on credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    /// Settled at the time of sale.
    Paid,
    /// Sold on credit; a debt is recorded for the customer.
    Unpaid,
}

impl PaymentStatus {
    #[inline]
    pub fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

/// Customer details attached to a sale. Required for credit sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable record of one transaction.
///
/// Uses the snapshot pattern: product name and unit price are frozen at
/// the time of sale, so later product edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Selling price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Always `quantity × unit_price_cents`.
    pub total_amount_cents: i64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub is_paid: bool,
    /// Always `!is_paid`.
    pub is_debt: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_minor(self.total_amount_cents)
    }

    /// Customer details, when both name and phone were recorded.
    pub fn customer(&self) -> Option<Customer> {
        match (&self.customer_name, &self.customer_phone) {
            (Some(name), Some(phone)) => Some(Customer {
                name: name.clone(),
                phone: phone.clone(),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Debt
// =============================================================================

/// A ledger entry for money a customer owes for an unpaid sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Debt {
    pub id: String,
    pub user_id: String,
    /// Originating sale. Absent on debts recorded without a sale reference.
    pub sale_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub amount_cents: i64,
    /// Human-readable summary, e.g. `"3x Rice bag"`.
    pub description: String,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the debt is settled.
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Debt {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_cents)
    }

    /// Builds the description stored on a debt: `"<quantity>x <product>"`.
    pub fn describe(quantity: i64, product_name: &str) -> String {
        format!("{}x {}", quantity, product_name)
    }

    /// Settles the debt. Returns `false` (and changes nothing) when it was
    /// already paid, so `paid_at` keeps its first value.
    pub fn settle(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_paid {
            return false;
        }
        self.is_paid = true;
        self.paid_at = Some(now);
        true
    }
}

// =============================================================================
// Sale Journal
// =============================================================================

/// Progress of a sale through the recording workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum JournalStatus {
    /// Sale recorded, later steps outstanding (or interrupted).
    Pending,
    /// Every required step applied.
    Completed,
    /// A step cannot be applied automatically (e.g. stock ran out).
    NeedsAttention,
}

impl JournalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::Pending => "pending",
            JournalStatus::Completed => "completed",
            JournalStatus::NeedsAttention => "needs_attention",
        }
    }
}

/// Reconciliation marker written atomically with a Sale.
///
/// Records which follow-up effects the sale still owes (stock decrement,
/// debt creation) so an interrupted workflow can be resumed without
/// applying any effect twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleJournalEntry {
    pub id: String,
    pub user_id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// True for credit sales.
    pub debt_required: bool,
    pub stock_applied: bool,
    pub debt_id: Option<String>,
    pub status: JournalStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleJournalEntry {
    /// Opens a pending journal entry for a freshly built sale.
    pub fn open(id: String, sale: &Sale) -> Self {
        SaleJournalEntry {
            id,
            user_id: sale.user_id.clone(),
            sale_id: sale.id.clone(),
            product_id: sale.product_id.clone(),
            quantity: sale.quantity,
            debt_required: sale.is_debt,
            stock_applied: false,
            debt_id: None,
            status: JournalStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: sale.created_at,
            updated_at: sale.created_at,
        }
    }

    /// True when nothing remains to be applied.
    pub fn is_settled(&self) -> bool {
        self.stock_applied && (!self.debt_required || self.debt_id.is_some())
    }

    /// Status implied by the applied steps.
    pub fn derived_status(&self) -> JournalStatus {
        if self.is_settled() {
            JournalStatus::Completed
        } else if self.status == JournalStatus::NeedsAttention {
            JournalStatus::NeedsAttention
        } else {
            JournalStatus::Pending
        }
    }
}

// =============================================================================
// User Profile
// =============================================================================

/// Profile of an authenticated shop owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub phone: String,
    pub business_name: String,
    pub is_pro: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Profile fields the owner may change from the settings screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProfileUpdate {
    pub business_name: Option<String>,
    pub is_pro: Option<bool>,
}

impl ProfileUpdate {
    pub fn apply_to(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        if let Some(name) = &self.business_name {
            profile.business_name = name.trim().to_string();
        }
        if let Some(is_pro) = self.is_pro {
            profile.is_pro = is_pro;
        }
        profile.updated_at = now;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rice_bag() -> Product {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Product {
            id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            name: "Rice bag".to_string(),
            quantity: 10,
            cost_price_cents: 100_000,
            selling_price_cents: 150_000,
            low_stock_alert: 2,
            created_at: now,
            updated_at: now,
        }
    }

    fn credit_sale() -> Sale {
        Sale {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            product_id: "p-1".to_string(),
            product_name: "Rice bag".to_string(),
            quantity: 3,
            unit_price_cents: 150_000,
            total_amount_cents: 450_000,
            customer_name: Some("Ada".to_string()),
            customer_phone: Some("08001234567".to_string()),
            is_paid: false,
            is_debt: true,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_low_stock_boundary() {
        let mut product = rice_bag();
        assert!(!product.is_low_stock());
        product.quantity = 2;
        assert!(product.is_low_stock());
        product.quantity = 3;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_margin_percent() {
        let mut product = rice_bag();
        assert!((product.margin_percent().unwrap() - 50.0).abs() < 1e-9);
        product.cost_price_cents = 0;
        assert_eq!(product.margin_percent(), None);
    }

    #[test]
    fn test_ensure_can_sell() {
        let product = rice_bag();
        assert!(product.ensure_can_sell(10).is_ok());
        let err = product.ensure_can_sell(11).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 10,
                requested: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let mut product = rice_bag();
        let later = product.created_at + chrono::Duration::hours(1);
        let patch = ProductPatch {
            quantity: Some(25),
            name: Some("  Rice bag 50kg ".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut product, later);

        assert_eq!(product.quantity, 25);
        assert_eq!(product.name, "Rice bag 50kg");
        assert_eq!(product.selling_price_cents, 150_000);
        assert_eq!(product.updated_at, later);
        assert!(ProductPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_debt_settles_once() {
        let first = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        let mut debt = Debt {
            id: "d-1".to_string(),
            user_id: "u-1".to_string(),
            sale_id: Some("s-1".to_string()),
            customer_name: "Ada".to_string(),
            customer_phone: "08001234567".to_string(),
            amount_cents: 450_000,
            description: Debt::describe(3, "Rice bag"),
            is_paid: false,
            created_at: first,
            paid_at: None,
        };

        assert_eq!(debt.description, "3x Rice bag");
        assert!(debt.settle(first));
        assert!(!debt.settle(second));
        assert_eq!(debt.paid_at, Some(first));
    }

    #[test]
    fn test_sale_customer() {
        let sale = credit_sale();
        assert_eq!(sale.customer().unwrap().name, "Ada");
        assert_eq!(sale.total_amount(), Money::from_major(4500));

        let walk_in = Sale {
            customer_phone: None,
            ..credit_sale()
        };
        assert!(walk_in.customer().is_none());
    }

    #[test]
    fn test_journal_settlement() {
        let sale = credit_sale();
        let mut journal = SaleJournalEntry::open("j-1".to_string(), &sale);
        assert!(journal.debt_required);
        assert_eq!(journal.derived_status(), JournalStatus::Pending);

        journal.stock_applied = true;
        assert!(!journal.is_settled());

        journal.debt_id = Some("d-1".to_string());
        assert_eq!(journal.derived_status(), JournalStatus::Completed);
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_value(credit_sale()).unwrap();
        assert_eq!(json["totalAmountCents"], 450_000);
        assert_eq!(json["isDebt"], true);

        let status = serde_json::to_string(&JournalStatus::NeedsAttention).unwrap();
        assert_eq!(status, "\"needs_attention\"");
    }
}
