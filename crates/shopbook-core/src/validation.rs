//! # Validation Module
//!
//! Input validation utilities for Shopbook.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form                                                     │
//! │  ├── Basic format checks (empty, numeric)                              │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: shopbook-ledger operation                                    │
//! │  └── THIS MODULE: runs before any persistence call                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite)                                               │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Conditional stock decrement                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopbook_core::validation::{validate_customer, validate_quantity};
//!
//! validate_quantity(3).unwrap();
//! assert!(validate_customer(" ", "08001234567").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Customer, NewProduct, ProductPatch};
use crate::{MAX_AMOUNT_CENTS, MAX_PARTY_NAME_LEN, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_PRODUCT_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use shopbook_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Rice bag").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, MAX_PRODUCT_NAME_LEN)
}

/// Validates a business name from the profile settings.
pub fn validate_business_name(name: &str) -> ValidationResult<()> {
    required_text("business name", name, MAX_PARTY_NAME_LEN)
}

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Digits, spaces and an optional leading `+` only
/// - Between 7 and 15 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body.chars().all(|c| c.is_ascii_digit() || c == ' ') {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must have between 7 and 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates the customer attached to a credit sale.
///
/// ## Rules
/// - Name and phone must both be non-empty after trimming
/// - Name at most [`MAX_PARTY_NAME_LEN`] characters
///
/// The phone is stored as written; only presence is checked.
pub fn validate_customer(name: &str, phone: &str) -> ValidationResult<()> {
    required_text("customer name", name, MAX_PARTY_NAME_LEN)?;

    if phone.trim().is_empty() {
        return Err(ValidationError::required("customer phone"));
    }

    Ok(())
}

/// Validates an optional customer for a credit sale.
pub fn validate_credit_customer(customer: Option<&Customer>) -> ValidationResult<()> {
    match customer {
        Some(c) => validate_customer(&c.name, &c.phone),
        None => Err(ValidationError::required("customer name")),
    }
}

/// Validates free text that must be present and bounded.
fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Record Sale                                                            │
/// │                                                                         │
/// │  Owner enters quantity: 3                                              │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(3) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → stock check, then persist                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level entered on the inventory form. Zero is allowed.
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    non_negative("quantity", qty)
}

/// Validates a low-stock alert threshold. Zero disables the alert for
/// everything except an empty shelf.
pub fn validate_low_stock_alert(threshold: i64) -> ValidationResult<()> {
    non_negative("low stock alert", threshold)
}

/// Validates a price in minor units.
///
/// ## Example
/// ```rust
/// use shopbook_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("selling price", 150_000).is_ok());
/// assert!(validate_price_cents("selling price", 0).is_ok());
/// assert!(validate_price_cents("selling price", -1).is_err());
/// assert!(validate_price_cents("selling price", i64::MAX).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    non_negative(field, cents)?;
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::Overflow {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates every field of a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_stock_level(product.quantity)?;
    validate_price_cents("cost price", product.cost_price_cents)?;
    validate_price_cents("selling price", product.selling_price_cents)?;
    if let Some(threshold) = product.low_stock_alert {
        validate_low_stock_alert(threshold)?;
    }
    Ok(())
}

/// Validates the fields present in a product patch.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }
    if let Some(qty) = patch.quantity {
        validate_stock_level(qty)?;
    }
    if let Some(cost) = patch.cost_price_cents {
        validate_price_cents("cost price", cost)?;
    }
    if let Some(selling) = patch.selling_price_cents {
        validate_price_cents("selling price", selling)?;
    }
    if let Some(threshold) = patch.low_stock_alert {
        validate_low_stock_alert(threshold)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
