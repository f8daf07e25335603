//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A sale of 3 × 0.10 must total exactly 0.30, not "nearly" 0.30.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (kobo, cents, ...)                   │
//! │    price 1500.00 → 150000 minor units                                  │
//! │    3 × 150000    → 450000 minor units = 4500.00, exactly               │
//! │                                                                         │
//! │  Decimal text from forms is rounded ONCE, on the way in (half-up).     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopbook_core::money::Money;
//!
//! let price = Money::parse("19.995").unwrap(); // rounds half-up
//! assert_eq!(price.minor_units(), 2000);
//!
//! let total = price.checked_mul_quantity(3).unwrap();
//! assert_eq!(total.to_string(), "60.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Minor units in one major unit (two decimal places).
pub const MINOR_PER_MAJOR: i64 = 100;

/// Number of decimal places kept for every amount.
pub const DECIMAL_PLACES: usize = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative when selling below cost
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as the bare integer** so JSON payloads carry minor units
/// - **Saturating `+`/`-`**: totals pin at the `i64` bounds instead of
///   wrapping or panicking
///
/// ## Where Money is Used
/// ```text
/// Product.selling_price ──► Sale.unit_price ──► Sale.total_amount ──► Debt.amount
///                                                       │
/// Product.cost_price ─────────────────────────────► profit_for_sale()
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let price = Money::from_minor(150_000); // 1500.00
    /// assert_eq!(price.major_units(), 1500);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from a whole number of major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit portion (truncated toward zero).
    #[inline]
    pub const fn major_units(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the fractional portion in minor units (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses decimal text ("1500", "19.99", "0.125") into Money.
    ///
    /// Digits beyond the second decimal place are rounded half-up on the
    /// magnitude: `0.125 → 0.13`, `0.124 → 0.12`, `-0.125 → -0.13`.
    ///
    /// ## Errors
    /// - `Required` for empty input
    /// - `InvalidFormat` for anything but an optional `-`, digits and one `.`
    /// - `Overflow` when the value does not fit in i64 minor units
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// assert_eq!(Money::parse("1500").unwrap().minor_units(), 150_000);
    /// assert_eq!(Money::parse("0.005").unwrap().minor_units(), 1);
    /// assert!(Money::parse("12,5").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "expected digits with an optional decimal point".to_string(),
            });
        }

        let overflow = || ValidationError::Overflow {
            field: "amount".to_string(),
        };

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };

        // First two fractional digits are kept, the third decides rounding.
        let digits: Vec<i64> = fraction
            .bytes()
            .map(|b| i64::from(b - b'0'))
            .collect();
        let digit = |i: usize| digits.get(i).copied().unwrap_or(0);
        let mut minor = digit(0) * 10 + digit(1);
        if digit(DECIMAL_PLACES) >= 5 {
            minor += 1;
        }

        let magnitude = whole_value
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -magnitude } else { magnitude }))
    }

    /// Multiplies a unit price by a quantity, failing on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let unit_price = Money::from_major(1500);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_major(4500)));
    /// assert_eq!(Money::from_minor(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Expresses `self` as a percentage of `whole`; zero when `whole` is zero.
    ///
    /// For display only (profit margins); never feed the result back into
    /// money arithmetic.
    pub fn percent_of(&self, whole: Money) -> f64 {
        if whole.is_zero() {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency symbol (`"-12.50"`).
///
/// Currency symbols are a configuration concern; see `LedgerConfig`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.major_units().abs(),
            self.minor_part()
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
