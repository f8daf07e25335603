//! # Debt Ledger Views
//!
//! Filtering and per-customer grouping for the debts screen.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Debt;

/// Tab selected on the debts screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DebtFilter {
    #[default]
    All,
    Unpaid,
    Paid,
}

impl DebtFilter {
    #[inline]
    pub fn matches(self, debt: &Debt) -> bool {
        match self {
            DebtFilter::All => true,
            DebtFilter::Unpaid => !debt.is_paid,
            DebtFilter::Paid => debt.is_paid,
        }
    }

    /// The `is_paid` value a store should filter on, if any.
    pub fn is_paid(self) -> Option<bool> {
        match self {
            DebtFilter::All => None,
            DebtFilter::Unpaid => Some(false),
            DebtFilter::Paid => Some(true),
        }
    }
}

/// Debts matching `filter` whose customer name (case-insensitive) or phone
/// contains `search`. A blank search matches everything.
pub fn filter_debts<'a>(debts: &'a [Debt], filter: DebtFilter, search: &str) -> Vec<&'a Debt> {
    let needle = search.trim().to_lowercase();
    debts
        .iter()
        .filter(|d| filter.matches(d))
        .filter(|d| {
            needle.is_empty()
                || d.customer_name.to_lowercase().contains(&needle)
                || d.customer_phone.contains(&needle)
        })
        .collect()
}

/// What one customer owes across all their debts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerBalance {
    pub customer_phone: String,
    /// Name on the most recent debt.
    pub customer_name: String,
    pub outstanding: Money,
    pub unpaid_count: usize,
    #[ts(as = "String")]
    pub last_debt_at: DateTime<Utc>,
}

/// Groups debts by customer phone, sorted by outstanding amount descending.
///
/// Customers with only settled debts are included with a zero balance.
pub fn customer_balances(debts: &[Debt]) -> Vec<CustomerBalance> {
    let mut by_phone: HashMap<&str, CustomerBalance> = HashMap::new();

    for debt in debts {
        let entry = by_phone
            .entry(debt.customer_phone.as_str())
            .or_insert_with(|| CustomerBalance {
                customer_phone: debt.customer_phone.clone(),
                customer_name: debt.customer_name.clone(),
                outstanding: Money::zero(),
                unpaid_count: 0,
                last_debt_at: debt.created_at,
            });

        if debt.created_at > entry.last_debt_at {
            entry.last_debt_at = debt.created_at;
            entry.customer_name = debt.customer_name.clone();
        }
        if !debt.is_paid {
            entry.outstanding += debt.amount();
            entry.unpaid_count += 1;
        }
    }

    let mut balances: Vec<CustomerBalance> = by_phone.into_values().collect();
    balances.sort_by(|a, b| {
        b.outstanding
            .cmp(&a.outstanding)
            .then_with(|| b.last_debt_at.cmp(&a.last_debt_at))
            .then_with(|| a.customer_phone.cmp(&b.customer_phone))
    });
    balances
}
