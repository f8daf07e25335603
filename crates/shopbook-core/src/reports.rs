//! # Stock & Sales Aggregation
//!
//! Pure derivations over the shop's products, sales and debts. Nothing
//! here reads the clock: callers pass `now` and the business's UTC offset.
//!
//! ## Report Window
//! ```text
//!   Daily    ──►  local midnight today ............ now
//!   Weekly   ──►  now − 7 days ...................... now
//!   Monthly  ──►  local midnight on the 1st ........ now
//! ```
//!
//! Profit is computed against the *current* cost price of the product. A
//! sale whose product has been deleted contributes revenue but no profit.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Debt, Product, Sale};

// =============================================================================
// Stock
// =============================================================================

/// Products whose stock is at or below their alert threshold.
pub fn low_stock_items(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_low_stock()).collect()
}

// =============================================================================
// Sales
// =============================================================================

/// Sales made on the same local calendar date as `now`.
pub fn todays_sales(sales: &[Sale], now: DateTime<Utc>, offset: FixedOffset) -> Vec<&Sale> {
    let today = now.with_timezone(&offset).date_naive();
    sales
        .iter()
        .filter(|s| s.created_at.with_timezone(&offset).date_naive() == today)
        .collect()
}

/// Sum of sale totals.
pub fn total_revenue<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Money {
    sales.into_iter().map(Sale::total_amount).sum()
}

/// Sum of totals for sales paid at the counter.
pub fn total_paid<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Money {
    total_revenue(sales.into_iter().filter(|s| s.is_paid))
}

/// Sum of totals for sales made on credit.
pub fn total_on_credit<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Money {
    total_revenue(sales.into_iter().filter(|s| !s.is_paid))
}

/// Profit on one sale: `(unit price − cost) × quantity`.
///
/// Zero when the product no longer exists.
pub fn profit_for_sale(sale: &Sale, product: Option<&Product>) -> Money {
    match product {
        Some(p) => Money::from_minor(
            (sale.unit_price_cents - p.cost_price_cents).saturating_mul(sale.quantity),
        ),
        None => Money::zero(),
    }
}

/// Total profit across sales, matching each sale to its product by id.
pub fn total_profit<'a>(sales: impl IntoIterator<Item = &'a Sale>, products: &[Product]) -> Money {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();
    sales
        .into_iter()
        .map(|s| profit_for_sale(s, by_id.get(s.product_id.as_str()).copied()))
        .sum()
}

// =============================================================================
// Debts
// =============================================================================

/// Sum of amounts still owed.
pub fn outstanding_debt(debts: &[Debt]) -> Money {
    debts.iter().filter(|d| !d.is_paid).map(Debt::amount).sum()
}

/// Sum of amounts already collected.
pub fn paid_debt_total(debts: &[Debt]) -> Money {
    debts.iter().filter(|d| d.is_paid).map(Debt::amount).sum()
}

// =============================================================================
// Top Products
// =============================================================================

/// Units and revenue for one product over a set of sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    /// Name from the first sale seen for this product.
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Best sellers by revenue.
///
/// Groups sales by product id in first-seen order, then sorts by revenue
/// descending. The sort is stable, so ties keep first-seen order.
pub fn top_products<'a>(sales: impl IntoIterator<Item = &'a Sale>, n: usize) -> Vec<ProductSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<ProductSales> = Vec::new();

    for sale in sales {
        let slot = *index.entry(sale.product_id.as_str()).or_insert_with(|| {
            groups.push(ProductSales {
                product_id: sale.product_id.clone(),
                name: sale.product_name.clone(),
                quantity: 0,
                revenue_cents: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.quantity = group.quantity.saturating_add(sale.quantity);
        group.revenue_cents = group.revenue_cents.saturating_add(sale.total_amount_cents);
    }

    groups.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    groups.truncate(n);
    groups
}

// =============================================================================
// Period Reports
// =============================================================================

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReportPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl ReportPeriod {
    /// Inclusive start of the window ending at `now`.
    pub fn start(self, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        let today = now.with_timezone(&offset).date_naive();
        match self {
            ReportPeriod::Daily => local_midnight(today, offset),
            ReportPeriod::Weekly => now - Duration::days(7),
            ReportPeriod::Monthly => local_midnight(today.with_day(1).unwrap_or(today), offset),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }
}

/// Midnight of a local date, expressed in UTC.
fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Aggregates for one reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    pub total_sales: Money,
    pub total_profit: Money,
    pub total_paid: Money,
    pub total_debts: Money,
    pub sales_count: usize,
    pub top_products: Vec<ProductSales>,
    /// `total_profit / total_sales × 100`; zero when nothing was sold.
    pub profit_margin: f64,
}

/// Builds the report for `period`, listing the `top_n` best sellers.
pub fn period_report(
    sales: &[Sale],
    products: &[Product],
    period: ReportPeriod,
    now: DateTime<Utc>,
    offset: FixedOffset,
    top_n: usize,
) -> PeriodReport {
    let start = period.start(now, offset);
    let window: Vec<&Sale> = sales.iter().filter(|s| s.created_at >= start).collect();

    let total_sales = total_revenue(window.iter().copied());
    let profit = total_profit(window.iter().copied(), products);

    PeriodReport {
        period,
        start,
        total_sales,
        total_profit: profit,
        total_paid: total_paid(window.iter().copied()),
        total_debts: total_on_credit(window.iter().copied()),
        sales_count: window.len(),
        top_products: top_products(window.iter().copied(), top_n),
        profit_margin: profit.percent_of(total_sales),
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Figures shown on the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub todays_total: Money,
    pub todays_count: usize,
    pub outstanding_debt: Money,
    pub unpaid_debt_count: usize,
    pub product_count: usize,
    pub low_stock: Vec<Product>,
    pub all_time_revenue: Money,
    /// Up to five of today's sales, in the order given.
    pub recent_sales: Vec<Sale>,
}

pub fn dashboard_summary(
    products: &[Product],
    sales: &[Sale],
    debts: &[Debt],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> DashboardSummary {
    let today = todays_sales(sales, now, offset);

    DashboardSummary {
        todays_total: total_revenue(today.iter().copied()),
        todays_count: today.len(),
        outstanding_debt: outstanding_debt(debts),
        unpaid_debt_count: debts.iter().filter(|d| !d.is_paid).count(),
        product_count: products.len(),
        low_stock: low_stock_items(products).into_iter().cloned().collect(),
        all_time_revenue: total_revenue(sales),
        recent_sales: today.into_iter().take(5).cloned().collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn lagos() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn product(id: &str, qty: i64, alert: i64, cost: i64, sell: i64) -> Product {
        let t = at(2026, 1, 1, 0, 0);
        Product {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            name: format!("Product {}", id),
            quantity: qty,
            cost_price_cents: cost,
            selling_price_cents: sell,
            low_stock_alert: alert,
            created_at: t,
            updated_at: t,
        }
    }

    fn sale(id: &str, product_id: &str, qty: i64, unit: i64, paid: bool, when: DateTime<Utc>) -> Sale {
        Sale {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            quantity: qty,
            unit_price_cents: unit,
            total_amount_cents: qty * unit,
            customer_name: None,
            customer_phone: None,
            is_paid: paid,
            is_debt: !paid,
            created_at: when,
        }
    }

    fn debt(amount: i64, paid: bool) -> Debt {
        Debt {
            id: format!("d-{}", amount),
            user_id: "u-1".to_string(),
            sale_id: None,
            customer_name: "Ada".to_string(),
            customer_phone: "0800".to_string(),
            amount_cents: amount,
            description: "1x Product".to_string(),
            is_paid: paid,
            created_at: at(2026, 1, 1, 0, 0),
            paid_at: if paid { Some(at(2026, 1, 2, 0, 0)) } else { None },
        }
    }

    #[test]
    fn test_low_stock_inclusive() {
        let products = vec![
            product("a", 2, 2, 0, 0),
            product("b", 3, 2, 0, 0),
            product("c", 0, 0, 0, 0),
        ];
        let ids: Vec<&str> = low_stock_items(&products).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_todays_sales_use_local_date() {
        // 23:30 UTC on the 1st is 00:30 on the 2nd in UTC+1
        let now = at(2026, 3, 2, 12, 0);
        let sales = vec![
            sale("s1", "a", 1, 100, true, at(2026, 3, 1, 23, 30)),
            sale("s2", "a", 1, 100, true, at(2026, 3, 1, 22, 59)),
            sale("s3", "a", 1, 100, true, at(2026, 3, 2, 11, 0)),
        ];
        let ids: Vec<&str> = todays_sales(&sales, now, lagos())
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s1", "s3"]);
    }

    #[test]
    fn test_profit_skips_deleted_products() {
        let products = vec![product("a", 10, 2, 100_000, 150_000)];
        let sales = vec![
            sale("s1", "a", 3, 150_000, true, at(2026, 3, 1, 9, 0)),
            sale("s2", "gone", 2, 50_000, true, at(2026, 3, 1, 9, 0)),
        ];

        assert_eq!(total_profit(&sales, &products), Money::from_minor(150_000));
        assert_eq!(profit_for_sale(&sales[1], None), Money::zero());
        assert_eq!(total_revenue(&sales), Money::from_minor(550_000));
    }

    #[test]
    fn test_debt_totals() {
        let debts = vec![debt(450_000, false), debt(100, true), debt(50, false)];
        assert_eq!(outstanding_debt(&debts), Money::from_minor(450_050));
        assert_eq!(paid_debt_total(&debts), Money::from_minor(100));
    }

    #[test]
    fn test_top_products_stable_ordering() {
        let t = at(2026, 3, 1, 9, 0);
        let sales = vec![
            sale("s1", "a", 1, 500, true, t),
            sale("s2", "b", 2, 250, true, t),
            sale("s3", "c", 1, 900, true, t),
            sale("s4", "a", 1, 100, false, t),
        ];

        let top = top_products(&sales, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, "c");
        assert_eq!(top[1].product_id, "a");
        assert_eq!(top[1].quantity, 2);

        let tied = vec![sale("x", "b", 1, 100, true, t), sale("y", "a", 1, 100, true, t)];
        let order: Vec<String> = top_products(&tied, 5).into_iter().map(|p| p.product_id).collect();
        assert_eq!(order, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_huge_totals_saturate() {
        let now = at(2026, 3, 10, 12, 0);
        let unit = i64::MAX / 2 + 1;
        let products = vec![product("p1", 5, 1, 0, unit)];
        let sales = vec![
            sale("s1", "p1", 1, unit, true, now),
            sale("s2", "p1", 1, unit, true, now),
        ];

        let summary = dashboard_summary(&products, &sales, &[], now, lagos());
        assert_eq!(summary.todays_total, Money::from_minor(i64::MAX));
        assert_eq!(summary.all_time_revenue, Money::from_minor(i64::MAX));

        let top = top_products(&sales, 5);
        assert_eq!(top[0].revenue_cents, i64::MAX);
        assert_eq!(top[0].quantity, 2);

        let report = period_report(&sales, &products, ReportPeriod::Daily, now, lagos(), 5);
        assert_eq!(report.total_profit, Money::from_minor(i64::MAX));
    }

    #[test]
    fn test_period_start() {
        let now = at(2026, 3, 15, 10, 0);
        let offset = lagos();

        assert_eq!(ReportPeriod::Daily.start(now, offset), at(2026, 3, 14, 23, 0));
        assert_eq!(ReportPeriod::Weekly.start(now, offset), at(2026, 3, 8, 10, 0));
        assert_eq!(ReportPeriod::Monthly.start(now, offset), at(2026, 2, 28, 23, 0));
    }

    #[test]
    fn test_period_report() {
        let now = at(2026, 3, 15, 10, 0);
        let products = vec![product("a", 10, 2, 100_000, 150_000)];
        let sales = vec![
            sale("s1", "a", 3, 150_000, false, at(2026, 3, 15, 9, 0)),
            sale("s2", "a", 1, 150_000, true, at(2026, 3, 15, 8, 0)),
            sale("old", "a", 5, 150_000, true, at(2026, 2, 1, 8, 0)),
        ];

        let report = period_report(&sales, &products, ReportPeriod::Daily, now, lagos(), 5);
        assert_eq!(report.sales_count, 2);
        assert_eq!(report.total_sales, Money::from_minor(600_000));
        assert_eq!(report.total_paid, Money::from_minor(150_000));
        assert_eq!(report.total_debts, Money::from_minor(450_000));
        assert_eq!(report.total_profit, Money::from_minor(200_000));
        assert!((report.profit_margin - 33.333_333).abs() < 1e-3);
        assert_eq!(report.top_products.len(), 1);

        let empty = period_report(&[], &products, ReportPeriod::Monthly, now, lagos(), 5);
        assert_eq!(empty.profit_margin, 0.0);
        assert_eq!(empty.sales_count, 0);
    }

    #[test]
    fn test_dashboard_summary() {
        let now = at(2026, 3, 15, 10, 0);
        let products = vec![product("a", 7, 2, 100_000, 150_000), product("b", 1, 5, 10, 20)];
        let sales = vec![
            sale("s1", "a", 3, 150_000, false, at(2026, 3, 15, 9, 0)),
            sale("s0", "b", 1, 20, true, at(2026, 3, 10, 9, 0)),
        ];
        let debts = vec![debt(450_000, false)];

        let summary = dashboard_summary(&products, &sales, &debts, now, lagos());
        assert_eq!(summary.todays_total, Money::from_minor(450_000));
        assert_eq!(summary.todays_count, 1);
        assert_eq!(summary.outstanding_debt, Money::from_minor(450_000));
        assert_eq!(summary.unpaid_debt_count, 1);
        assert_eq!(summary.product_count, 2);
        assert_eq!(summary.low_stock.len(), 1);
        assert_eq!(summary.all_time_revenue, Money::from_minor(450_020));
        assert_eq!(summary.recent_sales.len(), 1);
    }
}
