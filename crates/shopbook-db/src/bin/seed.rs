//! # Seed Data Generator
//!
//! Populates a database with a demo shop for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database (SHOPBOOK_DB_PATH or the platform data dir)
//! cargo run -p shopbook-db --bin seed
//!
//! # Specify database path and owner
//! cargo run -p shopbook-db --bin seed -- --db ./shopbook_dev.db --user demo
//! ```
//!
//! ## Generated Data
//! - One owner profile
//! - A dozen provisions-store products, some already at their alert level
//! - A mix of paid and credit sales, one of the debts settled

use std::env;
use std::sync::Arc;

use shopbook_core::reports::ReportPeriod;
use shopbook_core::{Customer, NewProduct};
use shopbook_db::{Database, DbConfig};
use shopbook_ledger::{LedgerConfig, SaleRequest, ShopLedger};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// (name, quantity, cost, selling price, low-stock alert), prices in major units
const PRODUCTS: &[(&str, i64, i64, i64, i64)] = &[
    ("Rice bag 50kg", 10, 1000, 1500, 2),
    ("Beans 5kg", 14, 2400, 3000, 3),
    ("Garri 10kg", 4, 1800, 2300, 5),
    ("Vegetable oil 5L", 8, 5200, 6500, 2),
    ("Sugar 1kg", 30, 900, 1200, 10),
    ("Salt 500g", 25, 150, 250, 5),
    ("Spaghetti 500g", 40, 450, 600, 12),
    ("Tomato paste tin", 3, 300, 450, 6),
    ("Milk powder 400g", 12, 2100, 2700, 4),
    ("Bottled water pack", 20, 700, 1000, 5),
    ("Bread loaf", 6, 600, 900, 6),
    ("Eggs crate", 5, 2800, 3400, 2),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Ada", "08001234567"),
    ("Chinedu", "08035551212"),
    ("Bisi", "+234 809 555 0101"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut db_path: Option<String> = None;
    let mut user_id = String::from("demo-owner");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopbook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: SHOPBOOK_DB_PATH or data dir)");
                println!("  -u, --user <ID>    Owner user id (default: demo-owner)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None => DbConfig::from_env()?,
    };
    println!("🌱 Shopbook Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database_path.display());
    println!("Owner:    {}", user_id);
    println!();

    let db = Database::new(config).await?;
    let ledger = ShopLedger::new(Arc::new(db), LedgerConfig::from_env()?);

    ledger
        .register_profile(&user_id, "08000000000", "Demo Provisions Store")
        .await?;
    let ctx = ledger.open_session(&user_id).await?;

    let existing = ledger.store().products().count(&ctx.user_id).await?;
    if existing > 0 {
        println!("⚠ Owner already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, quantity, cost, selling, alert) in PRODUCTS {
        let product = ledger
            .add_product(
                &ctx,
                NewProduct {
                    name: name.to_string(),
                    quantity: *quantity,
                    cost_price_cents: cost * 100,
                    selling_price_cents: selling * 100,
                    low_stock_alert: Some(*alert),
                },
            )
            .await?;
        products.push(product);
    }
    println!("✓ Added {} products", products.len());

    let mut recorded = 0;
    for (idx, product) in products.iter().enumerate() {
        let quantity = 1 + (idx as i64 % 3);
        if product.quantity < quantity {
            continue;
        }

        let request = if idx % 3 == 0 {
            let (name, phone) = CUSTOMERS[idx % CUSTOMERS.len()];
            SaleRequest::on_credit(
                &product.id,
                quantity,
                Customer {
                    name: name.to_string(),
                    phone: phone.to_string(),
                },
            )
        } else {
            SaleRequest::paid(&product.id, quantity)
        };

        match ledger.record_sale(&ctx, request).await {
            Ok(_) => recorded += 1,
            Err(e) => eprintln!("Failed to record sale of {}: {}", product.name, e),
        }
    }
    println!("✓ Recorded {} sales", recorded);

    let unpaid = ledger
        .debts(&ctx, shopbook_core::debts::DebtFilter::Unpaid, "")
        .await?;
    if let Some(debt) = unpaid.last() {
        ledger.mark_debt_paid(&ctx, &debt.id).await?;
        println!("✓ Settled debt of {}", debt.customer_name);
    }

    let summary = ledger.dashboard(&ctx).await?;
    let report = ledger.report(&ctx, ReportPeriod::Daily).await?;
    info!(
        sales = summary.todays_count,
        low_stock = summary.low_stock.len(),
        "Seed complete"
    );

    println!();
    println!("Today:       {}", ledger.format_currency(summary.todays_total.minor_units()));
    println!("Profit:      {}", ledger.format_currency(report.total_profit.minor_units()));
    println!("Owed to you: {}", ledger.format_currency(summary.outstanding_debt.minor_units()));
    println!("Low stock:   {} products", summary.low_stock.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: `info,shopbook=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopbook=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
