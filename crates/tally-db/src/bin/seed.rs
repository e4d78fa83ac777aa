//! # Seed Data Generator
//!
//! Populates the database with a demo salon for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default company into ./tally_dev.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path and company
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --company acme
//! ```
//!
//! ## Generated Data
//! - Clients (some with a cashback credit)
//! - Services with default commissions
//! - Products with opening stock and restock thresholds
//! - Packages

use std::env;
use tally_core::{Money, Percentage};
use tally_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_COMPANY: &str = "demo-company";

/// (name, cashback credit in cents)
const CLIENTS: &[(&str, i64)] = &[
    ("Ana Souza", 5000),
    ("Bruno Lima", 0),
    ("Carla Mendes", 1250),
    ("Diego Rocha", 0),
    ("Elisa Prado", 800),
];

/// (name, price in cents, default commission in bps)
const SERVICES: &[(&str, i64, u32)] = &[
    ("Haircut", 5000, 2000),
    ("Beard Trim", 3000, 2000),
    ("Coloring", 12000, 1500),
    ("Manicure", 4000, 3000),
    ("Pedicure", 4500, 3000),
    ("Facial Cleansing", 9000, 1250),
];

/// (name, price in cents, stock, minimum)
const PRODUCTS: &[(&str, i64, i64, i64)] = &[
    ("Shampoo 300ml", 2990, 24, 5),
    ("Conditioner 300ml", 3190, 18, 5),
    ("Hair Wax", 2500, 3, 4),
    ("Nail Polish", 1290, 40, 10),
    ("Beard Oil", 3990, 2, 2),
];

/// (name, price in cents)
const PACKAGES: &[(&str, i64)] = &[
    ("Groom Day (cut + beard)", 7000),
    ("Spa Day (manicure + pedicure + facial)", 15000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");
    let mut company_id = String::from(DEFAULT_COMPANY);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--company" | "-c" => {
                if i + 1 < args.len() {
                    company_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: ./tally_dev.db)");
                println!("  -c, --company <ID>     Company id to seed (default: {DEFAULT_COMPANY})");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(argument = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(%db_path, %company_id, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE company_id = ?1")
        .bind(&company_id)
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        warn!(existing, %company_id, "Company already seeded; delete the database to regenerate");
        return Ok(());
    }

    let catalog = db.catalog();
    let cashback = db.cashback();

    for (name, credit) in CLIENTS {
        let client = catalog.insert_client(&company_id, name).await?;
        if *credit > 0 {
            let balance = cashback.balance(&company_id, &client.id).await?;
            cashback
                .credit(&company_id, &balance.id, Money::from_cents(*credit), None)
                .await?;
        }
        println!("  client   {:<40} {}", name, client.id);
    }

    for (name, price, bps) in SERVICES {
        let entry = catalog
            .insert_service(
                &company_id,
                name,
                Money::from_cents(*price),
                Percentage::from_bps(*bps),
            )
            .await?;
        println!("  service  {:<40} {}", name, entry.id);
    }

    for (name, price, stock, minimum) in PRODUCTS {
        let entry = catalog
            .insert_product(&company_id, name, Money::from_cents(*price), *stock, *minimum)
            .await?;
        println!("  product  {:<40} {}", name, entry.id);
    }

    for (name, price) in PACKAGES {
        let entry = catalog
            .insert_package(&company_id, name, Money::from_cents(*price))
            .await?;
        println!("  package  {:<40} {}", name, entry.id);
    }

    info!(
        clients = CLIENTS.len(),
        services = SERVICES.len(),
        products = PRODUCTS.len(),
        packages = PACKAGES.len(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
