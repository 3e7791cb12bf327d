//! # Seed Data Generator
//!
//! Populates a database with a small product catalog and opening distributor
//! stock for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./prevente.db)
//! cargo run -p prevente-db --bin seed
//!
//! # Specify database path
//! cargo run -p prevente-db --bin seed -- --db ./data/prevente.db
//! ```

use std::env;

use prevente_core::types::{Location, REASON_PURCHASE};
use prevente_core::Money;
use prevente_db::{Database, DbConfig};

/// (name, unit price in centimes, opening distributor stock)
const CATALOG: &[(&str, i64, i64)] = &[
    ("Eau minérale 1.5L", 4500, 600),
    ("Eau minérale 0.5L", 2500, 400),
    ("Limonade 1L", 9000, 240),
    ("Jus d'orange 1L", 12000, 180),
    ("Jus de pomme 1L", 12000, 120),
    ("Soda cola 33cl", 5000, 480),
    ("Lait UHT 1L", 10500, 300),
    ("Café moulu 250g", 38000, 90),
    ("Thé vert 100g", 22000, 60),
    ("Biscuits assortis", 15000, 150),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./prevente.db".to_string());

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open database at {db_path}: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = seed(&db).await {
        eprintln!("seeding failed: {err}");
        std::process::exit(1);
    }

    println!(
        "Seeded {} products with opening stock into {db_path}",
        CATALOG.len()
    );
}

async fn seed(db: &Database) -> prevente_db::DbResult<()> {
    let products = db.products();
    let ledger = db.ledger();

    for &(name, price_cents, opening_stock) in CATALOG {
        products.upsert(name, Money::from_cents(price_cents)).await?;
        ledger
            .record_movement(
                &Location::Distributor,
                name,
                opening_stock,
                0,
                None,
                Some(REASON_PURCHASE),
            )
            .await?;
    }

    Ok(())
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
