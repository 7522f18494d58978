//! # Seed Data Generator
//!
//! Populates a fresh database with the default administrator and a small
//! demo catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p pos-db --bin seed
//!
//! # Specify database path
//! cargo run -p pos-db --bin seed -- --db ./data/pos.db
//! ```
//!
//! Refuses to touch a database that already has products, so it is safe
//! to run twice.

use std::env;

use chrono::Utc;
use pos_core::{Customer, Product};
use pos_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, barcode, price_cents, stock, reorder_threshold)
const PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Arabica Beans 1kg", "7891000100103", 4590, 24, 5),
    ("Whole Milk 1L", "7891000100110", 450, 60, 12),
    ("White Bread", "7891000100127", 380, 18, 6),
    ("Spaghetti 500g", "7891000100134", 290, 40, 10),
    ("Olive Oil 500ml", "7891000100141", 1890, 15, 4),
    ("Mineral Water 1.5L", "7891000100158", 220, 120, 24),
    ("Dark Chocolate 90g", "7891000100165", 650, 30, 8),
    ("Ground Coffee 250g", "7891000100172", 1290, 22, 6),
    ("Rice 1kg", "7891000100189", 520, 35, 10),
    ("Black Beans 1kg", "7891000100196", 740, 28, 8),
];

/// (name, phone)
const CUSTOMERS: &[(&str, &str)] = &[
    ("Ana Souza", "555-0101"),
    ("Bruno Lima", "555-0102"),
    ("Carla Mendes", "555-0103"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./pos_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("POS Seed Data Generator");
    println!("=======================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    if db.auth().ensure_default_admin().await? {
        println!("✓ Default administrator created (admin / admin123 - change it)");
    } else {
        println!("  Users already present, administrator not touched");
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} products; skipping catalog seed.");
        return Ok(());
    }

    let now = Utc::now();
    for (name, barcode, price_cents, stock, reorder) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            barcode: Some((*barcode).to_string()),
            price_cents: *price_cents,
            stock_on_hand: *stock,
            reorder_threshold: *reorder,
            is_active: true,
            created_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("✓ Seeded {} products", PRODUCTS.len());

    for (name, phone) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: (*name).to_string(),
            tax_id: None,
            phone: Some((*phone).to_string()),
            email: None,
            is_active: true,
            created_at: now,
        };
        db.customers().insert(&customer).await?;
    }
    println!("✓ Seeded {} customers", CUSTOMERS.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}
