//! # Seed Data Generator
//!
//! Stocks a demo shop so there is something to scan.
//!
//! ## Usage
//! ```bash
//! # Stock every demo item (default)
//! cargo run -p tillquest-db --bin seed
//!
//! # Only the first 10 items
//! cargo run -p tillquest-db --bin seed -- --count 10
//!
//! # Specify database path
//! cargo run -p tillquest-db --bin seed -- --db ./data/tillquest.db
//! ```
//!
//! ## Generated Items
//! Toys, snacks and school supplies across a few shelves. Each item has:
//! - Barcode: `200{shelf}{index:04}`
//! - A kid-friendly name
//! - Price: 0.50 - 15.00
//! - Stock: 1 - 20

use std::env;

use tillquest_core::Money;
use tillquest_db::{Database, DbConfig, InventoryStore};

/// Demo shelves: (shelf number, base price in cents, items)
const SHELVES: &[(u32, i64, &[&str])] = &[
    (
        1,
        300,
        &[
            "Bouncy Ball",
            "Yo-Yo",
            "Toy Car",
            "Jump Rope",
            "Kite",
            "Rubber Duck",
            "Building Blocks",
            "Teddy Bear",
        ],
    ),
    (
        2,
        50,
        &[
            "Lollipop",
            "Apple",
            "Banana",
            "Juice Box",
            "Cookie",
            "Gummy Bears",
            "Popcorn",
            "Chocolate Bar",
        ],
    ),
    (
        3,
        100,
        &[
            "Pencil",
            "Eraser",
            "Crayons",
            "Sticker Sheet",
            "Notebook",
            "Ruler",
            "Glue Stick",
            "Colouring Book",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./tillquest_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("TillQuest Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to stock (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./tillquest_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("TillQuest Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut inventory = InventoryStore::open(db.kv()).await?;
    if !inventory.is_empty() {
        println!("⚠ Shop already has {} items", inventory.len());
        println!("  Skipping seed to avoid overwriting stock.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut stocked = 0;
    'shelves: for (shelf, base_price, names) in SHELVES {
        for (index, name) in names.iter().enumerate() {
            if stocked >= count {
                break 'shelves;
            }

            let (barcode, price, quantity) = demo_item(*shelf, *base_price, index);
            if let Err(e) = inventory.upsert(&barcode, name, price, quantity).await {
                eprintln!("Failed to stock {}: {}", name, e);
                continue;
            }

            println!("  {:<16} {:>6}  x{:<3} {}", barcode, price, quantity, name);
            stocked += 1;
        }
    }

    println!();
    println!("✓ Stocked {} items ({} units)", stocked, inventory.total_units());

    db.close().await;
    Ok(())
}

/// Barcode, price and stock for the `index`th item on `shelf`.
fn demo_item(shelf: u32, base_price: i64, index: usize) -> (String, Money, i64) {
    let barcode = format!("200{}{:04}", shelf, index);
    let price = Money::from_cents(base_price + ((index as i64 * 175) % 1200));
    let quantity = 1 + ((index as i64 * 7) % 20);
    (barcode, price, quantity)
}
