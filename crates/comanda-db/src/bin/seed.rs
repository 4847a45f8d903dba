//! # Seed Data Generator
//!
//! Creates a tenant schema and fills its catalog with a small restaurant
//! menu for development.
//!
//! ## Usage
//! ```bash
//! # Seed the "demo" tenant using DATABASE_URL
//! cargo run -p comanda-db --bin seed
//!
//! # Choose tenant and database
//! cargo run -p comanda-db --bin seed -- --schema bistro --db postgres://localhost/comanda
//! ```
//!
//! ## Generated Catalog
//! - Pizzas (printed in the kitchen): three sizes, whole and half quantities
//! - Burgers (printed in the kitchen)
//! - Drinks (served from the counter)
//! - Extras: add-ons such as cheese and bacon, priced per portion

use std::env;

use uuid::Uuid;

use comanda_core::{Category, Money, Multiplier, Product, Quantity, Size, TenantSchema};
use comanda_db::{migrations, Database, DbConfig};

/// (category, need_print, sizes, quantities in thousandths, products as (code, name, cents))
type MenuSection = (
    &'static str,
    bool,
    &'static [&'static str],
    &'static [i64],
    &'static [(&'static str, &'static str, i64)],
);

const MENU: &[MenuSection] = &[
    (
        "Pizzas",
        true,
        &["Small", "Medium", "Large"],
        &[1000, 500],
        &[
            ("PZ-MARG", "Margherita", 4200),
            ("PZ-PEPP", "Pepperoni", 4800),
            ("PZ-4QJ", "Four Cheese", 5200),
            ("PZ-CAL", "Calabresa", 4500),
        ],
    ),
    (
        "Burgers",
        true,
        &["Regular"],
        &[1000, 2000],
        &[
            ("BG-CLS", "Classic Burger", 2800),
            ("BG-CHS", "Cheeseburger", 3100),
            ("BG-VEG", "Veggie Burger", 2900),
        ],
    ),
    (
        "Drinks",
        false,
        &["350ml", "600ml"],
        &[1000, 2000, 6000],
        &[
            ("DR-COLA", "Cola", 700),
            ("DR-GUAR", "Guarana", 700),
            ("DR-WATER", "Still Water", 450),
            ("DR-JUICE", "Orange Juice", 1100),
        ],
    ),
    (
        "Extras",
        false,
        &["Portion"],
        &[1000, 2000],
        &[
            ("EX-CHEESE", "Extra Cheese", 600),
            ("EX-BACON", "Bacon", 800),
            ("EX-EGG", "Fried Egg", 400),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut schema_name = String::from("demo");
    let mut database_url = env::var("DATABASE_URL").ok();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--schema" | "-s" => {
                if i + 1 < args.len() {
                    schema_name = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    database_url = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Comanda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --schema <NAME>  Tenant schema to seed (default: demo)");
                println!("  -d, --db <URL>       PostgreSQL URL (default: $DATABASE_URL)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let database_url = database_url.ok_or("DATABASE_URL is not set and --db was not given")?;
    let schema: TenantSchema = schema_name.parse()?;

    println!("🌱 Comanda Seed Data Generator");
    println!("==============================");
    println!("Tenant: {}", schema);
    println!();

    let db = Database::new(DbConfig::new(&database_url).max_connections(2)).await?;
    println!("✓ Connected to database");

    db.migrate_schema(&schema).await?;
    let (total, applied) = migrations::migration_status(db.pool(), &schema).await?;
    println!("✓ Migrations applied ({}/{})", applied, total);

    let catalog = db.catalog();
    let existing = catalog.count_products(&schema).await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating catalog...");

    let mut generated = 0;
    for (category_name, need_print, sizes, quantities, products) in MENU {
        let category = Category {
            id: Uuid::new_v4(),
            name: category_name.to_string(),
            need_print: *need_print,
        };
        catalog.insert_category(&schema, &category).await?;

        for thousandths in quantities.iter() {
            let quantity = Quantity {
                id: Uuid::new_v4(),
                category_id: category.id,
                value: Multiplier::from_thousandths(*thousandths),
            };
            catalog.insert_quantity(&schema, &quantity).await?;
        }

        for size_name in sizes.iter() {
            let size = Size {
                id: Uuid::new_v4(),
                name: size_name.to_string(),
                category_id: category.id,
            };
            catalog.insert_size(&schema, &size).await?;

            for (size_idx, (code, name, cents)) in products.iter().enumerate() {
                let product = generate_product(&category, &size, code, name, *cents, size_idx);
                if let Err(e) = catalog.insert_product(&schema, &product).await {
                    eprintln!("Failed to insert {}: {}", product.code, e);
                    continue;
                }
                generated += 1;
            }
        }

        println!("  {} ready", category_name);
    }

    println!();
    println!("✓ Generated {} products", generated);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// One product per (menu entry, size). Bigger sizes cost a bit more.
fn generate_product(
    category: &Category,
    size: &Size,
    code: &str,
    name: &str,
    base_cents: i64,
    seed: usize,
) -> Product {
    let size_code: String = size
        .name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase();

    let size_addon = match size.name.as_str() {
        "Medium" | "600ml" => base_cents / 4,
        "Large" => base_cents / 2,
        _ => 0,
    };
    let price_cents = base_cents + size_addon;

    // Cost between 30% and 45% of price
    let cost_pct = 30 + (seed * 5 % 16) as i64;

    Product {
        id: Uuid::new_v4(),
        code: format!("{}-{}", code, size_code),
        name: format!("{} {}", name, size.name),
        description: None,
        price: Money::from_cents(price_cents),
        cost: Money::from_cents(price_cents * cost_pct / 100),
        is_available: true,
        category_id: category.id,
        category: None,
        size_id: Some(size.id),
        size: None,
    }
}
