use dotenvy::dotenv;
use production_ledger::{
    ProductionLedger, Result,
    config::{database, inventory as inventory_config},
    core::inventory,
};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Open the ledger: one connection shared by every caller
    let database_url = database::get_database_url();
    let ledger = ProductionLedger::connect(&database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 4. Seed the inventory if a seed file is present
    let seed_path = inventory_config::get_seed_path();
    if Path::new(&seed_path).exists() {
        let seed = inventory_config::load_seed(&seed_path)?;
        let added = inventory::seed_inventory(ledger.connection(), &seed.products)
            .await
            .inspect_err(|e| error!("Failed to seed inventory: {}", e))?;
        info!("Seeded {added} inventory product(s) from {seed_path}.");
    } else {
        warn!("No inventory seed at {seed_path}, skipping.");
    }

    // 5. Report current state
    for product in ledger.list_products_for_summary().await {
        info!(
            "Ingredient {}: {} {} at {} per {}",
            product.name,
            product.stock_quantity,
            product.base_unit,
            product.weighted_average_cost,
            product.base_unit
        );
    }
    for subproduct in ledger.list_subproducts().await {
        info!("Subproduct {}: cost {:.2}", subproduct.name, subproduct.total_cost);
    }
    for product in ledger.list_final_products_with_costing().await {
        let margin = product.margin.map_or_else(
            || "-".to_string(),
            |m| format!("{:.1}%", m * Decimal::ONE_HUNDRED),
        );
        info!(
            "Final product {} ({} x {}): unit cost {:.4}, price {:.2}, margin {}",
            product.name,
            product.units_produced,
            product.subproduct_name,
            product.cost_per_unit,
            product.sale_price,
            margin
        );
    }

    ledger.close().await
}
