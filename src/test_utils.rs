//! Shared test utilities for the production ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::missing_errors_doc)]

use crate::{
    core::{inventory, subproduct, subproduct::IngredientLine},
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = crate::config::database::create_connection("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers an inventory product and stocks it.
///
/// # Arguments
/// * `db` - Database connection
/// * `name` - Product name
/// * `base_unit` - Unit of the product's family (`g`, `ml`, `u`, ...)
/// * `stock` - Initial stock in base units, zero leaves the product unstocked
/// * `unit_cost` - Cost of one base unit
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    base_unit: &str,
    stock: Decimal,
    unit_cost: Decimal,
) -> Result<entities::inventory_item::Model> {
    let product = inventory::register_product(db, name, base_unit).await?;
    if stock <= Decimal::ZERO {
        return Ok(product);
    }
    inventory::receive_stock(db, product.id, stock, &product.base_unit, unit_cost).await
}

/// Builds an ingredient line.
pub fn line(product_id: i64, quantity: Decimal, unit: &str) -> IngredientLine {
    IngredientLine {
        product_id,
        quantity,
        unit: unit.to_string(),
    }
}

/// Current stock of an inventory product, zero if it does not exist.
pub async fn stock_of(db: &DatabaseConnection, product_id: i64) -> Result<Decimal> {
    Ok(inventory::get_product(db, product_id)
        .await?
        .map_or(Decimal::ZERO, |p| p.stock_quantity.get()))
}

/// Sets up the bakery scenario: flour and water in stock.
/// Returns (db, flour, water).
///
/// # Defaults
/// * flour: 10 000 g at 0.002 per gram
/// * water: 5 000 ml at 0.0005 per millilitre
pub async fn setup_bakery() -> Result<(
    DatabaseConnection,
    entities::inventory_item::Model,
    entities::inventory_item::Model,
)> {
    let db = setup_test_db().await?;
    let flour = create_test_product(&db, "Flour", "g", Decimal::from(10_000), Decimal::new(2, 3))
        .await?;
    let water = create_test_product(&db, "Water", "ml", Decimal::from(5_000), Decimal::new(5, 4))
        .await?;
    Ok((db, flour, water))
}

/// Sets up the bakery scenario plus a "Dough" subproduct made from 500 g flour and 250 ml water.
/// Returns (db, flour, water, dough).
pub async fn setup_with_dough() -> Result<(
    DatabaseConnection,
    entities::inventory_item::Model,
    entities::inventory_item::Model,
    entities::subproduct::Model,
)> {
    let (db, flour, water) = setup_bakery().await?;
    subproduct::create_subproduct(
        &db,
        "Dough",
        &[
            line(flour.id, Decimal::from(500), "g"),
            line(water.id, Decimal::from(250), "ml"),
        ],
    )
    .await?;
    let dough = subproduct::get_subproduct_by_name(&db, "Dough")
        .await?
        .ok_or_else(|| crate::errors::Error::not_found("subproduct", "Dough"))?;
    Ok((db, flour, water, dough))
}
