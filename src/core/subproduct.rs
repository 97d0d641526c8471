//! Subproduct business logic - Costing, stock consumption and recipe management.
//!
//! Creating a subproduct runs in three phases inside one [`UnitOfWork`]:
//! 1. cost every ingredient line at its current weighted-average cost (read-only),
//! 2. consume each line's stock from the inventory,
//! 3. persist the subproduct and its recipe lines.
//!
//! Any failure rolls the whole unit back, so inventory is never left partially consumed.
//! The cost is a snapshot: producing the subproduct later consumes stock again but never
//! re-prices it.

use crate::{
    core::{inventory, unit_of_work::UnitOfWork},
    entities::{
        FinalProduct, Subproduct, SubproductIngredient, final_product, subproduct,
        subproduct_ingredient,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// One ingredient as entered by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// Inventory product to draw from
    pub product_id: i64,
    /// Quantity in `unit`
    pub quantity: Decimal,
    /// Unit symbol as entered (e.g., `"kg"`)
    pub unit: String,
}

/// A persisted recipe line, quantity and unit exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLine {
    /// Inventory product id
    pub product_id: i64,
    /// Quantity as entered
    pub quantity_used: Decimal,
    /// Unit as entered
    pub unit_used: String,
}

impl From<subproduct_ingredient::Model> for RecipeLine {
    fn from(model: subproduct_ingredient::Model) -> Self {
        Self {
            product_id: model.product_id,
            quantity_used: model.quantity_used.get(),
            unit_used: model.unit_used,
        }
    }
}

/// Identity and cost snapshot of a subproduct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubproductSummary {
    /// Subproduct id
    pub id: i64,
    /// Subproduct name
    pub name: String,
    /// Cost snapshot taken at creation
    pub total_cost: Decimal,
}

impl From<subproduct::Model> for SubproductSummary {
    fn from(model: subproduct::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            total_cost: model.total_cost.get(),
        }
    }
}

/// Stock drawn from one inventory product during a production run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedLine {
    /// Inventory product id
    pub product_id: i64,
    /// Amount consumed in the product's base unit
    pub base_quantity: Decimal,
}

/// Confirmation of a completed production run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRun {
    /// The subproduct that was produced, cost unchanged
    pub subproduct: SubproductSummary,
    /// How many batches were produced
    pub run_quantity: u32,
    /// What each recipe line drew from inventory
    pub consumed: Vec<ConsumedLine>,
}

/// Computes the cost of a set of ingredient lines without side effects.
///
/// The sum `Σ base_quantity × weighted_average_cost` is accumulated in exact decimal
/// arithmetic.
///
/// # Errors
/// Returns [`Error::MissingIngredient`] if a product is absent from inventory and
/// [`Error::Conversion`] if a quantity cannot be normalised to the product's base unit,
/// and [`Error::Validation`] if the cost leaves the decimal range.
pub async fn cost_ingredients<C>(conn: &C, lines: &[IngredientLine]) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let mut total = Decimal::ZERO;
    for line in lines {
        let product = inventory::get_product(conn, line.product_id)
            .await?
            .ok_or(Error::MissingIngredient {
                product_id: line.product_id,
            })?;
        let base_quantity = inventory::to_product_base(&product, line.quantity, &line.unit)?;
        let unit_cost = product.weighted_average_cost.get();
        let line_cost = base_quantity
            .checked_mul(unit_cost)
            .ok_or_else(|| Error::overflow(format!("cost of {} {}", line.quantity, line.unit)))?;
        debug!(
            product = %product.name,
            base_quantity = %base_quantity,
            unit_cost = %unit_cost,
            line_cost = %line_cost,
            "ingredient costed"
        );
        total = total
            .checked_add(line_cost)
            .ok_or_else(|| Error::overflow("subproduct cost"))?;
    }
    Ok(total)
}

/// Creates a subproduct, consuming its ingredients, and returns its total cost.
///
/// # Errors
/// Returns [`Error::Validation`] for an empty name, no lines or non-positive quantities;
/// [`Error::MissingIngredient`], [`Error::Conversion`], [`Error::InsufficientStock`] or an
/// out-of-range [`Error::Validation`] from the costing and consumption phases; [`Error::Database`] on storage failure.
/// No stock is consumed and nothing is persisted when any error is returned.
pub async fn create_subproduct(
    db: &DatabaseConnection,
    name: &str,
    lines: &[IngredientLine],
) -> Result<Decimal> {
    create_subproduct_record(db, name, lines)
        .await
        .map(|created| created.total_cost)
}

/// Same as [`create_subproduct`] but also returns the new id and name.
///
/// `total_cost` in the returned summary is the exact computed cost.
///
/// # Errors
/// Same as [`create_subproduct`].
pub async fn create_subproduct_record(
    db: &DatabaseConnection,
    name: &str,
    lines: &[IngredientLine],
) -> Result<SubproductSummary> {
    let name = name.trim();
    validate_recipe(name, lines)?;

    let uow = UnitOfWork::begin(db, "create_subproduct").await?;
    let outcome = create_in(uow.conn(), name, lines).await;
    let created = uow.finish(outcome).await.inspect_err(|e| {
        error!("Error creating subproduct '{name}': {e}");
    })?;

    info!(
        subproduct_id = created.id,
        "Subproduct '{}' created. Cost: {:.2}", created.name, created.total_cost
    );
    Ok(created)
}

fn validate_recipe(name: &str, lines: &[IngredientLine]) -> Result<()> {
    if name.is_empty() {
        return Err(Error::validation("Subproduct name cannot be empty"));
    }
    if lines.is_empty() {
        return Err(Error::validation(
            "A subproduct needs at least one ingredient",
        ));
    }
    if let Some(bad) = lines.iter().find(|l| l.quantity <= Decimal::ZERO) {
        return Err(Error::validation(format!(
            "Ingredient quantity must be positive, got {} {} for product {}",
            bad.quantity, bad.unit, bad.product_id
        )));
    }
    Ok(())
}

async fn create_in<C>(conn: &C, name: &str, lines: &[IngredientLine]) -> Result<SubproductSummary>
where
    C: ConnectionTrait,
{
    // Phase 1: every line must cost out before anything is touched
    let total_cost = cost_ingredients(conn, lines).await?;

    // Phase 2: consume stock
    for line in lines {
        inventory::consume_stock(conn, line.product_id, line.quantity, &line.unit).await?;
    }

    // Phase 3: persist
    let created = subproduct::ActiveModel {
        name: Set(name.to_string()),
        total_cost: Set(total_cost.into()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let rows = lines.iter().map(|line| subproduct_ingredient::ActiveModel {
        subproduct_id: Set(created.id),
        product_id: Set(line.product_id),
        quantity_used: Set(line.quantity.into()),
        unit_used: Set(line.unit.trim().to_string()),
        ..Default::default()
    });
    SubproductIngredient::insert_many(rows).exec(conn).await?;

    Ok(SubproductSummary {
        id: created.id,
        name: created.name,
        total_cost,
    })
}

/// Lists all subproducts ordered by name.
///
/// Storage failures are logged and produce an empty list.
pub async fn list_subproducts(db: &DatabaseConnection) -> Vec<SubproductSummary> {
    match Subproduct::find()
        .order_by_asc(subproduct::Column::Name)
        .all(db)
        .await
    {
        Ok(rows) => rows.into_iter().map(SubproductSummary::from).collect(),
        Err(e) => {
            error!("Error listing subproducts: {e}");
            Vec::new()
        }
    }
}

/// Lists the recipe lines of a subproduct in insertion order.
///
/// Unknown subproducts and storage failures both produce an empty list.
pub async fn get_ingredients(db: &DatabaseConnection, subproduct_id: i64) -> Vec<RecipeLine> {
    match recipe_lines(db, subproduct_id).await {
        Ok(lines) => lines,
        Err(e) => {
            error!("Error loading ingredients of subproduct {subproduct_id}: {e}");
            Vec::new()
        }
    }
}

async fn recipe_lines<C>(conn: &C, subproduct_id: i64) -> Result<Vec<RecipeLine>>
where
    C: ConnectionTrait,
{
    let rows = SubproductIngredient::find()
        .filter(subproduct_ingredient::Column::SubproductId.eq(subproduct_id))
        .order_by_asc(subproduct_ingredient::Column::Id)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(RecipeLine::from).collect())
}

/// Finds a subproduct by id.
///
/// # Errors
/// Returns [`Error::Database`] on storage failure.
pub async fn get_subproduct<C>(conn: &C, subproduct_id: i64) -> Result<Option<subproduct::Model>>
where
    C: ConnectionTrait,
{
    Subproduct::find_by_id(subproduct_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Finds the first subproduct with the given name.
///
/// # Errors
/// Returns [`Error::Database`] on storage failure.
pub async fn get_subproduct_by_name<C>(conn: &C, name: &str) -> Result<Option<subproduct::Model>>
where
    C: ConnectionTrait,
{
    Subproduct::find()
        .filter(subproduct::Column::Name.eq(name))
        .order_by_asc(subproduct::Column::Id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Produces `run_quantity` batches of a subproduct, consuming each recipe line
/// `run_quantity` times over. The stored cost is left untouched.
///
/// # Errors
/// Returns [`Error::Validation`] for a zero run, [`Error::NotFound`] for an unknown
/// subproduct, [`Error::EmptyRecipe`] when it has no lines, and any inventory error raised
/// while consuming. Nothing is consumed when an error is returned.
pub async fn produce(
    db: &DatabaseConnection,
    subproduct_id: i64,
    run_quantity: u32,
) -> Result<ProductionRun> {
    if run_quantity == 0 {
        return Err(Error::validation("Run quantity must be greater than zero"));
    }

    let uow = UnitOfWork::begin(db, "produce").await?;
    let outcome = produce_in(uow.conn(), subproduct_id, run_quantity).await;
    let run = uow.finish(outcome).await.inspect_err(|e| {
        error!("Error producing subproduct {subproduct_id}: {e}");
    })?;

    info!(
        subproduct_id,
        "Subproduct {} produced x{run_quantity}", run.subproduct.name
    );
    Ok(run)
}

async fn produce_in<C>(conn: &C, subproduct_id: i64, run_quantity: u32) -> Result<ProductionRun>
where
    C: ConnectionTrait,
{
    let subproduct = get_subproduct(conn, subproduct_id)
        .await?
        .ok_or_else(|| Error::not_found("subproduct", subproduct_id))?;

    let lines = recipe_lines(conn, subproduct_id).await?;
    if lines.is_empty() {
        return Err(Error::EmptyRecipe { subproduct_id });
    }

    let multiplier = Decimal::from(run_quantity);
    let mut consumed = Vec::with_capacity(lines.len());
    for line in &lines {
        let quantity = line
            .quantity_used
            .checked_mul(multiplier)
            .ok_or_else(|| Error::overflow(format!("{run_quantity} runs of {}", line.unit_used)))?;
        let base_quantity =
            inventory::consume_stock(conn, line.product_id, quantity, &line.unit_used).await?;
        consumed.push(ConsumedLine {
            product_id: line.product_id,
            base_quantity,
        });
    }

    Ok(ProductionRun {
        subproduct: subproduct.into(),
        run_quantity,
        consumed,
    })
}

/// Deletes a subproduct and its recipe lines as one unit.
///
/// Consumed stock is not restored. A subproduct still referenced by final products
/// cannot be deleted.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown subproduct, [`Error::SubproductInUse`] when
/// final products reference it, and [`Error::Database`] on storage failure.
pub async fn delete_subproduct(db: &DatabaseConnection, subproduct_id: i64) -> Result<()> {
    let uow = UnitOfWork::begin(db, "delete_subproduct").await?;
    let outcome = delete_in(uow.conn(), subproduct_id).await;
    uow.finish(outcome).await.inspect_err(|e| {
        error!("Error deleting subproduct {subproduct_id}: {e}");
    })?;

    info!(subproduct_id, "Subproduct {subproduct_id} deleted");
    Ok(())
}

async fn delete_in<C>(conn: &C, subproduct_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    get_subproduct(conn, subproduct_id)
        .await?
        .ok_or_else(|| Error::not_found("subproduct", subproduct_id))?;

    let final_products = FinalProduct::find()
        .filter(final_product::Column::SubproductId.eq(subproduct_id))
        .count(conn)
        .await?;
    if final_products > 0 {
        return Err(Error::SubproductInUse {
            subproduct_id,
            final_products,
        });
    }

    SubproductIngredient::delete_many()
        .filter(subproduct_ingredient::Column::SubproductId.eq(subproduct_id))
        .exec(conn)
        .await?;
    Subproduct::delete_by_id(subproduct_id).exec(conn).await?;
    Ok(())
}
