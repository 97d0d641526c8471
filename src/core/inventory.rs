//! Inventory ledger contract - Stock and weighted-average cost per product.
//!
//! The inventory table is owned by a separate subsystem; the production ledger only
//! needs cost lookups and stock consumption from it. Every function here is generic over
//! [`ConnectionTrait`] so it runs inside whatever transaction the caller already holds,
//! which is how consumption and ledger writes commit or roll back together.
//!
//! Stock and cost are always kept in the product's base unit.

use crate::{
    config::inventory::ProductSeed,
    core::{
        unit_of_work::UnitOfWork,
        units::{self, Unit},
    },
    entities::{DecimalText, InventoryItem, inventory_item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// How often a decrement is retried after another writer changed the same row.
const MAX_CONSUME_ATTEMPTS: usize = 3;
use tracing::{debug, error, info};

/// Read model used to populate ingredient choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySummary {
    /// Inventory product id
    pub product_id: i64,
    /// Product name
    pub name: String,
    /// Base unit symbol stock is kept in
    pub base_unit: String,
    /// Stock on hand in base units
    pub stock_quantity: Decimal,
    /// Average cost of one base unit
    pub weighted_average_cost: Decimal,
}

impl From<inventory_item::Model> for InventorySummary {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            product_id: model.id,
            name: model.name,
            base_unit: model.base_unit,
            stock_quantity: model.stock_quantity.get(),
            weighted_average_cost: model.weighted_average_cost.get(),
        }
    }
}

/// Registers a new product with zero stock and zero cost.
///
/// `unit` may be any unit of the product's family; it is stored as the family's base unit.
///
/// # Errors
/// Returns an error if the name is empty, the unit is unknown, or the insert fails
/// (for instance because the name already exists).
pub async fn register_product<C>(conn: &C, name: &str, unit: &str) -> Result<inventory_item::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    let unit: Unit = unit.parse()?;

    let product = inventory_item::ActiveModel {
        name: Set(name.trim().to_string()),
        base_unit: Set(unit.family().base_unit().symbol().to_string()),
        weighted_average_cost: Set(DecimalText::default()),
        stock_quantity: Set(DecimalText::default()),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let product = product.insert(conn).await?;
    info!(product_id = product.id, name = %product.name, "inventory product registered");
    Ok(product)
}

/// Finds an inventory product by id.
///
/// # Errors
/// Returns [`Error::Database`] on storage failure.
pub async fn get_product<C>(conn: &C, product_id: i64) -> Result<Option<inventory_item::Model>>
where
    C: ConnectionTrait,
{
    InventoryItem::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Finds an inventory product by its exact name.
///
/// # Errors
/// Returns [`Error::Database`] on storage failure.
pub async fn get_product_by_name<C>(conn: &C, name: &str) -> Result<Option<inventory_item::Model>>
where
    C: ConnectionTrait,
{
    InventoryItem::find()
        .filter(inventory_item::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Current weighted-average cost of one base unit of `product_id`.
///
/// # Errors
/// Returns [`Error::NotFound`] if the product is unknown.
pub async fn get_weighted_average_cost<C>(conn: &C, product_id: i64) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    get_product(conn, product_id)
        .await?
        .map(|product| product.weighted_average_cost.get())
        .ok_or_else(|| Error::not_found("inventory product", product_id))
}

/// Adds stock bought at `unit_cost` per entered `unit`, re-averaging the product cost.
///
/// The new cost is `(stock × cost + received_base × cost_per_base) / (stock + received_base)`.
///
/// # Errors
/// Returns an error if the product is unknown, the unit is of another family,
/// the quantity is not positive, the cost is negative, or the new totals leave the
/// decimal range.
pub async fn receive_stock<C>(
    conn: &C,
    product_id: i64,
    quantity: Decimal,
    unit: &str,
    unit_cost: Decimal,
) -> Result<inventory_item::Model>
where
    C: ConnectionTrait,
{
    if unit_cost < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Unit cost cannot be negative, got {unit_cost}"
        )));
    }

    let product = get_product(conn, product_id)
        .await?
        .ok_or_else(|| Error::not_found("inventory product", product_id))?;
    let base_quantity = to_product_base(&product, quantity, unit)?;

    let stock = product.stock_quantity.get();
    let cost = product.weighted_average_cost.get();
    let new_stock = stock
        .checked_add(base_quantity)
        .ok_or_else(|| Error::overflow(format!("stock of product {product_id}")))?;
    // new_stock > 0 because base_quantity > 0
    let new_cost = stock
        .checked_mul(cost)
        .zip(quantity.checked_mul(unit_cost))
        .and_then(|(held, received)| held.checked_add(received))
        .and_then(|value| value.checked_div(new_stock))
        .ok_or_else(|| Error::overflow(format!("stock value of product {product_id}")))?;

    let mut active: inventory_item::ActiveModel = product.into();
    active.stock_quantity = Set(new_stock.into());
    active.weighted_average_cost = Set(new_cost.into());
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    let product = active.update(conn).await?;

    info!(
        product_id,
        received = %base_quantity,
        weighted_average_cost = %product.weighted_average_cost,
        "stock received"
    );
    Ok(product)
}

/// Removes `quantity` `unit` of stock from `product_id`.
///
/// The stock check runs on the exact decimal value, so the whole remaining stock can be
/// taken. The decrement only applies if the stored stock still equals the value that was
/// checked; when another writer got there first the row is re-read and checked again.
/// Returns the amount consumed in base units.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown product, [`Error::Conversion`] when the unit
/// cannot be normalised or belongs to another family, and [`Error::InsufficientStock`] when
/// stock would go negative.
pub async fn consume_stock<C>(
    conn: &C,
    product_id: i64,
    quantity: Decimal,
    unit: &str,
) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    for _ in 0..MAX_CONSUME_ATTEMPTS {
        let product = get_product(conn, product_id)
            .await?
            .ok_or_else(|| Error::not_found("inventory product", product_id))?;
        let required = to_product_base(&product, quantity, unit)?;

        let available = product.stock_quantity.get();
        if available < required {
            return Err(Error::InsufficientStock {
                product_id,
                available,
                required,
            });
        }

        let result = InventoryItem::update_many()
            .col_expr(
                inventory_item::Column::StockQuantity,
                Expr::value(DecimalText(available - required)),
            )
            .col_expr(
                inventory_item::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().naive_utc()),
            )
            .filter(inventory_item::Column::Id.eq(product_id))
            .filter(inventory_item::Column::StockQuantity.eq(product.stock_quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            debug!(product_id, consumed = %required, unit = %product.base_unit, "stock consumed");
            return Ok(required);
        }
        debug!(product_id, "stock changed concurrently, re-checking");
    }

    Err(Error::Database(DbErr::RecordNotUpdated))
}

/// Registers and stocks every seeded product that does not exist yet.
///
/// Runs as one unit of work and returns how many products were added.
///
/// # Errors
/// Returns the first registration or receiving error; nothing is seeded in that case.
pub async fn seed_inventory(db: &DatabaseConnection, products: &[ProductSeed]) -> Result<usize> {
    let uow = UnitOfWork::begin(db, "seed_inventory").await?;
    let outcome: Result<usize> = async {
        let mut seeded = 0;
        for seed in products {
            if get_product_by_name(uow.conn(), seed.name.trim()).await?.is_some() {
                debug!(name = %seed.name, "inventory product already present, skipping");
                continue;
            }
            let product = register_product(uow.conn(), &seed.name, &seed.base_unit).await?;
            if seed.stock > Decimal::ZERO {
                receive_stock(
                    uow.conn(),
                    product.id,
                    seed.stock,
                    &seed.base_unit,
                    seed.unit_cost,
                )
                .await?;
            }
            seeded += 1;
        }
        Ok(seeded)
    }
    .await;
    uow.finish(outcome).await
}

/// Lists all inventory products ordered by name, for ingredient pickers.
///
/// Storage failures are logged and produce an empty list.
pub async fn list_products_for_summary(db: &DatabaseConnection) -> Vec<InventorySummary> {
    match InventoryItem::find()
        .order_by_asc(inventory_item::Column::Name)
        .all(db)
        .await
    {
        Ok(products) => products.into_iter().map(InventorySummary::from).collect(),
        Err(e) => {
            error!("Error listing inventory products: {e}");
            Vec::new()
        }
    }
}

/// Converts an entered quantity into the product's base unit, rejecting other families.
///
/// # Errors
/// Returns [`Error::Conversion`] if the unit is unknown, the quantity is not positive,
/// or the unit measures a different family than the product.
pub fn to_product_base(
    product: &inventory_item::Model,
    quantity: Decimal,
    unit: &str,
) -> Result<Decimal> {
    let (base_quantity, base_unit) = units::convert_to_base(quantity, unit)?;
    let product_unit: Unit = product.base_unit.parse()?;
    if product_unit != base_unit {
        return Err(Error::Conversion {
            message: format!(
                "'{}' is measured in {} but {unit} is a {} unit",
                product.name,
                product_unit.family(),
                base_unit.family()
            ),
        });
    }
    Ok(base_quantity)
}
