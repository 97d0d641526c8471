//! Final product business logic - Sellable goods portioned from a subproduct.
//!
//! Only the inputs (subproduct, units per batch, sale price) are stored. Unit cost and
//! margin are derived whenever final products are listed, from the parent subproduct's
//! cost snapshot.

use crate::{
    core::unit_of_work::UnitOfWork,
    entities::{FinalProduct, Subproduct, final_product, subproduct},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{error, info};

/// A final product joined with its subproduct and its derived unit economics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalProductCosting {
    /// Final product id
    pub id: i64,
    /// Final product name
    pub name: String,
    /// Parent subproduct id
    pub subproduct_id: i64,
    /// Parent subproduct name
    pub subproduct_name: String,
    /// Units one batch yields
    pub units_produced: i32,
    /// Sale price per unit, zero when unpriced
    pub sale_price: Decimal,
    /// Cost snapshot of the parent subproduct
    pub subproduct_total_cost: Decimal,
    /// `subproduct_total_cost / units_produced`
    pub cost_per_unit: Decimal,
    /// `(sale_price - cost_per_unit) / sale_price`, `None` while unpriced
    pub margin: Option<Decimal>,
}

impl FinalProductCosting {
    fn from_parts(product: final_product::Model, parent: subproduct::Model) -> Self {
        let total_cost = parent.total_cost.get();
        let sale_price = product.sale_price.get();
        let cost_per_unit = cost_per_unit(total_cost, product.units_produced);
        Self {
            id: product.id,
            name: product.name,
            subproduct_id: parent.id,
            subproduct_name: parent.name,
            units_produced: product.units_produced,
            sale_price,
            subproduct_total_cost: total_cost,
            cost_per_unit,
            margin: margin(sale_price, cost_per_unit),
        }
    }
}

/// Cost of one unit when a batch costing `total_cost` yields `units_produced` units.
///
/// Returns zero for a non-positive unit count, which the write path never stores.
#[must_use]
pub fn cost_per_unit(total_cost: Decimal, units_produced: i32) -> Decimal {
    if units_produced <= 0 {
        return Decimal::ZERO;
    }
    total_cost
        .checked_div(Decimal::from(units_produced))
        .unwrap_or_default()
}

/// Margin as a fraction of the sale price.
///
/// Undefined for an unpriced product, and when a tiny price against a large cost puts
/// the fraction outside the decimal range.
#[must_use]
pub fn margin(sale_price: Decimal, cost_per_unit: Decimal) -> Option<Decimal> {
    if sale_price <= Decimal::ZERO {
        return None;
    }
    sale_price
        .checked_sub(cost_per_unit)
        .and_then(|profit| profit.checked_div(sale_price))
}

fn validate_price(sale_price: Decimal) -> Result<()> {
    if sale_price < Decimal::ZERO {
        return Err(Error::validation(format!(
            "Sale price cannot be negative, got {sale_price}"
        )));
    }
    Ok(())
}

/// Creates a final product backed by an existing subproduct.
///
/// # Errors
/// Returns [`Error::Validation`] for an empty name, a non-positive unit count or a
/// negative price, [`Error::NotFound`] if the subproduct does not exist, and
/// [`Error::Database`] on storage failure.
pub async fn create_final_product(
    db: &DatabaseConnection,
    name: &str,
    subproduct_id: i64,
    units_produced: i32,
    sale_price: Decimal,
) -> Result<final_product::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Final product name cannot be empty"));
    }
    if units_produced <= 0 {
        return Err(Error::validation(format!(
            "Units produced must be greater than zero, got {units_produced}"
        )));
    }
    validate_price(sale_price)?;

    let uow = UnitOfWork::begin(db, "create_final_product").await?;
    let outcome: Result<final_product::Model> = async {
        Subproduct::find_by_id(subproduct_id)
            .one(uow.conn())
            .await?
            .ok_or_else(|| Error::not_found("subproduct", subproduct_id))?;

        let now = chrono::Utc::now().naive_utc();
        final_product::ActiveModel {
            name: Set(name.to_string()),
            subproduct_id: Set(subproduct_id),
            units_produced: Set(units_produced),
            sale_price: Set(sale_price.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(uow.conn())
        .await
        .map_err(Error::from)
    }
    .await;
    let product = uow.finish(outcome).await.inspect_err(|e| {
        error!("Error creating final product '{name}': {e}");
    })?;

    info!(final_product_id = product.id, "Final product '{name}' created");
    Ok(product)
}

/// Sets the sale price of a final product.
///
/// # Errors
/// Returns [`Error::Validation`] for a negative price, [`Error::NotFound`] if the
/// product does not exist, and [`Error::Database`] on storage failure.
pub async fn update_price(
    db: &DatabaseConnection,
    product_id: i64,
    sale_price: Decimal,
) -> Result<final_product::Model> {
    validate_price(sale_price)?;

    let uow = UnitOfWork::begin(db, "update_price").await?;
    let outcome: Result<final_product::Model> = async {
        let mut product: final_product::ActiveModel = FinalProduct::find_by_id(product_id)
            .one(uow.conn())
            .await?
            .ok_or_else(|| Error::not_found("final product", product_id))?
            .into();

        product.sale_price = Set(sale_price.into());
        product.updated_at = Set(chrono::Utc::now().naive_utc());
        product.update(uow.conn()).await.map_err(Error::from)
    }
    .await;
    let product = uow.finish(outcome).await.inspect_err(|e| {
        error!("Error updating final product {product_id}: {e}");
    })?;

    info!(final_product_id = product_id, sale_price = %sale_price, "Final product updated");
    Ok(product)
}

/// Deletes a final product. Its subproduct is left untouched.
///
/// # Errors
/// Returns [`Error::NotFound`] if the product does not exist and [`Error::Database`]
/// on storage failure.
pub async fn delete_final_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let uow = UnitOfWork::begin(db, "delete_final_product").await?;
    let outcome: Result<()> = async {
        let result = FinalProduct::delete_by_id(product_id)
            .exec(uow.conn())
            .await?;
        if result.rows_affected == 0 {
            return Err(Error::not_found("final product", product_id));
        }
        Ok(())
    }
    .await;
    uow.finish(outcome).await.inspect_err(|e| {
        error!("Error deleting final product {product_id}: {e}");
    })?;

    info!(final_product_id = product_id, "Final product {product_id} deleted");
    Ok(())
}

/// Finds a final product by id.
///
/// # Errors
/// Returns [`Error::Database`] on storage failure.
pub async fn get_final_product<C>(conn: &C, product_id: i64) -> Result<Option<final_product::Model>>
where
    C: ConnectionTrait,
{
    FinalProduct::find_by_id(product_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Lists final products joined with their subproduct, ordered by name, with unit
/// cost and margin derived from the subproduct's cost snapshot.
///
/// Storage failures are logged and produce an empty list.
pub async fn list_final_products_with_costing(db: &DatabaseConnection) -> Vec<FinalProductCosting> {
    let rows = FinalProduct::find()
        .find_also_related(Subproduct)
        .order_by_asc(final_product::Column::Name)
        .all(db)
        .await;

    match rows {
        Ok(rows) => rows
            .into_iter()
            .filter_map(|(product, parent)| {
                parent.map(|parent| FinalProductCosting::from_parts(product, parent))
            })
            .collect(),
        Err(e) => {
            error!("Error listing final products: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn insert_subproduct(
        db: &DatabaseConnection,
        name: &str,
        total_cost: Decimal,
    ) -> Result<subproduct::Model> {
        subproduct::ActiveModel {
            name: Set(name.to_string()),
            total_cost: Set(total_cost.into()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(Into::into)
    }

    #[test]
    fn test_cost_per_unit_and_margin() {
        assert_eq!(cost_per_unit(dec!(100.00), 5), dec!(20.00));
        assert_eq!(cost_per_unit(dec!(10), 0), Decimal::ZERO);

        assert_eq!(margin(dec!(25), dec!(20)), Some(dec!(0.2)));
        assert_eq!(margin(dec!(10), dec!(20)), Some(dec!(-1)));
        assert_eq!(margin(Decimal::ZERO, dec!(20)), None);
    }

    #[test]
    fn test_margin_out_of_range_is_undefined() {
        let huge_cost = dec!(10000000000000000000000000000);
        assert_eq!(margin(dec!(0.0001), huge_cost), None);
        assert_eq!(cost_per_unit(huge_cost, 1), huge_cost);
    }

    #[tokio::test]
    async fn test_create_final_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_final_product(&db, "", 1, 5, dec!(1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_final_product(&db, "Roll", 1, 0, dec!(1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_final_product(&db, "Roll", 1, -3, dec!(1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_final_product(&db, "Roll", 1, 5, dec!(-1)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_final_product_requires_subproduct() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_final_product(&db, "Roll", 99, 5, dec!(1)).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        assert!(list_final_products_with_costing(&db).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_final_products_with_costing() -> Result<()> {
        let db = setup_test_db().await?;
        let batch = insert_subproduct(&db, "Chocolate batch", dec!(100.00)).await?;

        create_final_product(&db, "Truffle", batch.id, 5, Decimal::ZERO).await?;

        let listed = list_final_products_with_costing(&db).await;
        assert_eq!(listed.len(), 1);
        let truffle = &listed[0];
        assert_eq!(truffle.name, "Truffle");
        assert_eq!(truffle.subproduct_name, "Chocolate batch");
        assert_eq!(truffle.units_produced, 5);
        assert_eq!(truffle.subproduct_total_cost, dec!(100));
        assert_eq!(truffle.cost_per_unit, dec!(20.00));
        assert_eq!(truffle.margin, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_final_products_sorted_by_name() -> Result<()> {
        let db = setup_test_db().await?;
        let batch = insert_subproduct(&db, "Batch", dec!(12)).await?;

        create_final_product(&db, "Scone", batch.id, 4, dec!(5)).await?;
        create_final_product(&db, "Bun", batch.id, 6, dec!(3)).await?;

        let names: Vec<_> = list_final_products_with_costing(&db)
            .await
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bun", "Scone"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_price_sets_margin() -> Result<()> {
        let db = setup_test_db().await?;
        let batch = insert_subproduct(&db, "Batch", dec!(100)).await?;
        let truffle = create_final_product(&db, "Truffle", batch.id, 5, Decimal::ZERO).await?;

        let updated = update_price(&db, truffle.id, dec!(25)).await?;
        assert_eq!(updated.sale_price, dec!(25));

        let listed = list_final_products_with_costing(&db).await;
        assert_eq!(listed[0].sale_price, dec!(25));
        assert_eq!(listed[0].margin, Some(dec!(0.2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_price_errors() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_price(&db, 1, dec!(-5)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = update_price(&db, 1, dec!(5)).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_final_product() -> Result<()> {
        let db = setup_test_db().await?;
        let batch = insert_subproduct(&db, "Batch", dec!(10)).await?;
        let bun = create_final_product(&db, "Bun", batch.id, 10, dec!(2)).await?;

        delete_final_product(&db, bun.id).await?;

        assert!(get_final_product(&db, bun.id).await?.is_none());
        assert!(list_final_products_with_costing(&db).await.is_empty());
        // Parent survives
        assert!(
            crate::core::subproduct::get_subproduct(&db, batch.id)
                .await?
                .is_some()
        );

        let result = delete_final_product(&db, bun.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_final_product_cost_from_real_subproduct() -> Result<()> {
        let (db, _flour, _water, dough) = setup_with_dough().await?;

        create_final_product(&db, "Baguette", dough.id, 3, dec!(1)).await?;

        let listed = list_final_products_with_costing(&db).await;
        // 1.125 / 3
        assert_eq!(listed[0].cost_per_unit, dec!(0.375));
        assert_eq!(listed[0].margin.unwrap(), dec!(0.625));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_final_products_fails_soft() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_errors([DbErr::Custom("store offline".to_string())])
            .into_connection();

        assert!(list_final_products_with_costing(&db).await.is_empty());
    }
}
