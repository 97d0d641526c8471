//! Production ledger service - The single entry point shared by all callers.
//!
//! One [`ProductionLedger`] owns one database connection pool for its whole lifetime.
//! Presentation code receives it by injection instead of opening its own connection,
//! and tests build it on an in-memory database.

use crate::{
    config::database,
    core::{
        final_product::{self, FinalProductCosting},
        inventory::{self, InventorySummary},
        subproduct::{self, IngredientLine, ProductionRun, RecipeLine, SubproductSummary},
    },
    entities::{final_product as final_product_entity, subproduct as subproduct_entity},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// Subproduct and final product operations over one shared connection.
#[derive(Debug)]
pub struct ProductionLedger {
    db: DatabaseConnection,
}

impl ProductionLedger {
    /// Wraps an already established connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connects to `database_url` and makes sure every table exists.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the tables cannot be created.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = database::create_connection(database_url).await?;
        database::create_tables(&db).await?;
        info!("Production ledger ready");
        Ok(Self::new(db))
    }

    /// The underlying connection, for collaborators such as the inventory subsystem.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Closes the connection pool. The ledger cannot be used afterwards.
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) if the pool fails to shut down.
    pub async fn close(self) -> Result<()> {
        self.db.close().await?;
        info!("Production ledger closed");
        Ok(())
    }

    /// Creates a subproduct from `lines`, consuming stock, and returns its cost.
    ///
    /// # Errors
    /// See [`subproduct::create_subproduct`].
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_subproduct(&self, name: &str, lines: &[IngredientLine]) -> Result<Decimal> {
        subproduct::create_subproduct(&self.db, name, lines).await
    }

    /// Like [`Self::create_subproduct`] but returns the new subproduct's identity too.
    ///
    /// # Errors
    /// See [`subproduct::create_subproduct`].
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_subproduct_record(
        &self,
        name: &str,
        lines: &[IngredientLine],
    ) -> Result<SubproductSummary> {
        subproduct::create_subproduct_record(&self.db, name, lines).await
    }

    /// Subproducts ordered by name; empty on storage failure.
    pub async fn list_subproducts(&self) -> Vec<SubproductSummary> {
        subproduct::list_subproducts(&self.db).await
    }

    /// Recipe lines of a subproduct; empty on storage failure.
    pub async fn get_ingredients(&self, subproduct_id: i64) -> Vec<RecipeLine> {
        subproduct::get_ingredients(&self.db, subproduct_id).await
    }

    /// Finds a subproduct by id.
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) on storage failure.
    pub async fn get_subproduct(&self, subproduct_id: i64) -> Result<Option<subproduct_entity::Model>> {
        subproduct::get_subproduct(&self.db, subproduct_id).await
    }

    /// Produces `run_quantity` batches of a subproduct.
    ///
    /// # Errors
    /// See [`subproduct::produce`].
    #[instrument(skip(self))]
    pub async fn produce(&self, subproduct_id: i64, run_quantity: u32) -> Result<ProductionRun> {
        subproduct::produce(&self.db, subproduct_id, run_quantity).await
    }

    /// Deletes an unreferenced subproduct and its recipe.
    ///
    /// # Errors
    /// See [`subproduct::delete_subproduct`].
    #[instrument(skip(self))]
    pub async fn delete_subproduct(&self, subproduct_id: i64) -> Result<()> {
        subproduct::delete_subproduct(&self.db, subproduct_id).await
    }

    /// Creates a final product portioned from a subproduct.
    ///
    /// # Errors
    /// See [`final_product::create_final_product`].
    #[instrument(skip(self))]
    pub async fn create_final_product(
        &self,
        name: &str,
        subproduct_id: i64,
        units_produced: i32,
        sale_price: Decimal,
    ) -> Result<final_product_entity::Model> {
        final_product::create_final_product(&self.db, name, subproduct_id, units_produced, sale_price)
            .await
    }

    /// Sets a final product's sale price.
    ///
    /// # Errors
    /// See [`final_product::update_price`].
    #[instrument(skip(self))]
    pub async fn update_price(
        &self,
        product_id: i64,
        sale_price: Decimal,
    ) -> Result<final_product_entity::Model> {
        final_product::update_price(&self.db, product_id, sale_price).await
    }

    /// Deletes a final product.
    ///
    /// # Errors
    /// See [`final_product::delete_final_product`].
    #[instrument(skip(self))]
    pub async fn delete_final_product(&self, product_id: i64) -> Result<()> {
        final_product::delete_final_product(&self.db, product_id).await
    }

    /// Finds a final product by id.
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) on storage failure.
    pub async fn get_final_product(
        &self,
        product_id: i64,
    ) -> Result<Option<final_product_entity::Model>> {
        final_product::get_final_product(&self.db, product_id).await
    }

    /// Final products with derived unit cost and margin; empty on storage failure.
    pub async fn list_final_products_with_costing(&self) -> Vec<FinalProductCosting> {
        final_product::list_final_products_with_costing(&self.db).await
    }

    /// Inventory products available as ingredients; empty on storage failure.
    pub async fn list_products_for_summary(&self) -> Vec<InventorySummary> {
        inventory::list_products_for_summary(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_full_production_workflow() -> Result<()> {
        let ledger = ProductionLedger::connect("sqlite::memory:").await?;
        let db = ledger.connection();
        let flour = create_test_product(db, "Flour", "g", dec!(10000), dec!(0.002)).await?;
        let water = create_test_product(db, "Water", "ml", dec!(5000), dec!(0.0005)).await?;

        // Ingredient picker
        let choices = ledger.list_products_for_summary().await;
        assert_eq!(choices.len(), 2);

        // Recipe
        let dough = ledger
            .create_subproduct_record(
                "Dough",
                &[line(flour.id, dec!(500), "g"), line(water.id, dec!(250), "ml")],
            )
            .await?;
        assert_eq!(dough.total_cost, dec!(1.125));
        assert_eq!(ledger.list_subproducts().await.len(), 1);
        assert_eq!(ledger.get_ingredients(dough.id).await.len(), 2);

        // Production run
        let run = ledger.produce(dough.id, 2).await?;
        assert_eq!(run.subproduct.name, "Dough");
        assert_eq!(stock_of(db, flour.id).await?, dec!(8500));
        assert_eq!(stock_of(db, water.id).await?, dec!(4250));

        // Final product
        let baguette = ledger
            .create_final_product("Baguette", dough.id, 5, Decimal::ZERO)
            .await?;
        ledger.update_price(baguette.id, dec!(0.90)).await?;
        let costing = ledger.list_final_products_with_costing().await;
        assert_eq!(costing[0].cost_per_unit, dec!(0.225));
        assert_eq!(costing[0].margin.unwrap(), dec!(0.75));

        // Subproduct stays while referenced
        let result = ledger.delete_subproduct(dough.id).await;
        assert!(matches!(result.unwrap_err(), Error::SubproductInUse { .. }));

        ledger.delete_final_product(baguette.id).await?;
        ledger.delete_subproduct(dough.id).await?;
        assert!(ledger.get_subproduct(dough.id).await?.is_none());
        assert!(ledger.get_final_product(baguette.id).await?.is_none());
        assert!(ledger.list_subproducts().await.is_empty());

        ledger.close().await
    }

    #[tokio::test]
    async fn test_ledger_shared_between_callers() -> Result<()> {
        let (db, flour, _water, dough) = setup_with_dough().await?;
        let ledger = Arc::new(ProductionLedger::new(db));
        let (kitchen, counter) = (Arc::clone(&ledger), Arc::clone(&ledger));

        let (run, listed) = tokio::join!(kitchen.produce(dough.id, 1), counter.list_subproducts());
        assert_eq!(run?.subproduct.id, dough.id);
        assert_eq!(listed.len(), 1);
        // 500 g for the dough itself, 500 g for the run
        assert_eq!(stock_of(ledger.connection(), flour.id).await?, dec!(9000));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_subproduct_returns_cost() -> Result<()> {
        let (db, flour, _water) = setup_bakery().await?;
        let ledger = ProductionLedger::new(db);

        let cost = ledger
            .create_subproduct("Roux", &[line(flour.id, dec!(250), "g")])
            .await?;
        assert_eq!(cost, dec!(0.5));
        Ok(())
    }
}
