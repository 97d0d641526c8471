//! Inventory item entity - The externally owned stock table.
//!
//! Each row holds the stock on hand and the weighted-average cost of one product,
//! both expressed in the product's base unit (`g`, `ml` or `u`).

use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product name (e.g., "Flour", "Milk")
    #[sea_orm(unique)]
    pub name: String,
    /// Canonical unit symbol stock and cost are kept in
    pub base_unit: String,
    /// Average cost of one base unit across all received stock
    #[sea_orm(column_type = "Text")]
    pub weighted_average_cost: DecimalText,
    /// Stock on hand in base units, never negative
    #[sea_orm(column_type = "Text")]
    pub stock_quantity: DecimalText,
    /// When stock or cost last changed
    pub updated_at: DateTime,
}

/// Defines relationships between inventory items and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product may appear in many recipes
    #[sea_orm(has_many = "super::subproduct_ingredient::Entity")]
    SubproductIngredients,
}

impl Related<super::subproduct_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubproductIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
