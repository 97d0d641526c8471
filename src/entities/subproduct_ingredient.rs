//! Subproduct ingredient entity - One recipe line of a subproduct.
//!
//! Quantity and unit are stored as entered, not converted to base units, so that
//! production runs can scale them and the recipe reads the way it was written.
use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subproduct ingredient database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subproduct_ingredients")]
pub struct Model {
    /// Unique identifier for the recipe line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning subproduct
    pub subproduct_id: i64,
    /// Inventory product consumed by this line
    pub product_id: i64,
    /// Quantity as entered
    #[sea_orm(column_type = "Text")]
    pub quantity_used: DecimalText,
    /// Unit as entered (e.g., `"kg"`, `"ml"`)
    pub unit_used: String,
}

/// Defines relationships between recipe lines and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one subproduct and goes away with it
    #[sea_orm(
        belongs_to = "super::subproduct::Entity",
        from = "Column::SubproductId",
        to = "super::subproduct::Column::Id",
        on_delete = "Cascade"
    )]
    Subproduct,
    /// Each line draws from one inventory product
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ProductId",
        to = "super::inventory_item::Column::Id"
    )]
    InventoryItem,
}

impl Related<super::subproduct::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subproduct.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
