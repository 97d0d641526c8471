//! Final product entity - A sellable good made from one subproduct.
//!
//! Unit cost and margin are derived at read time from the parent subproduct's
//! cost snapshot, so only the inputs are stored here.

use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Final product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "final_products")]
pub struct Model {
    /// Unique identifier for the final product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the final product (e.g., "Baguette")
    pub name: String,
    /// Subproduct this product is portioned from
    pub subproduct_id: i64,
    /// How many units one batch of the subproduct yields, always positive
    pub units_produced: i32,
    /// Sale price per unit, zero when not yet priced
    #[sea_orm(column_type = "Text")]
    pub sale_price: DecimalText,
    /// When the final product was created
    pub created_at: DateTime,
    /// When the final product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between FinalProduct and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each final product belongs to one subproduct
    #[sea_orm(
        belongs_to = "super::subproduct::Entity",
        from = "Column::SubproductId",
        to = "super::subproduct::Column::Id"
    )]
    Subproduct,
}

impl Related<super::subproduct::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subproduct.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
