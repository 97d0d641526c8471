//! Subproduct entity - An intermediate good with a fixed cost snapshot.
//!
//! `total_cost` is computed once, when the subproduct is created, from the
//! weighted-average cost of its ingredients at that moment.

use super::DecimalText;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subproduct database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subproducts")]
pub struct Model {
    /// Unique identifier for the subproduct
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the subproduct (e.g., "Dough")
    pub name: String,
    /// Cost snapshot taken at creation time
    #[sea_orm(column_type = "Text")]
    pub total_cost: DecimalText,
    /// When the subproduct was created
    pub created_at: DateTime,
}

/// Defines relationships between Subproduct and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One subproduct owns many ingredient lines
    #[sea_orm(has_many = "super::subproduct_ingredient::Entity")]
    Ingredients,
    /// One subproduct may back many final products
    #[sea_orm(has_many = "super::final_product::Entity")]
    FinalProducts,
}

impl Related<super::subproduct_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredients.def()
    }
}

impl Related<super::final_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinalProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
