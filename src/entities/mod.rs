//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod decimal_text;
pub mod final_product;
pub mod inventory_item;
pub mod subproduct;
pub mod subproduct_ingredient;

// Re-export specific types to avoid conflicts
pub use decimal_text::DecimalText;
pub use final_product::{
    Column as FinalProductColumn, Entity as FinalProduct, Model as FinalProductModel,
};
pub use inventory_item::{
    Column as InventoryItemColumn, Entity as InventoryItem, Model as InventoryItemModel,
};
pub use subproduct::{Column as SubproductColumn, Entity as Subproduct, Model as SubproductModel};
pub use subproduct_ingredient::{
    Column as SubproductIngredientColumn, Entity as SubproductIngredient,
    Model as SubproductIngredientModel,
};
