//! Unified error types for the production ledger.
//!
//! Write operations surface every variant to the caller after rolling back.
//! Read paths used for display log `Database` errors and degrade to empty results.

use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the production ledger and its inventory contract.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced row (subproduct, final product, inventory product) does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// An ingredient line names a product that is absent from inventory.
    #[error("Ingredient product {product_id} is not in the inventory")]
    MissingIngredient {
        /// Inventory product id referenced by the ingredient line
        product_id: i64,
    },

    /// A quantity/unit pair could not be normalised.
    #[error("Conversion error: {message}")]
    Conversion {
        /// What went wrong during conversion
        message: String,
    },

    /// Consuming stock would drive a product below zero.
    #[error("Insufficient stock for product {product_id}: available {available}, required {required}")]
    InsufficientStock {
        /// Inventory product id
        product_id: i64,
        /// Stock on hand in base units
        available: Decimal,
        /// Requested consumption in base units
        required: Decimal,
    },

    /// A subproduct has no ingredient lines.
    #[error("Subproduct {subproduct_id} has no ingredients")]
    EmptyRecipe {
        /// Subproduct id
        subproduct_id: i64,
    },

    /// Malformed caller input.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the rejected input
        message: String,
    },

    /// A subproduct cannot be deleted while final products reference it.
    #[error("Subproduct {subproduct_id} is referenced by {final_products} final product(s)")]
    SubproductInUse {
        /// Subproduct id
        subproduct_id: i64,
        /// Number of referencing final products
        final_products: u64,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Underlying persistence failure.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// A [`Error::Validation`] for arithmetic that leaves the decimal range.
    pub fn overflow(what: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: format!("{what} is out of the representable decimal range"),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
