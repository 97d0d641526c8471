//! Inventory seed configuration loading from `inventory.toml`
//!
//! The inventory table belongs to another subsystem. For standalone runs and demos
//! the binary can seed it from a TOML file listing products, their base unit, the
//! stock on hand and the cost of one base unit.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Default seed file looked up when `INVENTORY_SEED_PATH` is not set.
pub const DEFAULT_SEED_PATH: &str = "inventory.toml";

/// Configuration structure representing the entire seed file
#[derive(Debug, Deserialize)]
pub struct InventorySeed {
    /// Products to register in the inventory
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// Configuration for a single inventory product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Name of the product
    pub name: String,
    /// Base unit symbol: `g`, `ml` or `u`
    pub base_unit: String,
    /// Initial stock, expressed in `base_unit`
    #[serde(default)]
    pub stock: Decimal,
    /// Cost of one base unit
    #[serde(default)]
    pub unit_cost: Decimal,
}

/// Gets the seed file path from `INVENTORY_SEED_PATH` or the default location.
#[must_use]
pub fn get_seed_path() -> String {
    std::env::var("INVENTORY_SEED_PATH").unwrap_or_else(|_| DEFAULT_SEED_PATH.to_string())
}

/// Parses a seed document from a TOML string.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed or required fields are missing.
pub fn parse_seed(contents: &str) -> Result<InventorySeed> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse inventory seed: {e}"),
    })
}

/// Loads the inventory seed from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<InventorySeed> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!(
            "Failed to read inventory seed {}: {e}",
            path.as_ref().display()
        ),
    })?;
    parse_seed(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_inventory_seed() {
        let toml_str = r#"
            [[products]]
            name = "Flour"
            base_unit = "g"
            stock = 25000
            unit_cost = "0.002"

            [[products]]
            name = "Water"
            base_unit = "ml"
            unit_cost = "0.0005"
        "#;

        let seed = parse_seed(toml_str).unwrap();
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].name, "Flour");
        assert_eq!(seed.products[0].stock, dec!(25000));
        assert_eq!(seed.products[0].unit_cost, dec!(0.002));

        assert_eq!(seed.products[1].base_unit, "ml");
        assert_eq!(seed.products[1].stock, Decimal::ZERO);
    }

    #[test]
    fn test_parse_seed_rejects_missing_name() {
        let result = parse_seed("[[products]]\nbase_unit = \"g\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_seed_missing_file() {
        let result = load_seed("definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
