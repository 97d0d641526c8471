/// Database configuration and connection management
pub mod database;

/// Inventory seed loading from a TOML file
pub mod inventory;
