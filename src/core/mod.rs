//! Core business logic - framework-agnostic costing, production and inventory operations.

/// Final products and their derived unit economics
pub mod final_product;
/// Inventory ledger contract: cost lookup and stock consumption
pub mod inventory;
/// The injected production ledger service
pub mod ledger;
/// Subproduct costing, production runs and deletion
pub mod subproduct;
/// Transactional boundary shared by every write operation
pub mod unit_of_work;
/// Quantity normalisation into base units
pub mod units;

pub use ledger::ProductionLedger;
