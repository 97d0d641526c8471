//! Unit of work - The single transactional boundary for ledger writes.
//!
//! Cost lookups, inventory consumption and ledger inserts for one operation all run
//! against the same [`DatabaseTransaction`]. The operation either commits as a whole
//! or is rolled back as a whole; there is no partially applied state to compensate.

use crate::errors::Result;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, error};

/// An open transaction scoped to one ledger operation.
///
/// Dropping an unfinished unit of work rolls it back.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
    operation: &'static str,
}

impl UnitOfWork {
    /// Opens a new transaction for `operation` (used only for logging).
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) if the transaction cannot be opened.
    pub async fn begin(db: &DatabaseConnection, operation: &'static str) -> Result<Self> {
        let txn = db.begin().await?;
        debug!(operation, "unit of work started");
        Ok(Self { txn, operation })
    }

    /// Connection to run statements on inside this unit of work.
    #[must_use]
    pub const fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Makes every change of this unit of work durable.
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) if the commit fails.
    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await?;
        debug!(operation = self.operation, "unit of work committed");
        Ok(())
    }

    /// Discards every change of this unit of work.
    ///
    /// # Errors
    /// Returns [`Error::Database`](crate::Error::Database) if the rollback fails.
    pub async fn abort(self) -> Result<()> {
        self.txn.rollback().await?;
        debug!(operation = self.operation, "unit of work rolled back");
        Ok(())
    }

    /// Commits on `Ok`, rolls back on `Err` and hands the outcome back to the caller.
    ///
    /// Reporting the error is left to the caller. The original error is returned even if
    /// the rollback itself fails; the rollback failure is logged.
    ///
    /// # Errors
    /// Returns the error in `outcome`, or [`Error::Database`](crate::Error::Database) if
    /// committing a successful outcome fails.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let operation = self.operation;
                if let Err(rollback_err) = self.abort().await {
                    error!(operation, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::inventory;
    use crate::errors::Error;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_finish_commits_on_success() -> Result<()> {
        let db = setup_test_db().await?;

        let uow = UnitOfWork::begin(&db, "test").await?;
        let outcome = inventory::register_product(uow.conn(), "Sugar", "g").await;
        let product = uow.finish(outcome).await?;

        assert!(inventory::get_product(&db, product.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_finish_rolls_back_on_error() -> Result<()> {
        let db = setup_test_db().await?;

        let uow = UnitOfWork::begin(&db, "test").await?;
        let product = inventory::register_product(uow.conn(), "Sugar", "g").await?;
        let outcome: Result<()> = Err(Error::validation("boom"));
        let result = uow.finish(outcome).await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(inventory::get_product(&db, product.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let flour = create_test_product(&db, "Flour", "g", dec!(100), dec!(0.002)).await?;

        {
            let uow = UnitOfWork::begin(&db, "test").await?;
            inventory::consume_stock(uow.conn(), flour.id, dec!(40), "g").await?;
        }

        let flour = inventory::get_product(&db, flour.id).await?.unwrap();
        assert_eq!(flour.stock_quantity, dec!(100));
        Ok(())
    }
}
