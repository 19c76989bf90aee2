pub mod db;
pub mod models;

pub use db::Database;
pub use models::{Changeset, DatabaseStats, TransactionKind, TransactionRecord};

use crate::{error::Result, territory::Territory};

/// Persistence used by the treasurer service
#[cfg_attr(test, mockall::automock)]
pub trait TreasuryStore {
    fn get_territory(&self, id: &str) -> Result<Option<Territory>>;

    /// Write every part of `changes` in one transaction.
    ///
    /// Fails with `TerritoryExists` when the created id is taken and with
    /// `TerritoryNotFound` when an updated territory or balance has no row.
    fn apply(&self, changes: &Changeset) -> Result<()>;

    fn get_transaction_history(&self, id: &str, limit: Option<usize>) -> Result<Vec<TransactionRecord>>;
}
