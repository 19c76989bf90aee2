// src/treasury/mod.rs
pub mod balance;
pub mod ledger;
pub mod tax;

pub use balance::TreasuryBalance;
pub use ledger::TreasuryLedger;
pub use tax::TaxRates;
