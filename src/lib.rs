pub mod config;
pub mod cooldown;
pub mod error;
pub mod storage;
pub mod territory;
pub mod treasurer;
pub mod treasury;
pub mod utils;

pub use config::Config;
pub use error::{Result, TreasuryError};
pub use treasury::{TaxRates, TreasuryBalance, TreasuryLedger};
