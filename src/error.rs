use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreasuryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient funds: {required:.2} required, missing {deficit:.2}")]
    InsufficientFunds { required: f64, deficit: f64 },

    #[error("Territory not found: {0}")]
    TerritoryNotFound(String),

    #[error("Territory already exists: {0}")]
    TerritoryExists(String),

    #[error("Command '{command}' is on cooldown for {remaining_secs}s")]
    RateLimited { command: String, remaining_secs: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
