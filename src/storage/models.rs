use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::{territory::Territory, treasury::TreasuryBalance};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Donation,
    Tax,
    Salary,
    Upkeep,
    UpkeepMissed,
    Cost,
    Adjustment,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdrawal => "Withdrawal",
            TransactionKind::Donation => "Donation",
            TransactionKind::Tax => "Tax",
            TransactionKind::Salary => "Salary",
            TransactionKind::Upkeep => "Upkeep",
            TransactionKind::UpkeepMissed => "UpkeepMissed",
            TransactionKind::Cost => "Cost",
            TransactionKind::Adjustment => "Adjustment",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Deposit" => Ok(TransactionKind::Deposit),
            "Withdrawal" => Ok(TransactionKind::Withdrawal),
            "Donation" => Ok(TransactionKind::Donation),
            "Tax" => Ok(TransactionKind::Tax),
            "Salary" => Ok(TransactionKind::Salary),
            "Upkeep" => Ok(TransactionKind::Upkeep),
            "UpkeepMissed" => Ok(TransactionKind::UpkeepMissed),
            "Cost" => Ok(TransactionKind::Cost),
            "Adjustment" => Ok(TransactionKind::Adjustment),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// One line of a territory's treasury history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub id: i64,
    pub territory_id: String,
    pub kind: TransactionKind,
    pub amount: f64,
    /// Player or rank the money came from or went to, if any
    pub counterparty: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(territory_id: &str, kind: TransactionKind, amount: f64) -> Self {
        Self {
            id: 0,
            territory_id: territory_id.to_string(),
            kind,
            amount,
            counterparty: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }
}

/// Writes that must land together or not at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    /// New territory, rejected if the id is taken
    pub created: Option<Territory>,
    /// Existing territories to overwrite
    pub updated: Vec<Territory>,
    pub balances: Vec<(String, TreasuryBalance)>,
    pub records: Vec<TransactionRecord>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, territory: Territory) -> Self {
        self.created = Some(territory);
        self
    }

    pub fn update(mut self, territory: Territory) -> Self {
        self.updated.push(territory);
        self
    }

    pub fn balance(mut self, territory_id: &str, treasury: TreasuryBalance) -> Self {
        self.balances.push((territory_id.to_string(), treasury));
        self
    }

    pub fn record(mut self, record: TransactionRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.updated.is_empty() && self.balances.is_empty() && self.records.is_empty()
    }

    pub fn balance_of(&self, territory_id: &str) -> Option<TreasuryBalance> {
        self.balances
            .iter()
            .rev()
            .find(|(id, _)| id == territory_id)
            .map(|(_, treasury)| *treasury)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_territories: usize,
    pub total_balance: f64,
    pub indebted_territories: usize,
    pub total_transactions: usize,
}
