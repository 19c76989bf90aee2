// src/treasury/balance.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::{Result, TreasuryError};

/// Starting balance of a freshly created treasury
pub const DEFAULT_BALANCE: f64 = 0.0;

/// Immutable currency amount held by a territory.
///
/// Every operation returns a new value; the receiver is never modified.
/// Overdrafts are allowed: `withdraw` only rejects negative amounts, so
/// callers that forbid a negative treasury must check
/// [`TreasuryBalance::has_sufficient_funds`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreasuryBalance {
    balance: f64,
}

impl Default for TreasuryBalance {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE)
    }
}

impl From<f64> for TreasuryBalance {
    fn from(balance: f64) -> Self {
        Self::new(balance)
    }
}

impl TreasuryBalance {
    /// No validation: persisted treasuries may already be negative.
    pub fn new(balance: f64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Unchecked primitive behind `deposit` and `withdraw`
    pub fn add_to_balance(&self, delta: f64) -> Self {
        Self::new(self.balance + delta)
    }

    pub fn has_sufficient_funds(&self, amount: f64) -> bool {
        self.balance >= amount
    }

    /// Shortfall between `amount` and the balance, floored at zero
    pub fn deficit(&self, amount: f64) -> f64 {
        let deficit = amount - self.balance;
        if deficit > 0.0 {
            deficit
        } else {
            0.0
        }
    }

    pub fn withdraw(&self, amount: f64) -> Result<Self> {
        if amount < 0.0 {
            return Err(TreasuryError::InvalidArgument(
                "Withdrawal amount cannot be negative".to_string(),
            ));
        }
        Ok(self.add_to_balance(-amount))
    }

    pub fn deposit(&self, amount: f64) -> Result<Self> {
        if amount < 0.0 {
            return Err(TreasuryError::InvalidArgument(
                "Deposit amount cannot be negative".to_string(),
            ));
        }
        Ok(self.add_to_balance(amount))
    }

    pub fn with_balance(&self, new_balance: f64) -> Self {
        Self::new(new_balance)
    }

    /// Balance with exactly two fractional digits, as shown in menus
    pub fn formatted_balance(&self) -> String {
        format!("{:.2}", self.balance)
    }
}

impl fmt::Display for TreasuryBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        assert_eq!(TreasuryBalance::default().balance(), 0.0);
        assert_eq!(TreasuryBalance::default(), TreasuryBalance::new(DEFAULT_BALANCE));
    }

    #[test]
    fn test_negative_construction_allowed() {
        assert_eq!(TreasuryBalance::new(-42.5).balance(), -42.5);
        assert_eq!(TreasuryBalance::from(12.0).balance(), 12.0);
    }

    #[test]
    fn test_add_to_balance_is_unchecked() {
        let original = TreasuryBalance::new(500.0);

        assert_eq!(original.add_to_balance(250.0).balance(), 750.0);
        assert_eq!(original.add_to_balance(-200.0).balance(), 300.0);
        assert_eq!(original.balance(), 500.0);
    }

    #[test]
    fn test_withdraw_then_query_funds() {
        let treasury = TreasuryBalance::new(100.0).withdraw(30.0).unwrap();

        assert_eq!(treasury.balance(), 70.0);
        assert!(treasury.has_sufficient_funds(70.0));
        assert!(!treasury.has_sufficient_funds(70.01));
        assert_eq!(treasury.deficit(100.0), 30.0);
    }

    #[test]
    fn test_withdraw_allows_overdraft() {
        let treasury = TreasuryBalance::new(100.0).withdraw(200.0).unwrap();
        assert_eq!(treasury.balance(), -100.0);
        assert_eq!(treasury.deficit(0.0), 100.0);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let treasury = TreasuryBalance::default();

        let err = treasury.deposit(-5.0).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidArgument(_)));
        let err = treasury.withdraw(-5.0).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidArgument(_)));

        assert_eq!(treasury.balance(), 0.0);
    }

    #[test]
    fn test_zero_amounts_accepted() {
        let treasury = TreasuryBalance::new(10.0);
        assert_eq!(treasury.deposit(0.0).unwrap(), treasury);
        assert_eq!(treasury.withdraw(0.0).unwrap(), treasury);
    }

    #[test]
    fn test_sufficient_funds_matches_zero_deficit() {
        let treasury = TreasuryBalance::new(250.0);
        for amount in [-10.0, 0.0, 100.0, 249.99, 250.0, 250.01, 1_000.0] {
            assert_eq!(
                treasury.has_sufficient_funds(amount),
                treasury.deficit(amount) == 0.0,
                "amount {}",
                amount
            );
            assert_eq!(treasury.deficit(amount), (amount - 250.0).max(0.0));
        }
    }

    #[test]
    fn test_with_balance_replaces_value() {
        let original = TreasuryBalance::new(500.0);
        let replaced = original.with_balance(2000.0);

        assert_eq!(replaced.balance(), 2000.0);
        assert_eq!(original.balance(), 500.0);
    }

    #[test]
    fn test_chained_operations() {
        let original = TreasuryBalance::new(1000.0);
        let result = original
            .deposit(500.0)
            .and_then(|t| t.withdraw(200.0))
            .map(|t| t.add_to_balance(100.0))
            .unwrap();

        assert_eq!(result.balance(), 1400.0);
        assert_eq!(original.balance(), 1000.0);
    }

    #[test]
    fn test_equality_follows_ieee() {
        assert_eq!(TreasuryBalance::new(1000.0), TreasuryBalance::new(1000.0));
        assert_ne!(TreasuryBalance::new(1000.0), TreasuryBalance::new(2000.0));
        assert_ne!(TreasuryBalance::new(f64::NAN), TreasuryBalance::new(f64::NAN));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(TreasuryBalance::new(3.1).formatted_balance(), "3.10");
        assert_eq!(TreasuryBalance::new(-0.5).to_string(), "-0.50");
        assert_eq!(TreasuryBalance::new(1234.567).formatted_balance(), "1234.57");
        assert!(format!("{:?}", TreasuryBalance::new(1234.56)).contains("1234.56"));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&TreasuryBalance::new(12.5)).unwrap();
        assert_eq!(json, r#"{"balance":12.5}"#);
    }
}
