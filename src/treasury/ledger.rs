// src/treasury/ledger.rs
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::{
    error::{Result, TreasuryError},
    treasury::TreasuryBalance,
};
use tracing::{debug, info};

/// Shared owner of territory treasuries.
///
/// Readers get a copy of the current value. Writers compute the next value
/// under the lock and it is swapped in only if the computation succeeds.
#[derive(Default)]
pub struct TreasuryLedger {
    treasuries: Mutex<HashMap<String, TreasuryBalance>>,
}

impl TreasuryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TreasuryBalance>> {
        // Stored values are only replaced wholesale, a poisoned map is still consistent
        self.treasuries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a treasury, replacing any previous one for this territory
    pub fn open(&self, territory_id: &str, treasury: TreasuryBalance) {
        debug!("Opening treasury for {} with {}", territory_id, treasury);
        self.lock().insert(territory_id.to_string(), treasury);
    }

    pub fn close(&self, territory_id: &str) -> Option<TreasuryBalance> {
        self.lock().remove(territory_id)
    }

    pub fn get(&self, territory_id: &str) -> Result<TreasuryBalance> {
        self.lock()
            .get(territory_id)
            .copied()
            .ok_or_else(|| TreasuryError::TerritoryNotFound(territory_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Atomically replace a treasury with `f(current)`.
    ///
    /// On error the stored value is left as it was.
    pub fn update<F>(&self, territory_id: &str, f: F) -> Result<TreasuryBalance>
    where
        F: FnOnce(TreasuryBalance) -> Result<TreasuryBalance>,
    {
        let mut treasuries = self.lock();
        let slot = treasuries
            .get_mut(territory_id)
            .ok_or_else(|| TreasuryError::TerritoryNotFound(territory_id.to_string()))?;

        let next = f(*slot)?;
        *slot = next;
        Ok(next)
    }

    /// Move `amount` between two treasuries without allowing an overdraft on the source
    pub fn transfer(&self, from: &str, to: &str, amount: f64) -> Result<(TreasuryBalance, TreasuryBalance)> {
        let mut treasuries = self.lock();

        let source = *treasuries
            .get(from)
            .ok_or_else(|| TreasuryError::TerritoryNotFound(from.to_string()))?;
        let target = *treasuries
            .get(to)
            .ok_or_else(|| TreasuryError::TerritoryNotFound(to.to_string()))?;

        if !source.has_sufficient_funds(amount) {
            return Err(TreasuryError::InsufficientFunds {
                required: amount,
                deficit: source.deficit(amount),
            });
        }

        let source = source.withdraw(amount)?;
        // Self-transfer: credit the already debited value
        let target = if from == to { source.deposit(amount)? } else { target.deposit(amount)? };

        treasuries.insert(from.to_string(), source);
        treasuries.insert(to.to_string(), target);

        info!("Transferred {:.2} from {} to {}", amount, from, to);
        Ok((source, target))
    }
}
