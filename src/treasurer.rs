// src/treasurer.rs
use crate::{
    config::EconomyConfig,
    cooldown::RateLimitRegistry,
    error::{Result, TreasuryError},
    storage::{Changeset, TransactionKind, TransactionRecord, TreasuryStore},
    territory::{DailyReport, Rank, Territory, UpkeepOutcome},
    treasury::{TaxRates, TreasuryBalance, TreasuryLedger},
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Partial update of a territory's tax schedule
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxUpdate {
    pub base: Option<f64>,
    pub rent: Option<f64>,
    pub buy: Option<f64>,
    pub create: Option<f64>,
}

impl TaxUpdate {
    pub fn apply(&self, taxes: TaxRates) -> TaxRates {
        let mut taxes = taxes;
        if let Some(base) = self.base {
            taxes = taxes.with_base_tax(base);
        }
        if let Some(rent) = self.rent {
            taxes = taxes.with_property_rent_tax(rent);
        }
        if let Some(buy) = self.buy {
            taxes = taxes.with_property_buy_tax(buy);
        }
        if let Some(create) = self.create {
            taxes = taxes.with_property_create_tax(create);
        }
        taxes
    }
}

/// Largest amount a single operation may move
pub const MAX_MONEY_AMOUNT: f64 = 1_000_000_000.0;

/// Reject amounts that are not finite or exceed [`MAX_MONEY_AMOUNT`].
///
/// Sign checks are left to the operation receiving the amount.
pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(TreasuryError::InvalidArgument(format!(
            "Amount must be a finite number, got {}",
            amount
        )));
    }
    if amount > MAX_MONEY_AMOUNT {
        return Err(TreasuryError::InvalidArgument(format!(
            "Amount {:.2} exceeds the maximum of {:.2}",
            amount, MAX_MONEY_AMOUNT
        )));
    }
    Ok(())
}

/// Applies treasury operations to stored territories and keeps their history.
///
/// Each operation loads what it needs, computes the new state and hands every
/// write to the store as one [`Changeset`]. Operations of one treasurer are
/// serialized so two of them never interleave between load and write.
pub struct Treasurer<S: TreasuryStore> {
    store: S,
    economy: EconomyConfig,
    rate_limits: RateLimitRegistry,
    ledger: TreasuryLedger,
    writes: Mutex<()>,
}

impl<S: TreasuryStore> Treasurer<S> {
    pub fn new(store: S, economy: EconomyConfig, rate_limits: RateLimitRegistry) -> Self {
        Self {
            store,
            economy,
            rate_limits,
            ledger: TreasuryLedger::new(),
            writes: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Treasuries last moved by [`Treasurer::transfer`], as committed to the store
    pub fn ledger(&self) -> &TreasuryLedger {
        &self.ledger
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails if `actor` is still cooling down; does not start a new cooldown
    fn ensure_cooldown(&self, command: &str, actor: &str) -> Result<()> {
        let result = self.rate_limits.check_only(command, actor);
        if !result.allowed {
            return Err(TreasuryError::RateLimited {
                command: command.to_string(),
                remaining_secs: result.remaining_seconds(),
            });
        }
        Ok(())
    }

    fn start_cooldown(&self, command: &str, actor: &str) {
        self.rate_limits.can_execute(command, actor);
    }

    pub fn territory(&self, id: &str) -> Result<Territory> {
        self.store
            .get_territory(id)?
            .ok_or_else(|| TreasuryError::TerritoryNotFound(id.to_string()))
    }

    pub fn create_territory(&self, id: &str, name: &str, balance: Option<f64>, claimed_chunks: u32) -> Result<Territory> {
        let opening = balance.unwrap_or(self.economy.starting_balance);
        // Opening balances may be negative, only their size is bounded
        validate_amount(opening.abs())?;

        let _guard = self.lock_writes();
        if self.store.get_territory(id)?.is_some() {
            return Err(TreasuryError::TerritoryExists(id.to_string()));
        }

        let mut territory = Territory::new(id, name);
        territory.treasury = TreasuryBalance::new(opening);
        territory.claimed_chunks = claimed_chunks;

        let mut changes = Changeset::new().create(territory.clone());
        if opening != 0.0 {
            changes = changes.record(TransactionRecord::new(id, TransactionKind::Adjustment, opening));
        }
        self.store.apply(&changes)?;

        info!("Created territory {} '{}' with {}", id, name, territory.treasury);
        Ok(territory)
    }

    pub fn deposit(&self, id: &str, amount: f64, actor: &str) -> Result<TreasuryBalance> {
        validate_amount(amount)?;
        self.ensure_cooldown("deposit", actor)?;

        let _guard = self.lock_writes();
        let territory = self.territory(id)?;
        let treasury = territory.treasury.deposit(amount)?;

        self.store.apply(
            &Changeset::new()
                .balance(id, treasury)
                .record(TransactionRecord::new(id, TransactionKind::Deposit, amount).with_counterparty(actor)),
        )?;
        self.start_cooldown("deposit", actor);

        debug!("{} deposited {:.2} into {}", actor, amount, id);
        Ok(treasury)
    }

    pub fn withdraw(&self, id: &str, amount: f64, actor: &str, allow_overdraft: bool) -> Result<TreasuryBalance> {
        validate_amount(amount)?;
        self.ensure_cooldown("withdraw", actor)?;

        let _guard = self.lock_writes();
        let territory = self.territory(id)?;

        let overdraft_ok = allow_overdraft || self.economy.allow_overdraft;
        if !overdraft_ok && !territory.treasury.has_sufficient_funds(amount) {
            return Err(TreasuryError::InsufficientFunds {
                required: amount,
                deficit: territory.treasury.deficit(amount),
            });
        }

        let treasury = territory.treasury.withdraw(amount)?;
        if treasury.balance() < 0.0 {
            warn!("Treasury of {} is overdrawn: {}", id, treasury);
        }
        self.store.apply(
            &Changeset::new()
                .balance(id, treasury)
                .record(TransactionRecord::new(id, TransactionKind::Withdrawal, amount).with_counterparty(actor)),
        )?;
        self.start_cooldown("withdraw", actor);

        Ok(treasury)
    }

    pub fn donate(&self, id: &str, player: &str, amount: f64) -> Result<TreasuryBalance> {
        validate_amount(amount)?;
        self.ensure_cooldown("pay", player)?;

        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        let treasury = territory.donate(amount)?;

        self.store.apply(
            &Changeset::new()
                .balance(id, treasury)
                .record(TransactionRecord::new(id, TransactionKind::Donation, amount).with_counterparty(player)),
        )?;
        self.start_cooldown("pay", player);

        info!("{} donated {:.2} to {}", player, amount, id);
        Ok(treasury)
    }

    pub fn rename(&self, id: &str, new_name: &str) -> Result<Territory> {
        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        let cost = self.economy.rename_cost;
        territory.rename(new_name, cost)?;

        let mut changes = Changeset::new().update(territory.clone());
        if cost > 0.0 {
            changes = changes.record(TransactionRecord::new(id, TransactionKind::Cost, cost));
        }
        self.store.apply(&changes)?;
        Ok(territory)
    }

    pub fn update_taxes(&self, id: &str, update: TaxUpdate) -> Result<TaxRates> {
        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        territory.taxes = update.apply(territory.taxes);
        self.store.apply(&Changeset::new().update(territory.clone()))?;
        Ok(territory.taxes)
    }

    /// Add a rank or replace the one with the same name
    pub fn set_rank(&self, id: &str, rank: Rank) -> Result<Territory> {
        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        match territory.ranks.iter_mut().find(|r| r.name == rank.name) {
            Some(existing) => *existing = rank,
            None => territory.ranks.push(rank),
        }
        self.store.apply(&Changeset::new().update(territory.clone()))?;
        Ok(territory)
    }

    pub fn run_upkeep(&self, id: &str) -> Result<UpkeepOutcome> {
        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        let outcome = territory.pay_upkeep(self.economy.upkeep_cost_per_chunk);

        let changes = match outcome {
            UpkeepOutcome::Paid { amount } => Changeset::new()
                .balance(id, territory.treasury)
                .record(TransactionRecord::new(id, TransactionKind::Upkeep, amount)),
            UpkeepOutcome::Unpaid { required } => {
                Changeset::new().record(TransactionRecord::new(id, TransactionKind::UpkeepMissed, required))
            }
        };
        self.store.apply(&changes)?;

        Ok(outcome)
    }

    pub fn run_daily_tasks(&self, id: &str, members: usize) -> Result<DailyReport> {
        let _guard = self.lock_writes();
        let mut territory = self.territory(id)?;
        let report = territory.run_daily_tasks(self.economy.upkeep_cost_per_chunk, members);

        let mut changes = Changeset::new().balance(id, report.closing_balance);
        if report.taxes_collected != 0.0 {
            changes = changes.record(TransactionRecord::new(id, TransactionKind::Tax, report.taxes_collected));
        }
        for payment in &report.salaries {
            changes = changes.record(
                TransactionRecord::new(id, TransactionKind::Salary, payment.total)
                    .with_counterparty(payment.rank.as_str()),
            );
        }
        changes = changes.record(match report.upkeep {
            UpkeepOutcome::Paid { amount } => TransactionRecord::new(id, TransactionKind::Upkeep, amount),
            UpkeepOutcome::Unpaid { required } => {
                TransactionRecord::new(id, TransactionKind::UpkeepMissed, required)
            }
        });
        self.store.apply(&changes)?;

        Ok(report)
    }

    /// Move money between two territories; the source may not be overdrawn.
    ///
    /// Both treasuries are reloaded into the ledger before the move. If the
    /// store rejects the write, the ledger is put back to the loaded values.
    pub fn transfer(&self, from: &str, to: &str, amount: f64) -> Result<(TreasuryBalance, TreasuryBalance)> {
        validate_amount(amount)?;
        if amount <= 0.0 {
            return Err(TreasuryError::InvalidArgument(
                "Transfer amount must be greater than zero".to_string(),
            ));
        }

        let _guard = self.lock_writes();
        let loaded_source = self.territory(from)?.treasury;
        let loaded_target = self.territory(to)?.treasury;
        self.ledger.open(from, loaded_source);
        self.ledger.open(to, loaded_target);

        let (source, target) = self.ledger.transfer(from, to, amount)?;
        let changes = Changeset::new()
            .balance(from, source)
            .balance(to, target)
            .record(TransactionRecord::new(from, TransactionKind::Withdrawal, amount).with_counterparty(to))
            .record(TransactionRecord::new(to, TransactionKind::Deposit, amount).with_counterparty(from));

        if let Err(e) = self.store.apply(&changes) {
            warn!("Transfer from {} to {} was not stored: {}", from, to, e);
            self.ledger.open(from, loaded_source);
            self.ledger.open(to, loaded_target);
            return Err(e);
        }

        Ok((source, target))
    }

    pub fn history(&self, id: &str, limit: Option<usize>) -> Result<Vec<TransactionRecord>> {
        self.territory(id)?;
        self.store.get_transaction_history(id, limit)
    }
}
