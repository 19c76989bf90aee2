use serde::{Deserialize, Serialize};
use crate::{
    error::{Result, TreasuryError},
    treasury::{TaxRates, TreasuryBalance},
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub name: String,
    pub salary: u32,
    pub members: Vec<String>,
}

impl Rank {
    pub fn new(name: impl Into<String>, salary: u32) -> Self {
        Self {
            name: name.into(),
            salary,
            members: Vec::new(),
        }
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn salary_cost(&self) -> f64 {
        self.members.len() as f64 * self.salary as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryPayment {
    pub rank: String,
    pub per_member: u32,
    pub total: f64,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UpkeepOutcome {
    Paid { amount: f64 },
    /// Treasury could not cover the chunks; nothing was withdrawn
    Unpaid { required: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub taxes_collected: f64,
    pub salaries: Vec<SalaryPayment>,
    pub upkeep: UpkeepOutcome,
    pub closing_balance: TreasuryBalance,
}

/// A town or region and the treasury it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: String,
    pub name: String,
    pub treasury: TreasuryBalance,
    pub taxes: TaxRates,
    pub claimed_chunks: u32,
    pub ranks: Vec<Rank>,
}

impl Territory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            treasury: TreasuryBalance::default(),
            taxes: TaxRates::default(),
            claimed_chunks: 0,
            ranks: Vec::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.treasury.balance()
    }

    /// Charge a fixed cost, refusing to overdraw the treasury
    pub fn pay_cost(&mut self, cost: f64) -> Result<TreasuryBalance> {
        if !self.treasury.has_sufficient_funds(cost) {
            return Err(TreasuryError::InsufficientFunds {
                required: cost,
                deficit: self.treasury.deficit(cost),
            });
        }
        self.treasury = self.treasury.withdraw(cost)?;
        Ok(self.treasury)
    }

    pub fn rename(&mut self, new_name: impl Into<String>, cost: f64) -> Result<()> {
        let new_name = new_name.into();
        self.pay_cost(cost)?;
        info!("Territory {} renamed from '{}' to '{}'", self.id, self.name, new_name);
        self.name = new_name;
        Ok(())
    }

    pub fn donate(&mut self, amount: f64) -> Result<TreasuryBalance> {
        if amount <= 0.0 {
            return Err(TreasuryError::InvalidArgument(
                "Donation must be greater than zero".to_string(),
            ));
        }
        self.treasury = self.treasury.deposit(amount)?;
        Ok(self.treasury)
    }

    /// Flat base tax from every member
    pub fn collect_base_tax(&mut self, members: usize) -> f64 {
        let collected = members as f64 * self.taxes.base_tax();
        self.treasury = self.treasury.add_to_balance(collected);
        debug!("Collected {:.2} base tax from {} members of {}", collected, members, self.id);
        collected
    }

    /// Pay every rank whose total salary fits in the current treasury.
    ///
    /// Ranks are paid in order; a rank that cannot be covered is skipped
    /// and later ranks are still tried.
    pub fn pay_salaries(&mut self) -> Vec<SalaryPayment> {
        let mut payments = Vec::new();

        for rank in &self.ranks {
            let cost = rank.salary_cost();
            if rank.salary == 0 || cost > self.treasury.balance() {
                continue;
            }
            self.treasury = self.treasury.add_to_balance(-cost);
            payments.push(SalaryPayment {
                rank: rank.name.clone(),
                per_member: rank.salary,
                total: cost,
                members: rank.members.clone(),
            });
        }

        payments
    }

    pub fn pay_upkeep(&mut self, cost_per_chunk: f64) -> UpkeepOutcome {
        let total = self.claimed_chunks as f64 * cost_per_chunk;
        if total > self.treasury.balance() {
            warn!(
                "Territory {} cannot pay {:.2} upkeep for {} chunks",
                self.id, total, self.claimed_chunks
            );
            return UpkeepOutcome::Unpaid { required: total };
        }
        self.treasury = self.treasury.add_to_balance(-total);
        UpkeepOutcome::Paid { amount: total }
    }

    /// Taxes, then salaries, then chunk upkeep
    pub fn run_daily_tasks(&mut self, cost_per_chunk: f64, members: usize) -> DailyReport {
        let taxes_collected = self.collect_base_tax(members);
        let salaries = self.pay_salaries();
        let upkeep = self.pay_upkeep(cost_per_chunk);

        info!("Daily tasks done for {}: treasury now {}", self.id, self.treasury);

        DailyReport {
            taxes_collected,
            salaries,
            upkeep,
            closing_balance: self.treasury,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn town(balance: f64) -> Territory {
        let mut territory = Territory::new("town-1", "Oakvale");
        territory.treasury = TreasuryBalance::new(balance);
        territory
    }

    #[test]
    fn test_pay_cost() {
        let mut territory = town(100.0);
        assert_eq!(territory.pay_cost(40.0).unwrap().balance(), 60.0);

        let err = territory.pay_cost(100.0).unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::InsufficientFunds { required, deficit } if required == 100.0 && deficit == 40.0
        ));
        assert_eq!(territory.balance(), 60.0);
    }

    #[test]
    fn test_rename_requires_funds() {
        let mut territory = town(10.0);
        assert!(territory.rename("Elmgrove", 50.0).is_err());
        assert_eq!(territory.name, "Oakvale");

        territory.rename("Elmgrove", 10.0).unwrap();
        assert_eq!(territory.name, "Elmgrove");
        assert_eq!(territory.balance(), 0.0);
    }

    #[test]
    fn test_donate_rejects_non_positive() {
        let mut territory = town(0.0);
        assert!(matches!(territory.donate(0.0), Err(TreasuryError::InvalidArgument(_))));
        assert!(matches!(territory.donate(-3.0), Err(TreasuryError::InvalidArgument(_))));
        assert_eq!(territory.donate(15.0).unwrap().balance(), 15.0);
    }

    #[test]
    fn test_pay_salaries_skips_unaffordable_ranks() {
        let mut territory = town(100.0);
        territory.ranks = vec![
            Rank::new("mayor", 80).with_members(["alice", "bob"]),
            Rank::new("guard", 20).with_members(["carol", "dave"]),
            Rank::new("citizen", 0).with_members(["erin"]),
        ];

        let payments = territory.pay_salaries();

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].rank, "guard");
        assert_eq!(payments[0].total, 40.0);
        assert_eq!(territory.balance(), 60.0);
    }

    #[test]
    fn test_pay_upkeep() {
        let mut territory = town(50.0);
        territory.claimed_chunks = 10;

        assert_eq!(territory.pay_upkeep(2.0), UpkeepOutcome::Paid { amount: 20.0 });
        assert_eq!(territory.balance(), 30.0);

        assert_eq!(territory.pay_upkeep(5.0), UpkeepOutcome::Unpaid { required: 50.0 });
        assert_eq!(territory.balance(), 30.0);
    }

    #[test]
    fn test_run_daily_tasks() {
        let mut territory = town(10.0);
        territory.taxes = TaxRates::default().with_base_tax(5.0);
        territory.claimed_chunks = 4;
        territory.ranks = vec![Rank::new("guard", 10).with_members(["carol"])];

        let report = territory.run_daily_tasks(1.0, 3);

        assert_eq!(report.taxes_collected, 15.0);
        assert_eq!(report.salaries.len(), 1);
        assert_eq!(report.upkeep, UpkeepOutcome::Paid { amount: 4.0 });
        assert_eq!(report.closing_balance.balance(), 11.0);
        assert_eq!(territory.treasury, report.closing_balance);
    }
}
