use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use crate::{
    cooldown::RateLimitRegistry,
    error::{Result, TreasuryError},
};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub economy: EconomyConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cooldowns: CooldownConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EconomyConfig {
    /// Daily cost of each claimed chunk
    pub upkeep_cost_per_chunk: f64,
    #[serde(default)]
    pub starting_balance: f64,
    /// Cost of renaming a territory
    #[serde(default = "default_rename_cost")]
    pub rename_cost: f64,
    /// Whether admin withdrawals may push a treasury below zero
    #[serde(default)]
    pub allow_overdraft: bool,
}

fn default_rename_cost() -> f64 {
    100.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CooldownConfig {
    /// Seconds per command, replacing the built-in cooldowns
    #[serde(default)]
    pub overrides: HashMap<String, u64>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("TAN").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| TreasuryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.economy.upkeep_cost_per_chunk.is_finite() || self.economy.upkeep_cost_per_chunk < 0.0 {
            return Err(TreasuryError::Config(format!(
                "upkeep_cost_per_chunk must be a non-negative number, got {}",
                self.economy.upkeep_cost_per_chunk
            )));
        }
        if !self.economy.starting_balance.is_finite() {
            return Err(TreasuryError::Config("starting_balance must be finite".to_string()));
        }
        if self.economy.rename_cost < 0.0 {
            return Err(TreasuryError::Config("rename_cost cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Built-in cooldowns with the configured overrides applied
    pub fn rate_limits(&self) -> RateLimitRegistry {
        let registry = RateLimitRegistry::with_defaults();
        for (command, seconds) in &self.cooldowns.overrides {
            registry.register(command, Duration::from_secs(*seconds));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [economy]
        upkeep_cost_per_chunk = 0.5
        starting_balance = 25.0

        [database]
        path = "tan.db"

        [cooldowns.overrides]
        deposit = 10
        audit = 3
    "#;

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.economy.upkeep_cost_per_chunk, 0.5);
        assert_eq!(config.economy.starting_balance, 25.0);
        assert_eq!(config.economy.rename_cost, 100.0);
        assert!(!config.economy.allow_overdraft);
        assert_eq!(config.database.path, "tan.db");
    }

    #[test]
    fn test_cooldown_section_optional() {
        let config = Config::from_toml(
            "[economy]\nupkeep_cost_per_chunk = 1.0\n[database]\npath = \"x.db\"\n",
        )
        .unwrap();
        assert!(config.cooldowns.overrides.is_empty());
    }

    #[test]
    fn test_rejects_negative_upkeep() {
        let err = Config::from_toml(
            "[economy]\nupkeep_cost_per_chunk = -1.0\n[database]\npath = \"x.db\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, TreasuryError::Config(_)));
    }

    #[test]
    fn test_rate_limit_overrides() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let registry = config.rate_limits();

        assert_eq!(registry.get("deposit").unwrap().cooldown(), Duration::from_secs(10));
        assert_eq!(registry.get("audit").unwrap().cooldown(), Duration::from_secs(3));
        assert_eq!(registry.get("withdraw").unwrap().cooldown(), Duration::from_secs(2));
    }
}
