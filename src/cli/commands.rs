use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tan-treasury")]
#[command(about = "Treasury administration for towns and regions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,

    /// Name recorded as the actor of admin operations
    #[arg(long, global = true, default_value = "console")]
    pub actor: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and configuration
    Init,

    /// Create a territory with its treasury
    Create {
        /// Territory id
        id: String,

        /// Display name
        name: String,

        /// Opening balance (defaults to the configured starting balance)
        #[arg(short, long, allow_negative_numbers = true)]
        balance: Option<f64>,

        /// Number of claimed chunks
        #[arg(long, default_value = "0")]
        chunks: u32,
    },

    /// Show a territory's treasury and taxes
    Show {
        id: String,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List all territories
    List {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Deposit into a treasury
    Deposit {
        id: String,

        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Withdraw from a treasury
    Withdraw {
        id: String,

        #[arg(allow_negative_numbers = true)]
        amount: f64,

        /// Allow the treasury to go below zero
        #[arg(long)]
        allow_overdraft: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Record a player donation
    Donate {
        id: String,

        /// Donating player
        player: String,

        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Move money from one territory to another
    Transfer {
        from: String,

        to: String,

        amount: f64,
    },

    /// Rename a territory, paying the configured cost
    Rename {
        id: String,

        new_name: String,
    },

    /// Update tax settings
    Tax {
        id: String,

        /// Flat tax per member
        #[arg(long, allow_negative_numbers = true)]
        base: Option<f64>,

        /// Tax rate on property rent (0-1)
        #[arg(long)]
        rent: Option<f64>,

        /// Tax rate on property sales (0-1)
        #[arg(long)]
        buy: Option<f64>,

        /// Flat tax on property creation
        #[arg(long)]
        create: Option<f64>,
    },

    /// Add or replace a salaried rank
    Rank {
        id: String,

        /// Rank name
        name: String,

        /// Salary paid to each member per day
        #[arg(short, long, default_value = "0")]
        salary: u32,

        /// Members of the rank
        #[arg(short, long, value_delimiter = ',')]
        members: Vec<String>,
    },

    /// Charge chunk upkeep
    Upkeep { id: String },

    /// Run the daily cycle: taxes, salaries, upkeep
    Daily {
        id: String,

        /// Members paying the base tax
        #[arg(short, long, default_value = "0")]
        members: usize,
    },

    /// Show transaction history
    History {
        id: String,

        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show statistics across all territories
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Delete a territory and its history
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_withdraw() {
        let cli = Cli::parse_from(["tan-treasury", "withdraw", "town-1", "12.5", "--allow-overdraft"]);
        match cli.command {
            Commands::Withdraw { id, amount, allow_overdraft, yes } => {
                assert_eq!(id, "town-1");
                assert_eq!(amount, 12.5);
                assert!(allow_overdraft);
                assert!(!yes);
            }
            _ => panic!("expected withdraw"),
        }
        assert_eq!(cli.config, "config.toml");
        assert_eq!(cli.actor, "console");
    }

    #[test]
    fn test_parse_negative_deposit() {
        let cli = Cli::parse_from(["tan-treasury", "deposit", "town-1", "-5"]);
        assert!(matches!(cli.command, Commands::Deposit { amount, .. } if amount == -5.0));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
