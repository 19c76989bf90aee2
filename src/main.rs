mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use tan_treasury::{
    config::Config,
    error::{self, TreasuryError},
    storage::Database,
    territory::{Rank, UpkeepOutcome},
    treasurer::{TaxUpdate, Treasurer},
    utils,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tan_treasury=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, &cli.actor, &config) {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn run(command: Commands, actor: &str, config: &Config) -> error::Result<()> {
    if let Commands::Init = command {
        info!("Initializing...");
        return initialize(config);
    }

    let db = Database::new(&config.database.path)?;
    let treasurer = Treasurer::new(db, config.economy.clone(), config.rate_limits());

    match command {
        Commands::Init => Ok(()),

        Commands::Create { id, name, balance, chunks } => {
            let territory = treasurer.create_territory(&id, &name, balance, chunks)?;
            println!(
                "{} {} '{}' with {}",
                "✓ Created".green(),
                territory.id,
                territory.name,
                utils::format_balance(&territory.treasury)
            );
            Ok(())
        }

        Commands::Show { id, format } => show_territory(&treasurer, &id, &format),

        Commands::List { format } => list_territories(treasurer.store(), &format),

        Commands::Deposit { id, amount } => {
            let treasury = treasurer.deposit(&id, amount, actor)?;
            println!("Deposited {} into {}. Treasury: {}", utils::format_amount(amount), id, utils::format_balance(&treasury));
            Ok(())
        }

        Commands::Withdraw { id, amount, allow_overdraft, yes } => {
            if !yes && !utils::confirm_action(&format!("Withdraw {} from {}?", utils::format_amount(amount), id)) {
                println!("Cancelled");
                return Ok(());
            }
            let treasury = treasurer.withdraw(&id, amount, actor, allow_overdraft)?;
            println!("Withdrew {} from {}. Treasury: {}", utils::format_amount(amount), id, utils::format_balance(&treasury));
            Ok(())
        }

        Commands::Donate { id, player, amount } => {
            let treasury = treasurer.donate(&id, &player, amount)?;
            println!("{} donated {} to {}. Treasury: {}", player, utils::format_amount(amount), id, utils::format_balance(&treasury));
            Ok(())
        }

        Commands::Transfer { from, to, amount } => {
            let (source, target) = treasurer.transfer(&from, &to, amount)?;
            println!("Transferred {} from {} to {}", utils::format_amount(amount), from, to);
            println!("  {:<20} {}", from, utils::format_balance(&source));
            println!("  {:<20} {}", to, utils::format_balance(&target));
            Ok(())
        }

        Commands::Rename { id, new_name } => {
            let territory = treasurer.rename(&id, &new_name)?;
            println!(
                "{} renamed to '{}'. Treasury: {}",
                id,
                territory.name,
                utils::format_balance(&territory.treasury)
            );
            Ok(())
        }

        Commands::Tax { id, base, rent, buy, create } => {
            let taxes = treasurer.update_taxes(&id, TaxUpdate { base, rent, buy, create })?;
            println!("{}", format!("Taxes of {}", id).cyan());
            println!("  Base:            {}", utils::format_amount(taxes.base_tax()));
            println!("  Rent rate:       {}", utils::format_amount(taxes.property_rent_tax()));
            println!("  Buy rate:        {}", utils::format_amount(taxes.property_buy_tax()));
            println!("  Creation:        {}", utils::format_amount(taxes.property_create_tax()));
            Ok(())
        }

        Commands::Rank { id, name, salary, members } => {
            let territory = treasurer.set_rank(&id, Rank::new(name.as_str(), salary).with_members(members))?;
            println!("{} now has {} rank(s)", territory.id, territory.ranks.len());
            Ok(())
        }

        Commands::Upkeep { id } => {
            match treasurer.run_upkeep(&id)? {
                UpkeepOutcome::Paid { amount } => {
                    println!("{} paid {} upkeep", id, utils::format_amount(amount).green())
                }
                UpkeepOutcome::Unpaid { required } => println!(
                    "{}",
                    format!("{} cannot pay {} upkeep", id, utils::format_amount(required)).red()
                ),
            }
            Ok(())
        }

        Commands::Daily { id, members } => {
            let report = treasurer.run_daily_tasks(&id, members)?;
            println!("{}", format!("=== Daily cycle for {} ===", id).cyan().bold());
            println!("Taxes collected:  {}", utils::format_amount(report.taxes_collected));
            for payment in &report.salaries {
                println!(
                    "Salary paid:      {} to {} member(s) of {}",
                    utils::format_amount(payment.total),
                    payment.members.len(),
                    payment.rank
                );
            }
            match report.upkeep {
                UpkeepOutcome::Paid { amount } => println!("Upkeep paid:      {}", utils::format_amount(amount)),
                UpkeepOutcome::Unpaid { required } => {
                    println!("Upkeep missed:    {}", utils::format_amount(required).red())
                }
            }
            println!("Treasury:         {}", utils::format_balance(&report.closing_balance));
            Ok(())
        }

        Commands::History { id, limit } => show_history(&treasurer, &id, limit),

        Commands::Stats { format } => show_stats(treasurer.store(), &format),

        Commands::Delete { id, yes } => {
            if !yes && !utils::confirm_action(&format!("Delete {} and its history?", id)) {
                println!("Cancelled");
                return Ok(());
            }
            if !treasurer.store().delete_territory(&id)? {
                return Err(TreasuryError::TerritoryNotFound(id));
            }
            println!("{} {}", "✓ Deleted".green(), id);
            Ok(())
        }
    }
}

fn show_territory(treasurer: &Treasurer<Database>, id: &str, format: &str) -> error::Result<()> {
    let territory = treasurer.territory(id)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&territory)?);
        return Ok(());
    }

    println!("{}", format!("=== {} ({}) ===", territory.name, territory.id).cyan().bold());
    println!("Treasury:        {}", utils::format_balance(&territory.treasury));
    println!("Claimed chunks:  {}", territory.claimed_chunks);
    println!("Base tax:        {}", utils::format_amount(territory.taxes.base_tax()));
    println!("Rent tax rate:   {}", utils::format_amount(territory.taxes.property_rent_tax()));
    println!("Buy tax rate:    {}", utils::format_amount(territory.taxes.property_buy_tax()));
    println!("Creation tax:    {}", utils::format_amount(territory.taxes.property_create_tax()));

    if !territory.ranks.is_empty() {
        println!("\n{}", "Ranks:".yellow());
        for rank in &territory.ranks {
            println!("  {:<16} salary {:>6}  members {}", rank.name, rank.salary, rank.members.len());
        }
    }
    Ok(())
}

fn list_territories(db: &Database, format: &str) -> error::Result<()> {
    let territories = db.list_territories()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&territories)?);
        return Ok(());
    }

    if territories.is_empty() {
        println!("No territories yet");
        return Ok(());
    }

    utils::print_table_border(70);
    utils::print_table_row(&["Id", "Name", "Treasury", "Chunks"], &[16, 24, 16, 8]);
    utils::print_table_border(70);
    for territory in &territories {
        utils::print_table_row(
            &[
                &territory.id,
                &territory.name,
                &territory.treasury.formatted_balance(),
                &territory.claimed_chunks.to_string(),
            ],
            &[16, 24, 16, 8],
        );
    }
    utils::print_table_border(70);
    Ok(())
}

fn show_history(treasurer: &Treasurer<Database>, id: &str, limit: usize) -> error::Result<()> {
    let history = treasurer.history(id, Some(limit))?;

    if history.is_empty() {
        println!("No transactions recorded for {}", id);
        return Ok(());
    }

    println!("{}", format!("Recent transactions of {}:", id).yellow());
    utils::print_table_border(80);
    utils::print_table_row(&["Timestamp", "Kind", "Amount", "Counterparty"], &[24, 14, 14, 20]);
    utils::print_table_border(80);
    for record in history {
        utils::print_table_row(
            &[
                &utils::format_timestamp(&record.timestamp),
                &record.kind.to_string(),
                &utils::format_amount(record.amount),
                record.counterparty.as_deref().unwrap_or("-"),
            ],
            &[24, 14, 14, 20],
        );
    }
    utils::print_table_border(80);
    Ok(())
}

fn show_stats(db: &Database, format: &str) -> error::Result<()> {
    let stats = db.get_stats()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Treasury Statistics ===".cyan().bold());
    println!("Territories:      {}", stats.total_territories);
    println!("Total treasury:   {}", utils::format_amount(stats.total_balance).yellow());
    println!("Overdrawn:        {}", stats.indebted_territories.to_string().red());
    println!("Transactions:     {}", stats.total_transactions);
    Ok(())
}

fn initialize(config: &Config) -> error::Result<()> {
    println!("{}", "Initializing treasury database...".green());
    let _db = Database::new(&config.database.path)?;
    println!("{}", "✓ Database initialized".green());
    println!("{}", "✓ Configuration loaded".green());
    println!("\n{}", "Configuration:".cyan());
    println!("  Database:          {}", config.database.path);
    println!("  Upkeep per chunk:  {}", utils::format_amount(config.economy.upkeep_cost_per_chunk));
    println!("  Starting balance:  {}", utils::format_amount(config.economy.starting_balance));
    println!("  Rename cost:       {}", utils::format_amount(config.economy.rename_cost));
    println!("  Allow overdraft:   {}", config.economy.allow_overdraft);

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to create a town", "tan-treasury create town-1 Oakvale --balance 100".yellow());
    println!("  {} to view it", "tan-treasury show town-1".yellow());
    Ok(())
}
