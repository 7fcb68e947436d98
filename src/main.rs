use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use finlytics::analytics::Period;
use finlytics::cli;
use finlytics::config::AppConfig;
use finlytics::log::init_logging;
use finlytics::transaction_store::TransactionStore;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Rate day, YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Display the exchange rate table for a day
    Rates {
        /// Rate day, YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Display income/expense totals for a transaction export
    Summary {
        /// JSON transaction export from the bank service
        #[arg(long)]
        transactions: PathBuf,
        /// Comma-separated account ids; defaults to all in the export
        #[arg(long, value_delimiter = ',')]
        accounts: Option<Vec<i64>>,
    },
    /// Display the per-month income/expense series for a year
    Monthly {
        #[arg(long)]
        transactions: PathBuf,
        #[arg(long)]
        year: i32,
        #[arg(long, value_delimiter = ',')]
        accounts: Option<Vec<i64>>,
    },
    /// Display per-category budget spend for a month
    Budgets {
        #[arg(long)]
        transactions: PathBuf,
        /// Period as YYYY-MM
        #[arg(long)]
        period: Period,
        #[arg(long, value_delimiter = ',')]
        accounts: Option<Vec<i64>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match cli.config_path.as_deref() {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let result = match cli.command {
        Some(command) => run_command(command, &config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}

async fn run_command(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Convert {
            amount,
            from,
            to,
            date,
        } => {
            let rates = finlytics::build_rate_cache(config);
            cli::convert::run(amount, &from, &to, date, &rates).await
        }
        Commands::Rates { date } => {
            let rates = finlytics::build_rate_cache(config);
            cli::rates::run(date, &rates).await
        }
        Commands::Summary {
            transactions,
            accounts,
        } => {
            let (service, accounts) = open_export(config, &transactions, accounts)?;
            cli::report::summary(&service, &accounts, &config.currency).await
        }
        Commands::Monthly {
            transactions,
            year,
            accounts,
        } => {
            let (service, accounts) = open_export(config, &transactions, accounts)?;
            cli::report::monthly(&service, &accounts, year, &config.currency).await
        }
        Commands::Budgets {
            transactions,
            period,
            accounts,
        } => {
            let (service, accounts) = open_export(config, &transactions, accounts)?;
            cli::report::budgets(&service, &accounts, period, &config.currency).await
        }
    }
}

fn open_export(
    config: &AppConfig,
    transactions: &std::path::Path,
    accounts: Option<Vec<i64>>,
) -> Result<(finlytics::service::Analytics, Vec<i64>)> {
    let store = cli::report::load_transactions(transactions)?;
    let accounts = accounts.unwrap_or_else(|| store.account_ids());
    let service = finlytics::build_analytics(config, Arc::new(store) as Arc<dyn TransactionStore>);
    Ok((service, accounts))
}
