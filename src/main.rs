use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use mycurrency::cli::backfill::BackfillArgs;
use mycurrency::cli::convert::ConvertArgs;
use mycurrency::cli::history::HistoryArgs;
use mycurrency::cli::rate::RateArgs;
use mycurrency::core::log::init_logging;

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
    /// Create default configuration
    Setup,
    /// Store the configured currencies that are not known yet
    Seed,
    /// Resolve the exchange rate of a currency pair
    Rate {
        /// Source currency code
        source: String,
        /// Target currency code
        target: String,
        /// Valuation date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Ask this provider only, skipping the stored rates
        #[arg(short, long)]
        provider: Option<String>,
        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert an amount between currencies
    Convert {
        /// Source currency code
        source: String,
        /// Amount in the source currency
        amount: String,
        /// Target currency code
        target: String,
        /// Valuation date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Ask this provider only, skipping the stored rates
        #[arg(short, long)]
        provider: Option<String>,
        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show stored rates of a source currency over a period
    History {
        /// Source currency code
        source: String,
        /// First valuation date (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last valuation date (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load historical rates for every configured pair
    Backfill {
        /// Number of days to go back from today
        #[arg(long)]
        days: Option<u32>,
        /// Source currency codes, comma separated
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
        /// Target currency codes, comma separated
        #[arg(long, value_delimiter = ',')]
        targets: Vec<String>,
    },
    /// Display configured providers and the fallback chain
    Providers,
    /// List known currencies
    Currencies,
}

impl From<Commands> for mycurrency::AppCommand {
    fn from(cmd: Commands) -> mycurrency::AppCommand {
        match cmd {
            Commands::Seed => mycurrency::AppCommand::Seed,
            Commands::Rate {
                source,
                target,
                date,
                provider,
                json,
            } => mycurrency::AppCommand::Rate(RateArgs {
                source,
                target,
                date,
                provider,
                json,
            }),
            Commands::Convert {
                source,
                amount,
                target,
                date,
                provider,
                json,
            } => mycurrency::AppCommand::Convert(ConvertArgs {
                source,
                amount,
                target,
                date,
                provider,
                json,
            }),
            Commands::History {
                source,
                from,
                to,
                json,
            } => mycurrency::AppCommand::History(HistoryArgs {
                source,
                from,
                to,
                json,
            }),
            Commands::Backfill {
                days,
                sources,
                targets,
            } => mycurrency::AppCommand::Backfill(BackfillArgs {
                days,
                sources,
                targets,
            }),
            Commands::Providers => mycurrency::AppCommand::Providers,
            Commands::Currencies => mycurrency::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => mycurrency::cli::setup::setup_at_path(path),
            None => mycurrency::cli::setup::setup(),
        },
        Some(cmd) => mycurrency::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
