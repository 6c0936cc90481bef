pub mod backfill;
pub mod cli;
pub mod conversion;
pub mod core;
pub mod history;
pub mod providers;
pub mod registry;
pub mod resolver;
pub mod store;

use crate::cli::backfill::BackfillArgs;
use crate::cli::convert::ConvertArgs;
use crate::cli::history::HistoryArgs;
use crate::cli::rate::RateArgs;
use crate::conversion::CurrencyConverter;
use crate::core::config::AppConfig;
use crate::registry::ProviderRegistry;
use crate::resolver::RateResolver;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need a configuration to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Seed,
    Rate(RateArgs),
    Convert(ConvertArgs),
    History(HistoryArgs),
    Backfill(BackfillArgs),
    Providers,
    Currencies,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("mycurrency starting...");
    let config = load_config(config_path)?;
    let registry = Arc::new(ProviderRegistry::from_config(&config)?);

    match command {
        AppCommand::Providers => {
            cli::providers::run(&registry);
            Ok(())
        }
        command => run_with_store(command, &config, registry).await,
    }
}

async fn run_with_store(
    command: AppCommand,
    config: &AppConfig,
    registry: Arc<ProviderRegistry>,
) -> Result<()> {
    let store = store::open_store(config)?;
    let resolver = RateResolver::new(Arc::clone(&store), registry);

    match command {
        AppCommand::Seed => cli::seed::run(store.as_ref(), &config.currencies).await,
        AppCommand::Rate(args) => cli::rate::run(&resolver, &args).await,
        AppCommand::Convert(args) => {
            let converter = CurrencyConverter::new(resolver);
            cli::convert::run(&converter, &args).await
        }
        AppCommand::History(args) => cli::history::run(store.as_ref(), &args).await,
        AppCommand::Backfill(args) => {
            cli::backfill::run(&resolver, store.as_ref(), &config.backfill, &args).await
        }
        AppCommand::Currencies => cli::currencies::run(store.as_ref()).await,
        AppCommand::Providers => {
            cli::providers::run(resolver.registry());
            Ok(())
        }
    }
}
