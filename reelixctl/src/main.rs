use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelix_core::config::{ConfigLoad, ConfigLoader};
use reelix_model::FeedSort;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "reelixctl")]
#[command(about = "Exercise the Reelix shorts feed engine against a live API")]
struct Cli {
    /// Configuration file (overrides REELIX_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token used for reactions, comments and moderation
    #[arg(long, global = true, env = "REELIX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one page of shorts and print it
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// latest, trending or random
        #[arg(long)]
        sort: Option<FeedSort>,
    },
    /// Print one page of comments for an item
    Comments {
        item: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Swipe through the feed with headless media and print each card
    Simulate {
        #[arg(long, default_value_t = 5)]
        swipes: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reelix_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config.clone() {
        loader = loader.with_config_path(path);
    }
    let ConfigLoad {
        config,
        warnings,
        source,
    } = loader.load().context("failed to load configuration")?;

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
    match &source {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("using built-in configuration defaults"),
    }
    info!(
        api.base_url = %config.api.base_url,
        feed.page_size = config.feed.page_size,
        feed.sort = %config.feed.sort,
        "configuration in effect"
    );

    match cli.command {
        Command::Feed { page, sort } => {
            commands::feed(&config, page, sort.unwrap_or(config.feed.sort)).await
        }
        Command::Comments { item, page } => {
            commands::comments(&config, &item, page).await
        }
        Command::Simulate { swipes } => {
            commands::simulate(config, cli.token, swipes).await
        }
    }
}
