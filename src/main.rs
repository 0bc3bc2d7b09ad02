//! Cosmos Disburse - recurring balance disbursement for Cosmos SDK chains
//!
//! # WARNING
//! - This bot moves real funds. Seed phrases in the environment control them.
//! - The sweep strategy sends the whole balance to a throwaway address whose
//!   seed phrase is discarded. Those funds are unrecoverable.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use cosmos_disburse::cli::commands::{self, StartOptions};
use cosmos_disburse::config::Config;
use cosmos_disburse::disburse::StrategyKind;

/// Cosmos Disburse - recurring balance disbursement
#[derive(Parser)]
#[command(name = "disburse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the disbursement loop
    Start {
        /// Strategy to run (prompts when omitted)
        #[arg(long, value_enum)]
        strategy: Option<StrategyKind>,

        /// Number of wallets for the generate strategy (prompts when omitted)
        #[arg(long)]
        count: Option<usize>,

        /// Stop after this many cycles instead of running forever
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Show the balance of every configured account
    Balances,

    /// Generate wallets once and save them to the wallet file
    Generate {
        /// Number of wallets (prompts when omitted)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables (and seed phrases) from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.json);

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Start {
            strategy,
            count,
            max_cycles,
        } => {
            commands::start(
                &config,
                StartOptions {
                    strategy,
                    wallet_count: count,
                    max_cycles,
                },
            )
            .await
        }
        Commands::Balances => commands::balances(&config).await,
        Commands::Generate { count } => commands::generate(&config, count).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cosmos_disburse=info,disburse=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
