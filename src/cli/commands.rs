//! CLI command implementations

use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use tracing::{info, warn};

use crate::chain::{ChainGateway, RpcGateway};
use crate::config::Config;
use crate::disburse::{DisbursementLoop, Strategy, StrategyKind};
use crate::wallet::account::{load_accounts, mnemonics_from_env, Account};
use crate::wallet::generator::generate_and_save;
use crate::wallet::keys::Derivation;

/// Options for `start` that can bypass the interactive prompts
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub strategy: Option<StrategyKind>,
    pub wallet_count: Option<usize>,
    pub max_cycles: Option<u64>,
}

/// Start the disbursement loop
pub async fn start(config: &Config, options: StartOptions) -> Result<()> {
    let accounts = load_source_accounts(config).await?;
    println!("{}", banner(config));

    // Everything the loop needs is fixed before it is built
    let kind = match options.strategy {
        Some(kind) => kind,
        None => prompt_strategy(config)?,
    };
    let wallet_count = match (kind, options.wallet_count) {
        (StrategyKind::Generate, Some(count)) => positive_count(count)?,
        (StrategyKind::Generate, None) => prompt_wallet_count(config)?,
        _ => 0,
    };
    let strategy = Strategy::from_kind(kind, config, wallet_count);

    info!("Initializing RPC client...");
    let gateway: Arc<dyn ChainGateway> = Arc::new(RpcGateway::new(&config.chain)?);

    let mut engine = DisbursementLoop::new(Arc::new(config.clone()), gateway, accounts, strategy);
    if let Some(max) = options.max_cycles {
        engine = engine.with_max_cycles(max);
    }

    let cancel = engine.cancellation_token();
    let prefix = config.log_prefix().to_string();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("{} Interrupt received, stopping after the current cycle", prefix);
            cancel.cancel();
        }
    });

    engine.run().await;
    Ok(())
}

/// Show the current balance of every configured account
pub async fn balances(config: &Config) -> Result<()> {
    let accounts = load_source_accounts(config).await?;
    let gateway = RpcGateway::new(&config.chain)?;

    println!("\n=== ACCOUNT BALANCES ===\n");

    let mut total: u128 = 0;
    for account in &accounts {
        print!("{} ({}): ", account.name(), account.address());
        match gateway
            .query_balance(&account.address(), &config.chain.base_denom)
            .await
        {
            Ok(balance) => {
                total += balance;
                println!(
                    "{} {} ({} {})",
                    config.to_display_amount(balance),
                    config.chain.display_symbol,
                    balance,
                    config.chain.base_denom
                );
            }
            Err(e) => println!("(balance fetch failed: {})", e),
        }
    }

    println!(
        "\nTotal: {} {} across {} accounts",
        config.to_display_amount(total),
        config.chain.display_symbol,
        accounts.len()
    );
    println!(
        "Fee threshold: {} {}",
        config.to_display_amount(config.fee_threshold()),
        config.chain.display_symbol
    );

    Ok(())
}

/// Generate wallets once and write them to the wallet file
pub async fn generate(config: &Config, count: Option<usize>) -> Result<()> {
    let count = match count {
        Some(count) => positive_count(count)?,
        None => prompt_wallet_count(config)?,
    };

    let output = Path::new(&config.disbursement.wallets_file);
    let records = generate_and_save(count, &Derivation::ephemeral(&config.chain), output).await?;

    println!(
        "{} Generated {} wallets and saved to {}",
        config.log_prefix(),
        records.len(),
        output.display()
    );
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

async fn load_source_accounts(config: &Config) -> Result<Vec<Arc<Account>>> {
    let seeds = mnemonics_from_env(&config.disbursement.mnemonic_env_prefix);
    info!(
        "Found {} seed phrases ({}*)",
        seeds.len(),
        config.disbursement.mnemonic_env_prefix
    );

    load_accounts(seeds, &Derivation::accounts(&config.chain))
        .await
        .context("Failed to initialize accounts")
}

/// Ask which strategy to run
///
/// Uses an arrow-key menu on a terminal and a numbered answer on piped stdin.
pub fn prompt_strategy(config: &Config) -> Result<StrategyKind> {
    let prompt = format!("{} Choose recipient method", config.log_prefix());
    let labels: Vec<String> = StrategyKind::ALL
        .iter()
        .map(|kind| kind.menu_label(config))
        .collect();

    if std::io::stdin().is_terminal() {
        let index = Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()?;
        return Ok(StrategyKind::ALL[index]);
    }

    println!("{}:", prompt);
    for (i, label) in labels.iter().enumerate() {
        println!("{}. {}", i + 1, label);
    }

    let answer = read_stdin_line()?;
    StrategyKind::from_menu_number(&answer)
        .with_context(|| format!("Invalid choice {:?}, expected 1-4", answer.trim()))
}

/// Ask how many wallets to generate
pub fn prompt_wallet_count(config: &Config) -> Result<usize> {
    let prompt = format!("{} Enter number of wallets to generate", config.log_prefix());

    if std::io::stdin().is_terminal() {
        let count = Input::<usize>::new()
            .with_prompt(prompt)
            .validate_with(|n: &usize| -> std::result::Result<(), &str> {
                if *n > 0 {
                    Ok(())
                } else {
                    Err("enter a positive number")
                }
            })
            .interact_text()?;
        return Ok(count);
    }

    println!("{}: ", prompt);
    let answer = read_stdin_line()?;
    let count: usize = answer
        .trim()
        .parse()
        .with_context(|| format!("Invalid wallet count {:?}", answer.trim()))?;
    positive_count(count)
}

fn positive_count(count: usize) -> Result<usize> {
    if count == 0 {
        anyhow::bail!("Wallet count must be positive");
    }
    Ok(count)
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line)
}

fn banner(config: &Config) -> String {
    let title = format!("{} Cosmos Wallet Manager", config.log_prefix());
    let border = "*".repeat(title.len() + 12);
    format!("\n  {border}\n  *     {title}     *\n  {border}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_contains_prefix() {
        let mut config = Config::default();
        config.disbursement.log_prefix = "[osmo]".to_string();
        let banner = banner(&config);
        assert!(banner.contains("[osmo] Cosmos Wallet Manager"));
        let lines: Vec<&str> = banner.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), lines[1].len());
    }

    #[tokio::test]
    async fn test_generate_with_count_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.disbursement.wallets_file = dir
            .path()
            .join("wallet.json")
            .to_string_lossy()
            .into_owned();

        generate(&config, Some(2)).await.unwrap();

        let records = crate::wallet::generator::load_wallet_records(Path::new(
            &config.disbursement.wallets_file,
        ))
        .await
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_zero_count_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        let saved = r#"[{"mnemonic":"keep","address":"cosmos1keep"}]"#;
        std::fs::write(&path, saved).unwrap();

        let mut config = Config::default();
        config.disbursement.wallets_file = path.to_string_lossy().into_owned();

        let err = generate(&config, Some(0)).await.unwrap_err();
        assert!(err.to_string().contains("Wallet count must be positive"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), saved);
    }

    #[test]
    fn test_positive_count() {
        assert!(positive_count(0).is_err());
        assert_eq!(positive_count(3).unwrap(), 3);
    }
}
