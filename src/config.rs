//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub disbursement: DisbursementConfig,
}

/// Chain parameters: denominations, fees, RPC and address derivation
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub rpc_endpoint: String,
    /// Chain id used when signing. Fetched from the node when empty.
    #[serde(default)]
    pub chain_id: String,
    /// Base (smallest unit) denomination, e.g. `uatom`
    #[serde(default = "default_base_denom")]
    pub base_denom: String,
    /// Human-readable symbol, e.g. `ATOM`
    #[serde(default = "default_display_symbol")]
    pub display_symbol: String,
    /// Decimal exponent between base and display units
    #[serde(default = "default_exponent")]
    pub exponent: u32,
    /// Minimum transaction fee in base units. Also the balance gate.
    #[serde(default = "default_min_tx_fee")]
    pub min_tx_fee: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// BIP-44 coin type used for the HD derivation path
    #[serde(default = "default_coin_type")]
    pub coin_type: u32,
    /// Bech32 prefix for source accounts
    #[serde(default = "default_address_prefix")]
    pub address_prefix: String,
    /// Bech32 prefix for generated one-time recipients and wallet files
    #[serde(default = "default_address_prefix")]
    pub ephemeral_address_prefix: String,
    #[serde(default)]
    pub memo: String,
}

/// Loop scheduling, file locations and output formatting
#[derive(Debug, Clone, Deserialize)]
pub struct DisbursementConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Amount sent per transfer by the auto-generate and file strategies
    #[serde(default = "default_transfer_amount")]
    pub transfer_amount: u64,
    #[serde(default = "default_recipients_file")]
    pub recipients_file: String,
    #[serde(default = "default_wallets_file")]
    pub wallets_file: String,
    /// Environment variables starting with this marker hold seed phrases
    #[serde(default = "default_mnemonic_env_prefix")]
    pub mnemonic_env_prefix: String,
    /// Prefix for every user-facing log line
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: default_rpc_endpoint(),
            chain_id: String::new(),
            base_denom: default_base_denom(),
            display_symbol: default_display_symbol(),
            exponent: default_exponent(),
            min_tx_fee: default_min_tx_fee(),
            gas_limit: default_gas_limit(),
            coin_type: default_coin_type(),
            address_prefix: default_address_prefix(),
            ephemeral_address_prefix: default_address_prefix(),
            memo: String::new(),
        }
    }
}

impl Default for DisbursementConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            transfer_amount: default_transfer_amount(),
            recipients_file: default_recipients_file(),
            wallets_file: default_wallets_file(),
            mnemonic_env_prefix: default_mnemonic_env_prefix(),
            log_prefix: default_log_prefix(),
        }
    }
}

fn default_rpc_endpoint() -> String {
    "https://cosmos-rpc.publicnode.com:443".to_string()
}

fn default_base_denom() -> String {
    "uatom".to_string()
}

fn default_display_symbol() -> String {
    "ATOM".to_string()
}

fn default_exponent() -> u32 {
    6
}

fn default_min_tx_fee() -> u64 {
    5_000
}

fn default_gas_limit() -> u64 {
    200_000
}

fn default_coin_type() -> u32 {
    118
}

fn default_address_prefix() -> String {
    "cosmos".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

fn default_transfer_amount() -> u64 {
    1
}

fn default_recipients_file() -> String {
    "recipients.txt".to_string()
}

fn default_wallets_file() -> String {
    "wallet.json".to_string()
}

fn default_mnemonic_env_prefix() -> String {
    "MNEMONIC".to_string()
}

fn default_log_prefix() -> String {
    "[disburse]".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix DISBURSE_)
            .add_source(
                config::Environment::with_prefix("DISBURSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let chain = &self.chain;

        let endpoint = url::Url::parse(&chain.rpc_endpoint)
            .with_context(|| format!("Invalid rpc_endpoint: {}", chain.rpc_endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("rpc_endpoint must use http or https, got {}", endpoint.scheme());
        }

        if chain.base_denom.trim().is_empty() {
            anyhow::bail!("base_denom must not be empty");
        }
        if chain.display_symbol.trim().is_empty() {
            anyhow::bail!("display_symbol must not be empty");
        }
        if chain.address_prefix.trim().is_empty() || chain.ephemeral_address_prefix.trim().is_empty()
        {
            anyhow::bail!("address prefixes must not be empty");
        }

        // 10^exponent must fit comfortably in an f64 for display
        if chain.exponent > 18 {
            anyhow::bail!("exponent cannot exceed 18, got {}", chain.exponent);
        }

        if chain.min_tx_fee == 0 {
            anyhow::bail!("min_tx_fee must be positive");
        }
        if chain.gas_limit == 0 {
            anyhow::bail!("gas_limit must be positive");
        }

        if self.disbursement.transfer_amount == 0 {
            anyhow::bail!("transfer_amount must be at least 1 base unit");
        }
        if self.disbursement.interval_secs == 0 {
            anyhow::bail!("interval_secs must be positive");
        }
        if self.disbursement.mnemonic_env_prefix.is_empty() {
            anyhow::bail!("mnemonic_env_prefix must not be empty");
        }

        Ok(())
    }

    /// Sleep between cycles
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.disbursement.interval_secs)
    }

    /// Minimum balance, in base units, needed to cover one transaction
    pub fn fee_threshold(&self) -> u128 {
        u128::from(self.chain.min_tx_fee)
    }

    /// Base units sent per transfer by the auto-generate and file strategies
    pub fn transfer_amount(&self) -> u128 {
        u128::from(self.disbursement.transfer_amount)
    }

    /// Prefix prepended to user-facing log lines
    pub fn log_prefix(&self) -> &str {
        &self.disbursement.log_prefix
    }

    /// Convert a base-unit amount to display units
    pub fn to_display_amount(&self, base_units: u128) -> f64 {
        base_units as f64 / 10f64.powi(self.chain.exponent as i32)
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Chain:
    rpc_endpoint: {}
    chain_id: {}
    denom: {} ({}, exponent {})
    min_tx_fee: {} {}
    gas_limit: {}
    coin_type: {}
    address_prefix: {}
    ephemeral_address_prefix: {}
  Disbursement:
    interval: {}s
    transfer_amount: {} {}
    recipients_file: {}
    wallets_file: {}
    mnemonic_env_prefix: {}
"#,
            mask_url(&self.chain.rpc_endpoint),
            if self.chain.chain_id.is_empty() {
                "(from node)"
            } else {
                &self.chain.chain_id
            },
            self.chain.base_denom,
            self.chain.display_symbol,
            self.chain.exponent,
            self.chain.min_tx_fee,
            self.chain.base_denom,
            self.chain.gas_limit,
            self.chain.coin_type,
            self.chain.address_prefix,
            self.chain.ephemeral_address_prefix,
            self.disbursement.interval_secs,
            self.disbursement.transfer_amount,
            self.chain.base_denom,
            self.disbursement.recipients_file,
            self.disbursement.wallets_file,
            self.disbursement.mnemonic_env_prefix,
        )
    }
}

/// Mask URL for display (hide credentials and API keys in query params)
fn mask_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return "***".to_string();
    };

    if url.query().is_some() {
        url.set_query(Some("***"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        // Only fails for URLs that cannot carry credentials
        let _ = url.set_username("***");
        let _ = url.set_password(None);
    }

    url.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            disbursement: DisbursementConfig::default(),
        }
    }
}
