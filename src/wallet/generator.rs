//! Wallet generation and the wallet output file
//!
//! The output file is a pretty-printed JSON array of `{mnemonic, address}`
//! objects and is replaced in full on every write.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::keys::{generate_mnemonic, Derivation};
use crate::error::{Error, Result};

/// One generated wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedWalletRecord {
    pub mnemonic: String,
    pub address: String,
}

/// Generate `count` independent wallets
pub fn generate_wallets(count: usize, derivation: &Derivation) -> Result<Vec<GeneratedWalletRecord>> {
    (0..count)
        .map(|_| {
            let mnemonic = generate_mnemonic()?;
            let address = derivation.address(&mnemonic)?;
            debug!("Generated wallet {}", address);
            Ok(GeneratedWalletRecord { mnemonic, address })
        })
        .collect()
}

/// Write the records, replacing any previous file contents
pub async fn save_wallets(path: &Path, records: &[GeneratedWalletRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| Error::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Read a wallet output file back
pub async fn load_wallet_records(path: &Path) -> Result<Vec<GeneratedWalletRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Generate `count` wallets off the async runtime and persist them
pub async fn generate_and_save(count: usize, derivation: &Derivation, path: &Path) -> Result<Vec<GeneratedWalletRecord>> {
    let derivation = derivation.clone();
    let records = tokio::task::spawn_blocking(move || generate_wallets(count, &derivation))
        .await
        .map_err(|e| Error::KeyDerivation(format!("Wallet generation task failed: {}", e)))??;

    save_wallets(path, &records).await?;
    Ok(records)
}
