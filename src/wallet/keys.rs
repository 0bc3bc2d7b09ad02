//! Mnemonic generation and HD key derivation
//!
//! Keys follow the Cosmos convention: BIP-39 seed, BIP-32 path
//! `m/44'/{coin_type}'/0'/0/0`, secp256k1, bech32 address with a
//! configurable prefix.

use cosmrs::bip32::{DerivationPath, XPrv};
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::AccountId;

use crate::config::ChainConfig;
use crate::error::{Error, Result};

/// Entropy for a 12-word phrase
const MNEMONIC_ENTROPY_BYTES: usize = 16;

/// How to turn a seed phrase into a key and an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivation {
    pub coin_type: u32,
    pub prefix: String,
}

impl Derivation {
    pub fn new(coin_type: u32, prefix: impl Into<String>) -> Self {
        Self {
            coin_type,
            prefix: prefix.into(),
        }
    }

    /// Derivation for the configured source accounts
    pub fn accounts(chain: &ChainConfig) -> Self {
        Self::new(chain.coin_type, chain.address_prefix.clone())
    }

    /// Derivation for generated one-time recipients and wallet files
    pub fn ephemeral(chain: &ChainConfig) -> Self {
        Self::new(chain.coin_type, chain.ephemeral_address_prefix.clone())
    }

    fn path(&self) -> Result<DerivationPath> {
        format!("m/44'/{}'/0'/0/0", self.coin_type)
            .parse()
            .map_err(|e| Error::KeyDerivation(format!("Invalid derivation path: {}", e)))
    }

    /// Derive the signing key and address for a seed phrase
    pub fn derive(&self, phrase: &str) -> Result<(SigningKey, AccountId)> {
        let mnemonic = bip39::Mnemonic::parse_normalized(phrase.trim())
            .map_err(|e| Error::KeyDerivation(format!("Invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed("");

        let xprv = XPrv::derive_from_path(seed, &self.path()?)
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&xprv.private_key().to_bytes())
            .map_err(|e| Error::KeyDerivation(e.to_string()))?;

        let account_id = signing_key
            .public_key()
            .account_id(&self.prefix)
            .map_err(|e| Error::KeyDerivation(format!("Invalid address prefix: {}", e)))?;

        Ok((signing_key, account_id))
    }

    /// Derive only the address for a seed phrase
    pub fn address(&self, phrase: &str) -> Result<String> {
        let (_, account_id) = self.derive(phrase)?;
        Ok(account_id.to_string())
    }
}

/// Generate a fresh random 12-word seed phrase
pub fn generate_mnemonic() -> Result<String> {
    let entropy: [u8; MNEMONIC_ENTROPY_BYTES] = rand::random();
    let mnemonic = bip39::Mnemonic::from_entropy(&entropy)
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Generate a brand-new one-time address. The seed phrase is discarded.
pub fn generate_ephemeral_address(derivation: &Derivation) -> Result<String> {
    let phrase = generate_mnemonic()?;
    derivation.address(&phrase)
}

/// Syntactic check for a bech32 account address with the expected prefix
pub fn is_valid_address(address: &str, prefix: &str) -> bool {
    address
        .parse::<AccountId>()
        .map(|id| id.prefix() == prefix)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known all-"abandon" test vector; never fund it.
    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic_is_twelve_words() {
        let phrase = generate_mnemonic().unwrap();
        assert_eq!(phrase.split_whitespace().count(), 12);
        assert!(bip39::Mnemonic::parse_normalized(&phrase).is_ok());
    }

    #[test]
    fn test_generated_mnemonics_differ() {
        let a = generate_mnemonic().unwrap();
        let b = generate_mnemonic().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let derivation = Derivation::new(118, "cosmos");
        let first = derivation.address(TEST_PHRASE).unwrap();
        let second = derivation.address(TEST_PHRASE).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("cosmos1"));
        assert!(is_valid_address(&first, "cosmos"));
    }

    #[test]
    fn test_prefix_changes_address_only_in_hrp() {
        let cosmos = Derivation::new(118, "cosmos").address(TEST_PHRASE).unwrap();
        let osmo = Derivation::new(118, "osmo").address(TEST_PHRASE).unwrap();
        assert!(osmo.starts_with("osmo1"));
        assert_ne!(cosmos, osmo);
        assert!(!is_valid_address(&osmo, "cosmos"));
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let derivation = Derivation::new(118, "cosmos");
        match derivation.derive("not a real seed phrase") {
            Err(Error::KeyDerivation(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("invalid phrase was accepted"),
        }
    }

    #[test]
    fn test_ephemeral_addresses_are_fresh() {
        let derivation = Derivation::new(118, "cosmos");
        let a = generate_ephemeral_address(&derivation).unwrap();
        let b = generate_ephemeral_address(&derivation).unwrap();
        assert_ne!(a, b);
        assert!(is_valid_address(&a, "cosmos"));
    }

    #[test]
    fn test_is_valid_address_rejects_garbage() {
        assert!(!is_valid_address("", "cosmos"));
        assert!(!is_valid_address("cosmos1notbech32", "cosmos"));
    }
}
