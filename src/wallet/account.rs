//! Source accounts derived from seed phrases in the environment
//!
//! Every environment variable whose name starts with the configured marker
//! (default `MNEMONIC`) holds one seed phrase. All phrases must derive, or
//! startup fails.

use std::fmt;
use std::sync::Arc;

use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::AccountId;
use futures::future::try_join_all;
use tracing::info;

use super::keys::Derivation;
use crate::error::{Error, Result};

/// A funded source account: signing key plus its derived address
pub struct Account {
    name: String,
    address: AccountId,
    signing_key: SigningKey,
}

impl Account {
    /// Derive an account from a seed phrase
    pub fn from_mnemonic(name: impl Into<String>, phrase: &str, derivation: &Derivation) -> Result<Self> {
        let name = name.into();
        let (signing_key, address) = derivation
            .derive(phrase)
            .map_err(|e| Error::KeyDerivation(format!("{}: {}", name, e)))?;

        Ok(Self {
            name,
            address,
            signing_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> String {
        self.address.to_string()
    }

    pub fn account_id(&self) -> &AccountId {
        &self.address
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

// Key material never reaches logs
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

/// A seed phrase discovered in the environment, tagged with its variable name
#[derive(Clone)]
pub struct SeedPhrase {
    pub var_name: String,
    phrase: String,
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedPhrase")
            .field("var_name", &self.var_name)
            .field("phrase", &"***")
            .finish()
    }
}

/// Collect seed phrases from environment-style `(name, value)` pairs
///
/// Discovery order is preserved; empty values are skipped.
pub fn collect_mnemonics<I>(vars: I, marker_prefix: &str) -> Vec<SeedPhrase>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(key, _)| key.starts_with(marker_prefix))
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(var_name, phrase)| SeedPhrase { var_name, phrase })
        .collect()
}

/// Collect seed phrases from the process environment
pub fn mnemonics_from_env(marker_prefix: &str) -> Vec<SeedPhrase> {
    collect_mnemonics(std::env::vars(), marker_prefix)
}

/// Derive one account per seed phrase
///
/// Derivation runs concurrently on the blocking pool; the result keeps the
/// input order. Any failure aborts the whole set.
pub async fn load_accounts(seeds: Vec<SeedPhrase>, derivation: &Derivation) -> Result<Vec<Arc<Account>>> {
    if seeds.is_empty() {
        return Err(Error::Config(
            "No seed phrases found in the environment; at least one account is required".to_string(),
        ));
    }

    let tasks = seeds.into_iter().map(|seed| {
        let derivation = derivation.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                Account::from_mnemonic(seed.var_name, &seed.phrase, &derivation)
            })
            .await
            .map_err(|e| Error::KeyDerivation(format!("Derivation task failed: {}", e)))?
        }
    });

    let accounts: Vec<Arc<Account>> = try_join_all(tasks)
        .await?
        .into_iter()
        .map(Arc::new)
        .collect();

    for account in &accounts {
        info!("Loaded account {}: {}", account.name(), account.address());
    }

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::keys::generate_mnemonic;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_collect_mnemonics_filters_and_keeps_order() {
        let env = vars(&[
            ("MNEMONIC_B", "phrase b"),
            ("PATH", "/usr/bin"),
            ("MNEMONIC", "phrase root"),
            ("MNEMONIC_EMPTY", "   "),
            ("MY_MNEMONIC", "not matched"),
            ("MNEMONIC_A", "phrase a"),
        ]);

        let seeds = collect_mnemonics(env, "MNEMONIC");
        let names: Vec<&str> = seeds.iter().map(|s| s.var_name.as_str()).collect();
        assert_eq!(names, vec!["MNEMONIC_B", "MNEMONIC", "MNEMONIC_A"]);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let seeds = collect_mnemonics(vars(&[("MNEMONIC", "secret words here")]), "MNEMONIC");
        let rendered = format!("{:?}", seeds[0]);
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_load_accounts_preserves_order() {
        let derivation = Derivation::new(118, "cosmos");
        let phrases: Vec<String> = (0..3).map(|_| generate_mnemonic().unwrap()).collect();
        let env = vars(&[
            ("MNEMONIC_1", phrases[0].as_str()),
            ("MNEMONIC_2", phrases[1].as_str()),
            ("MNEMONIC_3", phrases[2].as_str()),
        ]);

        let accounts = load_accounts(collect_mnemonics(env, "MNEMONIC"), &derivation)
            .await
            .unwrap();

        assert_eq!(accounts.len(), 3);
        for (account, phrase) in accounts.iter().zip(&phrases) {
            assert_eq!(account.address(), derivation.address(phrase).unwrap());
        }
        assert_eq!(accounts[0].name(), "MNEMONIC_1");
        assert!(!format!("{:?}", accounts[0]).contains(&phrases[0]));
    }

    #[tokio::test]
    async fn test_load_accounts_fails_on_any_bad_phrase() {
        let derivation = Derivation::new(118, "cosmos");
        let good = generate_mnemonic().unwrap();
        let env = vars(&[("MNEMONIC_1", good.as_str()), ("MNEMONIC_2", "definitely not valid")]);

        let err = load_accounts(collect_mnemonics(env, "MNEMONIC"), &derivation)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyDerivation(_)));
        assert!(err.to_string().contains("MNEMONIC_2"));
    }

    #[tokio::test]
    async fn test_load_accounts_requires_at_least_one() {
        let derivation = Derivation::new(118, "cosmos");
        let err = load_accounts(Vec::new(), &derivation).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
