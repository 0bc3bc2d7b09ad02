//! Wallet management module
//!
//! Provides the source accounts and everything that moves or creates keys:
//! - Seed phrase discovery and account derivation
//! - Ephemeral recipient and wallet generation
//! - Recipient list loading
//! - Transfer execution
//!
//! # Architecture
//!
//! ```text
//! env (MNEMONIC*) → load_accounts → Account ─┐
//!                                            ├→ TransferExecutor → ChainGateway
//! recipients.txt → RecipientList ────────────┘
//! ```

pub mod account;
pub mod generator;
pub mod keys;
pub mod recipients;
pub mod transfer;

pub use account::{collect_mnemonics, load_accounts, mnemonics_from_env, Account, SeedPhrase};
pub use generator::{generate_and_save, load_wallet_records, GeneratedWalletRecord};
pub use keys::{generate_ephemeral_address, generate_mnemonic, Derivation};
pub use recipients::{RecipientList, RecipientSource};
pub use transfer::{TransferExecutor, TransferRequest, TransferResult};
