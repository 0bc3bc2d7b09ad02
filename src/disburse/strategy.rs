//! Disbursement strategies and their balance gates
//!
//! The gates are asymmetric: single-unit sends (auto-generate,
//! file list) go ahead when `balance >= fee`, while a sweep needs
//! `balance > fee` so that the swept amount is at least one base unit.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::Config;
use crate::wallet::recipients::RecipientSource;

/// The four menu choices offered at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Send one unit to a freshly generated address
    Auto,
    /// Send one unit to every address in the recipients file
    File,
    /// Send the whole balance minus the fee to a generated address
    Sweep,
    /// Only generate wallets and write them to the wallet file
    Generate,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Auto,
        StrategyKind::File,
        StrategyKind::Sweep,
        StrategyKind::Generate,
    ];

    /// Menu label shown by the interactive prompt
    pub fn menu_label(&self, config: &Config) -> String {
        match self {
            StrategyKind::Auto => "Transfer to generated addresses".to_string(),
            StrategyKind::File => {
                format!("Transfer to {}", config.disbursement.recipients_file)
            }
            StrategyKind::Sweep => "Transfer all balance to a generated wallet".to_string(),
            StrategyKind::Generate => {
                format!("Generate wallets and save to {}", config.disbursement.wallets_file)
            }
        }
    }

    /// Parse a numbered menu answer ("1".."4")
    pub fn from_menu_number(answer: &str) -> Option<Self> {
        match answer.trim() {
            "1" => Some(StrategyKind::Auto),
            "2" => Some(StrategyKind::File),
            "3" => Some(StrategyKind::Sweep),
            "4" => Some(StrategyKind::Generate),
            _ => None,
        }
    }
}

/// The strategy fixed for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    AutoGenerate,
    FileList(RecipientSource),
    SweepAll,
    GenerateWalletsOnly { count: usize, output: PathBuf },
}

impl Strategy {
    /// Build the strategy for a menu choice. `wallet_count` is only used by
    /// `StrategyKind::Generate`.
    pub fn from_kind(kind: StrategyKind, config: &Config, wallet_count: usize) -> Self {
        match kind {
            StrategyKind::Auto => Strategy::AutoGenerate,
            StrategyKind::File => {
                Strategy::FileList(RecipientSource::new(&config.disbursement.recipients_file))
            }
            StrategyKind::Sweep => Strategy::SweepAll,
            StrategyKind::Generate => Strategy::GenerateWalletsOnly {
                count: wallet_count,
                output: PathBuf::from(&config.disbursement.wallets_file),
            },
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::AutoGenerate => write!(f, "auto-generate"),
            Strategy::FileList(source) => write!(f, "file-list ({})", source.path.display()),
            Strategy::SweepAll => write!(f, "sweep-all"),
            Strategy::GenerateWalletsOnly { count, output } => {
                write!(f, "generate-wallets ({} -> {})", count, output.display())
            }
        }
    }
}

/// What to do with one account's observed balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Send { amount: u128 },
    InsufficientFunds,
}

/// Gate for single-unit sends (auto-generate and each file-list step)
pub fn decide_single_send(balance: u128, fee_threshold: u128, transfer_amount: u128) -> Decision {
    if balance >= fee_threshold && transfer_amount > 0 {
        Decision::Send {
            amount: transfer_amount,
        }
    } else {
        Decision::InsufficientFunds
    }
}

/// Gate for sweeping: strictly more than the fee, send the remainder
pub fn decide_sweep(balance: u128, fee_threshold: u128) -> Decision {
    if balance > fee_threshold {
        Decision::Send {
            amount: balance - fee_threshold,
        }
    } else {
        Decision::InsufficientFunds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: u128 = 5_000;

    #[test]
    fn test_single_send_gate_is_inclusive() {
        assert_eq!(decide_single_send(FEE - 1, FEE, 1), Decision::InsufficientFunds);
        assert_eq!(decide_single_send(FEE, FEE, 1), Decision::Send { amount: 1 });
        assert_eq!(decide_single_send(FEE + 1, FEE, 1), Decision::Send { amount: 1 });
        assert_eq!(decide_single_send(0, FEE, 1), Decision::InsufficientFunds);
    }

    #[test]
    fn test_single_send_never_zero() {
        assert_eq!(decide_single_send(1_000_000, FEE, 0), Decision::InsufficientFunds);
    }

    #[test]
    fn test_sweep_gate_is_strict() {
        assert_eq!(decide_sweep(FEE, FEE), Decision::InsufficientFunds);
        assert_eq!(decide_sweep(FEE - 1, FEE), Decision::InsufficientFunds);
        assert_eq!(decide_sweep(FEE + 1, FEE), Decision::Send { amount: 1 });
        assert_eq!(
            decide_sweep(1_000_000, FEE),
            Decision::Send { amount: 995_000 }
        );
    }

    #[test]
    fn test_sweep_amount_is_balance_minus_fee() {
        for balance in [5_001u128, 10_000, 123_456_789] {
            match decide_sweep(balance, FEE) {
                Decision::Send { amount } => assert_eq!(amount, balance - FEE),
                Decision::InsufficientFunds => panic!("expected a send for {}", balance),
            }
        }
    }

    #[test]
    fn test_menu_numbers() {
        assert_eq!(StrategyKind::from_menu_number("1"), Some(StrategyKind::Auto));
        assert_eq!(StrategyKind::from_menu_number(" 2\n"), Some(StrategyKind::File));
        assert_eq!(StrategyKind::from_menu_number("3"), Some(StrategyKind::Sweep));
        assert_eq!(StrategyKind::from_menu_number("4"), Some(StrategyKind::Generate));
        assert_eq!(StrategyKind::from_menu_number("5"), None);
    }

    #[test]
    fn test_from_kind_uses_configured_paths() {
        let config = Config::default();
        let file = Strategy::from_kind(StrategyKind::File, &config, 0);
        assert_eq!(
            file,
            Strategy::FileList(RecipientSource::new("recipients.txt"))
        );

        let generate = Strategy::from_kind(StrategyKind::Generate, &config, 3);
        assert_eq!(
            generate,
            Strategy::GenerateWalletsOnly {
                count: 3,
                output: PathBuf::from("wallet.json")
            }
        );
    }
}
