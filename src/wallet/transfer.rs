//! Transfer execution
//!
//! Builds a transfer request, hands it to the chain gateway and classifies
//! the outcome. Failures are logged and returned as data; they never stop
//! the disbursement loop.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::account::Account;
use crate::chain::{ChainGateway, FeeConfig};
use crate::error::{Error, Result};

/// A single transfer of `amount` base units from one account to an address
#[derive(Debug)]
pub struct TransferRequest<'a> {
    from: &'a Account,
    to: String,
    amount: u128,
    denom: String,
}

impl<'a> TransferRequest<'a> {
    /// Build a request; zero amounts are rejected
    pub fn new(from: &'a Account, to: impl Into<String>, amount: u128, denom: impl Into<String>) -> Result<Self> {
        if amount == 0 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self {
            from,
            to: to.into(),
            amount,
            denom: denom.into(),
        })
    }

    pub fn from(&self) -> &'a Account {
        self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    pub fn denom(&self) -> &str {
        &self.denom
    }
}

/// Outcome of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// Included in a block and executed successfully
    Confirmed { tx_hash: String },
    /// Anything else: bad address, signing, network, chain rejection
    Failed { detail: String },
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Confirmed { .. })
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            TransferResult::Confirmed { tx_hash } => Some(tx_hash),
            TransferResult::Failed { .. } => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match self {
            TransferResult::Confirmed { .. } => None,
            TransferResult::Failed { detail } => Some(detail),
        }
    }
}

/// Transfer executor for base-denomination sends
pub struct TransferExecutor {
    gateway: Arc<dyn ChainGateway>,
    fee: FeeConfig,
    denom: String,
    symbol: String,
    log_prefix: String,
}

impl TransferExecutor {
    /// Create a new transfer executor
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        fee: FeeConfig,
        symbol: impl Into<String>,
        log_prefix: impl Into<String>,
    ) -> Self {
        Self {
            denom: fee.denom.clone(),
            gateway,
            fee,
            symbol: symbol.into(),
            log_prefix: log_prefix.into(),
        }
    }

    /// Send `amount` base units from `account` to `recipient` and wait for
    /// the chain to confirm it
    pub async fn execute(&self, account: &Account, recipient: &str, amount: u128) -> TransferResult {
        let request = match TransferRequest::new(account, recipient, amount, self.denom.as_str()) {
            Ok(request) => request,
            Err(e) => {
                error!("{} Refusing to build transfer: {}", self.log_prefix, e);
                return TransferResult::Failed {
                    detail: e.to_string(),
                };
            }
        };

        info!(
            from = %account.address(),
            recipient,
            amount = %amount,
            "{} Send {} from {} to {}",
            self.log_prefix,
            self.symbol,
            account.address(),
            recipient
        );

        match self.gateway.broadcast_transfer(&request, &self.fee).await {
            Ok(tx_hash) => {
                info!(tx_hash = %tx_hash, "{} Successfully broadcasted: {}", self.log_prefix, tx_hash);
                TransferResult::Confirmed { tx_hash }
            }
            Err(e) => {
                error!("{} Failed to send transaction: {}", self.log_prefix, e);
                debug!("Transfer failure retryable: {}", e.is_retryable());
                TransferResult::Failed {
                    detail: e.to_string(),
                }
            }
        }
    }
}
