//! Chain access
//!
//! The disbursement loop only ever needs two things from the network: the
//! spendable balance of an address and a way to broadcast a transfer and
//! wait for it to land in a block. `ChainGateway` is that seam.

pub mod rpc;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

use crate::config::ChainConfig;
use crate::error::Result;
use crate::wallet::transfer::TransferRequest;

pub use rpc::RpcGateway;

/// Fee attached to every broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeConfig {
    /// Fee amount in base units
    pub amount: u128,
    pub denom: String,
    pub gas_limit: u64,
}

impl FeeConfig {
    pub fn from_chain(chain: &ChainConfig) -> Self {
        Self {
            amount: u128::from(chain.min_tx_fee),
            denom: chain.base_denom.clone(),
            gas_limit: chain.gas_limit,
        }
    }
}

/// Balance and broadcast operations the disbursement loop depends on
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Current spendable amount of `denom` held by `address`
    async fn query_balance(&self, address: &str, denom: &str) -> Result<u128>;

    /// Sign and broadcast a transfer, returning the transaction hash once the
    /// chain has executed it successfully
    async fn broadcast_transfer(&self, request: &TransferRequest<'_>, fee: &FeeConfig) -> Result<String>;
}
