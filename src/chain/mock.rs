//! In-memory chain gateway for tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChainGateway, FeeConfig};
use crate::error::{Error, Result};
use crate::wallet::transfer::TransferRequest;

/// A transfer as seen by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransfer {
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub denom: String,
    pub confirmed: bool,
}

#[derive(Default)]
struct State {
    balances: HashMap<String, u128>,
    failing_senders: HashSet<String>,
    unreachable: HashSet<String>,
    balance_queries: Vec<String>,
    transfers: Vec<SentTransfer>,
    next_hash: u64,
}

/// Records every call and keeps balances in sync with confirmed sends
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<State>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &str, amount: u128) {
        self.state.lock().unwrap().balances.insert(address.to_string(), amount);
    }

    pub fn balance(&self, address: &str) -> u128 {
        self.state.lock().unwrap().balances.get(address).copied().unwrap_or(0)
    }

    /// Every broadcast from `address` is rejected by the chain
    pub fn fail_transfers_from(&self, address: &str) {
        self.state.lock().unwrap().failing_senders.insert(address.to_string());
    }

    /// Balance queries for `address` fail with a network error
    pub fn make_unreachable(&self, address: &str) {
        self.state.lock().unwrap().unreachable.insert(address.to_string());
    }

    pub fn balance_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().balance_queries.clone()
    }

    pub fn transfers(&self) -> Vec<SentTransfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn transfers_from(&self, address: &str) -> Vec<SentTransfer> {
        self.transfers().into_iter().filter(|t| t.from == address).collect()
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn query_balance(&self, address: &str, _denom: &str) -> Result<u128> {
        let mut state = self.state.lock().unwrap();
        state.balance_queries.push(address.to_string());

        if state.unreachable.contains(address) {
            return Err(Error::Network(format!("connection refused for {}", address)));
        }

        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn broadcast_transfer(&self, request: &TransferRequest<'_>, fee: &FeeConfig) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let from = request.from().address();
        let rejected = state.failing_senders.contains(&from);

        state.transfers.push(SentTransfer {
            from: from.clone(),
            to: request.to().to_string(),
            amount: request.amount(),
            denom: request.denom().to_string(),
            confirmed: !rejected,
        });

        if rejected {
            return Err(Error::TransferRejected {
                code: 5,
                log: "transfer rejected: insufficient funds".to_string(),
            });
        }

        let balance = state.balances.entry(from).or_insert(0);
        *balance = balance.saturating_sub(request.amount() + fee.amount);

        state.next_hash += 1;
        Ok(format!("{:064X}", state.next_hash))
    }
}
