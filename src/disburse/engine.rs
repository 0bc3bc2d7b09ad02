//! The disbursement loop
//!
//! One cycle walks every account in a fixed order: poll the balance, report
//! it, apply the strategy, execute the resulting transfers. After the last
//! account the loop sleeps for the configured interval and starts over.
//! Nothing that goes wrong inside a cycle stops the loop; only the
//! cancellation token (or a cycle limit) does.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::strategy::{decide_single_send, decide_sweep, Decision, Strategy};
use crate::chain::{ChainGateway, FeeConfig};
use crate::config::Config;
use crate::error::Result;
use crate::wallet::account::Account;
use crate::wallet::generator::generate_and_save;
use crate::wallet::keys::{generate_ephemeral_address, Derivation};
use crate::wallet::recipients::RecipientList;
use crate::wallet::transfer::{TransferExecutor, TransferResult};

/// Counters for one pass over all accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub balance_queries: usize,
    pub transfers_attempted: usize,
    pub transfers_confirmed: usize,
    pub insufficient_funds: usize,
    pub wallets_generated: usize,
}

impl CycleReport {
    fn record(&mut self, result: &TransferResult) {
        self.transfers_attempted += 1;
        if result.is_success() {
            self.transfers_confirmed += 1;
        }
    }
}

/// Scheduler that applies one strategy to every account, forever
pub struct DisbursementLoop {
    config: Arc<Config>,
    gateway: Arc<dyn ChainGateway>,
    executor: TransferExecutor,
    accounts: Vec<Arc<Account>>,
    strategy: Strategy,
    ephemeral: Derivation,
    cancel: CancellationToken,
    max_cycles: Option<u64>,
}

impl DisbursementLoop {
    /// Create a loop for a fixed account set and strategy
    pub fn new(
        config: Arc<Config>,
        gateway: Arc<dyn ChainGateway>,
        accounts: Vec<Arc<Account>>,
        strategy: Strategy,
    ) -> Self {
        let executor = TransferExecutor::new(
            gateway.clone(),
            FeeConfig::from_chain(&config.chain),
            config.chain.display_symbol.clone(),
            config.log_prefix(),
        );

        Self {
            ephemeral: Derivation::ephemeral(&config.chain),
            config,
            gateway,
            executor,
            accounts,
            strategy,
            cancel: CancellationToken::new(),
            max_cycles: None,
        }
    }

    /// Stop after `cycles` completed cycles instead of running forever
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the loop at the next cycle boundary or sleep
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled (or until the cycle limit). Returns the number of
    /// completed cycles.
    pub async fn run(&self) -> u64 {
        let prefix = self.config.log_prefix();
        info!(
            "{} Starting disbursement loop: {} accounts, strategy {}",
            prefix,
            self.accounts.len(),
            self.strategy
        );

        let interval = self.config.interval();
        let mut completed = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let report = self.run_cycle().await;
            completed += 1;
            debug!(cycle = completed, ?report, "Cycle complete");

            if self.max_cycles.is_some_and(|max| completed >= max) {
                break;
            }

            info!("{} Sleeping for {} seconds...", prefix, interval.as_secs());
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("{} Disbursement loop stopped after {} cycles", prefix, completed);
        completed
    }

    /// One pass over every account
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        match &self.strategy {
            Strategy::GenerateWalletsOnly { count, output } => {
                report.wallets_generated = self.generate_wallets(*count, output).await;
            }
            Strategy::FileList(source) => {
                // Read once per cycle so edits to the file apply to the next pass
                let recipients = source.load().await;
                for account in &self.accounts {
                    let balance = self.poll_balance(account, &mut report).await;
                    match &recipients {
                        Ok(list) => self.send_to_list(account, balance, list, &mut report).await,
                        Err(e) => error!(
                            "{} Skipping {} this cycle: {}",
                            self.config.log_prefix(),
                            account.address(),
                            e
                        ),
                    }
                }
            }
            Strategy::AutoGenerate => {
                for account in &self.accounts {
                    let balance = self.poll_balance(account, &mut report).await;
                    self.send_to_generated(account, balance, &mut report).await;
                }
            }
            Strategy::SweepAll => {
                for account in &self.accounts {
                    let balance = self.poll_balance(account, &mut report).await;
                    self.sweep(account, balance, &mut report).await;
                }
            }
        }

        report
    }

    /// Query and report an account's balance. A failed query counts as zero.
    async fn poll_balance(&self, account: &Account, report: &mut CycleReport) -> u128 {
        report.balance_queries += 1;
        let prefix = self.config.log_prefix();

        match self
            .gateway
            .query_balance(&account.address(), &self.config.chain.base_denom)
            .await
        {
            Ok(balance) => {
                info!(
                    address = %account.address(),
                    balance = %balance,
                    "{} Current balance: {} {}",
                    prefix,
                    self.config.to_display_amount(balance),
                    self.config.chain.display_symbol
                );
                balance
            }
            Err(e) => {
                error!(
                    "{} Failed to query balance for {}: {}",
                    prefix,
                    account.address(),
                    e
                );
                0
            }
        }
    }

    async fn send_to_generated(&self, account: &Account, balance: u128, report: &mut CycleReport) {
        let fee = self.config.fee_threshold();
        match decide_single_send(balance, fee, self.config.transfer_amount()) {
            Decision::Send { amount } => {
                let Some(recipient) = self.ephemeral_recipient() else {
                    return;
                };
                let result = self.executor.execute(account, &recipient, amount).await;
                report.record(&result);
            }
            Decision::InsufficientFunds => {
                report.insufficient_funds += 1;
                warn!("{} Insufficient funds to send transaction.", self.config.log_prefix());
            }
        }
    }

    /// Walk the recipient list in order, re-checking the balance after every
    /// send and stopping at the first recipient that cannot be covered
    async fn send_to_list(
        &self,
        account: &Account,
        mut balance: u128,
        recipients: &RecipientList,
        report: &mut CycleReport,
    ) {
        let fee = self.config.fee_threshold();
        let amount_per_recipient = self.config.transfer_amount();

        if recipients.is_empty() {
            warn!("{} Recipient list is empty, nothing to send.", self.config.log_prefix());
            return;
        }

        let total = recipients.len();
        for (index, recipient) in recipients.addresses().iter().enumerate() {
            match decide_single_send(balance, fee, amount_per_recipient) {
                Decision::Send { amount } => {
                    let result = self.executor.execute(account, recipient, amount).await;
                    report.record(&result);

                    if index + 1 < total {
                        balance = self.poll_balance(account, report).await;
                    }
                }
                Decision::InsufficientFunds => {
                    report.insufficient_funds += 1;
                    warn!(
                        "{} Insufficient funds to send transaction. Skipping {} remaining recipients.",
                        self.config.log_prefix(),
                        total - index
                    );
                    break;
                }
            }
        }
    }

    async fn sweep(&self, account: &Account, balance: u128, report: &mut CycleReport) {
        match decide_sweep(balance, self.config.fee_threshold()) {
            Decision::Send { amount } => {
                let Some(recipient) = self.ephemeral_recipient() else {
                    return;
                };
                info!(
                    "{} Send all {} from {} to {}",
                    self.config.log_prefix(),
                    self.config.chain.display_symbol,
                    account.address(),
                    recipient
                );
                let result = self.executor.execute(account, &recipient, amount).await;
                report.record(&result);
            }
            Decision::InsufficientFunds => {
                report.insufficient_funds += 1;
                warn!(
                    "{} Insufficient funds: {} {} available.",
                    self.config.log_prefix(),
                    self.config.to_display_amount(balance),
                    self.config.chain.display_symbol
                );
            }
        }
    }

    /// Fresh one-time recipient; generation failures skip the send
    fn ephemeral_recipient(&self) -> Option<String> {
        match generate_ephemeral_address(&self.ephemeral) {
            Ok(address) => Some(address),
            Err(e) => {
                error!("{} Failed to generate recipient address: {}", self.config.log_prefix(), e);
                None
            }
        }
    }

    async fn generate_wallets(&self, count: usize, output: &Path) -> usize {
        let prefix = self.config.log_prefix();
        let result: Result<usize> = generate_and_save(count, &self.ephemeral, output)
            .await
            .map(|records| records.len());

        match result {
            Ok(generated) => {
                info!(
                    "{} Generated {} wallets and saved to {}",
                    prefix,
                    generated,
                    output.display()
                );
                generated
            }
            Err(e) => {
                error!(
                    "{} Failed to generate wallets and save to {}: {}",
                    prefix,
                    output.display(),
                    e
                );
                0
            }
        }
    }
}
