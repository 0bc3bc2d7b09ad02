//! Tendermint RPC gateway
//!
//! Balances and account sequence numbers are read through ABCI queries;
//! transfers are signed locally and submitted with `broadcast_tx_commit`,
//! which only returns once the transaction is in a block.

use async_trait::async_trait;
use cosmrs::bank::MsgSend;
use cosmrs::proto::cosmos::auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse};
use cosmrs::proto::cosmos::bank::v1beta1::{QueryBalanceRequest, QueryBalanceResponse};
use cosmrs::rpc::endpoint::broadcast::tx_commit;
use cosmrs::rpc::{Client, HttpClient};
use cosmrs::tendermint::chain::Id as ChainId;
use cosmrs::tx::{self, Fee, Msg, SignDoc, SignerInfo};
use cosmrs::{AccountId, Coin, Denom};
use prost::Message;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{ChainGateway, FeeConfig};
use crate::config::ChainConfig;
use crate::error::{Error, Result};
use crate::wallet::transfer::TransferRequest;

const BALANCE_QUERY_PATH: &str = "/cosmos.bank.v1beta1.Query/Balance";
const ACCOUNT_QUERY_PATH: &str = "/cosmos.auth.v1beta1.Query/Account";
const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// Chain gateway backed by a Tendermint RPC endpoint
pub struct RpcGateway {
    client: HttpClient,
    configured_chain_id: Option<String>,
    chain_id: OnceCell<ChainId>,
    memo: String,
}

impl RpcGateway {
    /// Create a gateway for the configured endpoint
    pub fn new(chain: &ChainConfig) -> Result<Self> {
        let client = HttpClient::new(chain.rpc_endpoint.as_str())
            .map_err(|e| Error::Config(format!("Invalid RPC endpoint {}: {}", chain.rpc_endpoint, e)))?;

        let configured_chain_id = if chain.chain_id.trim().is_empty() {
            None
        } else {
            Some(chain.chain_id.trim().to_string())
        };

        Ok(Self {
            client,
            configured_chain_id,
            chain_id: OnceCell::new(),
            memo: chain.memo.clone(),
        })
    }

    /// Chain id used for signing, fetched from the node once if not configured
    pub async fn chain_id(&self) -> Result<ChainId> {
        self.chain_id
            .get_or_try_init(|| async {
                match &self.configured_chain_id {
                    Some(id) => id
                        .parse::<ChainId>()
                        .map_err(|e| Error::Config(format!("Invalid chain_id {}: {}", id, e))),
                    None => {
                        let status = self.client.status().await?;
                        debug!("Fetched chain id from node: {}", status.node_info.network);
                        Ok::<ChainId, Error>(status.node_info.network)
                    }
                }
            })
            .await
            .cloned()
    }

    /// Run an ABCI query and decode the protobuf response
    async fn abci_query<Req, Resp>(&self, path: &str, request: Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let response = self
            .client
            .abci_query(Some(path.to_string()), request.encode_to_vec(), None, false)
            .await?;

        if response.code.is_err() {
            return Err(Error::Network(format!(
                "Query {} failed (code {}): {}",
                path,
                response.code.value(),
                response.log
            )));
        }

        Ok(Resp::decode(response.value.as_slice())?)
    }

    /// Account number and next sequence for a signer
    async fn account_info(&self, address: &str) -> Result<(u64, u64)> {
        let response: QueryAccountResponse = self
            .abci_query(
                ACCOUNT_QUERY_PATH,
                QueryAccountRequest {
                    address: address.to_string(),
                },
            )
            .await?;

        let any = response
            .account
            .ok_or_else(|| Error::Network(format!("Account {} not found on chain", address)))?;

        if any.type_url != BASE_ACCOUNT_TYPE_URL {
            return Err(Error::Signing(format!(
                "Unsupported account type {} for {}",
                any.type_url, address
            )));
        }

        let account = BaseAccount::decode(any.value.as_slice())?;
        Ok((account.account_number, account.sequence))
    }

    fn coin(amount: u128, denom: &str) -> Result<Coin> {
        let denom: Denom = denom
            .parse()
            .map_err(|e| Error::Config(format!("Invalid denom {}: {}", denom, e)))?;
        Ok(Coin { denom, amount })
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn query_balance(&self, address: &str, denom: &str) -> Result<u128> {
        let response: QueryBalanceResponse = self
            .abci_query(
                BALANCE_QUERY_PATH,
                QueryBalanceRequest {
                    address: address.to_string(),
                    denom: denom.to_string(),
                },
            )
            .await?;

        match response.balance {
            Some(coin) => coin
                .amount
                .parse::<u128>()
                .map_err(|e| Error::Network(format!("Malformed balance {}: {}", coin.amount, e))),
            None => Ok(0),
        }
    }

    async fn broadcast_transfer(&self, request: &TransferRequest<'_>, fee: &FeeConfig) -> Result<String> {
        let to_address: AccountId = request
            .to()
            .parse()
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", request.to(), e)))?;

        let from = request.from();
        let msg = MsgSend {
            from_address: from.account_id().clone(),
            to_address,
            amount: vec![Self::coin(request.amount(), request.denom())?],
        }
        .to_any()
        .map_err(|e| Error::Signing(e.to_string()))?;

        let (account_number, sequence) = self.account_info(&from.address()).await?;
        let chain_id = self.chain_id().await?;

        let body = tx::Body::new(vec![msg], self.memo.clone(), 0u32);
        let auth_info = SignerInfo::single_direct(Some(from.signing_key().public_key()), sequence)
            .auth_info(Fee::from_amount_and_gas(
                Self::coin(fee.amount, &fee.denom)?,
                fee.gas_limit,
            ));

        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account_number)
            .map_err(|e| Error::Signing(e.to_string()))?;
        let tx_bytes = sign_doc
            .sign(from.signing_key())
            .and_then(|raw| raw.to_bytes())
            .map_err(|e| Error::Signing(e.to_string()))?;

        debug!(
            "Broadcasting {} bytes (account {}, sequence {})",
            tx_bytes.len(),
            account_number,
            sequence
        );

        let response = self.client.broadcast_tx_commit(tx_bytes).await?;
        check_commit(&response)
    }
}

/// Transaction hash of a committed transfer, or the first non-zero code.
///
/// Accepted into the mempool is not enough: both CheckTx and block execution
/// must succeed.
fn check_commit(response: &tx_commit::Response) -> Result<String> {
    if response.check_tx.code.is_err() {
        return Err(Error::TransferRejected {
            code: response.check_tx.code.value(),
            log: response.check_tx.log.clone(),
        });
    }
    if response.tx_result.code.is_err() {
        return Err(Error::TransferRejected {
            code: response.tx_result.code.value(),
            log: response.tx_result.log.clone(),
        });
    }

    Ok(response.hash.to_string())
}
