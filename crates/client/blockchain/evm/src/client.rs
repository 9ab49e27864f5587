//! JSON-RPC wallet client.
//!
//! Talks to an endpoint that exposes both node methods (`eth_call`,
//! `eth_getLogs`, ...) and wallet methods (`eth_requestAccounts`,
//! `eth_sendTransaction`, `wallet_switchEthereumChain`). Local development
//! nodes with unlocked accounts and wallet bridges both qualify.
//!
//! HTTP has no push channel, so account and chain notifications are produced
//! by [`EvmWallet::spawn_watcher`], which polls and emits on change.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use client_blockchain_core::{
    Address, B256, BlockchainConfig, Bytes, ChainDescriptor, ChainId, ChainReader, Log, LogFilter,
    ProviderError, TransactionReceipt, TransactionRequest, TxHash, U256, WalletEvent,
    WalletProvider,
};

use crate::config::EvmConfig;
use crate::core::{EvmError, Result};
use crate::rpc::HttpTransport;
use crate::utils::{parse_u64, parse_u256, quantity};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    transaction_hash: Option<B256>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    block_number: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

impl RpcLog {
    fn into_log(self) -> Result<Log> {
        Ok(Log {
            address: self.address,
            topics: self.topics,
            data: self.data,
            block_number: self.block_number.as_deref().map(parse_u64).transpose()?,
            transaction_hash: self.transaction_hash,
        })
    }
}

impl RpcReceipt {
    fn into_receipt(self) -> Result<TransactionReceipt> {
        // Receipts without a status field predate Byzantium; they only exist for mined successes.
        let status = match self.status.as_deref() {
            Some(s) => parse_u64(s)?,
            None => TransactionReceipt::STATUS_SUCCESS,
        };
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            block_number: parse_u64(&self.block_number)?,
            status,
            logs: self
                .logs
                .into_iter()
                .map(RpcLog::into_log)
                .collect::<Result<_>>()?,
        })
    }
}

/// EVM wallet backed by a JSON-RPC endpoint.
#[derive(Clone)]
pub struct EvmWallet {
    transport: Arc<HttpTransport>,
    events: broadcast::Sender<WalletEvent>,
    config: EvmConfig,
}

impl EvmWallet {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: EvmConfig) -> Result<Self> {
        config.validate().map_err(EvmError::InvalidConfig)?;

        let transport = HttpTransport::new(config.get_rpc_url(), config.request_timeout)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        tracing::info!(
            network = config.network_name(),
            rpc_url = config.get_rpc_url(),
            "EVM wallet client created"
        );

        Ok(Self {
            transport: Arc::new(transport),
            events,
            config,
        })
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    /// Poll authorized accounts and the selected chain, emitting
    /// [`WalletEvent`]s whenever either changes.
    pub fn spawn_watcher(&self) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        let period = self.config.account_poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last_accounts: Option<Vec<Address>> = None;
            let mut last_chain: Option<ChainId> = None;

            loop {
                ticker.tick().await;

                match transport.request::<Vec<Address>>("eth_accounts", json!([])).await {
                    Ok(accounts) => {
                        if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                            tracing::debug!(count = accounts.len(), "Accounts changed");
                            let _ = events.send(WalletEvent::AccountsChanged(accounts.clone()));
                        }
                        last_accounts = Some(accounts);
                    }
                    Err(e) => tracing::debug!("Account watcher: eth_accounts failed: {}", e),
                }

                match transport.request::<String>("eth_chainId", json!([])).await {
                    Ok(raw) => match parse_u64(&raw) {
                        Ok(chain_id) => {
                            if last_chain.is_some_and(|prev| prev != chain_id) {
                                tracing::debug!(chain_id, "Chain changed");
                                let _ = events.send(WalletEvent::ChainChanged(chain_id));
                            }
                            last_chain = Some(chain_id);
                        }
                        Err(e) => tracing::debug!("Account watcher: bad chain id: {}", e),
                    },
                    Err(e) => tracing::debug!("Account watcher: eth_chainId failed: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl ChainReader for EvmWallet {
    async fn chain_id(&self) -> std::result::Result<ChainId, ProviderError> {
        let raw: String = self.transport.request("eth_chainId", json!([])).await?;
        Ok(parse_u64(&raw)?)
    }

    async fn balance(&self, address: Address) -> std::result::Result<U256, ProviderError> {
        let raw: String = self
            .transport
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        Ok(parse_u256(&raw)?)
    }

    async fn call(&self, to: Address, data: Bytes) -> std::result::Result<Bytes, ProviderError> {
        Ok(self
            .transport
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?)
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> std::result::Result<Option<TransactionReceipt>, ProviderError> {
        let receipt: Option<RpcReceipt> = self
            .transport
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        Ok(receipt.map(RpcReceipt::into_receipt).transpose()?)
    }

    async fn logs(&self, filter: &LogFilter) -> std::result::Result<Vec<Log>, ProviderError> {
        let params = json!([{
            "address": filter.address,
            "topics": filter.topics,
            "fromBlock": quantity(filter.from_block),
            "toBlock": quantity(filter.to_block),
        }]);
        let logs: Vec<RpcLog> = self.transport.request("eth_getLogs", params).await?;
        Ok(logs
            .into_iter()
            .map(RpcLog::into_log)
            .collect::<Result<Vec<_>>>()?)
    }
}

#[async_trait]
impl WalletProvider for EvmWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, ProviderError> {
        Ok(self
            .transport
            .request("eth_requestAccounts", json!([]))
            .await?)
    }

    async fn accounts(&self) -> std::result::Result<Vec<Address>, ProviderError> {
        Ok(self.transport.request("eth_accounts", json!([])).await?)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> std::result::Result<TxHash, ProviderError> {
        let mut params = json!({
            "from": tx.from,
            "to": tx.to,
            "data": tx.data,
            "value": tx.value,
        });
        if let Some(gas) = tx.gas_limit {
            params["gas"] = json!(quantity(gas));
        }

        let hash: TxHash = self
            .transport
            .request("eth_sendTransaction", json!([params]))
            .await?;
        tracing::debug!(tx_hash = %hash, to = %tx.to, "Transaction submitted");
        Ok(hash)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> std::result::Result<(), ProviderError> {
        let _: serde_json::Value = self
            .transport
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": quantity(chain_id) }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, chain: &ChainDescriptor) -> std::result::Result<(), ProviderError> {
        let params = json!([{
            "chainId": quantity(chain.chain_id),
            "chainName": chain.name,
            "rpcUrls": [chain.rpc_url],
            "blockExplorerUrls": [chain.explorer_url],
            "nativeCurrency": {
                "name": chain.native_symbol,
                "symbol": chain.native_symbol,
                "decimals": chain.native_decimals,
            },
        }]);
        let _: serde_json::Value = self
            .transport
            .request("wallet_addEthereumChain", params)
            .await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_decodes_status_and_logs() {
        let raw = json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x1b4",
            "status": "0x0",
            "logs": [{
                "address": format!("0x{}", "22".repeat(20)),
                "topics": [format!("0x{}", "33".repeat(32))],
                "data": "0x",
                "blockNumber": "0x1b4",
            }],
        });
        let receipt: RpcReceipt = serde_json::from_value(raw).unwrap();
        let receipt = receipt.into_receipt().unwrap();

        assert_eq!(receipt.block_number, 436);
        assert_eq!(receipt.status, 0);
        assert!(!receipt.succeeded());
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].block_number, Some(436));
    }

    #[test]
    fn legacy_receipt_without_status_is_success() {
        let raw = json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x1",
        });
        let receipt: RpcReceipt = serde_json::from_value(raw).unwrap();
        assert!(receipt.into_receipt().unwrap().succeeded());
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = EvmConfig::new(crate::EvmNetwork::Local).with_rpc_url("localhost:8545");
        assert!(matches!(
            EvmWallet::new(config),
            Err(EvmError::InvalidConfig(_))
        ));
    }
}
