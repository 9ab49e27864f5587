//! Builds the wallet provider, local store and runtime used by front-ends.
use std::sync::Arc;

use anyhow::Result;
use client_blockchain_core::{BlockchainConfig, WalletProvider};
use client_blockchain_evm::EvmWallet;
use runtime::{FileStore, KeyValueStore, Runtime, RuntimeConfig, TxConfig};

use crate::config::AppConfig;

/// Builder that assembles provider, storage and runtime for clients.
pub struct ClientBuilder {
    config: AppConfig,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ClientBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Provide a custom store instead of the file store under the data dir.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            balance_poll_interval: self.config.balance_poll_interval,
            tx: TxConfig::default().with_receipt_poll_interval(self.config.receipt_poll_interval),
            contracts: self.config.contracts.clone(),
            ..RuntimeConfig::default()
        }
    }

    /// Build the runtime. This attempts a silent reconnect and starts the
    /// balance poller; the account watcher is left to the caller.
    pub async fn build(self) -> Result<ClientSetup> {
        let wallet = EvmWallet::new(self.config.evm.clone())?;

        let store = match self.store.clone() {
            Some(store) => store,
            None => {
                let dir = self.config.storage_dir()?;
                tracing::debug!("Using file store at {}", dir.display());
                Arc::new(FileStore::new(dir)?)
            }
        };

        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let runtime = Runtime::builder()
            .config(self.runtime_config())
            .provider(provider)
            .store(store)
            .chain(self.config.evm.chain())
            .build()
            .await?;

        tracing::info!(
            network = self.config.evm.network_name(),
            reconnect = ?runtime.reconnect_outcome(),
            "Runtime built"
        );

        Ok(ClientSetup {
            config: self.config,
            wallet,
            runtime,
        })
    }
}

pub struct ClientSetup {
    pub config: AppConfig,
    pub wallet: EvmWallet,
    pub runtime: Runtime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn runtime_config_carries_app_settings() {
        let mut config = AppConfig::default();
        config.balance_poll_interval = Duration::from_secs(42);
        config.receipt_poll_interval = Duration::from_millis(300);
        config.contracts.token = client_blockchain_core::Address::repeat_byte(9);

        let runtime_config = ClientBuilder::new(config).runtime_config();
        assert_eq!(runtime_config.balance_poll_interval, Duration::from_secs(42));
        assert_eq!(
            runtime_config.tx.receipt_poll_interval,
            Duration::from_millis(300)
        );
        assert_eq!(
            runtime_config.contracts.token,
            client_blockchain_core::Address::repeat_byte(9)
        );
    }

    #[tokio::test]
    async fn builds_with_file_store_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_data_dir(dir.path());

        let setup = ClientBuilder::new(config).build().await.unwrap();
        assert!(dir.path().join("storage").is_dir());
        assert_eq!(
            *setup.runtime.reconnect_outcome(),
            runtime::ReconnectOutcome::NoSession
        );
        setup.runtime.shutdown().await.unwrap();
    }
}
