//! EVM network configuration.

use std::env;
use std::time::Duration;

use client_blockchain_core::{BlockchainConfig, ChainDescriptor, ChainId};

use crate::core::EvmError;

/// Supported EVM networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvmNetwork {
    /// BNB Smart Chain mainnet
    Bsc,
    /// BNB Smart Chain testnet
    BscTestnet,
    /// Local development node (anvil, hardhat)
    Local,
}

impl EvmNetwork {
    pub fn chain_id(&self) -> ChainId {
        match self {
            EvmNetwork::Bsc => 56,
            EvmNetwork::BscTestnet => 97,
            EvmNetwork::Local => 31337,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            EvmNetwork::Bsc => "https://bsc-dataseed.binance.org/",
            EvmNetwork::BscTestnet => "https://data-seed-prebsc-1-s1.binance.org:8545/",
            EvmNetwork::Local => "http://127.0.0.1:8545",
        }
    }

    pub fn explorer_url(&self) -> &'static str {
        match self {
            EvmNetwork::Bsc => "https://bscscan.com/",
            EvmNetwork::BscTestnet => "https://testnet.bscscan.com/",
            EvmNetwork::Local => "http://127.0.0.1:8545",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EvmNetwork::Bsc => "BNB Smart Chain",
            EvmNetwork::BscTestnet => "BNB Smart Chain Testnet",
            EvmNetwork::Local => "Local Devnet",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            EvmNetwork::Bsc => "BNB",
            EvmNetwork::BscTestnet => "tBNB",
            EvmNetwork::Local => "ETH",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            EvmNetwork::Bsc => "bsc",
            EvmNetwork::BscTestnet => "bsc-testnet",
            EvmNetwork::Local => "local",
        }
    }
}

impl std::str::FromStr for EvmNetwork {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bsc" | "mainnet" => Ok(EvmNetwork::Bsc),
            "bsc-testnet" | "testnet" => Ok(EvmNetwork::BscTestnet),
            "local" => Ok(EvmNetwork::Local),
            other => Err(EvmError::InvalidConfig(format!(
                "Invalid EVM_NETWORK: {other}. Must be bsc, bsc-testnet, or local"
            ))),
        }
    }
}

/// EVM-specific configuration.
#[derive(Debug, Clone)]
pub struct EvmConfig {
    /// Network to connect to
    pub network: EvmNetwork,

    /// Custom RPC endpoint URL (overrides network default)
    pub rpc_url: Option<String>,

    /// How often the account watcher polls `eth_accounts` / `eth_chainId`
    pub account_poll_interval: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl EvmConfig {
    pub fn new(network: EvmNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
            account_poll_interval: Duration::from_millis(2_000),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `EVM_NETWORK` - Network name (bsc, bsc-testnet, local) (default: bsc)
    /// - `EVM_RPC_URL` - Custom RPC endpoint URL
    /// - `EVM_ACCOUNT_POLL_MS` - Account watcher interval (default: 2000)
    pub fn from_env() -> Result<Self, EvmError> {
        let network = env::var("EVM_NETWORK")
            .unwrap_or_else(|_| "bsc".to_string())
            .parse::<EvmNetwork>()?;

        let mut config = Self::new(network);
        config.rpc_url = env::var("EVM_RPC_URL").ok().filter(|url| !url.is_empty());

        if let Some(ms) = env::var("EVM_ACCOUNT_POLL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.account_poll_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    pub fn with_account_poll_interval(mut self, interval: Duration) -> Self {
        self.account_poll_interval = interval;
        self
    }

    /// Get the RPC URL (custom or default for network).
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }
}

impl BlockchainConfig for EvmConfig {
    fn network_name(&self) -> &str {
        self.network.slug()
    }

    fn rpc_url(&self) -> &str {
        self.get_rpc_url()
    }

    fn chain(&self) -> ChainDescriptor {
        ChainDescriptor {
            chain_id: self.network.chain_id(),
            name: self.network.display_name().to_string(),
            rpc_url: self.get_rpc_url().to_string(),
            explorer_url: self.network.explorer_url().to_string(),
            native_symbol: self.network.native_symbol().to_string(),
            native_decimals: 18,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let url = self.get_rpc_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("Invalid RPC URL format: {url}"));
        }
        if self.account_poll_interval.is_zero() {
            return Err("Account poll interval must be greater than 0".to_string());
        }
        Ok(())
    }
}
