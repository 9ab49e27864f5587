//! Common types for wallet and chain interactions.

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, B256, Bytes, U256};

/// EIP-155 chain identifier.
pub type ChainId = u64;

/// Transaction hash.
pub type TxHash = B256;

/// A transaction the wallet is asked to sign and broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,

    /// Native value attached to the call (payable functions only)
    pub value: U256,

    /// Explicit gas limit; `None` lets the wallet estimate
    pub gas_limit: Option<u64>,
}

impl TransactionRequest {
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// An emitted log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<TxHash>,
}

/// Mined transaction receipt.
///
/// A receipt can exist for a transaction that logically failed; callers must
/// inspect [`TransactionReceipt::succeeded`] rather than rely on the absence of
/// an RPC error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,

    /// Execution status code (1 = success, 0 = reverted)
    pub status: u64,

    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub const STATUS_SUCCESS: u64 = 1;

    pub fn succeeded(&self) -> bool {
        self.status == Self::STATUS_SUCCESS
    }
}

/// `eth_getLogs` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,

    /// Positional topic filter; `None` matches anything at that position
    pub topics: Vec<Option<B256>>,

    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    /// Filter scoped to a single block.
    pub fn in_block(address: Address, block: u64) -> Self {
        Self {
            address,
            topics: Vec::new(),
            from_block: block,
            to_block: block,
        }
    }

    pub fn with_topic(mut self, position: usize, topic: B256) -> Self {
        if self.topics.len() <= position {
            self.topics.resize(position + 1, None);
        }
        self.topics[position] = Some(topic);
        self
    }

    /// Whether a log satisfies this filter.
    pub fn matches(&self, log: &Log) -> bool {
        if log.address != self.address {
            return false;
        }
        if let Some(block) = log.block_number {
            if block < self.from_block || block > self.to_block {
                return false;
            }
        }
        self.topics.iter().enumerate().all(|(i, wanted)| match wanted {
            Some(topic) => log.topics.get(i) == Some(topic),
            None => true,
        })
    }
}

/// Wallet-originated notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Authorized accounts changed; an empty list means the wallet revoked access
    AccountsChanged(Vec<Address>),

    ChainChanged(ChainId),

    /// The provider lost its connection to every chain
    Disconnected,
}

/// Parameters for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_symbol: String,
    pub native_decimals: u8,
}

/// Blockchain-specific configuration.
///
/// Implemented by each backend's config type.
pub trait BlockchainConfig: Send + Sync {
    /// Human-readable network name (e.g., "bsc", "bsc-testnet")
    fn network_name(&self) -> &str;

    /// RPC endpoint URL
    fn rpc_url(&self) -> &str;

    /// The single chain this deployment supports
    fn chain(&self) -> ChainDescriptor;

    /// Validate configuration
    fn validate(&self) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(address: Address, topics: Vec<B256>, block: u64) -> Log {
        Log {
            address,
            topics,
            data: Bytes::new(),
            block_number: Some(block),
            transaction_hash: None,
        }
    }

    #[test]
    fn filter_matches_address_block_and_topics() {
        let contract = Address::repeat_byte(0x11);
        let sig = B256::repeat_byte(0xaa);
        let player = B256::left_padding_from(Address::repeat_byte(0x22).as_slice());

        let filter = LogFilter::in_block(contract, 7)
            .with_topic(0, sig)
            .with_topic(1, player);

        assert!(filter.matches(&log(contract, vec![sig, player], 7)));
        assert!(!filter.matches(&log(contract, vec![sig, player], 8)));
        assert!(!filter.matches(&log(Address::ZERO, vec![sig, player], 7)));
        assert!(!filter.matches(&log(contract, vec![sig], 7)));
    }

    #[test]
    fn skipped_topic_positions_are_wildcards() {
        let contract = Address::repeat_byte(0x11);
        let filter = LogFilter::in_block(contract, 1).with_topic(1, B256::repeat_byte(1));

        assert_eq!(filter.topics, vec![None, Some(B256::repeat_byte(1))]);
        assert!(filter.matches(&log(
            contract,
            vec![B256::repeat_byte(9), B256::repeat_byte(1)],
            1
        )));
    }

    #[test]
    fn receipt_status_zero_is_not_success() {
        let receipt = TransactionReceipt {
            transaction_hash: B256::ZERO,
            block_number: 1,
            status: 0,
            logs: vec![],
        };
        assert!(!receipt.succeeded());
    }
}
