//! Wallet and chain abstraction traits.
//!
//! This module defines a layered abstraction:
//! - Layer 0: ChainReader (read-only node access)
//! - Layer 1: WalletProvider (accounts, signing, wallet notifications)

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{
    Address, Bytes, ChainDescriptor, ChainId, Log, LogFilter, TransactionReceipt,
    TransactionRequest, TxHash, U256, WalletEvent,
};

// ============================================================================
// Error Types
// ============================================================================

/// Raw error surfaced by a provider before classification.
///
/// Callers that need a user-facing decision convert it into
/// [`TxError`](crate::TxError) exactly once at the boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// No wallet is present (no injected provider, no signer configured)
    #[error("Wallet provider unavailable")]
    Unavailable,

    /// JSON-RPC error object returned by the wallet or node
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Bytes>,
    },

    /// Connection-level failure (timeout, refused, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The JSON-RPC error code, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ============================================================================
// Layer 0: Read-only Node Access
// ============================================================================

/// Read-only chain access.
///
/// Carries no notion of accounts or signing.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Currently selected chain id.
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// Native-currency balance in wei.
    async fn balance(&self, address: Address) -> Result<U256, ProviderError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;

    /// Receipt for a mined transaction, `None` while still pending.
    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ProviderError>;

    /// `eth_getLogs`.
    async fn logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ProviderError>;
}

// ============================================================================
// Layer 1: Wallet
// ============================================================================

/// A wallet able to authorize accounts and sign transactions.
///
/// Implementations are shared read-only by every screen; concurrent signing
/// requests are serialized by the wallet itself.
#[async_trait]
pub trait WalletProvider: ChainReader {
    /// Ask the user to authorize accounts (may prompt).
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Accounts already authorized, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Sign and broadcast, returning the transaction hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ProviderError>;

    /// `wallet_switchEthereumChain`. Error code 4902 means the chain is unknown to the wallet.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`.
    async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;

    /// Subscribe to account, chain and disconnect notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
