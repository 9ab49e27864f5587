//! Connection snapshots published to subscribers.

use std::fmt;
use std::sync::Arc;

use client_blockchain_core::{
    Address, Bytes, ChainId, DEFAULT_DECIMALS, TransactionRequest, U256, WalletProvider,
    format_units,
};

/// Connection state machine states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Signing handle for the connected account.
///
/// Shared read-only by every screen; the wallet serializes concurrent signing.
#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn WalletProvider>,
    address: Address,
    chain_id: ChainId,
}

impl Signer {
    pub fn new(provider: Arc<dyn WalletProvider>, address: Address, chain_id: ChainId) -> Self {
        Self {
            provider,
            address,
            chain_id,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// Transaction from this account to `to`.
    pub fn transaction(&self, to: Address, data: impl Into<Bytes>) -> TransactionRequest {
        TransactionRequest::new(self.address, to, data)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Live view of the wallet connection.
///
/// Either fully disconnected (no address, chain or signer) or fully connected
/// (all three present and consistent with the wallet).
#[derive(Debug, Clone, Default)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub signer: Option<Signer>,

    /// Set once the startup reconnect attempt finished; until then
    /// `status` is not final
    pub wallet_ready: bool,
}

impl ConnectionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// `(address, chain)` identity while connected.
    pub fn identity(&self) -> Option<(Address, ChainId)> {
        match (self.status, self.address, self.chain_id) {
            (ConnectionStatus::Connected, Some(address), Some(chain)) => Some((address, chain)),
            _ => None,
        }
    }
}

/// Last-fetched balances of the connected address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// Platform token, decimal string
    pub token: String,
    /// Native currency, decimal string
    pub native: String,
    pub token_wei: U256,
    pub native_wei: U256,
}

impl Default for BalanceSnapshot {
    fn default() -> Self {
        Self::from_wei(U256::ZERO, U256::ZERO)
    }
}

impl BalanceSnapshot {
    pub fn from_wei(token_wei: U256, native_wei: U256) -> Self {
        Self {
            token: format_units(token_wei, DEFAULT_DECIMALS),
            native: format_units(native_wei, DEFAULT_DECIMALS),
            token_wei,
            native_wei,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.token_wei.is_zero() && self.native_wei.is_zero()
    }
}
