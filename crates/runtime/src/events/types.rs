//! Event types for different topics.

use client_blockchain_core::{Address, ChainId, TxHash};
use serde::{Deserialize, Serialize};

/// Why a connection was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Explicit `disconnect()` call
    User,
    /// The wallet revoked every account
    AccountsRevoked,
    /// The wallet moved to a chain other than the supported one
    UnsupportedChain,
    /// The wallet reported it lost its connection
    WalletDisconnected,
}

/// Connection lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    Connected { address: Address, chain_id: ChainId },

    /// The wallet switched accounts while connected
    AccountChanged { address: Address },

    /// The wallet moved to the supported chain (again)
    ChainChanged { chain_id: ChainId },

    Disconnected { reason: DisconnectReason },
}

/// Progress of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStage {
    /// Waiting for the wallet; `hash` is set once the wallet returns one
    Pending { hash: Option<TxHash> },

    /// Mined with a success status
    Succeeded { hash: TxHash },

    /// Rejected, reverted, or mined with a failure status
    Failed {
        hash: Option<TxHash>,
        message: String,
    },
}

impl TxStage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStage::Pending { .. })
    }
}

/// Transaction progress for one screen action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxEvent {
    /// Action label, e.g. "freeroll.roll"
    pub label: String,
    pub stage: TxStage,
}
