//! Wallet connection state machine and its published snapshots.

mod manager;
mod state;

pub use manager::{ConnectionManager, ReconnectOutcome};
pub use state::{BalanceSnapshot, ConnectionSnapshot, ConnectionStatus, Signer};
