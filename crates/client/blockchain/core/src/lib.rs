//! Wallet abstraction layer for the Gipie reward platform.
//!
//! This crate provides a layered, backend-agnostic view of an EVM wallet.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: WalletProvider (accounts, signing, notifications)
//!          └── ChainReader
//!
//! Layer 0: ChainReader (read-only node access)
//! ```
//!
//! # Design Philosophy
//!
//! - **Layer 0 (Reader)**: balances, `eth_call`, receipts and logs; no accounts
//! - **Layer 1 (Wallet)**: everything that needs the user's consent
//! - **Errors**: raw [`ProviderError`]s are classified once into [`TxError`]
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{TxError, WalletProvider};
//!
//! async fn first_account(wallet: &dyn WalletProvider) -> Result<Address, TxError> {
//!     let accounts = wallet.request_accounts().await?;
//!     accounts.first().copied().ok_or(TxError::Unknown("no accounts".into()))
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;
pub mod units;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{
    CODE_EXECUTION_REVERTED, CODE_TX_REJECTED, CODE_UNRECOGNIZED_CHAIN, CODE_USER_REJECTED,
    CODE_USER_REJECTED_ALT, REJECTED_MESSAGE, TxError, classify, decode_revert_reason,
};

pub use traits::{ChainReader, ProviderError, WalletProvider};

pub use types::{
    Address, B256, BlockchainConfig, Bytes, ChainDescriptor, ChainId, Log, LogFilter,
    TransactionReceipt, TransactionRequest, TxHash, U256, WalletEvent,
};

pub use units::{DEFAULT_DECIMALS, format_units, parse_units, tokens};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockWallet;
