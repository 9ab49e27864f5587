//! EVM backend for the Gipie reward platform.
//!
//! This crate provides:
//! - A JSON-RPC [`EvmWallet`] implementing the backend-agnostic wallet traits
//! - Network and deployment configuration loaded from the environment
//! - `sol!` bindings for every deployed platform contract
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_evm::{ContractAddresses, EvmConfig, EvmWallet};
//!
//! let config = EvmConfig::from_env()?;
//! let wallet = EvmWallet::new(config)?;
//! let _watcher = wallet.spawn_watcher();
//! let contracts = ContractAddresses::from_env()?;
//! ```

pub mod client;
pub mod config;
pub mod contracts;
pub mod core;
pub mod rpc;
pub mod utils;

pub use client::EvmWallet;
pub use config::{ContractAddresses, EvmConfig, EvmNetwork};
pub use crate::core::{EvmError, Result};
