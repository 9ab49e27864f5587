//! Network and deployment configuration.

pub mod deployment;
pub mod network;

pub use deployment::ContractAddresses;
pub use network::{EvmConfig, EvmNetwork};
