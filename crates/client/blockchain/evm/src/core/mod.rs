//! Core types shared across the EVM backend.

pub mod error;

pub use error::{EvmError, Result};
