//! Error types for EVM backend operations.

use client_blockchain_core::ProviderError;
use thiserror::Error;

/// Errors raised while configuring or talking to an EVM node.
#[derive(Debug, Error)]
pub enum EvmError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<EvmError> for ProviderError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::Http(e) => ProviderError::Transport(e.to_string()),
            EvmError::Rpc {
                code,
                message,
                data,
            } => ProviderError::Rpc {
                code,
                message,
                data: data
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse().ok()),
            },
            EvmError::Malformed(msg) => ProviderError::Decode(msg),
            EvmError::Serialization(e) => ProviderError::Decode(e.to_string()),
            EvmError::InvalidConfig(msg) => ProviderError::Transport(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvmError>;
