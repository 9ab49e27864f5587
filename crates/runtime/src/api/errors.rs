//! Unified error types surfaced by the runtime API.
//!
//! Connection failures carry enough shape for the caller to decide between a
//! silent notice and a visible error; runtime failures wrap worker and
//! repository problems.

use client_blockchain_core::{ChainId, ProviderError, TxError};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("no supported chain configured")]
    MissingChain,

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

/// Why `connect()` did not produce a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No wallet present. Informational.
    #[error("no wallet available")]
    Unavailable,

    /// The user dismissed the prompt. Informational, never retried.
    #[error("connection request rejected by user")]
    Rejected,

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("unsupported network {actual}, expected {expected}")]
    UnsupportedNetwork { expected: ChainId, actual: ChainId },

    #[error("wallet error: {0}")]
    Provider(TxError),
}

impl ConnectError {
    /// Conditions that are logged but not shown as application errors.
    pub fn is_silent(&self) -> bool {
        matches!(self, ConnectError::Unavailable | ConnectError::Rejected)
    }
}

impl From<ProviderError> for ConnectError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable => ConnectError::Unavailable,
            other => match TxError::from(other) {
                TxError::Rejected => ConnectError::Rejected,
                classified => ConnectError::Provider(classified),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_is_silent() {
        let err = ConnectError::from(ProviderError::rpc(4001, "User rejected the request."));
        assert_eq!(err, ConnectError::Rejected);
        assert!(err.is_silent());
        assert!(ConnectError::from(ProviderError::Unavailable).is_silent());
        assert!(!ConnectError::NoAccounts.is_silent());
    }
}
