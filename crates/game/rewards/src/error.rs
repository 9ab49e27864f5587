use client_blockchain_core::TxError;
use runtime::TxFailure;
use thiserror::Error;

/// Why a screen action did not run or did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    /// Another action on the same screen is still in flight
    #[error("another transaction is in progress")]
    Busy,

    /// A precondition failed; the text is shown as is
    #[error("{0}")]
    NotReady(String),

    #[error("failed to read contract state: {0}")]
    Read(#[from] TxError),

    #[error(transparent)]
    Tx(#[from] TxFailure),
}

impl ScreenError {
    pub fn not_ready(reason: impl Into<String>) -> Self {
        ScreenError::NotReady(reason.into())
    }

    /// Text for the screen's message line.
    pub fn user_message(&self) -> String {
        match self {
            ScreenError::Busy => "Please wait for the current transaction.".to_string(),
            ScreenError::NotReady(reason) => reason.clone(),
            ScreenError::Read(_) => "Error fetching data from contract.".to_string(),
            ScreenError::Tx(failure) => failure.message.clone(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ScreenError::Tx(failure) if failure.is_rejection())
    }
}
