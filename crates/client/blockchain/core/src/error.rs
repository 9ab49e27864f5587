//! Closed error taxonomy for wallet and contract interactions.
//!
//! Wallets and nodes report failures through loosely shaped JSON-RPC errors
//! (numeric codes, free-form messages, optional revert data). [`TxError`]
//! classifies them once, at the boundary where they first arrive, so screens
//! never inspect raw codes.

use alloy_sol_types::{Revert, SolError};

use crate::traits::ProviderError;

/// EIP-1193 user rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;

/// Rejection code used by some mobile wallets.
pub const CODE_USER_REJECTED_ALT: i64 = 5001;

/// Node-side "transaction rejected" code.
pub const CODE_TX_REJECTED: i64 = -32003;

/// EIP-3085 chain not added to the wallet.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Geth-style `execution reverted`.
pub const CODE_EXECUTION_REVERTED: i64 = 3;

const REJECTION_CODES: [i64; 3] = [CODE_USER_REJECTED, CODE_USER_REJECTED_ALT, CODE_TX_REJECTED];
const REJECTION_MARKERS: [&str; 3] = ["rejected", "denied", "cancelled"];
const REVERT_MARKER: &str = "execution reverted";

/// Message shown when the user declines a wallet prompt.
pub const REJECTED_MESSAGE: &str = "Transaction rejected by user.";

/// Classified wallet/contract failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// The user declined the wallet prompt. Never retried automatically.
    #[error("rejected by user")]
    Rejected,

    /// The contract reverted, with its reason string when one was supplied.
    #[error("execution reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted { reason: Option<String> },

    /// Node unreachable or wallet missing.
    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Unknown(String),
}

impl TxError {
    /// User-facing message, falling back to a screen-specific text when the
    /// error carries nothing better.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected => REJECTED_MESSAGE.to_string(),
            Self::Reverted {
                reason: Some(reason),
            } if !reason.is_empty() => reason.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

impl From<ProviderError> for TxError {
    fn from(err: ProviderError) -> Self {
        classify(&err)
    }
}

/// Map a raw provider error onto the taxonomy.
pub fn classify(err: &ProviderError) -> TxError {
    match err {
        ProviderError::Unavailable => TxError::Network(err.to_string()),
        ProviderError::Transport(msg) => TxError::Network(msg.clone()),
        ProviderError::Decode(msg) => TxError::Unknown(msg.clone()),
        ProviderError::Rpc {
            code,
            message,
            data,
        } => {
            let lowered = message.to_ascii_lowercase();
            if REJECTION_CODES.contains(code) {
                return TxError::Rejected;
            }
            // Revert reasons are free text and may contain rejection words.
            if *code == CODE_EXECUTION_REVERTED || lowered.contains(REVERT_MARKER) {
                let reason = data
                    .as_deref()
                    .and_then(|data| decode_revert_reason(data))
                    .or_else(|| reason_from_message(message));
                return TxError::Reverted { reason };
            }
            if REJECTION_MARKERS.iter().any(|m| lowered.contains(m)) {
                return TxError::Rejected;
            }
            TxError::Unknown(message.clone())
        }
    }
}

/// Decode `Error(string)` revert data.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data, true).ok().map(|revert| revert.reason)
}

/// Extract the reason from `"execution reverted: <reason>"`.
fn reason_from_message(message: &str) -> Option<String> {
    // ASCII lowering keeps byte offsets valid for slicing `message`.
    let lowered = message.to_ascii_lowercase();
    let idx = lowered.find(REVERT_MARKER)?;
    let rest = message[idx + REVERT_MARKER.len()..]
        .trim_start_matches(':')
        .trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;

    #[test]
    fn rejection_codes_classify_as_rejected() {
        for code in [4001, 5001, -32003] {
            assert_eq!(
                classify(&ProviderError::rpc(code, "whatever")),
                TxError::Rejected
            );
        }
        assert_eq!(
            classify(&ProviderError::rpc(-32000, "User denied transaction signature")),
            TxError::Rejected
        );
        assert_eq!(
            classify(&ProviderError::rpc(-1, "ACTION_REJECTED")),
            TxError::Rejected
        );
    }

    #[test]
    fn revert_reason_from_abi_data() {
        let data: Bytes = Revert {
            reason: "Cooldown active".into(),
        }
        .abi_encode()
        .into();
        let err = ProviderError::Rpc {
            code: 3,
            message: "execution reverted".into(),
            data: Some(data),
        };
        assert_eq!(
            classify(&err),
            TxError::Reverted {
                reason: Some("Cooldown active".into())
            }
        );
    }

    #[test]
    fn revert_reason_from_message() {
        let err = ProviderError::rpc(-32000, "execution reverted: Not eligible");
        assert_eq!(
            classify(&err),
            TxError::Reverted {
                reason: Some("Not eligible".into())
            }
        );
    }

    #[test]
    fn non_ascii_message_keeps_reason() {
        let err = ProviderError::rpc(-32000, "İİİ execution reverted: Déjà réclamé");
        assert_eq!(
            classify(&err),
            TxError::Reverted {
                reason: Some("Déjà réclamé".into())
            }
        );
        assert_eq!(
            classify(&ProviderError::rpc(-32000, "İİİ execution reverted")),
            TxError::Reverted { reason: None }
        );
    }

    #[test]
    fn user_messages() {
        assert_eq!(TxError::Rejected.user_message("x"), REJECTED_MESSAGE);
        assert_eq!(
            TxError::Reverted {
                reason: Some("Too early".into())
            }
            .user_message("Roll failed"),
            "Too early"
        );
        assert_eq!(
            TxError::Reverted { reason: None }.user_message("Roll failed"),
            "Roll failed"
        );
        assert_eq!(
            TxError::Network("down".into()).user_message("Roll failed"),
            "Roll failed"
        );
    }

    #[test]
    fn transport_is_network() {
        assert!(matches!(
            TxError::from(ProviderError::Transport("timeout".into())),
            TxError::Network(_)
        ));
        assert!(matches!(
            TxError::from(ProviderError::Unavailable),
            TxError::Network(_)
        ));
    }
}
