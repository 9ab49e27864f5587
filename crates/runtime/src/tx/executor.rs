//! Submit a transaction and follow it to a terminal state.
//!
//! Every stage is published on the [`Topic::Transaction`](crate::events::Topic)
//! bus so the caller's status line and notifications stay in sync.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{
    ChainReader, TransactionReceipt, TransactionRequest, TxError, TxHash,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::TxMetrics;
use crate::connection::Signer;
use crate::events::{EventBus, TxEvent, TxStage};

/// Default receipt polling period.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct TxConfig {
    pub receipt_poll_interval: Duration,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }
}

impl TxConfig {
    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }
}

/// A transaction that did not confirm successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFailure {
    /// Set once the wallet accepted the request
    pub hash: Option<TxHash>,
    pub error: TxError,
    /// Text shown to the user
    pub message: String,
}

impl TxFailure {
    pub fn is_rejection(&self) -> bool {
        self.error.is_rejection()
    }
}

impl fmt::Display for TxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TxFailure {}

/// Runs write transactions for the screens.
#[derive(Clone)]
pub struct TxExecutor {
    bus: EventBus,
    config: TxConfig,
    metrics: Arc<TxMetrics>,
}

impl TxExecutor {
    pub fn new(bus: EventBus, config: TxConfig) -> Self {
        Self {
            bus,
            config,
            metrics: Arc::new(TxMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<TxMetrics> {
        &self.metrics
    }

    /// Send `request` through `signer` and wait for its receipt.
    ///
    /// `label` names the action in status updates. `failure_message` is shown
    /// when the error carries no more specific text (a rejection or a decoded
    /// revert reason takes precedence).
    pub async fn execute(
        &self,
        signer: &Signer,
        request: TransactionRequest,
        label: &str,
        failure_message: &str,
    ) -> Result<TransactionReceipt, TxFailure> {
        self.publish(label, TxStage::Pending { hash: None });
        self.metrics.record_submitted();

        let provider = signer.provider();
        let started = Instant::now();
        let hash = provider
            .send_transaction(request)
            .await
            .map_err(|e| self.fail(label, None, e.into(), failure_message))?;

        info!(label, tx_hash = %hash, "Transaction submitted");
        self.publish(label, TxStage::Pending { hash: Some(hash) });

        let receipt = self
            .wait_for_receipt(provider.as_ref(), hash)
            .await
            .map_err(|e| self.fail(label, Some(hash), e, failure_message))?;

        if !receipt.succeeded() {
            return Err(self.fail(
                label,
                Some(hash),
                TxError::Reverted { reason: None },
                failure_message,
            ));
        }

        let elapsed = started.elapsed();
        self.metrics.record_confirmed(elapsed);
        info!(
            label,
            tx_hash = %hash,
            block = receipt.block_number,
            elapsed_ms = elapsed.as_millis() as u64,
            "Transaction confirmed"
        );
        self.publish(label, TxStage::Succeeded { hash });
        Ok(receipt)
    }

    /// Poll until the receipt is available. Transport hiccups keep polling;
    /// any other provider error ends the wait.
    async fn wait_for_receipt<R>(&self, reader: &R, hash: TxHash) -> Result<TransactionReceipt, TxError>
    where
        R: ChainReader + ?Sized,
    {
        loop {
            match reader.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => debug!(tx_hash = %hash, "Receipt not yet available"),
                Err(e) => match TxError::from(e) {
                    TxError::Network(message) => {
                        warn!(tx_hash = %hash, "Receipt poll failed, retrying: {}", message)
                    }
                    other => return Err(other),
                },
            }
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }

    fn fail(
        &self,
        label: &str,
        hash: Option<TxHash>,
        error: TxError,
        failure_message: &str,
    ) -> TxFailure {
        let message = error.user_message(failure_message);
        if error.is_rejection() {
            self.metrics.record_rejected();
            info!(label, "Transaction rejected by user");
        } else {
            self.metrics.record_failed();
            error!(label, tx_hash = ?hash, "Transaction failed: {}", error);
        }

        self.publish(
            label,
            TxStage::Failed {
                hash,
                message: message.clone(),
            },
        );
        TxFailure {
            hash,
            error,
            message,
        }
    }

    fn publish(&self, label: &str, stage: TxStage) {
        self.bus.publish(TxEvent {
            label: label.to_string(),
            stage,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, Topic};
    use client_blockchain_core::{
        Address, Bytes, CODE_USER_REJECTED, MockWallet, ProviderError, REJECTED_MESSAGE,
        WalletProvider,
    };
    use tokio::sync::broadcast;

    const GAME: Address = Address::repeat_byte(0x44);

    fn setup() -> (MockWallet, Signer, TxExecutor) {
        let owner = Address::repeat_byte(1);
        let wallet = MockWallet::with_account(56, owner);
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let signer = Signer::new(provider, owner, 56);
        let executor = TxExecutor::new(
            EventBus::new(),
            TxConfig::default().with_receipt_poll_interval(Duration::from_millis(100)),
        );
        (wallet, signer, executor)
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<TxStage> {
        let mut stages = Vec::new();
        while let Ok(Event::Transaction(event)) = rx.try_recv() {
            stages.push(event.stage);
        }
        stages
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_after_receipt_polls() {
        let (wallet, signer, executor) = setup();
        wallet.set_receipt_delay(2);
        let mut rx = executor.bus.subscribe(Topic::Transaction);

        let request = signer.transaction(GAME, Bytes::from_static(&[1, 2, 3, 4]));
        let receipt = executor
            .execute(&signer, request, "Roll", "Roll failed")
            .await
            .unwrap();

        assert!(receipt.succeeded());
        let stages = drain(&mut rx);
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], TxStage::Pending { hash: None });
        assert!(matches!(stages[1], TxStage::Pending { hash: Some(_) }));
        assert_eq!(
            stages[2],
            TxStage::Succeeded {
                hash: receipt.transaction_hash
            }
        );
        assert_eq!(executor.metrics().confirmed(), 1);
    }

    #[tokio::test]
    async fn rejection_uses_fixed_message() {
        let (wallet, signer, executor) = setup();
        wallet.fail_send(Some(ProviderError::rpc(
            CODE_USER_REJECTED,
            "User denied transaction signature",
        )));

        let request = signer.transaction(GAME, Bytes::new());
        let failure = executor
            .execute(&signer, request, "Claim", "Claim failed")
            .await
            .unwrap_err();

        assert!(failure.is_rejection());
        assert_eq!(failure.hash, None);
        assert_eq!(failure.message, REJECTED_MESSAGE);
        assert_eq!(executor.metrics().rejected(), 1);
    }

    #[tokio::test]
    async fn failed_status_is_a_revert() {
        let (wallet, signer, executor) = setup();
        wallet.set_receipt_status(0);

        let request = signer.transaction(GAME, Bytes::new());
        let failure = executor
            .execute(&signer, request, "Spin", "Spin failed")
            .await
            .unwrap_err();

        assert_eq!(failure.error, TxError::Reverted { reason: None });
        assert!(failure.hash.is_some());
        assert_eq!(failure.message, "Spin failed");
        assert_eq!(executor.metrics().failed(), 1);
    }
}
