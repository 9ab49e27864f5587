//! Transaction execution counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters maintained by [`TxExecutor`](super::TxExecutor).
///
/// Uses atomics for lock-free access across screens.
#[derive(Debug, Default)]
pub struct TxMetrics {
    /// Transactions handed to the wallet
    submitted: AtomicU64,

    /// Transactions mined with a success status
    confirmed: AtomicU64,

    /// Sends or receipts that ended in failure, excluding rejections
    failed: AtomicU64,

    /// Requests the user declined in the wallet
    rejected: AtomicU64,

    /// Sum of submit-to-receipt times, in milliseconds
    total_confirmation_millis: AtomicU64,
}

impl TxMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_confirmed(&self, elapsed: Duration) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
        self.total_confirmation_millis
            .fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Mean time from submission to a successful receipt.
    pub fn avg_confirmation_time(&self) -> Duration {
        let confirmed = self.confirmed();
        if confirmed == 0 {
            Duration::ZERO
        } else {
            let total = self.total_confirmation_millis.load(Ordering::Relaxed);
            Duration::from_millis(total / confirmed)
        }
    }

    /// Creates a snapshot for display/logging.
    ///
    /// Not atomic across fields.
    pub fn snapshot(&self) -> TxMetricsSnapshot {
        TxMetricsSnapshot {
            submitted: self.submitted(),
            confirmed: self.confirmed(),
            failed: self.failed(),
            rejected: self.rejected(),
            avg_confirmation_time: self.avg_confirmation_time(),
        }
    }
}

/// Point-in-time copy of [`TxMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxMetricsSnapshot {
    pub submitted: u64,
    pub confirmed: u64,
    pub failed: u64,
    pub rejected: u64,
    pub avg_confirmation_time: Duration,
}
