//! Write-transaction execution and outcome recovery.

mod correlate;
mod executor;
mod metrics;

pub use correlate::EventCorrelator;
pub use executor::{RECEIPT_POLL_INTERVAL, TxConfig, TxExecutor, TxFailure};
pub use metrics::{TxMetrics, TxMetricsSnapshot};
