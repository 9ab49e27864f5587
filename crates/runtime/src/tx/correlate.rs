//! Recover a contract's result from the logs of a confirmed transaction.
//!
//! Some contracts only report an action's outcome through an event. The
//! node that served the receipt may not have indexed the logs yet, so the
//! lookup is retried with backoff before giving up.

use client_blockchain_core::{ChainReader, Log, LogFilter};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventCorrelator {
    policy: RetryPolicy,
}

impl EventCorrelator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// First log under `filter` that `decode` accepts.
    ///
    /// `None` after the retry budget is spent; callers fall back to a
    /// neutral outcome.
    pub async fn find<R, T, F>(&self, reader: &R, filter: &LogFilter, decode: F) -> Option<T>
    where
        R: ChainReader + ?Sized,
        F: Fn(&Log) -> Option<T>,
    {
        let decode = &decode;
        self.policy
            .run(move |_| async move {
                let logs = reader.logs(filter).await?;
                Ok::<_, client_blockchain_core::ProviderError>(
                    logs.iter().filter(|log| filter.matches(log)).find_map(decode),
                )
            })
            .await
    }
}
