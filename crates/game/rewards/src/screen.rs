//! Plumbing shared by every screen: signer lookup, contract reads, the
//! one-action-at-a-time guard and transaction submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_sol_types::{SolCall, SolEvent};
use client_blockchain_core::{
    Address, Log, LogFilter, TransactionReceipt, TransactionRequest, TxError, U256,
};
use runtime::{Clock, ConnectionSnapshot, RuntimeHandle, Signer, TxFailure, call_view};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::error::ScreenError;

pub(crate) const CONNECT_FIRST: &str = "Connect your wallet first.";

/// Per-screen access to the runtime.
pub struct Screen {
    handle: RuntimeHandle,
    busy: AtomicBool,
}

/// Clears the busy flag when the action finishes, however it finishes.
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Screen {
    pub fn new(handle: RuntimeHandle) -> Self {
        Self {
            handle,
            busy: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> &RuntimeHandle {
        &self.handle
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the screen for one action.
    pub fn begin(&self) -> Result<BusyGuard<'_>, ScreenError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ScreenError::Busy)?;
        Ok(BusyGuard { flag: &self.busy })
    }

    pub fn signer(&self) -> Result<Signer, ScreenError> {
        self.handle
            .signer()
            .ok_or_else(|| ScreenError::not_ready(CONNECT_FIRST))
    }

    pub fn now_secs(&self) -> u64 {
        self.handle.clock().now_secs()
    }

    /// Send `call` to `to` and wait for a successful receipt.
    pub async fn send<C: SolCall + Send>(
        &self,
        signer: &Signer,
        to: Address,
        call: C,
        options: TxOptions,
    ) -> Result<TransactionReceipt, TxFailure> {
        let mut request = signer.transaction(to, call.abi_encode());
        request = options.apply(request);
        self.handle
            .executor()
            .execute(signer, request, options.label, options.failure)
            .await
    }
}

/// Labels and overrides for one transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    pub label: &'static str,
    /// Shown when the error has no more specific text
    pub failure: &'static str,
    pub gas_limit: Option<u64>,
    pub value: Option<U256>,
}

impl TxOptions {
    pub const fn new(label: &'static str, failure: &'static str) -> Self {
        Self {
            label,
            failure,
            gas_limit: None,
            value: None,
        }
    }

    pub fn gas(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    fn apply(&self, mut request: TransactionRequest) -> TransactionRequest {
        if let Some(gas) = self.gas_limit {
            request = request.with_gas_limit(gas);
        }
        if let Some(value) = self.value {
            request = request.with_value(value);
        }
        request
    }
}

/// View call through the connected account's provider.
pub async fn read<C: SolCall + Send>(
    signer: &Signer,
    to: Address,
    call: C,
) -> Result<C::Return, TxError> {
    call_view(signer.provider().as_ref(), to, call).await
}

/// Signer for a status fetch. Fetches only run while connected, so a missing
/// signer means the wallet went away mid-fetch.
pub fn status_signer(handle: &RuntimeHandle) -> Result<Signer, TxError> {
    handle
        .signer()
        .ok_or_else(|| TxError::Unknown("wallet not connected".into()))
}

/// Logs of event `E` emitted by `contract` for `player` in the receipt's block.
/// The player must be the event's first indexed argument.
pub fn player_event_filter<E: SolEvent>(
    contract: Address,
    receipt: &TransactionReceipt,
    player: Address,
) -> LogFilter {
    LogFilter::in_block(contract, receipt.block_number)
        .with_topic(0, E::SIGNATURE_HASH)
        .with_topic(1, player.into_word())
}

pub fn decode_event<E: SolEvent>(log: &Log) -> Option<E> {
    E::decode_raw_log(log.topics.iter().copied(), &log.data, true).ok()
}

/// Resets screen-local state to its default whenever the connected
/// `(address, chain)` changes, including on disconnect. Stops on drop.
pub struct IdentityReset {
    task: JoinHandle<()>,
}

impl IdentityReset {
    pub fn spawn<T>(state: Arc<Mutex<T>>, mut connection: watch::Receiver<ConnectionSnapshot>) -> Self
    where
        T: Default + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut identity = connection.borrow_and_update().identity();
            while connection.changed().await.is_ok() {
                let next = connection.borrow_and_update().identity();
                if next != identity {
                    identity = next;
                    *state.lock().await = T::default();
                    tracing::debug!(?identity, "Connection changed, screen state cleared");
                }
            }
        });
        Self { task }
    }
}

impl Drop for IdentityReset {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Contract integers that are small in practice (timestamps, counters).
pub fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_options_set_gas_and_value() {
        let request = TransactionRequest::new(Address::ZERO, Address::ZERO, Vec::<u8>::new());
        let request = TxOptions::new("Spin", "Spin failed")
            .gas(300_000)
            .value(U256::from(5u8))
            .apply(request);
        assert_eq!(request.gas_limit, Some(300_000));
        assert_eq!(request.value, U256::from(5u8));
    }

    #[test]
    fn oversized_values_saturate() {
        assert_eq!(to_u64(U256::from(42u8)), 42);
        assert_eq!(to_u64(U256::MAX), u64::MAX);
    }
}
