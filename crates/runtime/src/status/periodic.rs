//! Fetch-then-count-down status loop shared by every reward screen.
//!
//! A [`PeriodicStatus`] fetches its source immediately, then ticks once per
//! `tick` period, decrementing the displayed cooldown locally. When a positive
//! cooldown reaches zero it fetches again instead of trusting the local
//! countdown. [`PeriodicStatus::refresh`] forces a fetch, e.g. after a
//! transaction. The most recently completed fetch always wins.
//!
//! A loop started with [`PeriodicStatus::follow`] is bound to the wallet
//! connection: it fetches whenever the connected identity changes and
//! clears its view while disconnected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use client_blockchain_core::TxError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::cooldown::Cooldown;
use crate::connection::ConnectionSnapshot;

/// Default countdown resolution.
pub const STATUS_TICK: Duration = Duration::from_secs(1);

/// Something that can read a screen's on-chain status.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    type Status: Clone + Send + Sync + 'static;

    async fn fetch(&self) -> Result<Self::Status, TxError>;

    /// Cooldown embedded in a freshly fetched status.
    fn cooldown(&self, status: &Self::Status) -> Cooldown;
}

/// What a screen renders.
#[derive(Debug, Clone)]
pub struct StatusView<T> {
    /// Last successfully fetched status
    pub status: Option<T>,
    /// Locally decremented cooldown
    pub cooldown: Cooldown,
    pub loading: bool,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
}

impl<T> Default for StatusView<T> {
    fn default() -> Self {
        Self {
            status: None,
            cooldown: Cooldown::READY,
            loading: false,
            error: None,
        }
    }
}

type RefreshRequest<T> = oneshot::Sender<Option<T>>;

/// Handle to a running status loop. Dropping it stops the loop.
pub struct PeriodicStatus<S: StatusSource> {
    view: watch::Receiver<StatusView<S::Status>>,
    refresh_tx: mpsc::Sender<RefreshRequest<S::Status>>,
    task: JoinHandle<()>,
}

impl<S: StatusSource> PeriodicStatus<S> {
    pub fn spawn(source: Arc<S>) -> Self {
        Self::spawn_with_tick(source, STATUS_TICK)
    }

    pub fn spawn_with_tick(source: Arc<S>, tick: Duration) -> Self {
        Self::start(source, tick, None)
    }

    /// Loop that only fetches while `connection` reports a connected wallet.
    pub fn follow(source: Arc<S>, connection: watch::Receiver<ConnectionSnapshot>) -> Self {
        Self::start(source, STATUS_TICK, Some(connection))
    }

    fn start(
        source: Arc<S>,
        tick: Duration,
        connection: Option<watch::Receiver<ConnectionSnapshot>>,
    ) -> Self {
        let (view_tx, view) = watch::channel(StatusView::default());
        let (refresh_tx, refresh_rx) = mpsc::channel(8);
        let task = tokio::spawn(run(source, view_tx, refresh_rx, tick, connection));
        Self {
            view,
            refresh_tx,
            task,
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<StatusView<S::Status>> {
        self.view.clone()
    }

    pub fn current(&self) -> StatusView<S::Status> {
        self.view.borrow().clone()
    }

    /// Fetch now and return the fresh status, or `None` if the fetch failed.
    pub async fn refresh(&self) -> Option<S::Status> {
        let (reply, rx) = oneshot::channel();
        if self.refresh_tx.send(reply).await.is_err() {
            return None;
        }
        rx.await.ok().flatten()
    }
}

impl<S: StatusSource> Drop for PeriodicStatus<S> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<S: StatusSource>(
    source: Arc<S>,
    view: watch::Sender<StatusView<S::Status>>,
    mut refresh_rx: mpsc::Receiver<RefreshRequest<S::Status>>,
    tick: Duration,
    mut connection: Option<watch::Receiver<ConnectionSnapshot>>,
) {
    let mut identity = connection
        .as_mut()
        .and_then(|rx| rx.borrow_and_update().identity());
    let mut active = connection.is_none() || identity.is_some();

    if active {
        fetch_into(source.as_ref(), &view).await;
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick(), if active => {
                let mut expired = false;
                view.send_modify(|v| {
                    if !v.cooldown.is_ready() {
                        v.cooldown = v.cooldown.tick();
                        expired = v.cooldown.is_ready();
                    }
                });
                if expired {
                    tracing::debug!("Cooldown elapsed, refetching status");
                    fetch_into(source.as_ref(), &view).await;
                }
            }
            request = refresh_rx.recv() => {
                let Some(reply) = request else { break };
                let status = if active {
                    fetch_into(source.as_ref(), &view).await
                } else {
                    None
                };
                let _ = reply.send(status);
            }
            changed = connection_changed(&mut connection) => {
                if changed.is_err() {
                    break;
                }
                let next = connection
                    .as_mut()
                    .and_then(|rx| rx.borrow_and_update().identity());
                if next == identity {
                    continue;
                }
                identity = next;
                active = identity.is_some();
                if active {
                    fetch_into(source.as_ref(), &view).await;
                    ticker.reset();
                } else {
                    view.send_replace(StatusView::default());
                }
            }
        }
    }
}

async fn connection_changed(
    connection: &mut Option<watch::Receiver<ConnectionSnapshot>>,
) -> Result<(), watch::error::RecvError> {
    match connection {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}

async fn fetch_into<S: StatusSource>(
    source: &S,
    view: &watch::Sender<StatusView<S::Status>>,
) -> Option<S::Status> {
    view.send_modify(|v| v.loading = true);

    match source.fetch().await {
        Ok(status) => {
            let cooldown = source.cooldown(&status);
            view.send_modify(|v| {
                v.status = Some(status.clone());
                v.cooldown = cooldown;
                v.loading = false;
                v.error = None;
            });
            Some(status)
        }
        Err(e) => {
            tracing::warn!("Status fetch failed: {}", e);
            view.send_modify(|v| {
                v.loading = false;
                v.error = Some(e.to_string());
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Returns a 3 second cooldown on the first fetch, ready afterwards.
    struct Countdown {
        fetches: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl StatusSource for Countdown {
        type Status = u32;

        async fn fetch(&self) -> Result<u32, TxError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(TxError::Network("down".into()));
            }
            Ok(n)
        }

        fn cooldown(&self, status: &u32) -> Cooldown {
            Cooldown::from_remaining(if *status == 1 { 3 } else { 0 })
        }
    }

    fn source(fail: bool) -> Arc<Countdown> {
        Arc::new(Countdown {
            fetches: AtomicU32::new(0),
            fail,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_when_countdown_expires() {
        let src = source(false);
        let status = PeriodicStatus::spawn(src.clone());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(src.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(status.current().cooldown.secs(), 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(status.current().cooldown.secs(), 1);
        assert_eq!(src.fetches.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(src.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(status.current().status, Some(2));

        // Already ready: ticking does not refetch in a loop.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(src.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_returns_fresh_status() {
        let src = source(false);
        let status = PeriodicStatus::spawn(src.clone());

        assert_eq!(status.refresh().await, Some(2));
        assert_eq!(status.current().status, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_keep_error_message() {
        let src = source(true);
        let status = PeriodicStatus::spawn(src.clone());

        assert_eq!(status.refresh().await, None);
        let view = status.current();
        assert!(view.status.is_none());
        assert!(view.error.unwrap().contains("down"));
    }

    #[tokio::test(start_paused = true)]
    async fn follow_waits_for_connection() {
        use crate::connection::ConnectionStatus;
        use client_blockchain_core::Address;

        let src = source(false);
        let (connection_tx, connection) = watch::channel(ConnectionSnapshot::default());
        let status = PeriodicStatus::follow(src.clone(), connection);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(src.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(status.refresh().await, None);

        connection_tx.send_modify(|s| {
            s.status = ConnectionStatus::Connected;
            s.address = Some(Address::repeat_byte(1));
            s.chain_id = Some(56);
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(src.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(status.current().status, Some(1));

        connection_tx.send_replace(ConnectionSnapshot::default());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(status.current().status.is_none());
        assert!(status.current().cooldown.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_loop() {
        let src = source(false);
        let status = PeriodicStatus::spawn(src.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(status);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(Arc::strong_count(&src), 1);
    }
}
