//! Wallet connection manager.
//!
//! Single source of truth for "are we connected, as whom, and on which
//! chain". Consumers read [`ConnectionSnapshot`]s from a `watch` channel and
//! act through [`ConnectionManager::connect`] / [`ConnectionManager::disconnect`].
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!                             Connecting --err--> Disconnected
//! Connected --disconnect | accounts [] | unsupported chain--> Disconnected
//! Connected --account changed | chain changed (supported)--> Connected
//! ```
//!
//! All transitions are serialized by one async lock, so a wallet event never
//! interleaves with a half-finished `connect()`.

use std::sync::Arc;

use client_blockchain_core::{
    Address, CODE_UNRECOGNIZED_CHAIN, ChainDescriptor, ChainId, ChainReader, TxError, WalletEvent,
    WalletProvider,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

use crate::api::ConnectError;
use crate::clock::Clock;
use crate::connection::state::{BalanceSnapshot, ConnectionSnapshot, ConnectionStatus, Signer};
use crate::events::{ConnectionEvent, DisconnectReason, EventBus};
use crate::repository::{SessionLookup, SessionStore};

/// What the startup reconnect attempt found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectOutcome {
    Restored(Address),
    NoSession,
    /// The stored session was past its TTL and has been deleted
    Expired,
    /// Stored account or chain no longer matches the wallet; record deleted
    Mismatch,
    /// No wallet present; the stored record is left alone
    Unavailable,
    /// The wallet or storage errored; record deleted where possible
    Failed(String),
}

/// Handle to the connection state machine. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Option<Arc<dyn WalletProvider>>,
    sessions: SessionStore,
    clock: Arc<dyn Clock>,
    chain: ChainDescriptor,
    state: watch::Sender<ConnectionSnapshot>,
    balances: watch::Sender<BalanceSnapshot>,
    bus: EventBus,
    transitions: Mutex<()>,
}

impl ConnectionManager {
    /// `provider` is `None` when no wallet is installed.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        sessions: SessionStore,
        clock: Arc<dyn Clock>,
        chain: ChainDescriptor,
        bus: EventBus,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        let (balances, _) = watch::channel(BalanceSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                sessions,
                clock,
                chain,
                state,
                balances,
                bus,
                transitions: Mutex::new(()),
            }),
        }
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn balances(&self) -> watch::Receiver<BalanceSnapshot> {
        self.inner.balances.subscribe()
    }

    pub fn supported_chain(&self) -> &ChainDescriptor {
        &self.inner.chain
    }

    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.inner.provider.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Ask the wallet for an account and connect with it.
    ///
    /// [`ConnectError::is_silent`] errors are expected user or environment
    /// conditions; the state is left `Disconnected` either way.
    pub async fn connect(&self) -> Result<Address, ConnectError> {
        let _guard = self.inner.transitions.lock().await;

        let Some(provider) = self.inner.provider.clone() else {
            tracing::info!("No wallet provider available");
            return Err(ConnectError::Unavailable);
        };

        self.inner
            .state
            .send_modify(|s| s.status = ConnectionStatus::Connecting);

        match self.request_connection(provider.as_ref()).await {
            Ok((address, chain_id)) => {
                self.establish(&provider, address, chain_id);
                self.persist(address, chain_id);
                self.inner
                    .bus
                    .publish(ConnectionEvent::Connected { address, chain_id });
                tracing::info!(address = %address, chain_id, "Wallet connected");
                Ok(address)
            }
            Err(err) => {
                self.reset_state();
                if err.is_silent() {
                    tracing::info!("Wallet connection not established: {}", err);
                } else {
                    tracing::warn!("Wallet connection failed: {}", err);
                }
                Err(err)
            }
        }
    }

    async fn request_connection(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<(Address, ChainId), ConnectError> {
        let accounts = provider.request_accounts().await?;
        let address = *accounts.first().ok_or(ConnectError::NoAccounts)?;
        let chain_id = provider.chain_id().await?;

        if chain_id != self.inner.chain.chain_id {
            return Err(ConnectError::UnsupportedNetwork {
                expected: self.inner.chain.chain_id,
                actual: chain_id,
            });
        }
        Ok((address, chain_id))
    }

    /// Drop the connection and forget the stored session.
    ///
    /// A no-op when already disconnected: storage is not touched.
    pub async fn disconnect(&self) {
        let _guard = self.inner.transitions.lock().await;
        self.disconnect_locked(DisconnectReason::User);
    }

    /// Restore a stored session without prompting, if the wallet still agrees
    /// with it. Always marks the wallet ready afterwards.
    pub async fn attempt_silent_reconnect(&self) -> ReconnectOutcome {
        let outcome = {
            let _guard = self.inner.transitions.lock().await;
            self.silent_reconnect_locked().await
        };
        self.inner.state.send_modify(|s| s.wallet_ready = true);
        tracing::info!(?outcome, "Silent reconnect finished");
        outcome
    }

    async fn silent_reconnect_locked(&self) -> ReconnectOutcome {
        let record = match self.inner.sessions.load(self.inner.clock.now_millis()) {
            Ok(SessionLookup::Valid(record)) => record,
            Ok(SessionLookup::Missing) | Ok(SessionLookup::Corrupt) => {
                return ReconnectOutcome::NoSession;
            }
            Ok(SessionLookup::Expired) => return ReconnectOutcome::Expired,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                return ReconnectOutcome::Failed(e.to_string());
            }
        };

        let Some(provider) = self.inner.provider.clone() else {
            return ReconnectOutcome::Unavailable;
        };

        let live = async {
            let accounts = provider.accounts().await?;
            let chain_id = provider.chain_id().await?;
            Ok::<_, client_blockchain_core::ProviderError>((accounts, chain_id))
        }
        .await;

        let (accounts, chain_id) = match live {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!("Wallet query failed during reconnect: {}", e);
                self.clear_session();
                return ReconnectOutcome::Failed(e.to_string());
            }
        };

        let account_matches = accounts.first() == Some(&record.address);
        let chain_matches =
            record.chain_id() == Some(chain_id) && chain_id == self.inner.chain.chain_id;
        if !account_matches || !chain_matches {
            tracing::info!(
                stored = %record.address,
                live = ?accounts.first(),
                chain_id,
                "Stored session no longer matches wallet"
            );
            self.clear_session();
            return ReconnectOutcome::Mismatch;
        }

        self.establish(&provider, record.address, chain_id);
        self.inner.bus.publish(ConnectionEvent::Connected {
            address: record.address,
            chain_id,
        });
        ReconnectOutcome::Restored(record.address)
    }

    /// Ask the wallet to select the supported chain, registering it first if
    /// the wallet does not know it.
    pub async fn switch_to_supported_network(&self) -> Result<(), TxError> {
        let provider = self
            .inner
            .provider
            .clone()
            .ok_or_else(|| TxError::Network("no wallet available".into()))?;
        let chain = &self.inner.chain;

        match provider.switch_chain(chain.chain_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some(CODE_UNRECOGNIZED_CHAIN) => {
                tracing::info!(chain_id = chain.chain_id, "Adding chain to wallet");
                provider.add_chain(chain).await?;
                provider.switch_chain(chain.chain_id).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Wallet events
    // ------------------------------------------------------------------

    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        let _guard = self.inner.transitions.lock().await;
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => self.disconnect_locked(DisconnectReason::AccountsRevoked),
                Some(&address) => self.adopt_account(address).await,
            },
            WalletEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id),
            WalletEvent::Disconnected => {
                self.disconnect_locked(DisconnectReason::WalletDisconnected)
            }
        }
    }

    /// Forward wallet notifications into [`Self::handle_wallet_event`].
    pub fn spawn_event_listener(&self) -> Option<JoinHandle<()>> {
        let mut events = self.inner.provider.as_ref()?.subscribe();
        let manager = self.clone();

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => manager.handle_wallet_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Wallet event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Wallet event listener stopped");
        }))
    }

    async fn adopt_account(&self, address: Address) {
        let current = self.snapshot();
        if !current.is_connected() {
            tracing::debug!(address = %address, "Ignoring account change while disconnected");
            return;
        }
        let Some(provider) = self.inner.provider.clone() else {
            return;
        };

        let chain_id = match provider.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                tracing::warn!("Chain query failed after account change: {}", e);
                current.chain_id.unwrap_or(self.inner.chain.chain_id)
            }
        };
        if chain_id != self.inner.chain.chain_id {
            self.disconnect_locked(DisconnectReason::UnsupportedChain);
            return;
        }

        if current.address != Some(address) {
            self.inner.balances.send_replace(BalanceSnapshot::default());
        }
        self.establish(&provider, address, chain_id);
        self.persist(address, chain_id);
        self.inner
            .bus
            .publish(ConnectionEvent::AccountChanged { address });
        tracing::info!(address = %address, "Wallet account changed");
    }

    fn on_chain_changed(&self, chain_id: ChainId) {
        let current = self.snapshot();
        let Some((address, _)) = current.identity() else {
            tracing::debug!(chain_id, "Ignoring chain change while disconnected");
            return;
        };

        if chain_id != self.inner.chain.chain_id {
            tracing::warn!(
                chain_id,
                supported = self.inner.chain.chain_id,
                "Wallet switched to unsupported network"
            );
            self.disconnect_locked(DisconnectReason::UnsupportedChain);
            return;
        }

        let Some(provider) = self.inner.provider.clone() else {
            return;
        };
        self.establish(&provider, address, chain_id);
        self.persist(address, chain_id);
        self.inner
            .bus
            .publish(ConnectionEvent::ChainChanged { chain_id });
    }

    // ------------------------------------------------------------------
    // Internals (caller holds the transition lock)
    // ------------------------------------------------------------------

    fn establish(&self, provider: &Arc<dyn WalletProvider>, address: Address, chain_id: ChainId) {
        let signer = Signer::new(Arc::clone(provider), address, chain_id);
        self.inner.state.send_modify(|s| {
            s.status = ConnectionStatus::Connected;
            s.address = Some(address);
            s.chain_id = Some(chain_id);
            s.signer = Some(signer);
        });
    }

    fn persist(&self, address: Address, chain_id: ChainId) {
        if let Err(e) = self
            .inner
            .sessions
            .save(address, chain_id, self.inner.clock.now_millis())
        {
            tracing::warn!("Failed to persist session: {}", e);
        }
    }

    fn clear_session(&self) {
        if let Err(e) = self.inner.sessions.clear() {
            tracing::warn!("Failed to clear session: {}", e);
        }
    }

    fn reset_state(&self) {
        self.inner.state.send_modify(|s| {
            s.status = ConnectionStatus::Disconnected;
            s.address = None;
            s.chain_id = None;
            s.signer = None;
        });
        self.inner.balances.send_replace(BalanceSnapshot::default());
    }

    fn disconnect_locked(&self, reason: DisconnectReason) {
        if self.inner.state.borrow().status == ConnectionStatus::Disconnected {
            tracing::debug!(?reason, "Already disconnected");
            return;
        }
        self.reset_state();
        self.clear_session();
        self.inner
            .bus
            .publish(ConnectionEvent::Disconnected { reason });
        tracing::info!(?reason, "Wallet disconnected");
    }

    /// Publish balances fetched for `address`, unless the connection moved on
    /// while they were in flight. Returns whether they were published.
    pub(crate) async fn publish_balances(&self, address: Address, balances: BalanceSnapshot) -> bool {
        let _guard = self.inner.transitions.lock().await;
        let current = self.inner.state.borrow().identity();
        match current {
            Some((connected, _)) if connected == address => {
                self.inner.balances.send_replace(balances);
                true
            }
            _ => {
                tracing::debug!(address = %address, "Dropping balances for stale address");
                false
            }
        }
    }
}
