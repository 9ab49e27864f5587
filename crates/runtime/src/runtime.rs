//! High-level runtime orchestrator.
//!
//! The runtime owns the connection manager and background workers and hands
//! out a cloneable [`RuntimeHandle`] to the screens.

use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{ChainDescriptor, WalletProvider};
use client_blockchain_evm::config::ContractAddresses;
use tokio::task::JoinHandle;

use crate::api::{Result, RuntimeError};
use crate::clock::{Clock, SystemClock};
use crate::connection::{ConnectionManager, ReconnectOutcome};
use crate::events::EventBus;
use crate::handle::RuntimeHandle;
use crate::repository::{InMemoryStore, KeyValueStore, SESSION_TTL, SessionStore};
use crate::retry::RetryPolicy;
use crate::tx::{EventCorrelator, TxConfig, TxExecutor};
use crate::workers::{BALANCE_POLL_INTERVAL, BalancePoller};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
    pub balance_poll_interval: Duration,
    pub session_ttl: Duration,
    pub tx: TxConfig,
    /// Backoff for event lookups after a confirmed transaction
    pub event_retry: RetryPolicy,
    pub contracts: ContractAddresses,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            balance_poll_interval: BALANCE_POLL_INTERVAL,
            session_ttl: SESSION_TTL,
            tx: TxConfig::default(),
            event_retry: RetryPolicy::default(),
            contracts: ContractAddresses::default(),
        }
    }
}

/// Owns the background tasks. Dropping it stops them.
pub struct Runtime {
    handle: RuntimeHandle,
    reconnect: ReconnectOutcome,

    // Background workers: wallet event listener and balance poller
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Result of the startup session restore.
    pub fn reconnect_outcome(&self) -> &ReconnectOutcome {
        &self.reconnect
    }

    /// Stop the background workers and wait for them to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        for handle in std::mem::take(&mut self.workers) {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(RuntimeError::WorkerJoin(e)),
            }
        }
        tracing::info!("Runtime stopped");
        Ok(())
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        for handle in &self.workers {
            handle.abort();
        }
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    provider: Option<Arc<dyn WalletProvider>>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    chain: Option<ChainDescriptor>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            provider: None,
            store: None,
            clock: None,
            chain: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Wallet to connect through. Without one the runtime stays disconnected.
    pub fn provider(mut self, provider: Arc<dyn WalletProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Persistent key-value storage (default: in-memory)
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Time source (default: system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The one network the application supports (required)
    pub fn chain(mut self, chain: ChainDescriptor) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Build the runtime, restore any stored session and start the workers.
    pub async fn build(self) -> Result<Runtime> {
        let chain = self.chain.ok_or(RuntimeError::MissingChain)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let bus = EventBus::with_capacity(self.config.event_buffer_size);

        let sessions = SessionStore::new(Arc::clone(&store)).with_ttl(self.config.session_ttl);
        let connection = ConnectionManager::new(self.provider, sessions, clock, chain, bus.clone());

        let mut workers = Vec::with_capacity(2);
        match connection.spawn_event_listener() {
            Some(listener) => workers.push(listener),
            None => tracing::info!("No wallet provider configured"),
        }

        let reconnect = connection.attempt_silent_reconnect().await;

        let poller = BalancePoller::new(connection.clone(), self.config.contracts.token)
            .with_poll_interval(self.config.balance_poll_interval);
        workers.push(tokio::spawn(async move {
            poller.run().await;
        }));

        let executor = TxExecutor::new(bus, self.config.tx);
        let correlator = EventCorrelator::new(self.config.event_retry);
        let handle = RuntimeHandle::new(
            connection,
            executor,
            correlator,
            store,
            self.config.contracts,
        );

        Ok(Runtime {
            handle,
            reconnect,
            workers,
        })
    }
}
