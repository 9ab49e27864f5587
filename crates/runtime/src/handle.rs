use std::sync::Arc;

use client_blockchain_core::Address;
use client_blockchain_evm::config::ContractAddresses;
use tokio::sync::{broadcast, watch};

use crate::api::ConnectError;
use crate::clock::Clock;
use crate::connection::{BalanceSnapshot, ConnectionManager, ConnectionSnapshot, Signer};
use crate::events::{Event, EventBus, Topic};
use crate::repository::KeyValueStore;
use crate::tx::{EventCorrelator, TxExecutor};

/// Client-facing handle to the runtime's shared services.
///
/// Screens hold a clone and read the signer from it on every action, so they
/// always act as the currently connected account.
#[derive(Clone)]
pub struct RuntimeHandle {
    connection: ConnectionManager,
    executor: TxExecutor,
    correlator: EventCorrelator,
    store: Arc<dyn KeyValueStore>,
    contracts: ContractAddresses,
}

impl RuntimeHandle {
    pub(crate) fn new(
        connection: ConnectionManager,
        executor: TxExecutor,
        correlator: EventCorrelator,
        store: Arc<dyn KeyValueStore>,
        contracts: ContractAddresses,
    ) -> Self {
        Self {
            connection,
            executor,
            correlator,
            store,
            contracts,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn executor(&self) -> &TxExecutor {
        &self.executor
    }

    pub fn correlator(&self) -> &EventCorrelator {
        &self.correlator
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.connection.clock()
    }

    /// Signer of the connected account, if any.
    pub fn signer(&self) -> Option<Signer> {
        self.connection.snapshot().signer
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.connection.snapshot()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.connection.subscribe()
    }

    pub fn watch_balances(&self) -> watch::Receiver<BalanceSnapshot> {
        self.connection.balances()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.bus().subscribe(topic)
    }

    pub fn bus(&self) -> &EventBus {
        self.connection.bus()
    }

    pub async fn connect(&self) -> Result<Address, ConnectError> {
        self.connection.connect().await
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }
}
