//! Runtime services for the Gipie rewards client.
//!
//! This crate wires the wallet provider, local storage and background tasks
//! into one runtime. Consumers build a [`Runtime`], then act through the
//! cloneable [`RuntimeHandle`] it hands out.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`connection`] owns the wallet connection state machine
//! - [`tx`] submits transactions and recovers their emitted events
//! - [`status`] drives per-screen status refresh and cooldowns
//! - [`events`] provides the topic-based event bus
//! - [`repository`] provides key-value storage, sessions and history
//! - [`workers`] keeps background tasks (balance polling)
pub mod api;
pub mod clock;
pub mod connection;
pub mod contract;
pub mod events;
pub mod repository;
pub mod retry;
pub mod runtime;
pub mod status;
pub mod tx;
pub mod workers;

mod handle;

pub use api::{ConnectError, Result, RuntimeError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{
    BalanceSnapshot, ConnectionManager, ConnectionSnapshot, ConnectionStatus, ReconnectOutcome,
    Signer,
};
pub use contract::call_view;
pub use events::{
    ConnectionEvent, DisconnectReason, Event, EventBus, Topic, TxEvent, TxStage,
};
pub use handle::RuntimeHandle;
pub use repository::{
    FileStore, HISTORY_CAPACITY, HistoryLog, InMemoryStore, KeyValueStore, RepositoryError,
    SessionStore,
};
pub use retry::RetryPolicy;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use status::{Cooldown, CooldownStyle, PeriodicStatus, StatusSource, StatusView};
pub use tx::{EventCorrelator, TxConfig, TxExecutor, TxFailure, TxMetrics};
