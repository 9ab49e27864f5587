//! Topic-based event bus for runtime events.
//!
//! Events are published to specific topics, and consumers subscribe only to
//! the topics they need. Continuous state (connection snapshot, balances,
//! screen status) is published through `watch` channels instead.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{ConnectionEvent, DisconnectReason, TxEvent, TxStage};
