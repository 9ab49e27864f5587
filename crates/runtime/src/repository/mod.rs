//! Local persistence.
//!
//! Everything here is advisory client-side memory (the last session, recent
//! outcomes). Authoritative state lives in the contracts.

mod error;
mod file;
mod history;
mod memory;
mod session;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileStore;
pub use history::{HISTORY_CAPACITY, HistoryLog};
pub use memory::InMemoryStore;
pub use session::{SESSION_KEY, SESSION_TTL, SessionLookup, SessionRecord, SessionStore};
pub use traits::KeyValueStore;
