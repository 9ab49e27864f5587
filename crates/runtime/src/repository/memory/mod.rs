//! In-memory storage implementations.

mod store;

pub use store::InMemoryStore;
