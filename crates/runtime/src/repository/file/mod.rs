//! File-based storage implementations.

mod store;

pub use store::FileStore;
