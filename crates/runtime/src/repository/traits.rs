//! Storage traits.

use crate::repository::error::Result;

/// Namespaced string storage, the local equivalent of browser local storage.
///
/// Values are opaque strings (JSON in practice). Implementations must make a
/// `set` visible to subsequent `get`s in the same process.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
