//! Small per-address outcome logs kept for display continuity.

use std::marker::PhantomData;
use std::sync::Arc;

use client_blockchain_core::Address;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::error::Result;
use crate::repository::traits::KeyValueStore;

/// Default number of entries retained per address.
pub const HISTORY_CAPACITY: usize = 3;

/// Newest-first list stored under `{namespace}_{address}`.
///
/// Not authoritative state: unreadable entries are treated as empty.
pub struct HistoryLog<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: &'static str,
    capacity: usize,
    _entry: PhantomData<fn() -> T>,
}

impl<T> Clone for HistoryLog<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace,
            capacity: self.capacity,
            _entry: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> HistoryLog<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &'static str) -> Self {
        Self {
            store,
            namespace,
            capacity: HISTORY_CAPACITY,
            _entry: PhantomData,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn key(&self, address: Address) -> String {
        format!("{}_{}", self.namespace, address)
    }

    pub fn load(&self, address: Address) -> Result<Vec<T>> {
        let Some(raw) = self.store.get(&self.key(address))? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(namespace = self.namespace, "Ignoring unreadable history: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Prepend an entry, drop the oldest beyond capacity, and return the new list.
    pub fn push(&self, address: Address, entry: T) -> Result<Vec<T>> {
        let mut entries = self.load(address)?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        self.store
            .set(&self.key(address), &serde_json::to_string(&entries)?)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, KeyValueStore};

    #[test]
    fn keeps_three_newest_first() {
        let log: HistoryLog<u32> = HistoryLog::new(Arc::new(InMemoryStore::new()), "rollHistory");
        let addr = Address::repeat_byte(7);

        for roll in 1..=5 {
            log.push(addr, roll).unwrap();
        }
        assert_eq!(log.load(addr).unwrap(), vec![5, 4, 3]);
    }

    #[test]
    fn keyed_per_address() {
        let log: HistoryLog<u32> = HistoryLog::new(Arc::new(InMemoryStore::new()), "spinHistory");
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);

        log.push(a, 1).unwrap();
        assert!(log.load(b).unwrap().is_empty());
        assert!(log.key(a).starts_with("spinHistory_0x"));
    }

    #[test]
    fn unreadable_history_is_empty() {
        let backing = Arc::new(InMemoryStore::new());
        let log: HistoryLog<u32> = HistoryLog::new(backing.clone(), "rollHistory");
        let addr = Address::repeat_byte(3);
        backing.set(&log.key(addr), "{oops").unwrap();

        assert!(log.load(addr).unwrap().is_empty());
        assert_eq!(log.push(addr, 9).unwrap(), vec![9]);
    }
}
