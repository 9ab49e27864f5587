//! Persisted memory of the last successful wallet connection.

use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{Address, ChainId};
use serde::{Deserialize, Serialize};

use crate::repository::error::Result;
use crate::repository::traits::KeyValueStore;

/// Storage key of the session record.
pub const SESSION_KEY: &str = "lastWalletConnection";

/// How long a stored session may be honored after it was written.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// `{ address, chainId, timestamp }` as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub address: Address,

    /// Decimal chain id, kept as a string for layout compatibility
    #[serde(rename = "chainId")]
    pub chain_id: String,

    /// Creation time in Unix milliseconds
    pub timestamp: i64,
}

impl SessionRecord {
    pub fn new(address: Address, chain_id: ChainId, timestamp: i64) -> Self {
        Self {
            address,
            chain_id: chain_id.to_string(),
            timestamp,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id.parse().ok()
    }

    pub fn is_expired(&self, now_millis: i64, ttl: Duration) -> bool {
        now_millis.saturating_sub(self.timestamp) > ttl.as_millis() as i64
    }
}

/// Result of reading the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Missing,
    /// Older than the TTL; already removed from storage
    Expired,
    /// Unparseable; already removed from storage
    Corrupt,
    Valid(SessionRecord),
}

/// Session record persistence with expiry.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ttl: SESSION_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the record. Expired or corrupt records are deleted before
    /// returning, so none outlives its window once looked at.
    pub fn load(&self, now_millis: i64) -> Result<SessionLookup> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(SessionLookup::Missing);
        };

        let record = match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Discarding unreadable session record: {}", e);
                self.store.remove(SESSION_KEY)?;
                return Ok(SessionLookup::Corrupt);
            }
        };

        if record.is_expired(now_millis, self.ttl) {
            tracing::info!(address = %record.address, "Stored session expired");
            self.store.remove(SESSION_KEY)?;
            return Ok(SessionLookup::Expired);
        }

        Ok(SessionLookup::Valid(record))
    }

    pub fn save(&self, address: Address, chain_id: ChainId, now_millis: i64) -> Result<()> {
        let record = SessionRecord::new(address, chain_id, now_millis);
        self.store
            .set(SESSION_KEY, &serde_json::to_string(&record)?)?;
        tracing::debug!(address = %address, chain_id, "Session persisted");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryStore, KeyValueStore};

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn store() -> (Arc<InMemoryStore>, SessionStore) {
        let backing = Arc::new(InMemoryStore::new());
        let sessions = SessionStore::new(backing.clone());
        (backing, sessions)
    }

    #[test]
    fn layout_uses_camel_case_chain_id() {
        let record = SessionRecord::new(Address::repeat_byte(0xab), 56, 1_700_000_000_000);
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert_eq!(json["chainId"], "56");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
        assert!(json["address"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn valid_within_ttl() {
        let (_, sessions) = store();
        sessions.save(Address::repeat_byte(1), 56, 0).unwrap();

        match sessions.load(7 * DAY_MS).unwrap() {
            SessionLookup::Valid(record) => assert_eq!(record.chain_id(), Some(56)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn expired_record_is_deleted() {
        let (backing, sessions) = store();
        sessions.save(Address::repeat_byte(1), 56, 0).unwrap();

        assert_eq!(sessions.load(7 * DAY_MS + 1).unwrap(), SessionLookup::Expired);
        assert_eq!(backing.get(SESSION_KEY).unwrap(), None);
        assert_eq!(sessions.load(7 * DAY_MS + 1).unwrap(), SessionLookup::Missing);
    }

    #[test]
    fn corrupt_record_is_deleted() {
        let (backing, sessions) = store();
        backing.set(SESSION_KEY, "not json").unwrap();

        assert_eq!(sessions.load(0).unwrap(), SessionLookup::Corrupt);
        assert_eq!(backing.get(SESSION_KEY).unwrap(), None);
    }
}
