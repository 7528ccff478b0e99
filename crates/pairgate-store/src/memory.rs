//! In-process store implementation backed by `tokio::sync::RwLock`.
//!
//! This is the store the bundled binary and the test suites run against.
//! It honors the same contract an external store must: `update_if` holds
//! the write lock across predicate and mutation, so it is a true
//! compare-and-set — two racing grant transitions serialize here, and
//! exactly one sees its precondition hold.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    RateLimitRecord, RateLimitStore, SessionRecord, SessionStore, StoreError,
};

/// In-memory session keyspace. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored. Test/diagnostic helper.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(
        &self,
        code: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(code).cloned())
    }

    async fn put(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(record.pairing_code.clone(), record);
        Ok(())
    }

    async fn update_if<P, U>(
        &self,
        code: &str,
        predicate: P,
        apply: U,
    ) -> Result<bool, StoreError>
    where
        P: FnOnce(&SessionRecord) -> bool + Send,
        U: FnOnce(&mut SessionRecord) + Send,
    {
        // The write lock spans predicate and mutation: this is the atomic
        // step the whole protocol leans on.
        let mut map = self.sessions.write().await;
        match map.get_mut(code) {
            Some(record) if predicate(record) => {
                apply(record);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, code: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(code);
        Ok(())
    }
}

/// In-memory rate-limit keyspace. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryRateLimitStore {
    records: Arc<RwLock<HashMap<(String, String), RateLimitRecord>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn get(
        &self,
        code: &str,
        source: &str,
    ) -> Result<Option<RateLimitRecord>, StoreError> {
        let key = (code.to_string(), source.to_string());
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn put(&self, record: RateLimitRecord) -> Result<(), StoreError> {
        let key = (
            record.pairing_code.clone(),
            record.source_address.clone(),
        );
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn delete(
        &self,
        code: &str,
        source: &str,
    ) -> Result<(), StoreError> {
        let key = (code.to_string(), source.to_string());
        self.records.write().await.remove(&key);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionStatus;

    fn record(code: &str) -> SessionRecord {
        SessionRecord {
            pairing_code: code.into(),
            device_id: "r1".into(),
            created_at: 0,
            expires_at: 1_000_000,
            status: SessionStatus::Active,
            connected: false,
            connected_at: None,
            disconnected_at: None,
            stale_disconnect_at: None,
            connection_token: None,
            authorized_source: None,
            channel_name: format!("pairgate_{code}"),
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = MemorySessionStore::new();
        assert!(store.get("AB12CD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_returns_record() {
        let store = MemorySessionStore::new();
        store.put(record("AB12CD")).await.unwrap();

        let got = store.get("AB12CD").await.unwrap().expect("present");
        assert_eq!(got.pairing_code, "AB12CD");
    }

    #[tokio::test]
    async fn test_put_replaces_existing_record() {
        let store = MemorySessionStore::new();
        store.put(record("AB12CD")).await.unwrap();

        let mut updated = record("AB12CD");
        updated.device_id = "r2".into();
        store.put(updated).await.unwrap();

        let got = store.get("AB12CD").await.unwrap().unwrap();
        assert_eq!(got.device_id, "r2");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_an_error() {
        let store = MemorySessionStore::new();
        store.delete("AB12CD").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_if_applies_when_predicate_holds() {
        let store = MemorySessionStore::new();
        store.put(record("AB12CD")).await.unwrap();

        let applied = store
            .update_if(
                "AB12CD",
                |r| !r.connected,
                |r| {
                    r.connected = true;
                    r.status = SessionStatus::Connected;
                },
            )
            .await
            .unwrap();

        assert!(applied);
        let got = store.get("AB12CD").await.unwrap().unwrap();
        assert!(got.connected);
        assert_eq!(got.status, SessionStatus::Connected);
    }

    #[tokio::test]
    async fn test_update_if_rejects_when_predicate_fails() {
        let store = MemorySessionStore::new();
        let mut r = record("AB12CD");
        r.connected = true;
        store.put(r).await.unwrap();

        let applied = store
            .update_if("AB12CD", |r| !r.connected, |r| r.connected = true)
            .await
            .unwrap();

        assert!(!applied);
    }

    #[tokio::test]
    async fn test_update_if_missing_record_returns_false() {
        let store = MemorySessionStore::new();
        let applied = store
            .update_if("AB12CD", |_| true, |r| r.connected = true)
            .await
            .unwrap();
        assert!(!applied);
    }

    #[tokio::test]
    async fn test_update_if_is_exclusive_under_contention() {
        // Many concurrent grant attempts against one idle record: the CAS
        // must admit exactly one.
        let store = MemorySessionStore::new();
        store.put(record("AB12CD")).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .update_if(
                        "AB12CD",
                        |r| !r.connected,
                        |r| r.connected = true,
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1, "exactly one CAS must win");
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let store = MemorySessionStore::new();
        let other = store.clone();
        store.put(record("AB12CD")).await.unwrap();

        assert!(other.get("AB12CD").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rate_limit_put_get_delete_round_trip() {
        let store = MemoryRateLimitStore::new();
        store
            .put(RateLimitRecord {
                pairing_code: "AB12CD".into(),
                source_address: "1.2.3.4".into(),
                failed_attempts: 3,
                lockout_until: 0,
                last_attempt: 42,
            })
            .await
            .unwrap();

        let got = store
            .get("AB12CD", "1.2.3.4")
            .await
            .unwrap()
            .expect("present");
        assert_eq!(got.failed_attempts, 3);

        store.delete("AB12CD", "1.2.3.4").await.unwrap();
        assert!(store.get("AB12CD", "1.2.3.4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_keyed_by_code_and_source() {
        // Same code, different sources: independent records.
        let store = MemoryRateLimitStore::new();
        for source in ["1.2.3.4", "5.6.7.8"] {
            store
                .put(RateLimitRecord {
                    pairing_code: "AB12CD".into(),
                    source_address: source.into(),
                    failed_attempts: 1,
                    lockout_until: 0,
                    last_attempt: 0,
                })
                .await
                .unwrap();
        }

        store.delete("AB12CD", "1.2.3.4").await.unwrap();
        assert!(store.get("AB12CD", "1.2.3.4").await.unwrap().is_none());
        assert!(store.get("AB12CD", "5.6.7.8").await.unwrap().is_some());
    }
}
