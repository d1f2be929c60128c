//! In-memory document store.
//!
//! The counterpart of the hosted store for tests and offline experiments:
//! it assigns ids and server timestamps the way the service would, but keeps
//! everything in process memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use crate::entry::JournalEntry;
use crate::error::{Error, Result};
use crate::store::DocumentStore;

/// An in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<JournalEntry>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all collections.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections
            .lock()
            .expect("store lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, entry: &JournalEntry) -> Result<String> {
        let id = format!("entry-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);

        let mut stored = entry.clone();
        stored.id = Some(id.clone());
        // The hosted service stamps its own clock on arrival.
        stored.server_timestamp = Some(Utc::now());

        self.collections
            .lock()
            .map_err(|_| Error::write_failed("store lock poisoned"))?
            .entry(collection.to_string())
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn query_by_owner(&self, collection: &str, owner: &str) -> Result<Vec<JournalEntry>> {
        let collections = self
            .collections
            .lock()
            .map_err(|_| Error::query_failed("store lock poisoned"))?;
        Ok(collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.owner_id == owner)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| Error::delete_failed("store lock poisoned"))?;
        let entries = collections
            .get_mut(collection)
            .ok_or_else(|| Error::delete_failed(format!("no such collection: {collection}")))?;

        let before = entries.len();
        entries.retain(|entry| entry.id.as_deref() != Some(id));
        if entries.len() == before {
            return Err(Error::delete_failed(format!("no entry with id {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;

    const COLLECTION: &str = "entries";

    fn entry_for(owner: &str, caption: &str) -> JournalEntry {
        JournalEntry::new(
            &Identity::new(owner),
            "https://img.example/a.jpg",
            caption,
        )
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_server_timestamp() {
        let store = MemoryStore::new();
        let id = store
            .insert(COLLECTION, &entry_for("u1", "oak leaf"))
            .await
            .unwrap();

        let entries = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some(id.as_str()));
        assert!(entries[0].server_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_owner_isolation() {
        let store = MemoryStore::new();
        store.insert(COLLECTION, &entry_for("u1", "a")).await.unwrap();
        store.insert(COLLECTION, &entry_for("u2", "b")).await.unwrap();
        store.insert(COLLECTION, &entry_for("u1", "c")).await.unwrap();

        let u1 = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(u1.len(), 2);
        assert!(u1.iter().all(|entry| entry.owner_id == "u1"));

        let u2 = store.query_by_owner(COLLECTION, "u2").await.unwrap();
        assert_eq!(u2.len(), 1);
        assert_eq!(u2[0].caption, "b");
    }

    #[tokio::test]
    async fn test_n_inserts_return_n_entries() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store
                .insert(COLLECTION, &entry_for("u1", &format!("entry {i}")))
                .await
                .unwrap();
        }

        let entries = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(entries.len(), 7);
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_entry() {
        let store = MemoryStore::new();
        let keep = store.insert(COLLECTION, &entry_for("u1", "keep")).await.unwrap();
        let gone = store.insert(COLLECTION, &entry_for("u1", "gone")).await.unwrap();

        store.delete(COLLECTION, &gone).await.unwrap();

        let entries = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some(keep.as_str()));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let store = MemoryStore::new();
        store.insert(COLLECTION, &entry_for("u1", "only")).await.unwrap();

        let err = store.delete(COLLECTION, "entry-999").await.unwrap_err();
        assert!(matches!(err, Error::DeleteFailed { .. }));

        // The existing entry is untouched.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_query_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let entries = store.query_by_owner("other", "u1").await.unwrap();
        assert!(entries.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_query_delete_scenario() {
        // identity "u1": create one captioned entry, see exactly it, delete
        // it, see nothing.
        let store = MemoryStore::new();
        let mut entry = entry_for("u1", "oak leaf");
        entry.created_at = "2024-05-10T12:00:00Z".parse().unwrap();

        let id = store.insert(COLLECTION, &entry).await.unwrap();

        let found = store.query_by_owner(COLLECTION, "u1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].caption, "oak leaf");

        store.delete(COLLECTION, &id).await.unwrap();
        assert!(store
            .query_by_owner(COLLECTION, "u1")
            .await
            .unwrap()
            .is_empty());
    }
}
