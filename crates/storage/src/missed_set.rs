use std::sync::Arc;

use quiz_core::model::{MissedSet, MissedSetChange, QuestionId};
use tracing::warn;

use crate::repository::{KeyValueStore, StorageError};

/// Storage key holding the JSON-encoded missed set.
pub const MISSED_SET_KEY: &str = "quiz_missed_ids_v1";

/// Persisted set of question ids most recently answered incorrectly.
///
/// Reads never fail: missing, unreadable, or corrupt data is treated as an
/// empty set. Single-writer read-modify-write; no transactions across calls.
#[derive(Clone)]
pub struct MissedSetStore {
    kv: Arc<dyn KeyValueStore>,
}

impl MissedSetStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the whole set, falling back to empty on any failure.
    pub async fn get_all(&self) -> MissedSet {
        let raw = match self.kv.get(MISSED_SET_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return MissedSet::new(),
            Err(err) => {
                warn!(error = %err, "missed set unreadable, treating as empty");
                return MissedSet::new();
            }
        };

        match serde_json::from_str::<MissedSet>(&raw) {
            Ok(set) => set,
            Err(err) => {
                warn!(error = %err, "missed set is corrupt, treating as empty");
                MissedSet::new()
            }
        }
    }

    /// Replace the stored set in one write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn replace_all(&self, ids: &MissedSet) -> Result<(), StorageError> {
        let encoded =
            serde_json::to_string(ids).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(MISSED_SET_KEY, &encoded).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn add(&self, id: &QuestionId) -> Result<(), StorageError> {
        self.apply(&MissedSetChange::Add(id.clone())).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn remove(&self, id: &QuestionId) -> Result<(), StorageError> {
        self.apply(&MissedSetChange::Remove(id.clone())).await
    }

    /// Apply a single membership change, skipping the write when nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn apply(&self, change: &MissedSetChange) -> Result<(), StorageError> {
        let mut set = self.get_all().await;
        if set.apply(change) {
            self.replace_all(&set).await?;
        }
        Ok(())
    }

    /// Forget every missed question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.replace_all(&MissedSet::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    fn store() -> (InMemoryRepository, MissedSetStore) {
        let repo = InMemoryRepository::new();
        let store = MissedSetStore::new(Arc::new(repo.clone()));
        (repo, store)
    }

    #[tokio::test]
    async fn missing_key_reads_as_empty() {
        let (_repo, store) = store();
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_json_reads_as_empty() {
        let (repo, store) = store();
        repo.set(MISSED_SET_KEY, "{not json").await.unwrap();
        assert!(store.get_all().await.is_empty());

        repo.set(MISSED_SET_KEY, r#"{"q1": true}"#).await.unwrap();
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn unreadable_backend_reads_as_empty() {
        let store = MissedSetStore::new(Arc::new(BrokenStore));
        assert!(store.get_all().await.is_empty());
        assert!(store.add(&QuestionId::new("q1")).await.is_err());
    }

    #[tokio::test]
    async fn add_and_remove_round_trip() {
        let (repo, store) = store();
        let q1 = QuestionId::new("q1");
        let q2 = QuestionId::new("q2");

        store.add(&q1).await.unwrap();
        store.add(&q2).await.unwrap();
        store.add(&q1).await.unwrap();
        assert_eq!(
            repo.get(MISSED_SET_KEY).await.unwrap().as_deref(),
            Some(r#"["q1","q2"]"#)
        );

        store.remove(&q1).await.unwrap();
        let set = store.get_all().await;
        assert!(!set.contains(&q1));
        assert!(set.contains(&q2));

        store.clear().await.unwrap();
        assert!(store.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn replace_all_overwrites() {
        let (_repo, store) = store();
        store.add(&QuestionId::new("old")).await.unwrap();

        let replacement: MissedSet = ["a", "b"].into_iter().map(QuestionId::from).collect();
        store.replace_all(&replacement).await.unwrap();
        assert_eq!(store.get_all().await, replacement);
    }
}
