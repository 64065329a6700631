use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use quest_core::model::{ProgressRecord, QuestId};
use storage::repository::KeyValueStore;

pub const PROGRESS_KEY: &str = "sgxp.quest_progress";

pub type ProgressMap = BTreeMap<QuestId, ProgressRecord>;

/// Per-quest completion state, stored as one JSON object keyed by quest id.
///
/// Storage failures never reach the caller: reads come back empty and writes
/// are dropped, with a warning logged. Unreadable JSON counts as an empty
/// mapping. Concurrent writers race last-write-wins.
#[derive(Clone)]
pub struct LocalProgressStore {
    store: Arc<dyn KeyValueStore>,
}

impl LocalProgressStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, id: QuestId) -> Option<ProgressRecord> {
        self.read_map().await?.remove(&id)
    }

    /// Every stored record; empty when storage is unusable.
    pub async fn load_all(&self) -> ProgressMap {
        self.read_map().await.unwrap_or_default()
    }

    pub async fn save(&self, id: QuestId, record: &ProgressRecord) {
        let Some(mut map) = self.read_map().await else {
            return;
        };
        map.insert(id, record.clone());
        self.write_map(&map).await;
    }

    pub async fn remove(&self, id: QuestId) {
        let Some(mut map) = self.read_map().await else {
            return;
        };
        if map.remove(&id).is_some() {
            self.write_map(&map).await;
        }
    }

    /// Drop records for ids outside `keep`.
    pub async fn retain(&self, keep: &BTreeSet<QuestId>) {
        let Some(mut map) = self.read_map().await else {
            return;
        };
        let before = map.len();
        map.retain(|id, _| keep.contains(id));
        if map.len() != before {
            self.write_map(&map).await;
        }
    }

    pub async fn clear(&self) {
        if let Err(error) = self.store.remove(PROGRESS_KEY).await {
            tracing::warn!(%error, "failed to clear quest progress");
        }
    }

    /// `None` only when storage itself failed.
    async fn read_map(&self) -> Option<ProgressMap> {
        let raw = match self.store.get(PROGRESS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(ProgressMap::new()),
            Err(error) => {
                tracing::warn!(%error, "quest progress storage unavailable");
                return None;
            }
        };
        if raw.is_empty() {
            return Some(ProgressMap::new());
        }
        match serde_json::from_str::<ProgressMap>(&raw) {
            Ok(map) => Some(map),
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable quest progress");
                Some(ProgressMap::new())
            }
        }
    }

    async fn write_map(&self, map: &ProgressMap) {
        let raw = match serde_json::to_string(map) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(%error, "failed to encode quest progress");
                return;
            }
        };
        if let Err(error) = self.store.set(PROGRESS_KEY, &raw).await {
            tracing::warn!(%error, "failed to save quest progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_core::model::StepId;
    use storage::repository::{InMemoryStore, UnavailableStore};

    fn record(done: &[(u64, u64)]) -> ProgressRecord {
        let mut record = ProgressRecord::default();
        for (step, reward) in done {
            record.step_status.insert(StepId::new(*step), true);
            record.earned += reward;
        }
        record
    }

    #[tokio::test]
    async fn saves_and_loads_by_quest_id() {
        let store = LocalProgressStore::new(Arc::new(InMemoryStore::new()));
        assert_eq!(store.load(QuestId::new(1)).await, None);

        store.save(QuestId::new(1), &record(&[(2, 20)])).await;
        store.save(QuestId::new(2), &record(&[(1, 10)])).await;

        assert_eq!(store.load(QuestId::new(1)).await, Some(record(&[(2, 20)])));
        assert_eq!(store.load_all().await.len(), 2);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let store = LocalProgressStore::new(Arc::new(InMemoryStore::new()));
        store.save(QuestId::new(1), &record(&[(1, 10)])).await;
        store.save(QuestId::new(2), &record(&[(1, 10)])).await;

        store.remove(QuestId::new(1)).await;
        assert_eq!(store.load(QuestId::new(1)).await, None);
        assert!(store.load(QuestId::new(2)).await.is_some());

        store.clear().await;
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn retain_prunes_unknown_ids() {
        let store = LocalProgressStore::new(Arc::new(InMemoryStore::new()));
        for id in 1..=3 {
            store.save(QuestId::new(id), &record(&[(1, 10)])).await;
        }
        let keep: BTreeSet<QuestId> = [QuestId::new(2)].into_iter().collect();
        store.retain(&keep).await;

        let ids: Vec<QuestId> = store.load_all().await.into_keys().collect();
        assert_eq!(ids, vec![QuestId::new(2)]);
    }

    #[tokio::test]
    async fn corrupted_content_reads_as_empty_and_is_replaced() {
        let kv = Arc::new(InMemoryStore::new());
        kv.set(PROGRESS_KEY, "{not json").await.unwrap();
        let store = LocalProgressStore::new(kv.clone());

        assert_eq!(store.load(QuestId::new(1)).await, None);

        store.save(QuestId::new(4), &record(&[(1, 10)])).await;
        let raw = kv.get(PROGRESS_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"4":{"earned":10,"step_status":{"1":true}}}"#);
    }

    #[tokio::test]
    async fn unavailable_storage_is_a_no_op() {
        let store = LocalProgressStore::new(Arc::new(UnavailableStore));
        store.save(QuestId::new(1), &record(&[(1, 10)])).await;
        assert_eq!(store.load(QuestId::new(1)).await, None);
        store.remove(QuestId::new(1)).await;
        store.clear().await;
        assert!(store.load_all().await.is_empty());
    }
}
