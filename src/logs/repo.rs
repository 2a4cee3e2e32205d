use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use time::{Date, Duration, PrimitiveDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::logs::repo_types::UserLogs;
use crate::storage::StorageClient;

pub const DEFAULT_RETENTION_DAYS: u16 = 30;

/// Per-user log persistence with retention pruning.
///
/// Loads and saves for the same user are not coordinated: two overlapping
/// requests can interleave and the last save wins.
///
/// Every load writes, so the first visit of any new cookie leaves a
/// `{user_id}.json` holding `{}` behind. Nothing removes those files.
#[derive(Clone)]
pub struct LogStore {
    storage: Arc<dyn StorageClient>,
    retention_days: u16,
}

impl LogStore {
    pub fn new(storage: Arc<dyn StorageClient>, retention_days: u16) -> Self {
        Self {
            storage,
            retention_days,
        }
    }

    fn key(user_id: Uuid) -> String {
        format!("{}.json", user_id)
    }

    /// Reads the user's logs, drops days older than the retention window and
    /// writes the pruned result back.
    ///
    /// `now` is the local wall-clock time. Missing, unreadable and corrupt data
    /// all come back as empty logs; corrupt data is overwritten by the save.
    /// Only the write can fail.
    pub async fn load(&self, user_id: Uuid, now: PrimitiveDateTime) -> anyhow::Result<UserLogs> {
        let mut logs = self.read(user_id).await;

        let cutoff = now
            .checked_sub(Duration::days(i64::from(self.retention_days)))
            .unwrap_or(Date::MIN.midnight());
        let dropped = logs.retain_days(|d| d.date().midnight() >= cutoff);
        if dropped > 0 {
            debug!(%user_id, dropped, "pruned expired days");
        }

        self.save(user_id, &logs).await?;
        Ok(logs)
    }

    pub async fn save(&self, user_id: Uuid, logs: &UserLogs) -> anyhow::Result<()> {
        let body = serde_json::to_vec_pretty(logs).context("serialize logs")?;
        self.storage
            .put_object(&Self::key(user_id), Bytes::from(body))
            .await
            .with_context(|| format!("save logs for {}", user_id))
    }

    async fn read(&self, user_id: Uuid) -> UserLogs {
        let body = match self.storage.get_object(&Self::key(user_id)).await {
            Ok(Some(body)) => body,
            Ok(None) => return UserLogs::new(),
            Err(e) => {
                warn!(error = %e, %user_id, "logs unreadable; starting empty");
                return UserLogs::new();
            }
        };
        match serde_json::from_slice(&body) {
            Ok(logs) => logs,
            Err(e) => {
                warn!(error = %e, %user_id, "logs corrupt; discarding");
                UserLogs::new()
            }
        }
    }
}

#[cfg(test)]
mod log_store_tests {
    use super::*;
    use crate::logs::repo_types::{FoodEntry, LogDate};
    use crate::storage::{FileStorage, MemoryStorage};
    use async_trait::async_trait;
    use time::macros::datetime;

    fn store() -> (LogStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (LogStore::new(storage.clone(), 30), storage)
    }

    fn day(now: PrimitiveDateTime, days_ago: i64) -> LogDate {
        LogDate((now - Duration::days(days_ago)).date())
    }

    #[tokio::test]
    async fn load_prunes_days_outside_retention() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 14:30);

        let mut logs = UserLogs::new();
        for ago in [0, 29, 30, 31] {
            logs.append(day(now, ago), [FoodEntry::new("rice", 10.0)]);
        }
        store.save(user, &logs).await.unwrap();

        let loaded = store.load(user, now).await.unwrap();
        assert!(loaded.contains(day(now, 0)));
        assert!(loaded.contains(day(now, 29)));
        assert!(!loaded.contains(day(now, 30)));
        assert!(!loaded.contains(day(now, 31)));
    }

    #[tokio::test]
    async fn day_starting_exactly_at_cutoff_is_kept() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 0:00);

        let mut logs = UserLogs::new();
        logs.append(day(now, 30), [FoodEntry::new("rice", 10.0)]);
        logs.append(day(now, 31), [FoodEntry::new("rice", 10.0)]);
        store.save(user, &logs).await.unwrap();

        let loaded = store.load(user, now).await.unwrap();
        assert_eq!(loaded.dates_desc(), vec![day(now, 30)]);
    }

    #[tokio::test]
    async fn pruned_result_is_written_back() {
        let (store, storage) = store();
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 12:00);

        let mut logs = UserLogs::new();
        logs.append(day(now, 45), [FoodEntry::new("old", 1.0)]);
        logs.append(day(now, 1), [FoodEntry::new("new", 2.0)]);
        store.save(user, &logs).await.unwrap();

        store.load(user, now).await.unwrap();

        let raw = storage
            .get_object(&format!("{}.json", user))
            .await
            .unwrap()
            .unwrap();
        let persisted: UserLogs = serde_json::from_slice(&raw).unwrap();
        assert_eq!(persisted.dates_desc(), vec![day(now, 1)]);
    }

    #[tokio::test]
    async fn load_then_save_is_idempotent() {
        let (store, _) = store();
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 9:15);

        let mut logs = UserLogs::new();
        logs.append(day(now, 0), [FoodEntry::new("apple", 25.0)]);
        logs.append(day(now, 40), [FoodEntry::new("bread", 15.0)]);
        store.save(user, &logs).await.unwrap();

        let first = store.load(user, now).await.unwrap();
        store.save(user, &first).await.unwrap();
        let second = store.load(user, now).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn corrupt_bytes_load_as_empty() {
        let (store, storage) = store();
        let user = Uuid::new_v4();
        storage
            .put_object(&format!("{}.json", user), Bytes::from_static(b"{\"2026-10-19\": [tru"))
            .await
            .unwrap();

        let loaded = store.load(user, datetime!(2026-10-19 8:00)).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_loads_empty() {
        let (store, _) = store();
        let loaded = store
            .load(Uuid::new_v4(), datetime!(2026-10-19 8:00))
            .await
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn first_load_persists_empty_document() {
        let (store, storage) = store();
        let user = Uuid::new_v4();
        store.load(user, datetime!(2026-10-19 8:00)).await.unwrap();

        let raw = storage
            .get_object(&format!("{}.json", user))
            .await
            .unwrap()
            .expect("load writes the document");
        let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn widest_retention_does_not_overflow() {
        let store = LogStore::new(Arc::new(MemoryStorage::new()), u16::MAX);
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 8:00);

        let mut logs = UserLogs::new();
        logs.append(day(now, 3650), [FoodEntry::new("rice", 10.0)]);
        store.save(user, &logs).await.unwrap();

        let loaded = store.load(user, now).await.unwrap();
        assert!(loaded.contains(day(now, 3650)));
    }

    struct BrokenStorage;

    #[async_trait]
    impl StorageClient for BrokenStorage {
        async fn get_object(&self, _key: &str) -> anyhow::Result<Option<Bytes>> {
            anyhow::bail!("disk on fire")
        }
        async fn put_object(&self, _key: &str, _body: Bytes) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    #[tokio::test]
    async fn read_failure_is_swallowed_but_write_failure_propagates() {
        let store = LogStore::new(Arc::new(BrokenStorage), 30);
        let err = store
            .load(Uuid::new_v4(), datetime!(2026-10-19 8:00))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("disk on fire"));
    }

    #[tokio::test]
    async fn file_backed_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();
        let now = datetime!(2026-10-19 18:00);

        let store = LogStore::new(Arc::new(FileStorage::new(dir.path())), 30);
        let mut logs = store.load(user, now).await.unwrap();
        logs.append(day(now, 0), [FoodEntry::new("apple", 25.0)]);
        store.save(user, &logs).await.unwrap();

        let reopened = LogStore::new(Arc::new(FileStorage::new(dir.path())), 30);
        let loaded = reopened.load(user, now).await.unwrap();
        assert_eq!(loaded.day(day(now, 0)), &[FoodEntry::new("apple", 25.0)]);
    }
}
