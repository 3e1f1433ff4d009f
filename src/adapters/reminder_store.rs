use crate::domain::model::{MemberId, ReminderRecord};
use crate::domain::ports::ReminderStore;
use crate::utils::error::{GymError, Result};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fd_lock::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// 記憶體內的提醒紀錄，程序重啟即清空。
/// DashMap 的 entry 會鎖住該 key 所在的 shard，等同每位會員一個臨界區。
#[derive(Debug, Default)]
pub struct InMemoryReminderStore {
    records: DashMap<MemberId, ReminderRecord>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn claim(&self, record: ReminderRecord) -> Result<Option<ReminderRecord>> {
        match self.records.entry(record.member_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().window_end == record.window_end {
                    return Ok(Some(entry.get().clone()));
                }
                entry.insert(record);
                Ok(None)
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(None)
            }
        }
    }

    async fn get(&self, member_id: MemberId) -> Result<Option<ReminderRecord>> {
        Ok(self.records.get(&member_id).map(|r| r.value().clone()))
    }

    async fn remove(&self, member_id: MemberId) -> Result<()> {
        self.records.remove(&member_id);
        Ok(())
    }
}

/// 以 JSON 檔保存的提醒紀錄，讓 CLI 多次執行之間不會重複寄送。
///
/// 每次操作都在旁邊的 `.lock` 檔上取得 OS 檔案鎖，鎖內重新讀檔、
/// 判斷、寫入暫存檔再 rename，因此多個程序同時執行也只有一個能取得寄送權。
/// 讀寫失敗一律回傳 `StorageUnavailable`。
#[derive(Debug)]
pub struct JsonFileReminderStore {
    file: ReminderFile,
    // 同一程序內先排隊，避免佔用多個 blocking thread 等鎖
    gate: Mutex<()>,
}

#[derive(Debug, Clone)]
struct ReminderFile {
    path: PathBuf,
}

impl ReminderFile {
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GymError::storage(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let lock_path = self.sibling(".lock");
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| GymError::storage(format!("cannot open {}: {}", lock_path.display(), e)))
    }

    fn load(&self) -> Result<HashMap<MemberId, ReminderRecord>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let list: Vec<ReminderRecord> = serde_json::from_slice(&bytes).map_err(|e| {
                    GymError::storage(format!("{} is corrupt: {}", self.path.display(), e))
                })?;
                Ok(list.into_iter().map(|r| (r.member_id, r)).collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(GymError::storage(format!(
                "cannot read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn persist(&self, records: &HashMap<MemberId, ReminderRecord>) -> Result<()> {
        let mut list: Vec<&ReminderRecord> = records.values().collect();
        list.sort_by_key(|r| r.member_id);
        let data = serde_json::to_vec_pretty(&list)?;

        let tmp = self.sibling(".tmp");
        std::fs::write(&tmp, data)
            .map_err(|e| GymError::storage(format!("cannot write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            GymError::storage(format!("cannot replace {}: {}", self.path.display(), e))
        })
    }

    /// 在獨佔鎖內讀出全部紀錄交給 `f`；`f` 回傳 `true` 時寫回。
    fn update<T>(
        &self,
        f: impl FnOnce(&mut HashMap<MemberId, ReminderRecord>) -> (T, bool),
    ) -> Result<T> {
        let mut lock = RwLock::new(self.open_lock_file()?);
        let _guard = lock
            .write()
            .map_err(|e| GymError::storage(format!("cannot lock reminder store: {}", e)))?;

        let mut records = self.load()?;
        let (value, dirty) = f(&mut records);
        if dirty {
            self.persist(&records)?;
        }
        Ok(value)
    }

    fn read(&self) -> Result<HashMap<MemberId, ReminderRecord>> {
        let lock = RwLock::new(self.open_lock_file()?);
        let _guard = lock
            .read()
            .map_err(|e| GymError::storage(format!("cannot lock reminder store: {}", e)))?;
        self.load()
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GymError::storage(format!("reminder store task failed: {}", e)))?
}

impl JsonFileReminderStore {
    /// 開啟時先讀一次，損毀或無法讀取的檔案在這裡就回報。
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = ReminderFile {
            path: path.as_ref().to_path_buf(),
        };
        let check = file.clone();
        let count = blocking(move || check.read().map(|records| records.len())).await?;

        tracing::debug!(
            "Opened reminder store {} ({} records)",
            file.path.display(),
            count
        );

        Ok(Self {
            file,
            gate: Mutex::new(()),
        })
    }
}

#[async_trait]
impl ReminderStore for JsonFileReminderStore {
    async fn claim(&self, record: ReminderRecord) -> Result<Option<ReminderRecord>> {
        let _gate = self.gate.lock().await;
        let file = self.file.clone();
        blocking(move || {
            file.update(|records| {
                let duplicate = records
                    .get(&record.member_id)
                    .filter(|existing| existing.window_end == record.window_end)
                    .cloned();
                if duplicate.is_some() {
                    return (duplicate, false);
                }
                records.insert(record.member_id, record);
                (None, true)
            })
        })
        .await
    }

    async fn get(&self, member_id: MemberId) -> Result<Option<ReminderRecord>> {
        let file = self.file.clone();
        blocking(move || Ok(file.read()?.remove(&member_id))).await
    }

    async fn remove(&self, member_id: MemberId) -> Result<()> {
        let _gate = self.gate.lock().await;
        let file = self.file.clone();
        blocking(move || file.update(|records| ((), records.remove(&member_id).is_some()))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn record(member_id: MemberId, end: &str) -> ReminderRecord {
        ReminderRecord {
            member_id,
            window_end: NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
            sent_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn in_memory_claim_is_check_and_set() {
        let store = InMemoryReminderStore::new();
        assert!(store.claim(record(1, "2024-02-15")).await.unwrap().is_none());
        assert!(store.claim(record(1, "2024-02-15")).await.unwrap().is_some());
        assert!(store.claim(record(1, "2024-03-15")).await.unwrap().is_none());

        let current = store.get(1).await.unwrap().unwrap();
        assert_eq!(current.window_end, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");

        let store = JsonFileReminderStore::open(&path).await.unwrap();
        assert!(store.claim(record(3, "2024-02-15")).await.unwrap().is_none());
        assert!(store.claim(record(4, "2024-02-20")).await.unwrap().is_none());
        store.remove(4).await.unwrap();
        drop(store);

        let reopened = JsonFileReminderStore::open(&path).await.unwrap();
        assert!(reopened.get(3).await.unwrap().is_some());
        assert!(reopened.get(4).await.unwrap().is_none());
        assert!(reopened.claim(record(3, "2024-02-15")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stores_opened_on_one_file_see_each_others_claims() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");

        // 兩個獨立開啟的 store，等同排程 sweep 與手動 remind 兩個程序
        let cron = JsonFileReminderStore::open(&path).await.unwrap();
        let manual = JsonFileReminderStore::open(&path).await.unwrap();

        assert!(cron.claim(record(7, "2024-02-15")).await.unwrap().is_none());
        assert!(manual.claim(record(7, "2024-02-15")).await.unwrap().is_some());

        manual.remove(7).await.unwrap();
        assert!(cron.get(7).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_stores_on_one_file_have_one_winner() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");

        let mut handles = Vec::new();
        for _ in 0..6 {
            let store = JsonFileReminderStore::open(&path).await.unwrap();
            handles.push(tokio::spawn(async move {
                store.claim(record(7, "2024-02-15")).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_none() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        match JsonFileReminderStore::open(&path).await {
            Err(GymError::StorageUnavailable { .. }) => {}
            other => panic!("expected StorageUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_no_claim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reminders.json");
        // 暫存檔位置被目錄佔用，寫入會失敗
        tokio::fs::create_dir_all(dir.path().join("reminders.json.tmp"))
            .await
            .unwrap();

        let store = JsonFileReminderStore::open(&path).await.unwrap();
        assert!(matches!(
            store.claim(record(5, "2024-02-15")).await,
            Err(GymError::StorageUnavailable { .. })
        ));
        assert!(store.get(5).await.unwrap().is_none());
    }
}
