use crate::domain::model::MessageLogEntry;
use crate::domain::ports::MessageLog;
use crate::utils::error::{GymError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryMessageLog {
    entries: Mutex<Vec<MessageLogEntry>>,
}

impl InMemoryMessageLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageLog for InMemoryMessageLog {
    async fn append(&self, entry: MessageLogEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<MessageLogEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}

/// JSON Lines 檔，每筆紀錄一行，以 append 模式寫入。
#[derive(Debug)]
pub struct JsonFileMessageLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileMessageLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl MessageLog for JsonFileMessageLog {
    async fn append(&self, entry: MessageLogEntry) -> Result<()> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<MessageLogEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GymError::IoError(e)),
        };

        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MessageLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                // 寫到一半中斷的最後一行
                Err(e) => tracing::warn!(
                    "Skipping unreadable line {} in {}: {}",
                    index + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(entries)
    }
}
