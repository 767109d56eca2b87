use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use worldview_types::{validate_thread_id, ChatMessage};

use crate::error::Result;
use crate::models::ThreadRecord;
use crate::trait_store::ThreadStore;

/// One pretty-printed JSON file per thread under `base_path`
pub struct FileThreadStore {
    base_path: PathBuf,
}

impl FileThreadStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn thread_path(&self, thread_id: &str) -> Result<PathBuf> {
        validate_thread_id(thread_id)?;
        Ok(self.base_path.join(format!("{}.json", thread_id)))
    }

    async fn read_record(path: &Path) -> Result<Option<ThreadRecord>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename so readers never see a torn file
    async fn write_record(&self, record: &ThreadRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        let path = self.thread_path(&record.thread_id)?;
        let content = serde_json::to_string_pretty(record)?;

        let tmp_path = self.base_path.join(format!(
            ".{}.{}.tmp",
            record.thread_id,
            uuid::Uuid::new_v4().simple()
        ));

        let write_result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            match tokio::fs::rename(&tmp_path, &path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tokio::fs::remove_file(&path).await?;
                    tokio::fs::rename(&tmp_path, &path).await?;
                }
                Err(e) => return Err(e),
            }
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for FileThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        let path = self.thread_path(thread_id)?;
        Self::read_record(&path).await
    }

    async fn save(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<ThreadRecord> {
        let previous = self.load(thread_id).await?;
        let record = ThreadRecord::committed(previous.as_ref(), thread_id, messages);
        self.write_record(&record).await?;
        tracing::debug!(thread_id, turns = record.turns, "thread written to disk");
        Ok(record)
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        let path = self.thread_path(thread_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_threads(&self, limit: usize) -> Result<Vec<ThreadRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            // temp files end in .tmp
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable thread file"),
            }
        }

        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit);
        Ok(records)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
