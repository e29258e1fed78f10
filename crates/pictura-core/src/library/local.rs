use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::compress::job::SourceFile;
use crate::config::LibraryConfig;
use crate::consts::{LIBRARY_INDEX_FILE, LIBRARY_UPLOAD_DIR, UPLOAD_SUFFIX_LEN};
use crate::error::{PicturaError, Result};
use crate::intake::{format_name, is_accepted, IntakePurpose};

use super::caller::CallerId;
use super::record::UploadRecord;
use super::store::{HistoryStore, UploadStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryIndex {
    records: Vec<IndexEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    caller: CallerId,
    #[serde(flatten)]
    record: UploadRecord,
}

/// Upload and history stores backed by a directory and a JSON index.
///
/// Files land in `<root>/uploads/`, records in `<root>/index.json`.
pub struct LocalLibrary {
    root: PathBuf,
    public_base_url: String,
    index_lock: Mutex<()>,
}

impl LocalLibrary {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
            index_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::new(&config.root, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(LIBRARY_INDEX_FILE)
    }

    async fn read_index(&self) -> Result<LibraryIndex> {
        match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LibraryIndex::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_index(&self, index: &LibraryIndex) -> Result<()> {
        let json = serde_json::to_vec_pretty(index)?;
        tokio::fs::write(self.index_path(), json).await?;
        Ok(())
    }

    async fn append(&self, caller: CallerId, record: UploadRecord) -> Result<()> {
        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        index.records.push(IndexEntry { caller, record });
        self.write_index(&index).await
    }

    fn url_for(&self, key: &str, stored: &Path) -> String {
        if self.public_base_url.is_empty() {
            let absolute = std::path::absolute(stored).unwrap_or_else(|_| stored.to_path_buf());
            format!("file://{}", absolute.display())
        } else {
            format!("{}/{key}", self.public_base_url.trim_end_matches('/'))
        }
    }
}

/// `uploads/<timestamp_ms>-<random>.<ext>`
fn storage_key(name: &str, timestamp_ms: i64) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(UPLOAD_SUFFIX_LEN)
        .collect();
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_ascii_lowercase();
    format!("{LIBRARY_UPLOAD_DIR}/{timestamp_ms}-{suffix}.{ext}")
}

#[async_trait]
impl UploadStore for LocalLibrary {
    async fn upload(&self, file: &SourceFile, caller: Option<&CallerId>) -> Result<UploadRecord> {
        let caller = caller.ok_or(PicturaError::Unauthorized)?;
        if file.bytes.is_empty() {
            return Err(PicturaError::EmptyFile(file.name.clone()));
        }
        if !is_accepted(Path::new(&file.name), IntakePurpose::Upload) {
            return Err(PicturaError::UnsupportedFile(file.name.clone()));
        }

        let now = Utc::now();
        let key = storage_key(&file.name, now.timestamp_millis());
        let stored = self.root.join(&key);
        if let Some(parent) = stored.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&stored, &file.bytes).await?;

        let record = UploadRecord {
            id: Uuid::new_v4().to_string(),
            name: file.name.clone(),
            url: self.url_for(&key, &stored),
            size: file.size(),
            format: file
                .mime
                .as_deref()
                .map(format_name)
                .unwrap_or_default()
                .to_string(),
            created_at: now,
        };

        if let Err(e) = self.append(*caller, record.clone()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&stored).await {
                warn!(key = %key, error = %cleanup, "Orphaned upload not removed");
            }
            return Err(e);
        }

        info!(name = %record.name, size = record.size, key = %key, "Upload stored");
        Ok(record)
    }
}

#[async_trait]
impl HistoryStore for LocalLibrary {
    async fn history(&self, caller: Option<&CallerId>) -> Result<Vec<UploadRecord>> {
        let caller = caller.ok_or(PicturaError::Unauthorized)?;
        let index = {
            let _guard = self.index_lock.lock().await;
            self.read_index().await?
        };

        // Later entries first so equal timestamps keep newest-first order.
        let mut records: Vec<UploadRecord> = index
            .records
            .into_iter()
            .rev()
            .filter(|entry| entry.caller == *caller)
            .map(|entry| entry.record)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
