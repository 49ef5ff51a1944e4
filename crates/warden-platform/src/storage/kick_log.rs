//! Newline-delimited JSON audit log.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use warden_common::{KickLogEntry, StorageError};

use super::{read_optional, KickLogStore};

/// One camelCase JSON object per line, appended in write order.
pub struct FileKickLogStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl FileKickLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl KickLogStore for FileKickLogStore {
    async fn append(&self, entry: &KickLogEntry) -> Result<(), StorageError> {
        let mut line =
            serde_json::to_string(entry).map_err(|e| StorageError::format(&self.path, e))?;
        line.push('\n');

        let _guard = self.append_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(parent, e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| StorageError::io(&self.path, e))?;

        debug!(player = %entry.player_id, action = %entry.action, "kick log appended");
        Ok(())
    }

    async fn load(&self) -> Result<Vec<KickLogEntry>, StorageError> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<KickLogEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = index + 1, error = %e, "skipping malformed kick log line"),
            }
        }
        Ok(entries)
    }
}
