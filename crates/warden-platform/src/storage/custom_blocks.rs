//! JSON-file custom block lists.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use warden_common::StorageError;

use super::{normalize_ids, read_optional, write_file, CustomBlockStore};

/// One JSON object mapping owner user id to a sorted list of blocked ids.
///
/// Saves are read-modify-write; the mutex keeps concurrent saves for
/// different owners from clobbering each other.
pub struct FileCustomBlockStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCustomBlockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Vec<String>>, StorageError> {
        match read_optional(&self.path).await? {
            Some(json) if !json.trim().is_empty() => {
                serde_json::from_str(&json).map_err(|e| StorageError::format(&self.path, e))
            }
            _ => Ok(BTreeMap::new()),
        }
    }
}

#[async_trait]
impl CustomBlockStore for FileCustomBlockStore {
    async fn load(&self, owner_user_id: &str) -> Result<Vec<String>, StorageError> {
        let all = self.read_all().await?;
        Ok(all
            .get(owner_user_id)
            .map(|ids| normalize_ids(ids))
            .unwrap_or_default())
    }

    async fn save(
        &self,
        owner_user_id: &str,
        blocked_user_ids: &[String],
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_all().await?;
        let ids = normalize_ids(blocked_user_ids);
        debug!(owner = owner_user_id, count = ids.len(), "saving custom blocks");
        all.insert(owner_user_id.to_string(), ids);

        let json =
            serde_json::to_string_pretty(&all).map_err(|e| StorageError::format(&self.path, e))?;
        write_file(&self.path, &json).await
    }
}
