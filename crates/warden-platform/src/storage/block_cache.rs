//! JSON-file cache of the remote block list.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use warden_common::{BlockedUser, StorageError};

use super::{read_optional, remove_file, write_file, RemoteBlockCache};

/// Pretty-printed JSON array of `{userId, displayName}` records.
pub struct FileBlockCache {
    path: PathBuf,
}

impl FileBlockCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Drop records with a blank id and clear blank names.
fn sanitize(blocks: impl IntoIterator<Item = BlockedUser>) -> Vec<BlockedUser> {
    blocks
        .into_iter()
        .filter(|b| !b.user_id.trim().is_empty())
        .map(|b| BlockedUser::new(b.user_id.trim(), b.display_name))
        .collect()
}

#[async_trait]
impl RemoteBlockCache for FileBlockCache {
    async fn load(&self) -> Result<Vec<BlockedUser>, StorageError> {
        let Some(json) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        let blocks: Vec<BlockedUser> =
            serde_json::from_str(&json).map_err(|e| StorageError::format(&self.path, e))?;
        let blocks = sanitize(blocks);
        debug!(count = blocks.len(), "loaded block cache");
        Ok(blocks)
    }

    async fn save(&self, blocks: &[BlockedUser]) -> Result<(), StorageError> {
        let blocks = sanitize(blocks.iter().cloned());
        let json = serde_json::to_string_pretty(&blocks)
            .map_err(|e| StorageError::format(&self.path, e))?;
        write_file(&self.path, &json).await?;
        debug!(count = blocks.len(), "saved block cache");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        remove_file(&self.path).await
    }
}
