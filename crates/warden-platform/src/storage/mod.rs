//! Persisted state: session credential, remote block cache, custom block
//! lists, and the moderation audit log.
//!
//! Each concern is a small async trait so callers can swap the JSON-file
//! implementations for the in-memory ones in tests.

mod block_cache;
mod cookie;
mod custom_blocks;
mod kick_log;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use block_cache::FileBlockCache;
pub use cookie::FileCookieStore;
pub use custom_blocks::FileCustomBlockStore;
pub use kick_log::FileKickLogStore;

use async_trait::async_trait;
use warden_common::{BlockedUser, KickLogEntry, StorageError};

/// Holds the opaque credential string that restores a session.
#[async_trait]
pub trait CookieStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;
    async fn save(&self, cookie_header: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Durable copy of the last remote block list.
#[async_trait]
pub trait RemoteBlockCache: Send + Sync {
    async fn load(&self) -> Result<Vec<BlockedUser>, StorageError>;
    async fn save(&self, blocks: &[BlockedUser]) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Locally authored block lists, keyed by the owning account.
#[async_trait]
pub trait CustomBlockStore: Send + Sync {
    async fn load(&self, owner_user_id: &str) -> Result<Vec<String>, StorageError>;
    /// Replaces the owner's list; stored deduplicated and sorted.
    async fn save(&self, owner_user_id: &str, blocked_user_ids: &[String])
        -> Result<(), StorageError>;
}

/// Append-only moderation audit log.
#[async_trait]
pub trait KickLogStore: Send + Sync {
    async fn append(&self, entry: &KickLogEntry) -> Result<(), StorageError>;
    /// All readable entries in write order; malformed records are skipped.
    async fn load(&self) -> Result<Vec<KickLogEntry>, StorageError>;
}

/// Deduplicate and sort ids, dropping blanks.
pub(crate) fn normalize_ids(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Read a file, treating "not found" as absent.
pub(crate) async fn read_optional(path: &std::path::Path) -> Result<Option<String>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Write a file, creating its parent directory first.
pub(crate) async fn write_file(path: &std::path::Path, content: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| StorageError::io(path, e))
}

/// Delete a file; a missing file is not an error.
pub(crate) async fn remove_file(path: &std::path::Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ids_dedups_and_sorts() {
        let ids = vec![
            "usr_b".to_string(),
            "usr_a".to_string(),
            "usr_b".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(normalize_ids(&ids), vec!["usr_a", "usr_b"]);
    }

    #[tokio::test]
    async fn read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let content = read_optional(&dir.path().join("absent.json")).await.unwrap();
        assert!(content.is_none());
    }

    #[tokio::test]
    async fn remove_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_file(&dir.path().join("absent.json")).await.unwrap();
    }

    #[tokio::test]
    async fn write_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_file(&path, "{}").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some("{}"));
    }
}
