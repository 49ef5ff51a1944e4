//! In-memory stores for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use warden_common::{BlockedUser, KickLogEntry, StorageError};

use super::{normalize_ids, CookieStore, CustomBlockStore, KickLogStore, RemoteBlockCache};

#[derive(Default)]
pub struct MemoryCookieStore {
    value: Mutex<Option<String>>,
}

impl MemoryCookieStore {
    pub fn with_cookie(cookie_header: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(cookie_header.into())),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.current().filter(|c| !c.trim().is_empty()))
    }

    async fn save(&self, cookie_header: &str) -> Result<(), StorageError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(cookie_header.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Block cache that can be switched into a failing mode.
#[derive(Default)]
pub struct MemoryBlockCache {
    blocks: Mutex<Vec<BlockedUser>>,
    fail: Mutex<bool>,
}

impl MemoryBlockCache {
    pub fn with_blocks(blocks: Vec<BlockedUser>) -> Self {
        Self {
            blocks: Mutex::new(blocks),
            fail: Mutex::new(false),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    pub fn snapshot(&self) -> Vec<BlockedUser> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(StorageError::PathError("block cache unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBlockCache for MemoryBlockCache {
    async fn load(&self) -> Result<Vec<BlockedUser>, StorageError> {
        self.check()?;
        Ok(self.snapshot())
    }

    async fn save(&self, blocks: &[BlockedUser]) -> Result<(), StorageError> {
        self.check()?;
        *self.blocks.lock().unwrap_or_else(PoisonError::into_inner) = blocks.to_vec();
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.blocks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCustomBlockStore {
    lists: Mutex<HashMap<String, Vec<String>>>,
}

#[async_trait]
impl CustomBlockStore for MemoryCustomBlockStore {
    async fn load(&self, owner_user_id: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(owner_user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        owner_user_id: &str,
        blocked_user_ids: &[String],
    ) -> Result<(), StorageError> {
        self.lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner_user_id.to_string(), normalize_ids(blocked_user_ids));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryKickLogStore {
    entries: Mutex<Vec<KickLogEntry>>,
}

#[async_trait]
impl KickLogStore for MemoryKickLogStore {
    async fn append(&self, entry: &KickLogEntry) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<KickLogEntry>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
