//! JSON-file credential store.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_common::StorageError;

use super::{read_optional, remove_file, write_file, CookieStore};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CookieDoc {
    cookie_header: String,
}

/// Stores the credential as `{"cookieHeader": "..."}`.
///
/// On Unix the file is restricted to the owner (mode 0o600).
pub struct FileCookieStore {
    path: PathBuf,
}

impl FileCookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CookieStore for FileCookieStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        let Some(json) = read_optional(&self.path).await? else {
            debug!(path = %self.path.display(), "no cookie file");
            return Ok(None);
        };

        let doc: CookieDoc =
            serde_json::from_str(&json).map_err(|e| StorageError::format(&self.path, e))?;
        let header = doc.cookie_header.trim().to_string();
        debug!(len = header.len(), "loaded cookie header");
        Ok(Some(header).filter(|h| !h.is_empty()))
    }

    async fn save(&self, cookie_header: &str) -> Result<(), StorageError> {
        let doc = CookieDoc {
            cookie_header: cookie_header.to_string(),
        };
        let json = serde_json::to_string(&doc).map_err(|e| StorageError::format(&self.path, e))?;
        write_file(&self.path, &json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| StorageError::io(&self.path, e))?;
        }

        debug!(len = cookie_header.len(), "saved cookie header");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        remove_file(&self.path).await
    }
}
