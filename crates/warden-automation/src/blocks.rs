//! Effective block list: remote moderations plus the custom list.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warden_common::{BlockSourceMode, BlockedUser};
use warden_platform::{CustomBlockStore, RemoteBlockCache};
use warden_vrchat::{ApiError, PlayerModeration, RateGate, SessionManager};

use crate::AutomationError;

pub struct BlockListAggregator {
    session: Arc<SessionManager>,
    api_gate: Arc<RateGate>,
    cache: Arc<dyn RemoteBlockCache>,
    custom: Arc<dyn CustomBlockStore>,
    /// Last known remote list.
    snapshot: Mutex<Vec<BlockedUser>>,
    /// Serializes read-modify-write of custom lists.
    custom_lock: tokio::sync::Mutex<()>,
}

impl BlockListAggregator {
    pub fn new(
        session: Arc<SessionManager>,
        api_gate: Arc<RateGate>,
        cache: Arc<dyn RemoteBlockCache>,
        custom: Arc<dyn CustomBlockStore>,
    ) -> Self {
        Self {
            session,
            api_gate,
            cache,
            custom,
            snapshot: Mutex::new(Vec::new()),
            custom_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The remote block list.
    ///
    /// With `use_cache`, a non-empty in-memory snapshot or durable cache is
    /// returned without a remote call. A failed remote call falls back to
    /// the same two sources and only errors when both are empty.
    pub async fn remote_blocked_users(
        &self,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlockedUser>, AutomationError> {
        if use_cache {
            if let Some(blocks) = self.cached().await {
                return Ok(blocks);
            }
        }

        match self.fetch_remote(cancel).await {
            Ok(blocks) => {
                info!(count = blocks.len(), "remote block list refreshed");
                self.set_snapshot(blocks.clone());
                if let Err(e) = self.cache.save(&blocks).await {
                    warn!(error = %e, "failed to persist block cache");
                }
                Ok(blocks)
            }
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled.into()),
            Err(e) => match self.cached().await {
                Some(blocks) => {
                    warn!(
                        error = %e,
                        count = blocks.len(),
                        "remote block list unavailable, using cached copy"
                    );
                    Ok(blocks)
                }
                None => Err(e.into()),
            },
        }
    }

    pub async fn remote_blocked_ids(
        &self,
        use_cache: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, AutomationError> {
        let users = self.remote_blocked_users(use_cache, cancel).await?;
        Ok(users.into_iter().map(|u| u.user_id).collect())
    }

    pub async fn custom_blocked_ids(
        &self,
        owner_user_id: &str,
    ) -> Result<Vec<String>, AutomationError> {
        Ok(self.custom.load(owner_user_id).await?)
    }

    /// Union of the lists selected by `mode`.
    pub async fn effective_blocked_ids(
        &self,
        owner_user_id: &str,
        mode: BlockSourceMode,
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<String>, AutomationError> {
        let mut ids = BTreeSet::new();
        if mode.includes_remote() {
            ids.extend(self.remote_blocked_ids(true, cancel).await?);
        }
        if mode.includes_custom() {
            ids.extend(self.custom_blocked_ids(owner_user_id).await?);
        }
        debug!(?mode, count = ids.len(), "effective block set");
        Ok(ids)
    }

    /// Returns `false` when the id was already present or blank.
    pub async fn add_custom_blocked_id(
        &self,
        owner_user_id: &str,
        blocked_user_id: &str,
    ) -> Result<bool, AutomationError> {
        let blocked_user_id = blocked_user_id.trim();
        if blocked_user_id.is_empty() {
            return Ok(false);
        }

        let _guard = self.custom_lock.lock().await;
        let mut ids = self.custom.load(owner_user_id).await?;
        if ids.iter().any(|id| id == blocked_user_id) {
            return Ok(false);
        }
        ids.push(blocked_user_id.to_string());
        self.custom.save(owner_user_id, &ids).await?;
        info!(owner = owner_user_id, blocked = blocked_user_id, "custom block added");
        Ok(true)
    }

    /// Returns `false` when the id was not present.
    pub async fn remove_custom_blocked_id(
        &self,
        owner_user_id: &str,
        blocked_user_id: &str,
    ) -> Result<bool, AutomationError> {
        let blocked_user_id = blocked_user_id.trim();

        let _guard = self.custom_lock.lock().await;
        let mut ids = self.custom.load(owner_user_id).await?;
        let before = ids.len();
        ids.retain(|id| id != blocked_user_id);
        if ids.len() == before {
            return Ok(false);
        }
        self.custom.save(owner_user_id, &ids).await?;
        info!(owner = owner_user_id, blocked = blocked_user_id, "custom block removed");
        Ok(true)
    }

    async fn fetch_remote(&self, cancel: &CancellationToken) -> Result<Vec<BlockedUser>, ApiError> {
        let api = self.session.api().await?;
        let moderations = self
            .api_gate
            .run(cancel, || api.list_blocked_moderations())
            .await?;
        Ok(group_moderations(moderations))
    }

    /// Snapshot if non-empty, else the durable cache if non-empty.
    async fn cached(&self) -> Option<Vec<BlockedUser>> {
        let snapshot = self.snapshot();
        if !snapshot.is_empty() {
            return Some(snapshot);
        }

        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "block cache unreadable");
                return None;
            }
        };
        if cached.is_empty() {
            return None;
        }
        debug!(count = cached.len(), "adopting durable block cache");
        self.set_snapshot(cached.clone());
        Some(cached)
    }

    fn snapshot(&self) -> Vec<BlockedUser> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_snapshot(&self, blocks: Vec<BlockedUser>) {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = blocks;
    }
}

/// One entry per target, first-seen order, first non-blank name wins.
fn group_moderations(moderations: Vec<PlayerModeration>) -> Vec<BlockedUser> {
    let mut grouped: Vec<BlockedUser> = Vec::new();
    for m in moderations {
        let id = m.target_user_id.trim();
        if id.is_empty() {
            continue;
        }
        let name = m.target_display_name.filter(|n| !n.trim().is_empty());
        match grouped.iter_mut().find(|b| b.user_id == id) {
            Some(existing) => {
                if existing.display_name.is_none() {
                    existing.display_name = name;
                }
            }
            None => grouped.push(BlockedUser::new(id, name)),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, ME};
    use warden_vrchat::fake::ApiCall;

    fn moderation(id: &str, name: Option<&str>) -> PlayerModeration {
        PlayerModeration {
            target_user_id: id.into(),
            target_display_name: name.map(str::to_string),
        }
    }

    fn remote_calls(f: &crate::test_support::Fixture) -> usize {
        f.api.count(|c| *c == ApiCall::ListBlockedModerations)
    }

    #[test]
    fn grouping_keeps_first_non_blank_name() {
        let grouped = group_moderations(vec![
            moderation("usr_a", None),
            moderation("usr_b", Some("Bob")),
            moderation("usr_a", Some("  ")),
            moderation("usr_a", Some("Alice")),
            moderation("usr_a", Some("Alicia")),
            moderation(" ", Some("Nobody")),
        ]);
        assert_eq!(
            grouped,
            vec![
                BlockedUser::new("usr_a", Some("Alice".into())),
                BlockedUser::new("usr_b", Some("Bob".into())),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn remote_success_updates_snapshot_and_cache() {
        let f = fixture(true).await;
        f.api.set_blocked(Ok(vec![moderation("usr_a", Some("Alice"))]));

        let users = f.blocks.remote_blocked_users(false, &f.cancel).await.unwrap();

        assert_eq!(users, vec![BlockedUser::new("usr_a", Some("Alice".into()))]);
        assert_eq!(f.cache.snapshot(), users);

        // served from the snapshot now
        let again = f.blocks.remote_blocked_users(true, &f.cancel).await.unwrap();
        assert_eq!(again, users);
        assert_eq!(remote_calls(&f), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn populated_cache_survives_remote_failure() {
        let f = fixture(true).await;
        let cached = vec![BlockedUser::new("usr_c", None)];
        f.cache.save(&cached).await.unwrap();
        f.api.set_blocked(Err(ApiError::Transient("HTTP 500: down".into())));

        let with_cache = f.blocks.remote_blocked_users(true, &f.cancel).await.unwrap();
        assert_eq!(with_cache, cached);

        let forced = f.blocks.remote_blocked_users(false, &f.cancel).await.unwrap();
        assert_eq!(forced, cached);
        assert_eq!(remote_calls(&f), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_fallbacks_propagate_remote_failure() {
        let f = fixture(true).await;
        f.api.set_blocked(Err(ApiError::RateLimited));

        let err = f.blocks.remote_blocked_users(true, &f.cancel).await.unwrap_err();
        assert!(matches!(err, AutomationError::Api(ApiError::RateLimited)));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_cache_counts_as_empty() {
        let f = fixture(true).await;
        f.cache.set_failing(true);
        f.api.set_blocked(Ok(vec![moderation("usr_a", None)]));

        let users = f.blocks.remote_blocked_users(true, &f.cancel).await.unwrap();
        assert_eq!(users, vec![BlockedUser::new("usr_a", None)]);
    }

    #[tokio::test(start_paused = true)]
    async fn not_ready_session_uses_cache_or_fails() {
        let f = fixture(false).await;

        let err = f.blocks.remote_blocked_users(false, &f.cancel).await.unwrap_err();
        assert!(matches!(err, AutomationError::Api(ApiError::NotReady)));

        f.cache.save(&[BlockedUser::new("usr_c", None)]).await.unwrap();
        let users = f.blocks.remote_blocked_users(false, &f.cancel).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn effective_ids_follow_mode() {
        let f = fixture(true).await;
        f.api.set_blocked(Ok(vec![
            moderation("usr_r", None),
            moderation("usr_both", None),
        ]));
        f.blocks.add_custom_blocked_id(ME, "usr_c").await.unwrap();
        f.blocks.add_custom_blocked_id(ME, "usr_both").await.unwrap();

        let both = f
            .blocks
            .effective_blocked_ids(ME, BlockSourceMode::Both, &f.cancel)
            .await
            .unwrap();
        assert_eq!(
            both.into_iter().collect::<Vec<_>>(),
            vec!["usr_both", "usr_c", "usr_r"]
        );

        let remote = f
            .blocks
            .effective_blocked_ids(ME, BlockSourceMode::VrchatOnly, &f.cancel)
            .await
            .unwrap();
        assert!(remote.contains("usr_r") && !remote.contains("usr_c"));

        let custom = f
            .blocks
            .effective_blocked_ids(ME, BlockSourceMode::CustomOnly, &f.cancel)
            .await
            .unwrap();
        assert!(custom.contains("usr_c") && !custom.contains("usr_r"));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_only_mode_skips_remote() {
        let f = fixture(true).await;
        f.api.set_blocked(Err(ApiError::RateLimited));
        f.blocks.add_custom_blocked_id(ME, "usr_c").await.unwrap();

        let ids = f
            .blocks
            .effective_blocked_ids(ME, BlockSourceMode::CustomOnly, &f.cancel)
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(remote_calls(&f), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn add_and_remove_custom_ids() {
        let f = fixture(true).await;

        assert!(f.blocks.add_custom_blocked_id(ME, "usr_b").await.unwrap());
        assert!(f.blocks.add_custom_blocked_id(ME, "usr_a").await.unwrap());
        assert!(!f.blocks.add_custom_blocked_id(ME, "usr_a").await.unwrap());
        assert!(!f.blocks.add_custom_blocked_id(ME, "  ").await.unwrap());
        assert_eq!(
            f.blocks.custom_blocked_ids(ME).await.unwrap(),
            vec!["usr_a", "usr_b"]
        );

        assert!(f.blocks.remove_custom_blocked_id(ME, "usr_a").await.unwrap());
        assert!(!f.blocks.remove_custom_blocked_id(ME, "usr_zzz").await.unwrap());
        assert_eq!(f.blocks.custom_blocked_ids(ME).await.unwrap(), vec!["usr_b"]);

        // other owners are untouched
        assert!(f.blocks.custom_blocked_ids("usr_other").await.unwrap().is_empty());
    }
}
