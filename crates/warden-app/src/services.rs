//! Wires config, storage, the API client, and automation together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use warden_automation::{BlockListAggregator, ReconciliationLoop, Reconciler};
use warden_common::{CurrentUser, FailureLog, SessionEventBus, WardenError};
use warden_config::WardenConfig;
use warden_platform::{
    FileBlockCache, FileCookieStore, FileCustomBlockStore, FileKickLogStore, KickLogStore,
    StoragePaths,
};
use warden_vrchat::session::bounded;
use warden_vrchat::{AuthOutcome, ClientConfig, HttpConnector, RateGate, SessionManager};

pub struct Services {
    pub config: WardenConfig,
    pub paths: StoragePaths,
    pub events: SessionEventBus,
    pub session: Arc<SessionManager>,
    pub api_gate: Arc<RateGate>,
    pub blocks: Arc<BlockListAggregator>,
    pub kick_log: Arc<dyn KickLogStore>,
    pub failures: Arc<FailureLog>,
}

impl Services {
    pub fn build(config: WardenConfig) -> Result<Self, WardenError> {
        let paths = StoragePaths::resolve(config.storage.data_dir.as_deref())?;
        paths.ensure_dirs()?;
        debug!(root = %paths.root().display(), "storage ready");

        let client = ClientConfig::default()
            .with_base_url(&config.api.base_url)
            .with_user_agent(&config.api.user_agent)
            .with_timeouts(config.api.connect_timeout(), config.api.request_timeout());

        let events = SessionEventBus::default();
        let session = Arc::new(SessionManager::new(
            Arc::new(HttpConnector::new(client)),
            Arc::new(RateGate::new("auth", config.rate_limits.auth_interval())),
            Arc::new(FileCookieStore::new(paths.cookie_file())),
            events.clone(),
        ));

        let api_gate = Arc::new(RateGate::new("api", config.rate_limits.api_interval()));
        let blocks = Arc::new(BlockListAggregator::new(
            Arc::clone(&session),
            Arc::clone(&api_gate),
            Arc::new(FileBlockCache::new(paths.block_cache_file())),
            Arc::new(FileCustomBlockStore::new(paths.custom_blocks_file())),
        ));

        Ok(Self {
            kick_log: Arc::new(FileKickLogStore::new(paths.kick_log_file())),
            failures: Arc::new(FailureLog::default()),
            config,
            paths,
            events,
            session,
            api_gate,
            blocks,
        })
    }

    pub fn reconciler(&self) -> Arc<Reconciler> {
        Arc::new(
            Reconciler::new(
                Arc::clone(&self.session),
                Arc::clone(&self.blocks),
                Arc::clone(&self.api_gate),
                Arc::clone(&self.kick_log),
                Arc::clone(&self.failures) as _,
            )
            .with_locations_limit(self.config.automation.recent_locations_limit),
        )
    }

    pub fn reconciliation_loop(&self) -> Arc<ReconciliationLoop> {
        Arc::new(ReconciliationLoop::new(
            self.reconciler(),
            self.config.automation.scan_interval(),
        ))
    }

    /// Restore the saved session within the configured deadline.
    pub async fn restore(&self, cancel: &CancellationToken) -> AuthOutcome {
        bounded(
            self.config.session.restore_timeout(),
            cancel,
            self.session.try_restore_session(cancel),
        )
        .await
    }

    /// Restore the session and return who is logged in.
    pub async fn require_user(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CurrentUser, WardenError> {
        let outcome = self.restore(cancel).await;
        if !outcome.is_success() {
            let reason = outcome.error_message.unwrap_or_default();
            return Err(WardenError::Other(format!(
                "{reason} Run `warden login` first."
            )));
        }
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| WardenError::Other("session has no current user".into()))?;
        info!(user = %user.user_id, "session restored");
        Ok(user)
    }
}
