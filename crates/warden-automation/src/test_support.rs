//! Shared fixtures for the automation tests.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use warden_common::{FailureLog, SessionEventBus};
use warden_platform::storage::memory::{
    MemoryBlockCache, MemoryCookieStore, MemoryCustomBlockStore, MemoryKickLogStore,
};
use warden_vrchat::fake::{user_body, FakeApi, FakeConnector};
use warden_vrchat::{Instance, InstanceUser, RateGate, SessionManager};

use crate::blocks::BlockListAggregator;

pub(crate) const ME: &str = "usr_me";

pub(crate) struct Fixture {
    pub api: Arc<FakeApi>,
    pub session: Arc<SessionManager>,
    pub api_gate: Arc<RateGate>,
    pub cache: Arc<MemoryBlockCache>,
    pub custom: Arc<MemoryCustomBlockStore>,
    pub kick_log: Arc<MemoryKickLogStore>,
    pub failures: Arc<FailureLog>,
    pub blocks: Arc<BlockListAggregator>,
    pub events: SessionEventBus,
    pub cancel: CancellationToken,
}

/// A fixture whose session is already restored as [`ME`] when `logged_in`.
pub(crate) async fn fixture(logged_in: bool) -> Fixture {
    let api = FakeApi::new();
    let events = SessionEventBus::default();
    let session = Arc::new(SessionManager::new(
        FakeConnector::new(Arc::clone(&api)),
        Arc::new(RateGate::new("auth", Duration::from_secs(2))),
        Arc::new(MemoryCookieStore::with_cookie("auth=abc")),
        events.clone(),
    ));
    let cancel = CancellationToken::new();

    if logged_in {
        api.push_user_body(user_body(ME, "Me"));
        let outcome = session.try_restore_session(&cancel).await;
        assert!(outcome.is_success(), "{outcome:?}");
    }

    let api_gate = Arc::new(RateGate::new("api", Duration::from_secs(1)));
    let cache = Arc::new(MemoryBlockCache::default());
    let custom = Arc::new(MemoryCustomBlockStore::default());
    let blocks = Arc::new(BlockListAggregator::new(
        Arc::clone(&session),
        Arc::clone(&api_gate),
        Arc::clone(&cache) as _,
        Arc::clone(&custom) as _,
    ));

    Fixture {
        api,
        session,
        api_gate,
        cache,
        custom,
        kick_log: Arc::new(MemoryKickLogStore::default()),
        failures: Arc::new(FailureLog::default()),
        blocks,
        events,
        cancel,
    }
}

/// An active instance owned by [`ME`] with the given users present.
pub(crate) fn owned_instance(world_id: &str, instance_id: &str, users: &[&str]) -> Instance {
    Instance {
        world_id: world_id.into(),
        instance_id: instance_id.into(),
        location: format!("{world_id}:{instance_id}"),
        active: true,
        owner_id: Some(ME.into()),
        users: users
            .iter()
            .map(|id| InstanceUser {
                id: id.to_string(),
                display_name: Some(format!("Name of {id}")),
            })
            .collect(),
        user_count: users.len() as u32,
        capacity: 16,
        ..Instance::default()
    }
}
