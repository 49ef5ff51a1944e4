//! One reconciliation pass over the user's owned instances.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use warden_common::{
    new_correlation_id, BlockSourceMode, CurrentUser, FailureSink, KickAction, KickLogEntry,
};
use warden_platform::KickLogStore;
use warden_vrchat::{ApiError, Instance, InstanceUser, RateGate, SessionManager, VrchatApi};

use crate::blocks::BlockListAggregator;
use crate::owned::{fetch_owned, non_blank_or};

/// Detail text recorded for a successful moderation.
pub const KICK_DETAILS: &str = "Blocked user found in owned instance";

/// Why a pass ended before walking every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotReady,
    NoCurrentUser,
    BlockListUnavailable,
    NothingBlocked,
    LocationsUnavailable,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NotReady => "session not ready",
            SkipReason::NoCurrentUser => "no current user",
            SkipReason::BlockListUnavailable => "block list unavailable",
            SkipReason::NothingBlocked => "no blocked users",
            SkipReason::LocationsUnavailable => "recent locations unavailable",
            SkipReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub skipped: Option<SkipReason>,
    pub blocked_ids: usize,
    pub locations: usize,
    pub owned_instances: usize,
    pub kicked: usize,
    pub failed: usize,
    pub location_errors: usize,
}

impl ScanReport {
    fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = self.skipped {
            write!(f, "skipped ({reason}); ")?;
        }
        write!(
            f,
            "{} blocked ids, {} locations, {} owned instances, {} kicked, {} failed, \
             {} location errors",
            self.blocked_ids,
            self.locations,
            self.owned_instances,
            self.kicked,
            self.failed,
            self.location_errors
        )
    }
}

/// Enforces the effective block list on owned instances.
pub struct Reconciler {
    session: Arc<SessionManager>,
    blocks: Arc<BlockListAggregator>,
    api_gate: Arc<RateGate>,
    kick_log: Arc<dyn KickLogStore>,
    failures: Arc<dyn FailureSink>,
    locations_limit: u32,
}

impl Reconciler {
    pub fn new(
        session: Arc<SessionManager>,
        blocks: Arc<BlockListAggregator>,
        api_gate: Arc<RateGate>,
        kick_log: Arc<dyn KickLogStore>,
        failures: Arc<dyn FailureSink>,
    ) -> Self {
        Self {
            session,
            blocks,
            api_gate,
            kick_log,
            failures,
            locations_limit: 50,
        }
    }

    pub fn with_locations_limit(mut self, limit: u32) -> Self {
        self.locations_limit = limit;
        self
    }

    /// Run one pass. Never fails; problems are reported and counted.
    pub async fn tick(&self, cancel: &CancellationToken) -> ScanReport {
        let scan_id = new_correlation_id();
        let report = self
            .run(cancel)
            .instrument(info_span!("scan", %scan_id))
            .await;
        match report.skipped {
            Some(reason) => debug!(%scan_id, %reason, "scan skipped"),
            None => info!(
                %scan_id,
                kicked = report.kicked,
                failed = report.failed,
                "scan finished"
            ),
        }
        report
    }

    async fn run(&self, cancel: &CancellationToken) -> ScanReport {
        let report = ScanReport::default();

        if !self.session.is_ready().await {
            return report.skip(SkipReason::NotReady);
        }
        let Some(user) = self.session.current_user().await else {
            return report.skip(SkipReason::NoCurrentUser);
        };

        let blocked = match self
            .blocks
            .effective_blocked_ids(&user.user_id, BlockSourceMode::Both, cancel)
            .await
        {
            Ok(blocked) => blocked,
            Err(e) if e.is_cancelled() => return report.skip(SkipReason::Cancelled),
            Err(e) => {
                self.failures.report("Automation: load block list", &e);
                return report.skip(SkipReason::BlockListUnavailable);
            }
        };
        if blocked.is_empty() {
            return report.skip(SkipReason::NothingBlocked);
        }

        let api = match self.session.api().await {
            Ok(api) => api,
            Err(_) => return report.skip(SkipReason::NotReady),
        };
        self.enforce(api.as_ref(), &user, &blocked, cancel, report).await
    }

    async fn enforce(
        &self,
        api: &dyn VrchatApi,
        user: &CurrentUser,
        blocked: &BTreeSet<String>,
        cancel: &CancellationToken,
        mut report: ScanReport,
    ) -> ScanReport {
        report.blocked_ids = blocked.len();

        let limit = self.locations_limit;
        let locations = match self
            .api_gate
            .run(cancel, || api.recent_locations(limit, 0))
            .await
        {
            Ok(locations) => locations,
            Err(ApiError::Cancelled) => return report.skip(SkipReason::Cancelled),
            Err(e) => {
                self.failures.report("Automation: list recent locations", &e);
                return report.skip(SkipReason::LocationsUnavailable);
            }
        };
        report.locations = locations.len();

        for location in &locations {
            if cancel.is_cancelled() {
                return report.skip(SkipReason::Cancelled);
            }

            let (world_id, instance_id, instance) =
                match fetch_owned(api, &self.api_gate, location, &user.user_id, cancel).await {
                    Ok(Some(found)) => found,
                    Ok(None) => continue,
                    Err(ApiError::Cancelled) => return report.skip(SkipReason::Cancelled),
                    Err(e) => {
                        self.failures
                            .report(&format!("Automation: load instance {location}"), &e);
                        report.location_errors += 1;
                        continue;
                    }
                };
            report.owned_instances += 1;

            for present in instance.users.iter().filter(|u| blocked.contains(&u.id)) {
                let result = self
                    .api_gate
                    .run(cancel, || api.moderate_user(&present.id))
                    .await;

                let (action, details) = match result {
                    Ok(()) => {
                        info!(location = %location, user_id = %present.id, "blocked user removed");
                        report.kicked += 1;
                        (KickAction::Kicked, KICK_DETAILS.to_string())
                    }
                    Err(ApiError::Cancelled) => return report.skip(SkipReason::Cancelled),
                    Err(e) => {
                        self.failures
                            .report(&format!("Automation: moderate {}", present.id), &e);
                        report.failed += 1;
                        (KickAction::Failed, e.to_string())
                    }
                };

                let entry =
                    kick_entry(&world_id, &instance_id, &instance, present, action, details);
                if let Err(e) = self.kick_log.append(&entry).await {
                    warn!(error = %e, "kick log append failed");
                    self.failures.report("Automation: write kick log", &e);
                }
            }
        }

        report
    }
}

fn kick_entry(
    world_id: &str,
    instance_id: &str,
    instance: &Instance,
    player: &InstanceUser,
    action: KickAction,
    details: String,
) -> KickLogEntry {
    KickLogEntry {
        timestamp: Utc::now(),
        world_id: non_blank_or(&instance.world_id, world_id),
        instance_id: non_blank_or(instance.key(), instance_id),
        instance_name: Some(instance.label().to_string()).filter(|n| !n.trim().is_empty()),
        player_id: player.id.clone(),
        player_display_name: player
            .display_name
            .clone()
            .filter(|n| !n.trim().is_empty()),
        action,
        details: Some(details),
    }
}
