//! Owned-instance discovery shared by the scan and the listing command.

use std::cmp::Reverse;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use warden_common::FailureSink;
use warden_vrchat::{ApiError, Instance, InstanceUser, RateGate, VrchatApi};

use crate::location::{is_owned_by, split_location};

/// An active instance owned by the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedInstance {
    pub name: String,
    pub location: String,
    pub world_id: String,
    pub instance_id: String,
    pub user_count: u32,
    pub capacity: u32,
    pub users: Vec<InstanceUser>,
}

impl OwnedInstance {
    fn from_instance(
        location: &str,
        world_id: &str,
        instance_id: &str,
        instance: Instance,
    ) -> Self {
        Self {
            name: instance.label().to_string(),
            location: location.to_string(),
            world_id: non_blank_or(&instance.world_id, world_id),
            instance_id: non_blank_or(instance.key(), instance_id),
            user_count: instance.user_count.max(instance.users.len() as u32),
            capacity: instance.capacity,
            users: instance.users,
        }
    }
}

pub(crate) fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Fetch one location's instance, keeping it only if active and owned.
///
/// Malformed locations and missing instances yield `Ok(None)`.
pub(crate) async fn fetch_owned(
    api: &dyn VrchatApi,
    gate: &RateGate,
    location: &str,
    user_id: &str,
    cancel: &CancellationToken,
) -> Result<Option<(String, String, Instance)>, ApiError> {
    let Some((world_id, instance_id)) = split_location(location) else {
        debug!(location, "skipping malformed location");
        return Ok(None);
    };

    let instance = gate
        .run(cancel, || api.get_instance(world_id, instance_id))
        .await?;
    let Some(instance) = instance else {
        debug!(location, "instance no longer exists");
        return Ok(None);
    };
    if !instance.active || !is_owned_by(&instance, user_id) {
        return Ok(None);
    }
    Ok(Some((world_id.to_string(), instance_id.to_string(), instance)))
}

/// Recently active instances owned by `user_id`, busiest first.
///
/// Failures for single locations are reported and skipped.
pub async fn list_owned_instances(
    api: &dyn VrchatApi,
    gate: &RateGate,
    user_id: &str,
    limit: u32,
    failures: &dyn FailureSink,
    cancel: &CancellationToken,
) -> Result<Vec<OwnedInstance>, ApiError> {
    let locations = gate.run(cancel, || api.recent_locations(limit, 0)).await?;

    let mut owned = Vec::new();
    for location in &locations {
        match fetch_owned(api, gate, location, user_id, cancel).await {
            Ok(Some((world_id, instance_id, instance))) => owned.push(
                OwnedInstance::from_instance(location, &world_id, &instance_id, instance),
            ),
            Ok(None) => {}
            Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
            Err(e) => failures.report(&format!("Instances: load {location}"), &e),
        }
    }

    owned.sort_by_key(|i| Reverse(i.user_count));
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, owned_instance, ME};
    use warden_common::FailureLog;

    #[tokio::test(start_paused = true)]
    async fn lists_owned_active_instances_busiest_first() {
        let f = fixture(true).await;
        f.api.set_recent(Ok(vec![
            "wrld_1:quiet".into(),
            "wrld_2:busy".into(),
            "wrld_3:theirs".into(),
            "broken".into(),
        ]));
        f.api.set_instance(
            "wrld_1",
            "quiet",
            Ok(Some(owned_instance("wrld_1", "quiet", &["usr_a"]))),
        );
        f.api.set_instance(
            "wrld_2",
            "busy",
            Ok(Some(owned_instance("wrld_2", "busy", &["usr_a", "usr_b", "usr_c"]))),
        );
        let mut theirs = owned_instance("wrld_3", "theirs", &["usr_a"]);
        theirs.owner_id = Some("usr_someone".into());
        f.api.set_instance("wrld_3", "theirs", Ok(Some(theirs)));

        let api = f.session.api().await.unwrap();
        let failures = FailureLog::default();
        let owned = list_owned_instances(api.as_ref(), &f.api_gate, ME, 50, &failures, &f.cancel)
            .await
            .unwrap();

        let names: Vec<_> = owned.iter().map(|i| i.instance_id.as_str()).collect();
        assert_eq!(names, vec!["busy", "quiet"]);
        assert_eq!(owned[0].user_count, 3);
        assert_eq!(owned[0].location, "wrld_2:busy");
        assert!(failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn per_location_failures_are_reported_and_skipped() {
        let f = fixture(true).await;
        f.api
            .set_recent(Ok(vec!["wrld_1:bad".into(), "wrld_1:good".into()]));
        f.api
            .set_instance("wrld_1", "bad", Err(ApiError::Transient("HTTP 500: x".into())));
        f.api
            .set_instance("wrld_1", "good", Ok(Some(owned_instance("wrld_1", "good", &[]))));

        let api = f.session.api().await.unwrap();
        let failures = FailureLog::default();
        let owned = list_owned_instances(api.as_ref(), &f.api_gate, ME, 50, &failures, &f.cancel)
            .await
            .unwrap();

        assert_eq!(owned.len(), 1);
        assert_eq!(failures.len(), 1);
        assert!(failures.records()[0].context.contains("wrld_1:bad"));
    }

    #[test]
    fn fallback_ids_fill_blank_fields() {
        let instance = Instance {
            location: String::new(),
            ..Instance::default()
        };
        let owned = OwnedInstance::from_instance("wrld_1:abc", "wrld_1", "abc", instance);
        assert_eq!(owned.world_id, "wrld_1");
        assert_eq!(owned.instance_id, "abc");
    }
}
