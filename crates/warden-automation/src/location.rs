use warden_vrchat::Instance;

/// Split `worldId:instanceId` at the first colon.
///
/// Rejects strings with no colon, or a colon at the first or last position.
pub fn split_location(location: &str) -> Option<(&str, &str)> {
    let location = location.trim();
    let idx = location.find(':')?;
    if idx == 0 || idx >= location.len() - 1 {
        return None;
    }
    Some((&location[..idx], &location[idx + 1..]))
}

/// Whether `user_id` owns the instance.
///
/// Non-public instance variants carry the owner id in `hidden`, `friends`
/// or `private` instead of `ownerId`; any of the four matching is enough.
pub fn is_owned_by(instance: &Instance, user_id: &str) -> bool {
    if user_id.trim().is_empty() {
        return false;
    }
    [
        &instance.owner_id,
        &instance.hidden,
        &instance.friends,
        &instance.private,
    ]
    .into_iter()
    .flatten()
    .any(|owner| owner == user_id)
}
