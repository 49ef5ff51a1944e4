use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use warden_automation::{list_owned_instances, OwnedInstance};
use warden_common::{KickLogEntry, WardenError};

use crate::services::Services;

pub async fn instances(services: &Services, cancel: &CancellationToken) -> Result<(), WardenError> {
    let user = services.require_user(cancel).await?;
    let api = services.session.api().await?;

    let owned = list_owned_instances(
        api.as_ref(),
        &services.api_gate,
        &user.user_id,
        services.config.automation.recent_locations_limit,
        services.failures.as_ref(),
        cancel,
    )
    .await?;

    if owned.is_empty() {
        println!("No active instances owned by {}.", user.display_name);
    }
    for instance in &owned {
        println!("{}", format_instance(instance));
        for player in &instance.users {
            let name = player.display_name.as_deref().unwrap_or(&player.id);
            println!("    {name} ({})", player.id);
        }
    }
    print_failures(services);
    Ok(())
}

pub async fn scan(services: &Services, cancel: &CancellationToken) -> Result<(), WardenError> {
    services.require_user(cancel).await?;
    let report = services.reconciler().tick(cancel).await;
    println!("Scan: {report}");
    print_failures(services);
    Ok(())
}

pub async fn run(services: &Services, cancel: &CancellationToken) -> Result<(), WardenError> {
    let shutdown = cancel.child_token();
    let looper = services.reconciliation_loop();

    // Subscribe before restoring so the ready event is not missed.
    let follower = if services.config.automation.enabled {
        Some(looper.attach(services.events.subscribe(), shutdown.clone()))
    } else {
        warn!("automation is disabled in config; nothing will be enforced");
        None
    };

    if let Err(e) = services.require_user(cancel).await {
        shutdown.cancel();
        if let Some(task) = follower {
            join_follower(task).await;
        }
        return Err(e);
    }

    println!(
        "Enforcing blocks every {}s. Press Ctrl-C to stop.",
        services.config.automation.scan_interval().as_secs()
    );
    let signal = tokio::signal::ctrl_c().await;
    info!("shutting down");
    shutdown.cancel();
    if let Some(task) = follower {
        join_follower(task).await;
    }
    signal?;
    print_failures(services);
    Ok(())
}

/// Wait for the session follower, logging it if it panicked.
async fn join_follower(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        if e.is_panic() {
            error!(error = %e, "session follower panicked");
        }
    }
}

pub async fn log(services: &Services, limit: usize) -> Result<(), WardenError> {
    let entries = services.kick_log.load().await?;
    if entries.is_empty() {
        println!("No moderation actions recorded.");
    }
    for entry in entries.iter().rev().take(limit) {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_instance(instance: &OwnedInstance) -> String {
    format!(
        "{} [{}/{}] {}",
        instance.name, instance.user_count, instance.capacity, instance.location
    )
}

fn format_entry(entry: &KickLogEntry) -> String {
    let mut line = format!(
        "{} {:<8} {} ({}) in {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.action.to_string(),
        entry.player_label(),
        entry.player_id,
        entry.instance_label(),
    );
    if let Some(details) = entry.details.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(": ");
        line.push_str(details);
    }
    line
}

fn print_failures(services: &Services) {
    let records = services.failures.records();
    if records.is_empty() {
        return;
    }
    eprintln!("{} problem(s) during this run:", records.len());
    for record in records {
        eprintln!("  {}: {}", record.context, record.message);
    }
}
