use tokio_util::sync::CancellationToken;
use warden_common::{BlockSourceMode, WardenError};

use crate::cli::BlocksCommand;
use crate::services::Services;

pub async fn run(
    services: &Services,
    action: BlocksCommand,
    cancel: &CancellationToken,
) -> Result<(), WardenError> {
    let user = services.require_user(cancel).await?;
    let blocks = &services.blocks;

    match action {
        BlocksCommand::List { mode, refresh } => {
            let mode = BlockSourceMode::from(mode);
            if mode.includes_remote() {
                let remote = blocks.remote_blocked_users(!refresh, cancel).await?;
                println!("VRChat blocks ({}):", remote.len());
                for blocked in &remote {
                    println!("  {:<40} {}", blocked.user_id, blocked.label());
                }
            }
            if mode.includes_custom() {
                let custom = blocks.custom_blocked_ids(&user.user_id).await?;
                println!("Custom blocks ({}):", custom.len());
                for id in &custom {
                    println!("  {id}");
                }
            }
            let effective = blocks
                .effective_blocked_ids(&user.user_id, mode, cancel)
                .await?;
            println!("Effective block set: {} ids", effective.len());
        }
        BlocksCommand::Add { user_id } => {
            if blocks.add_custom_blocked_id(&user.user_id, &user_id).await? {
                println!("Added {} to the custom block list.", user_id.trim());
            } else {
                println!("{} is already blocked or is not a valid id.", user_id.trim());
            }
        }
        BlocksCommand::Remove { user_id } => {
            if blocks.remove_custom_blocked_id(&user.user_id, &user_id).await? {
                println!("Removed {} from the custom block list.", user_id.trim());
            } else {
                println!("{} was not on the custom block list.", user_id.trim());
            }
        }
    }
    Ok(())
}
