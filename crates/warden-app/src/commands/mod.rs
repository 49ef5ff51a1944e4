//! Subcommand handlers.

mod auth;
mod automation;
mod blocks;

use std::io::{self, BufRead, Write};

use tokio_util::sync::CancellationToken;
use warden_common::WardenError;

use crate::cli::Command;
use crate::services::Services;

pub async fn dispatch(services: &Services, command: Command) -> Result<(), WardenError> {
    let cancel = CancellationToken::new();
    match command {
        Command::Login { username, password } => {
            auth::login(services, &username, password, &cancel).await
        }
        Command::Logout => auth::logout(services, &cancel).await,
        Command::Status => auth::status(services, &cancel).await,
        Command::Blocks { action } => blocks::run(services, action, &cancel).await,
        Command::Instances => automation::instances(services, &cancel).await,
        Command::Log { limit } => automation::log(services, limit).await,
        Command::Scan => automation::scan(services, &cancel).await,
        Command::Run => automation::run(services, &cancel).await,
        Command::Config => {
            println!("{}", warden_config::config_to_json(&services.config));
            Ok(())
        }
    }
}

/// Print `label` and read one trimmed line from stdin.
pub(crate) async fn prompt(label: &str) -> Result<String, WardenError> {
    let label = label.to_string();
    let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
        print!("{label}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .map_err(|e| WardenError::Other(format!("prompt task failed: {e}")))??;
    Ok(line)
}
