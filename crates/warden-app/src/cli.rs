use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use warden_common::BlockSourceMode;

/// Warden: keeps blocked players out of the VRChat instances you own.
#[derive(Parser, Debug)]
#[command(name = "warden", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and save the session for later runs.
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from WARDEN_PASSWORD or prompted when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// End the session and forget the saved credential.
    Logout,

    /// Show whether the saved session is still valid.
    Status,

    /// Inspect or edit block lists.
    Blocks {
        #[command(subcommand)]
        action: BlocksCommand,
    },

    /// List your active instances, busiest first.
    Instances,

    /// Show recent moderation log entries, newest first.
    Log {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Run a single enforcement pass.
    Scan,

    /// Enforce blocks on a timer until interrupted.
    Run,

    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Subcommand, Debug)]
pub enum BlocksCommand {
    /// Show the block lists and the effective set.
    List {
        #[arg(long, value_enum, default_value_t = SourceArg::Both)]
        mode: SourceArg,

        /// Fetch the VRChat list instead of preferring the cache.
        #[arg(long)]
        refresh: bool,
    },

    /// Add a user id to your custom list.
    Add { user_id: String },

    /// Remove a user id from your custom list.
    Remove { user_id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    Both,
    Vrchat,
    Custom,
}

impl From<SourceArg> for BlockSourceMode {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Both => BlockSourceMode::Both,
            SourceArg::Vrchat => BlockSourceMode::VrchatOnly,
            SourceArg::Custom => BlockSourceMode::CustomOnly,
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
