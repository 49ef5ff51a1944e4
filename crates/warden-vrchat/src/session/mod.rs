//! Authentication state machine.
//!
//! [`SessionManager`] owns the only ready remote-call context. Every
//! transition is published on the [`warden_common::SessionEventBus`].

mod credentials;
mod manager;
pub mod messages;
mod parse;
mod types;


pub use credentials::extract_credential;
pub use manager::{bounded, SessionManager};
pub use parse::{parse_profile, Profile};
pub use types::{AuthOutcome, AuthStatus, SessionState};
