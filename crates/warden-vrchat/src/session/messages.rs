//! User-facing authentication messages.

pub const NO_SAVED_SESSION: &str = "No saved session.";
pub const RESTORE_RATE_LIMITED: &str =
    "Too many attempts from your network. Please wait a few minutes and try again.";
pub const SESSION_EXPIRED: &str = "Saved session expired. Please log in again.";
pub const SESSION_INVALID: &str = "Saved session is not valid anymore.";
pub const LOGIN_RATE_LIMITED: &str =
    "Too many login attempts from your network. Please wait a few minutes and try again.";
pub const LOGIN_UNPARSEABLE: &str = "Login response could not be parsed.";
pub const ALREADY_LOGGED_IN: &str = "Already logged in. Log out first.";
pub const NOT_LOGGED_IN: &str = "Not logged in. Please login first.";
pub const CODE_REQUIRED: &str = "2FA code is required.";
pub const TWO_FACTOR_STILL_REQUIRED: &str = "2FA still required.";
pub const TWO_FACTOR_UNPARSEABLE: &str =
    "2FA verify succeeded but user payload could not be parsed.";
pub const TWO_FACTOR_UNSUPPORTED: &str =
    "This account asks for a 2FA method Warden does not support.";
pub const OPERATION_CANCELLED: &str = "Operation cancelled.";
