//! Block enforcement for owned instances.
//!
//! - [`BlockListAggregator`] merges the remote and custom block lists
//! - [`Reconciler`] runs one enforcement pass
//! - [`ReconciliationLoop`] drives passes on a timer while the session is ready

pub mod blocks;
pub mod location;
pub mod owned;
pub mod scan;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use blocks::BlockListAggregator;
pub use location::{is_owned_by, split_location};
pub use owned::{list_owned_instances, OwnedInstance};
pub use scan::{Reconciler, ScanReport, SkipReason, KICK_DETAILS};
pub use scheduler::ReconciliationLoop;

use warden_common::{StorageError, WardenError};
use warden_vrchat::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AutomationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AutomationError::Api(ApiError::Cancelled))
    }
}

impl From<AutomationError> for WardenError {
    fn from(e: AutomationError) -> Self {
        match e {
            AutomationError::Api(e) => e.into(),
            AutomationError::Storage(e) => WardenError::Storage(e),
        }
    }
}
