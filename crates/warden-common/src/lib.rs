pub mod errors;
pub mod events;
pub mod failures;
pub mod id;
pub mod types;

pub use errors::{ConfigError, StorageError, WardenError};
pub use events::{SessionEvent, SessionEventBus};
pub use failures::{FailureLog, FailureRecord, FailureSink, TracingFailureSink};
pub use id::new_correlation_id;
pub use types::{BlockSourceMode, BlockedUser, CurrentUser, KickAction, KickLogEntry};

pub type Result<T> = std::result::Result<T, WardenError>;
