//! Failure reporting for background work.
//!
//! A [`FailureSink`] receives errors for surfacing to the user. It never
//! influences control flow: callers report and carry on.

use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};

pub trait FailureSink: Send + Sync {
    fn report(&self, context: &str, error: &(dyn Error + 'static));
}

/// Logs every reported failure at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, context: &str, error: &(dyn Error + 'static)) {
        tracing::error!(context, error = %error, "operation failed");
    }
}

/// A single reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub context: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// A bounded in-memory record of recent failures.
///
/// Oldest records are evicted once `capacity` is reached. Every report is
/// also logged so nothing is lost when the buffer wraps.
#[derive(Debug)]
pub struct FailureLog {
    items: Mutex<VecDeque<FailureRecord>>,
    capacity: usize,
}

impl FailureLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of the retained failures, oldest first.
    pub fn records(&self) -> Vec<FailureRecord> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for FailureLog {
    fn default() -> Self {
        Self::new(64)
    }
}

impl FailureSink for FailureLog {
    fn report(&self, context: &str, error: &(dyn Error + 'static)) {
        tracing::warn!(context, error = %error, "failure recorded");
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.len() >= self.capacity {
            items.pop_front();
        }
        items.push_back(FailureRecord {
            context: context.to_string(),
            message: error.to_string(),
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error(msg: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, msg.to_string())
    }

    #[test]
    fn records_context_and_message() {
        let log = FailureLog::new(4);
        log.report("Automation: list locations", &io_error("boom"));

        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context, "Automation: list locations");
        assert_eq!(records[0].message, "boom");
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let log = FailureLog::new(2);
        log.report("a", &io_error("1"));
        log.report("b", &io_error("2"));
        log.report("c", &io_error("3"));

        let contexts: Vec<_> = log.records().into_iter().map(|r| r.context).collect();
        assert_eq!(contexts, vec!["b", "c"]);
    }

    #[test]
    fn clear_empties_the_log() {
        let log = FailureLog::default();
        log.report("a", &io_error("1"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_reports() {
        TracingFailureSink.report("ctx", &io_error("ignored"));
    }
}
