//! Minimum-spacing throttle shared by every caller of one endpoint class.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::ApiError;

/// Enforces a fixed minimum interval between dispatched operations.
///
/// Callers queue on a fair mutex, so admission follows arrival order.
/// The lock is held only while waiting for the slot, never while the
/// operation runs.
#[derive(Debug)]
pub struct RateGate {
    name: &'static str,
    interval: Duration,
    next_allowed: Mutex<Instant>,
}

impl RateGate {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            next_allowed: Mutex::new(Instant::now()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a slot, then run `operation`.
    ///
    /// Cancellation aborts the wait or the in-flight operation and yields
    /// [`ApiError::Cancelled`]. A caller cancelled while waiting does not
    /// consume a slot.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        {
            let mut next_allowed = tokio::select! {
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                guard = self.next_allowed.lock() => guard,
            };

            let now = Instant::now();
            if *next_allowed > now {
                trace!(
                    gate = self.name,
                    wait_ms = (*next_allowed - now).as_millis() as u64,
                    "waiting for rate gate"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep_until(*next_allowed) => {}
                }
            }
            *next_allowed = Instant::now() + self.interval;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = operation() => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[tokio::test(start_paused = true)]
    async fn first_call_runs_immediately() {
        let gate = RateGate::new("api", INTERVAL);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let value = gate.run(&cancel, || async { Ok(7) }).await.unwrap();

        assert_eq!(value, 7);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_calls_are_spaced() {
        let gate = RateGate::new("api", INTERVAL);
        let cancel = CancellationToken::new();

        let mut starts = Vec::new();
        for _ in 0..5 {
            let at = gate
                .run(&cancel, || async { Ok::<_, ApiError>(Instant::now()) })
                .await
                .unwrap();
            starts.push(at);
        }

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL, "{:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_spaced() {
        let gate = Arc::new(RateGate::new("auth", INTERVAL));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = Arc::clone(&gate);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                gate.run(&cancel, || async { Ok::<_, ApiError>(Instant::now()) })
                    .await
                    .unwrap()
            }));
        }

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();

        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operation_does_not_hold_the_gate() {
        let gate = Arc::new(RateGate::new("api", INTERVAL));
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let slow = {
            let gate = Arc::clone(&gate);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                gate.run(&cancel, || async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, ApiError>(())
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        let second = gate
            .run(&cancel, || async { Ok::<_, ApiError>(Instant::now()) })
            .await
            .unwrap();
        let waited = second - start;
        assert!(waited >= INTERVAL && waited < Duration::from_secs(30), "{waited:?}");

        slow.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_wait_skips_operation() {
        let gate = RateGate::new("api", INTERVAL);
        let cancel = CancellationToken::new();
        gate.run(&cancel, || async { Ok(()) }).await.unwrap();

        let ran = std::sync::atomic::AtomicBool::new(false);
        let waiter = gate.run(&cancel, || async {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        };

        let (result, ()) = tokio::join!(waiter, canceller);
        assert_eq!(result, Err(ApiError::Cancelled));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_returns_immediately() {
        let gate = RateGate::new("api", INTERVAL);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = gate.run(&cancel, || async { Ok(1) }).await;
        assert_eq!(result, Err(ApiError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn operation_errors_pass_through() {
        let gate = RateGate::new("api", INTERVAL);
        let cancel = CancellationToken::new();

        let result: Result<(), _> = gate
            .run(&cancel, || async { Err(ApiError::RateLimited) })
            .await;
        assert_eq!(result, Err(ApiError::RateLimited));
    }
}
