//! Retry logic for object-store operations.
//!
//! Provides bounded exponential backoff for transient store errors. Whether
//! an error is transient is decided by [`StoreError::is_transient`], so the
//! taxonomy can grow without touching the executor.

use std::time::Duration;

use cm_error::StoreError;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before giving up (first try included).
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles each attempt after that.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the initial backoff duration.
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// The backoff duration after a given failed attempt (0-indexed).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Execute a store operation with retry on transient errors.
///
/// Transient errors back off and retry up to the policy's attempt ceiling,
/// then the last error propagates. Non-transient errors propagate from the
/// first attempt - programming, auth, and permission mistakes gain nothing
/// from being retried.
///
/// # Arguments
///
/// * `policy` - Retry configuration
/// * `operation` - Name of the operation for tracing
/// * `target` - Identifier of the object/bucket being operated on
/// * `f` - The operation; called once per attempt
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    target: &str,
    mut f: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, StoreError>>,
{
    let mut last_error: Option<StoreError> = None;

    for attempt in 1..=policy.max_attempts {
        debug!(operation, target, attempt, "Store call");

        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                if attempt < policy.max_attempts {
                    let backoff = policy.backoff_for(attempt - 1);
                    warn!(
                        operation,
                        target,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient store error, backing off"
                    );
                    sleep(backoff).await;
                }
                last_error = Some(e);
            }
            Err(e) => {
                warn!(operation, target, attempt, error = %e, "Non-transient store error");
                return Err(e);
            }
        }
    }

    Err(last_error.expect("at least one attempt was made"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new().with_initial_backoff(Duration::from_millis(1500))
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_backoff, Duration::from_millis(1500));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(0), Duration::from_millis(1500));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(3000));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(6000));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_policy(), "test_op", "obj", || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_three_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let attempt_times = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let times_clone = attempt_times.clone();

        let result = with_retry(&fast_policy(), "test_op", "obj", || {
            let n = calls_clone.fetch_add(1, Ordering::SeqCst);
            times_clone.lock().push(Instant::now());
            async move {
                if n < 3 {
                    Err(StoreError::ServiceUnavailable("busy".into()))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // Exactly 3 backoff waits, each at least double the previous.
        let times = attempt_times.lock();
        assert_eq!(times.len(), 4);
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps[0] >= Duration::from_millis(1500));
        assert!(gaps[1] >= gaps[0] * 2);
        assert!(gaps[2] >= gaps[1] * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion_propagates_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), StoreError> = with_retry(&fast_policy(), "test_op", "obj", || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::RateLimited("slow down".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(result.unwrap_err(), StoreError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_non_transient_fails_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<(), StoreError> = with_retry(&fast_policy(), "test_op", "obj", || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::PermissionDenied("nope".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), StoreError::PermissionDenied(_)));
    }
}
