//! Retry - Bounded polling for eventually consistent APIs
//!
//! Operations are retried on a fixed interval while a predicate says the
//! error is transient and the deadline has not passed. Once the deadline is
//! reached, the next failure is returned as-is.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::provider::{ProviderError, ProviderResult};

/// Propagation window used for IAM changes
pub const PROPAGATION_TIMEOUT: Duration = Duration::from_secs(120);

/// How long and how often to retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Two minutes, polling every two seconds
    pub const fn propagation() -> Self {
        Self::new(PROPAGATION_TIMEOUT, Duration::from_secs(2))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::propagation()
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or a
/// retryable failure happens after the deadline.
///
/// The attempt that starts after the deadline is the final one.
pub async fn retry_until<T, F, Fut, P>(
    policy: RetryPolicy,
    retryable: P,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
    P: Fn(&ProviderError) -> bool,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 1u32;

    loop {
        let started = Instant::now();
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retryable(&err) && started < deadline => {
                log::debug!("attempt {} failed with retryable error: {}", attempt, err);
                attempt += 1;
                tokio::time::sleep(policy.interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Retry predicate matching a single remote error code
pub fn on_code(code: &'static str) -> impl Fn(&ProviderError) -> bool {
    move |err| err.is_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_such_entity() -> ProviderError {
        ProviderError::new("not yet visible").with_code("NoSuchEntity")
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_until(RetryPolicy::propagation(), on_code("NoSuchEntity"), move || {
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(no_such_entity())
                } else {
                    Ok("profile")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "profile");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: ProviderResult<()> =
            retry_until(RetryPolicy::propagation(), on_code("NoSuchEntity"), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::new("denied").with_code("AccessDenied"))
            })
            .await;

        assert!(result.unwrap_err().is_code("AccessDenied"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_deadline_with_final_attempt() {
        let policy = RetryPolicy::new(Duration::from_secs(10), Duration::from_secs(3));
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: ProviderResult<()> =
            retry_until(policy, on_code("NoSuchEntity"), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(no_such_entity())
            })
            .await;

        assert!(result.unwrap_err().is_code("NoSuchEntity"));
        // Attempts at t=0,3,6,9 fall inside the window; t=12 is the final one.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
