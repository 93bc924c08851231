//! Retry loop for single backend calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use dynaquery_core::batch::RetryPolicy;
use dynaquery_core::client::ClientResult;
use dynaquery_core::{Error, Result};

/// Delay before retry `attempt` with equal jitter: half of the exponential
/// delay is fixed, the other half is random.
pub(crate) fn backoff(policy: &RetryPolicy, attempt: usize) -> Duration {
    let delay = policy.delay(attempt);
    if delay.is_zero() {
        return delay;
    }

    let half = delay / 2;
    let spread = u64::try_from(half.as_micros()).unwrap_or(u64::MAX);
    half + Duration::from_micros(rand::rng().random_range(0..=spread))
}

/// Runs `call` until it succeeds, fails with a non-transient error, or the
/// policy runs out of retries.
///
/// Exhausting the policy yields `BackendUnavailable`; anything non-transient
/// is returned as `Backend` without retrying.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && policy.should_retry(attempt) => {
                let delay = backoff(policy, attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient backend failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                tracing::error!(operation, attempts = attempt + 1, error = %err, "Retries exhausted");
                return Err(Error::BackendUnavailable {
                    operation,
                    message: err.to_string(),
                });
            }
            Err(source) => return Err(Error::Backend { operation, source }),
        }
    }
}
