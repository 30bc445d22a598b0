// src/llm/retry.rs
// Bounded retry with a fixed backoff schedule for the one distinguished
// transient upstream condition (rate limiting)

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::{Result, VegaError};

/// Additional attempts after the first call
pub const MAX_RETRIES: usize = 3;

/// Fixed backoff schedule, indexed by attempt number
pub const RETRY_DELAYS: [Duration; MAX_RETRIES] = [
    Duration::from_secs(5),
    Duration::from_secs(15),
    Duration::from_secs(30),
];

/// Invoke `op` against the completion service, retrying only on
/// [`VegaError::RateLimited`]. Any other failure propagates immediately.
/// After exhausting retries, the rate-limit failure itself propagates, the
/// only path for that condition to reach callers.
pub async fn call_with_retry<T, F, Fut>(request_id: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..=MAX_RETRIES {
        match op().await {
            Ok(value) => return Ok(value),
            Err(VegaError::RateLimited) if attempt < MAX_RETRIES => {
                let delay = RETRY_DELAYS[attempt];
                warn!(
                    request_id = %request_id,
                    attempt = attempt + 1,
                    max_attempts = MAX_RETRIES + 1,
                    delay_secs = delay.as_secs(),
                    "rate limited, backing off before retry"
                );
                sleep(delay).await;
            }
            Err(VegaError::RateLimited) => {
                error!(request_id = %request_id, "rate limit persisted after all retries");
                return Err(VegaError::RateLimited);
            }
            Err(e) => return Err(e),
        }
    }
    unreachable!("loop returns on the final attempt")
}
