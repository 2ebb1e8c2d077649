//! Bounded-attempt retry executor with linear backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// Run `operation` up to `max_attempts` times, waiting
/// `attempt_index * base_delay` after the i-th failure (linear backoff, no
/// jitter).
///
/// The final attempt's error is returned verbatim, never wrapped, so the
/// original diagnostic payload survives exhaustion. Callers that want an
/// "exhausted retries" shape wrap the returned error themselves.
pub async fn run_with_retry<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("operation succeeded on attempt {}/{}", attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt >= max_attempts {
                    warn!(
                        "❌ giving up after {} attempts, last error: {}",
                        max_attempts, error
                    );
                    return Err(error);
                }
                warn!(
                    "attempt {}/{} failed: {}, retrying",
                    attempt, max_attempts, error
                );
                sleep(base_delay * attempt).await;
                attempt += 1;
            }
        }
    }
}
