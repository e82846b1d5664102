//! Fixed-count retry with a fixed delay

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Run `operation` up to `attempts` times, sleeping `delay` between attempts.
///
/// Every error is retried. Once the attempts are exhausted the last error is
/// returned unchanged. `attempts` of zero is treated as one.
pub async fn retry<T, E, F, Fut>(attempts: u32, delay: Duration, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err(e),
            Err(e) => {
                warn!("Attempt {}/{} failed: {}", attempt, attempts, e);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
