//! Bounded exponential backoff for transient repository errors.

use std::future::Future;

use tracing::warn;

use crate::config::constants::{MAX_STORAGE_ATTEMPTS, STORAGE_BACKOFF_BASE};
use crate::error::MatchResult;

/// Run `op`, retrying transient failures with exponential backoff.
///
/// Only [`crate::error::MatchError::StorageUnavailable`] is retried; any
/// other error returns immediately. After [`MAX_STORAGE_ATTEMPTS`] the
/// last error is surfaced.
pub async fn retry_with_backoff<T, F, Fut>(label: &str, mut op: F) -> MatchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MatchResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt + 1 < MAX_STORAGE_ATTEMPTS => {
                let delay = STORAGE_BACKOFF_BASE * 2u32.saturating_pow(attempt);
                warn!(
                    %err,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "{label}: transient storage error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
