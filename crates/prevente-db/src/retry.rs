//! # Bounded Retry
//!
//! Caller-layer helper for transient store failures.
//!
//! `StoreUnavailable` (pool exhaustion, I/O hiccups) is worth a short retry;
//! every other error - domain outcomes, schema mismatches, query failures -
//! returns immediately. When the budget is exhausted the last transient
//! error surfaces as fatal for the request.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::DbResult;

/// Fixed pause between attempts. Deliberately short: the caller is a
/// blocking request-response handler, not a background job.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Runs `op` up to `attempts` times, retrying only transient failures.
///
/// ## Example
/// ```rust,ignore
/// let stock = with_retry(3, || ledger.current_stock(&loc, None)).await?;
/// ```
pub async fn with_retry<T, F, Fut>(attempts: u32, mut op: F) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(attempt, error = %err, "Transient store failure, retrying");
                sleep(RETRY_BACKOFF).await;
            }
            Err(err) => return Err(err),
        }
    }
}
