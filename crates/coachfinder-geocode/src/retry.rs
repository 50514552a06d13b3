//! Optional retry with exponential back-off for a single provider attempt.
//!
//! Disabled by default (`max_retries = 0`): the primary→fallback hop is the
//! only second chance a search normally gets. When enabled, only transient
//! failures are retried; a bad key or a malformed body fails immediately so
//! the fallback provider is reached without delay.

use std::future::Future;
use std::time::Duration;

use crate::error::GeocodeError;

const MAX_DELAY: Duration = Duration::from_secs(30);

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connect failures, HTTP 429 and 5xx.
///
/// **Not retriable:** missing API key, 4xx other than 429, parse failures,
/// and the service-level aggregate errors.
pub(crate) fn is_retriable(err: &GeocodeError) -> bool {
    match err {
        GeocodeError::ProviderTransport { source, .. } => source.is_timeout() || source.is_connect(),
        GeocodeError::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

/// Sleep before retry number `retry` (1-based): `base_ms * 2^(retry-1)`,
/// capped at 30 s, then scaled by a random factor in `0.75..=1.25`.
fn backoff_delay(base_ms: u64, retry: u32) -> Duration {
    let doublings = retry.saturating_sub(1).min(16);
    let exponential = Duration::from_millis(base_ms).saturating_mul(1 << doublings);
    exponential
        .min(MAX_DELAY)
        .mul_f64(rand::random_range(0.75..=1.25))
}

/// Runs `operation` once, then up to `max_retries` more times while it keeps
/// failing with a retriable error.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    provider: &'static str,
    max_retries: u32,
    delay_ms: u64,
    mut operation: F,
) -> Result<T, GeocodeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let mut result = operation().await;
    for retry in 1..=max_retries {
        let err = match result {
            Err(err) if is_retriable(&err) => err,
            done => return done,
        };
        let delay = backoff_delay(delay_ms, retry);
        tracing::warn!(
            provider,
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient geocoding error, backing off"
        );
        tokio::time::sleep(delay).await;
        result = operation().await;
    }
    result
}
