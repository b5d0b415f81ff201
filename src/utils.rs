use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Retry a Telegram API call with exponential backoff and jitter.
///
/// Only errors accepted by `is_transient` are retried; anything else is
/// returned immediately.
///
/// # Errors
///
/// Returns the last error once retries are exhausted or a non-transient
/// error occurs.
///
/// # Examples
///
/// ```
/// use album_bot::utils::retry_telegram_operation;
///
/// # async fn example() -> Result<(), String> {
/// let value = retry_telegram_operation(
///     || async { Ok::<_, String>(42) },
///     |_: &String| false,
/// )
/// .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
pub async fn retry_telegram_operation<F, Fut, T, E, C>(
    operation: F,
    is_transient: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter) // Add jitter to prevent thundering herd
        .take(TELEGRAM_API_MAX_RETRIES);

    RetryIf::start(retry_strategy, operation, is_transient)
        .await
        .map_err(|e| {
            warn!("Telegram API operation failed: {}", e);
            e
        })
}
