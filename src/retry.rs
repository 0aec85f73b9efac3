//! Bounded retries with exponential backoff for third-party widget APIs.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included. Never below 1.
    pub max_attempts: u32,
    /// Pause before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single pause.
    pub max_delay: Duration,
    /// Growth factor applied to the pause after each failed retry.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Quote and weather calls. The widget already shows a fallback, so
    /// one quick retry is enough.
    pub fn widget_api() -> Self {
        Self::new(2, Duration::from_millis(500)).with_max_delay(Duration::from_secs(1))
    }

    /// Pause before attempt `attempt` (0 = first try, no pause).
    fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::widget_api()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or
/// the attempts run out. The last error is returned.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        let pause = config.backoff(attempt);
        if !pause.is_zero() {
            debug!(
                "{}: waiting {:?} before attempt {}/{}",
                operation_name,
                pause,
                attempt + 1,
                config.max_attempts
            );
            sleep(pause).await;
        }

        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{}: recovered on attempt {}", operation_name, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        attempt += 1;
        if attempt >= config.max_attempts || !should_retry(&error) {
            warn!("{}: giving up after {} attempt(s): {}", operation_name, attempt, error);
            return Err(error);
        }
        warn!(
            "{}: attempt {}/{} failed: {}",
            operation_name, attempt, config.max_attempts, error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::sync::Mutex;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            url: "https://api.quotable.io/random".to_string(),
            status: code,
        }
    }

    /// Replays `outcomes` in order and records how often it was called.
    fn scripted(outcomes: Vec<Result<&'static str, FetchError>>) -> (Mutex<Vec<Result<&'static str, FetchError>>>, Mutex<u32>) {
        let mut outcomes = outcomes;
        outcomes.reverse();
        (Mutex::new(outcomes), Mutex::new(0))
    }

    async fn run(
        config: &RetryConfig,
        outcomes: Vec<Result<&'static str, FetchError>>,
    ) -> (Result<&'static str, FetchError>, u32) {
        let (queue, calls) = scripted(outcomes);
        let result = with_retry_if(
            config,
            "Quote API",
            || {
                *calls.lock().unwrap() += 1;
                let next = queue.lock().unwrap().pop().unwrap_or_else(|| Err(status(599)));
                async move { next }
            },
            FetchError::is_retryable,
        )
        .await;
        let calls = *calls.lock().unwrap();
        (result, calls)
    }

    // ==================== Backoff Tests ====================

    #[test]
    fn test_first_attempt_has_no_pause() {
        assert_eq!(RetryConfig::new(3, Duration::from_millis(500)).backoff(0), Duration::ZERO);
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = RetryConfig::new(5, Duration::from_millis(300)).with_max_delay(Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_millis(300));
        assert_eq!(config.backoff(2), Duration::from_millis(600));
        assert_eq!(config.backoff(3), Duration::from_secs(1));
    }

    #[test]
    fn test_attempts_never_below_one() {
        assert_eq!(RetryConfig::new(0, Duration::from_millis(10)).max_attempts, 1);
    }

    #[test]
    fn test_widget_preset() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.backoff(1), Duration::from_millis(500));
    }

    // ==================== with_retry_if Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_server_error_then_success() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let (result, calls) = run(&config, vec![Err(status(502)), Ok("quote")]).await;
        assert_eq!(result, Ok("quote"));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_not_retried() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let (result, calls) = run(&config, vec![Err(status(404))]).await;
        assert_eq!(result, Err(status(404)));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_with_last_error() {
        let unreachable = FetchError::Transport {
            url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            reason: "connection reset".to_string(),
        };
        let (result, calls) = run(
            &RetryConfig::widget_api(),
            vec![Err(status(503)), Err(unreachable.clone()), Ok("late")],
        )
        .await;
        assert_eq!(result, Err(unreachable));
        assert_eq!(calls, 2);
    }
}
