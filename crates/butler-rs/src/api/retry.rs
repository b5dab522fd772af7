//! Backoff policy for flaky completion providers.
//!
//! A worry run is at most three short API calls, so the policy is small:
//! when a provider hiccups (429, 5xx, dropped connection) the caller can
//! opt into a bounded number of retries with doubling, capped delays.
//! Client errors (400, 401, ...) never retry. Off by default: the
//! pipeline fails fast unless asked otherwise.

use std::time::Duration;
use tracing::warn;

/// Spread factors applied to the doubled delay so concurrent runs do not
/// hit a recovering provider in lockstep. Keyed on the attempt number;
/// not worth pulling in rand for a three-call pipeline.
const SPREAD: [f64; 4] = [0.70, 0.95, 0.55, 0.85];

/// Retry budget and backoff shape for one pipeline run.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// How many times a failed call may be retried. 0 disables retries.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub initial_delay: Duration,
    /// Ceiling for the doubled delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// The default backoff shape with the given retry budget.
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed): doubling from
    /// `initial_delay`, capped at `max_delay`, spread to avoid lockstep.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let doubled =
            self.initial_delay.as_secs_f64() * f64::from(2u32).powi(attempt.min(24) as i32);
        let capped = doubled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped * SPREAD[attempt as usize % SPREAD.len()])
    }
}

/// Whether an error string is worth retrying.
///
/// Client-error markers win when both kinds appear in the text: a 400
/// whose body happens to mention a timeout must not burn the budget.
pub fn should_retry(error: &str) -> bool {
    let lower = error.to_lowercase();

    let client_error = [
        "http 400",
        "http 401",
        "http 403",
        "http 404",
        "http 422",
        "invalid",
        "bad request",
        "unauthorized",
    ];
    if client_error.iter().any(|m| lower.contains(m)) {
        return false;
    }

    let overloaded = ["http 429", "http 500", "http 502", "http 503", "http 504"];
    if overloaded.iter().any(|m| lower.contains(m)) {
        return true;
    }

    // Transport-level failures from the HTTP client.
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "timeout",
        "broken pipe",
        "network",
    ]
    .iter()
    .any(|m| lower.contains(m))
}

/// Run a completion call under the retry policy, reporting each retry
/// through `on_retry(attempt, error)` before sleeping.
pub async fn retry_api_call_observed<T, F, Fut, O>(
    config: &RetryConfig,
    mut call: F,
    mut on_retry: O,
) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, String>>,
    O: FnMut(u32, &str),
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && should_retry(&e) => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                on_retry(attempt, &e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// [`retry_api_call_observed`] with retries logged through `tracing`.
pub async fn retry_api_call<T, F, Fut>(config: &RetryConfig, call: F) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, String>>,
{
    let max_retries = config.max_retries;
    retry_api_call_observed(config, call, |attempt, error| {
        warn!("transient API failure, retrying (attempt {attempt}/{max_retries}): {error}");
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn default_is_fail_fast() {
        assert_eq!(RetryConfig::default().max_retries, 0);
    }

    #[test]
    fn delay_grows_across_early_attempts() {
        let config = RetryConfig::with_retries(5);
        let d0 = config.delay_for_attempt(0);
        let d1 = config.delay_for_attempt(1);
        let d2 = config.delay_for_attempt(2);
        assert!(d0 < d1, "d0={d0:?} d1={d1:?}");
        assert!(d1 < d2, "d1={d1:?} d2={d2:?}");
    }

    #[test]
    fn delay_never_exceeds_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(2),
            ..RetryConfig::with_retries(10)
        };
        for attempt in 0..10 {
            assert!(config.delay_for_attempt(attempt) <= Duration::from_secs(2));
        }
    }

    #[test]
    fn overload_and_transport_errors_retry() {
        assert!(should_retry("completion API HTTP 429: rate limited"));
        assert!(should_retry("completion API HTTP 503: overloaded"));
        assert!(should_retry("request failed: connection reset by peer"));
        assert!(should_retry("request failed: operation timed out"));
    }

    #[test]
    fn client_errors_do_not_retry() {
        assert!(!should_retry("completion API HTTP 400: bad request"));
        assert!(!should_retry("completion API HTTP 401: unauthorized"));
        assert!(!should_retry("some random error"));
    }

    #[test]
    fn client_error_wins_over_transient_wording() {
        // A 400 whose body mentions a timeout is still a client error.
        assert!(!should_retry(
            "completion API HTTP 400: upstream timeout while validating"
        ));
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = retry_api_call(&fast(3), || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                if n < 2 {
                    Err("completion API HTTP 503: overloaded".to_string())
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_surfaces_the_error() {
        let calls = Cell::new(0u32);
        let err = retry_api_call::<&str, _, _>(&fast(1), || {
            calls.set(calls.get() + 1);
            async { Err("completion API HTTP 503: overloaded".to_string()) }
        })
        .await
        .unwrap_err();
        assert!(err.contains("HTTP 503"));
        assert_eq!(calls.get(), 2, "one initial call plus one retry");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let err = retry_api_call::<&str, _, _>(&fast(3), || {
            calls.set(calls.get() + 1);
            async { Err("completion API HTTP 401: unauthorized".to_string()) }
        })
        .await
        .unwrap_err();
        assert!(err.contains("HTTP 401"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn observer_sees_each_retry() {
        let calls = Cell::new(0u32);
        let attempts = RefCell::new(Vec::new());
        let result = retry_api_call_observed(
            &fast(3),
            || {
                let n = calls.get();
                calls.set(n + 1);
                async move {
                    if n < 2 {
                        Err("completion API HTTP 502: bad gateway".to_string())
                    } else {
                        Ok(())
                    }
                }
            },
            |attempt, error| {
                assert!(error.contains("HTTP 502"));
                attempts.borrow_mut().push(attempt);
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(*attempts.borrow(), vec![1, 2]);
    }
}
