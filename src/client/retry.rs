//! Bounded retry with server-hinted and exponential backoff.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,
    /// Added on top of every rate-limit wait.
    pub rate_limit_grace_seconds: u64,
    /// Rate-limit wait used when the server hint cannot be parsed.
    pub rate_limit_fallback_seconds: u64,
    /// First wait after a timeout or unexpected status.
    pub transient_delay_seconds: u64,
    /// Multiplier applied to the transient wait after each failure.
    pub backoff_factor: f64,
    /// Ceiling for the transient wait.
    pub max_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_grace_seconds: 3,
            rate_limit_fallback_seconds: 60,
            transient_delay_seconds: 10,
            backoff_factor: 2.0,
            max_delay_seconds: 120,
        }
    }
}

impl RetryConfig {
    /// Wait before retrying after a transient failure on `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.transient_delay_seconds as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay_seconds as f64).max(0.0);
        Duration::from_millis((capped * 1000.0) as u64)
    }

    /// Wait after a rate-limited response. Server hints are capped at the
    /// larger of `max_delay_seconds` and the fallback.
    pub fn rate_limit_delay(&self, retry_after: Option<Duration>) -> Duration {
        let fallback = Duration::from_secs(self.rate_limit_fallback_seconds);
        let ceiling = Duration::from_secs(self.max_delay_seconds).max(fallback);
        let wait = retry_after.map_or(fallback, |hint| hint.min(ceiling));
        wait.saturating_add(Duration::from_secs(self.rate_limit_grace_seconds))
    }
}

/// Parses a `Retry-After` style hint expressed in (possibly fractional) seconds.
///
/// A missing hint means "retry now"; an unparsable one yields `None` so the
/// caller falls back to the configured delay.
pub fn parse_retry_after(hint: Option<&str>) -> Option<Duration> {
    let Some(hint) = hint.map(str::trim) else {
        return Some(Duration::ZERO);
    };
    if hint.is_empty() {
        return Some(Duration::ZERO);
    }
    hint.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Runs `attempt` until it succeeds, fails fatally, or the attempt budget runs out.
pub async fn with_retry<F, Fut>(
    config: &RetryConfig,
    shutdown: &Shutdown,
    label: &str,
    mut attempt: F,
) -> Result<String, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, TransportError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_error = None;

    for n in 0..max_attempts {
        debug!(request = label, attempt = n + 1, max = max_attempts, "Sending request");

        let err = match shutdown.guard(attempt()).await? {
            Ok(payload) => return Ok(payload),
            Err(err) => err,
        };

        if !err.is_transient() {
            warn!(request = label, error = %err, "Request failed, not retrying");
            return Err(err);
        }

        if n + 1 < max_attempts {
            let delay = match &err {
                TransportError::RateLimited { retry_after } => config.rate_limit_delay(*retry_after),
                _ => config.delay_for_attempt(n),
            };
            warn!(
                request = label,
                attempt = n + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Request failed, backing off"
            );
            shutdown.sleep(delay).await?;
        }
        last_error = Some(err);
    }

    Err(TransportError::RetriesExhausted {
        attempts: max_attempts,
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(20));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(40));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(120));
    }

    #[test]
    fn test_rate_limit_delay_uses_hint_or_fallback() {
        let config = RetryConfig::default();
        assert_eq!(
            config.rate_limit_delay(Some(Duration::from_secs(2))),
            Duration::from_secs(5)
        );
        assert_eq!(config.rate_limit_delay(None), Duration::from_secs(63));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("7")), Some(Duration::from_secs(7)));
        assert_eq!(parse_retry_after(Some("0.5")), Some(Duration::from_millis(500)));
        assert_eq!(parse_retry_after(None), Some(Duration::ZERO));
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(Some("-1")), None);
        assert_eq!(parse_retry_after(Some("NaN")), None);
    }

    #[test]
    fn test_oversized_hint_falls_back_or_caps() {
        let config = RetryConfig::default();
        assert_eq!(parse_retry_after(Some("1e20")), None);
        assert_eq!(config.rate_limit_delay(parse_retry_after(Some("1e20"))), Duration::from_secs(63));

        assert_eq!(config.rate_limit_delay(Some(Duration::from_secs(86_400))), Duration::from_secs(123));
        assert_eq!(config.rate_limit_delay(Some(Duration::MAX)), Duration::from_secs(123));

        let huge_grace = RetryConfig {
            rate_limit_grace_seconds: u64::MAX,
            ..RetryConfig::default()
        };
        assert_eq!(huge_grace.rate_limit_delay(None), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_success() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result = with_retry(&RetryConfig::default(), &Shutdown::never(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TransportError::RateLimited {
                        retry_after: Some(Duration::from_secs(4)),
                    })
                } else {
                    Ok("{}".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "{}");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::default(), &Shutdown::never(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Network("connection refused".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_exhaust_budget() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::default(), &Shutdown::never(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Timeout) }
        })
        .await;

        assert!(matches!(
            result,
            Err(TransportError::RetriesExhausted { attempts: 5, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }
}
