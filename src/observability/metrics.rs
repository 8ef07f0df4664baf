//! Retry metrics.
//!
//! # Metrics
//! - `http_retry_attempts_total` (counter): attempts by outcome
//! - `http_retry_calls_total` (counter): logical calls by terminal result
//! - `http_retry_backoff_seconds` (histogram): backoff waits
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use std::time::Duration;

/// One attempt finished with `outcome`
/// (`success`, `retryable_status`, `transport_error`, `timeout`, `cancelled`).
pub fn record_attempt(outcome: &'static str) {
    metrics::counter!("http_retry_attempts_total", "outcome" => outcome).increment(1);
}

/// One logical call ended with `result`
/// (`success`, `exhausted`, `cancelled`, `not_retried`).
pub fn record_call(result: &'static str) {
    metrics::counter!("http_retry_calls_total", "result" => result).increment(1);
}

pub fn record_backoff(delay: Duration) {
    metrics::histogram!("http_retry_backoff_seconds").record(delay.as_secs_f64());
}
