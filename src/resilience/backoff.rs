//! Backoff policies: attempt number → delay before the next attempt.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

/// A pluggable mapping from a 1-based attempt number to a delay.
///
/// Cheap to clone; the underlying function is shared. No bounds are imposed
/// on what a custom function returns.
#[derive(Clone)]
pub struct BackoffPolicy {
    delay_fn: Arc<dyn Fn(u32) -> Duration + Send + Sync>,
    name: &'static str,
}

impl BackoffPolicy {
    /// `2^attempt` seconds (2s, 4s, 8s, ...), saturating.
    pub fn exponential() -> Self {
        Self {
            delay_fn: Arc::new(exponential_delay),
            name: "exponential",
        }
    }

    /// The same delay after every attempt.
    pub fn constant(delay: Duration) -> Self {
        Self {
            delay_fn: Arc::new(move |_| delay),
            name: "constant",
        }
    }

    /// Capped exponential backoff with up to 10% jitter.
    pub fn exponential_with_jitter(base: Duration, max: Duration) -> Self {
        Self {
            delay_fn: Arc::new(move |attempt| calculate_backoff(attempt, base, max)),
            name: "exponential_jitter",
        }
    }

    /// Wrap an arbitrary function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            delay_fn: Arc::new(f),
            name: "custom",
        }
    }

    /// Delay to wait after `attempt` failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        (self.delay_fn)(attempt)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl fmt::Debug for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffPolicy").field("name", &self.name).finish()
    }
}

fn exponential_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Calculate exponential backoff delay with jitter.
fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    // 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
