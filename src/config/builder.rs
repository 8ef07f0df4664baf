//! Fluent construction of [`HttpSettings`].

use std::time::Duration;

use crate::config::schema::HttpSettings;
use crate::resilience::backoff::BackoffPolicy;

/// One setter per recognized option.
///
/// Starts from the defaults with `insecure = true`, for callers that build
/// settings in code instead of loading them from the environment.
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    settings: HttpSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: HttpSettings {
                insecure: true,
                ..HttpSettings::default()
            },
        }
    }

    /// Retries after the first attempt. A failing call is attempted
    /// `max_retry + 1` times.
    pub fn max_retry(mut self, max_retry: u32) -> Self {
        self.settings.max_retry = max_retry;
        self
    }

    /// Log the reason of every retried attempt.
    pub fn debug_mode(mut self, debug: bool) -> Self {
        self.settings.debug_mode = debug;
        self
    }

    /// Skip TLS certificate verification.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.settings.insecure = insecure;
        self
    }

    pub fn max_idle_conns(mut self, max_idle_conns: usize) -> Self {
        self.settings.max_idle_conns = max_idle_conns;
        self
    }

    /// How long an idle pooled connection is kept.
    pub fn idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.settings.idle_conn_timeout = timeout;
        self
    }

    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.settings.tls_handshake_timeout = timeout;
        self
    }

    pub fn expect_continue_timeout(mut self, timeout: Duration) -> Self {
        self.settings.expect_continue_timeout = timeout;
        self
    }

    /// Sub-second values are risky: a slow server gets cut off mid-response.
    pub fn response_header_timeout(mut self, timeout: Duration) -> Self {
        self.settings.response_header_timeout = timeout;
        self
    }

    /// Per-attempt timeout. An attempt that outlives it is abandoned and
    /// counted as a retryable failure.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    pub fn backoff_policy(mut self, policy: BackoffPolicy) -> Self {
        self.settings.backoff_policy = policy;
        self
    }

    /// Shorthand for `backoff_policy(BackoffPolicy::from_fn(f))`.
    pub fn backoff_fn<F>(self, f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.backoff_policy(BackoffPolicy::from_fn(f))
    }

    pub fn retry_non_idempotent(mut self, retry: bool) -> Self {
        self.settings.retry_non_idempotent = retry;
        self
    }

    pub fn build(self) -> HttpSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
