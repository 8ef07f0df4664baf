//! Configuration schema definitions.
//!
//! `HttpRetryConfig` is the serialized form (TOML file, environment overlay);
//! all durations are integer milliseconds. `HttpSettings` is the runtime value
//! the client is built from.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::builder::SettingsBuilder;
use crate::resilience::backoff::BackoffPolicy;

/// Serialized retry client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpRetryConfig {
    /// Retries after the first attempt; total attempts = max_retry + 1.
    pub max_retry: u32,

    /// Log every retried attempt at info level.
    pub debug_mode: bool,

    /// Skip TLS certificate verification.
    pub insecure: bool,

    /// Idle pooled connections kept per host.
    pub max_idle_conns: usize,

    pub idle_conn_timeout_ms: u64,

    pub tls_handshake_timeout_ms: u64,

    pub expect_continue_timeout_ms: u64,

    pub response_header_timeout_ms: u64,

    /// Per-attempt timeout.
    pub request_timeout_ms: u64,

    /// Allow retries of POST/PATCH/CONNECT.
    pub retry_non_idempotent: bool,

    /// Status codes retried in addition to the defaults.
    pub extra_retryable_statuses: Vec<u16>,

    pub backoff: BackoffConfig,
}

impl Default for HttpRetryConfig {
    fn default() -> Self {
        Self {
            max_retry: 3,
            debug_mode: false,
            insecure: false,
            max_idle_conns: 15,
            idle_conn_timeout_ms: 90_000,
            tls_handshake_timeout_ms: 10_000,
            expect_continue_timeout_ms: 1_000,
            response_header_timeout_ms: 10_000,
            request_timeout_ms: 10_000,
            retry_non_idempotent: false,
            extra_retryable_statuses: Vec::new(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl HttpRetryConfig {
    /// Runtime settings described by this configuration.
    pub fn to_settings(&self) -> HttpSettings {
        HttpSettings {
            max_retry: self.max_retry,
            debug_mode: self.debug_mode,
            insecure: self.insecure,
            max_idle_conns: self.max_idle_conns,
            idle_conn_timeout: Duration::from_millis(self.idle_conn_timeout_ms),
            tls_handshake_timeout: Duration::from_millis(self.tls_handshake_timeout_ms),
            expect_continue_timeout: Duration::from_millis(self.expect_continue_timeout_ms),
            response_header_timeout: Duration::from_millis(self.response_header_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            backoff_policy: self.backoff.to_policy(),
            retry_non_idempotent: self.retry_non_idempotent,
        }
    }
}

/// Serialized backoff policy choice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// `2^attempt` seconds.
    #[default]
    Exponential,
    Constant {
        delay_ms: u64,
    },
    /// Capped exponential with jitter.
    Jitter {
        base_ms: u64,
        max_ms: u64,
    },
}

impl BackoffConfig {
    pub fn to_policy(&self) -> BackoffPolicy {
        match self {
            BackoffConfig::Exponential => BackoffPolicy::exponential(),
            BackoffConfig::Constant { delay_ms } => {
                BackoffPolicy::constant(Duration::from_millis(*delay_ms))
            }
            BackoffConfig::Jitter { base_ms, max_ms } => BackoffPolicy::exponential_with_jitter(
                Duration::from_millis(*base_ms),
                Duration::from_millis(*max_ms),
            ),
        }
    }
}

/// Runtime settings for a retrying client.
///
/// Immutable once handed to the client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub max_retry: u32,
    pub debug_mode: bool,
    pub insecure: bool,
    pub max_idle_conns: usize,
    pub idle_conn_timeout: Duration,
    pub tls_handshake_timeout: Duration,
    /// Carried for parity with other transports; reqwest exposes no knob for it.
    pub expect_continue_timeout: Duration,
    pub response_header_timeout: Duration,
    pub request_timeout: Duration,
    pub backoff_policy: BackoffPolicy,
    pub retry_non_idempotent: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpRetryConfig::default().to_settings()
    }
}

impl HttpSettings {
    /// Fluent construction. Unlike [`HttpSettings::default`], the builder
    /// starts with `insecure = true`.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let settings = HttpSettings::default();
        assert_eq!(settings.max_retry, 3);
        assert!(!settings.debug_mode);
        assert!(!settings.insecure);
        assert_eq!(settings.max_idle_conns, 15);
        assert_eq!(settings.idle_conn_timeout, Duration::from_secs(90));
        assert_eq!(settings.tls_handshake_timeout, Duration::from_secs(10));
        assert_eq!(settings.expect_continue_timeout, Duration::from_secs(1));
        assert_eq!(settings.response_header_timeout, Duration::from_secs(10));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.backoff_policy.name(), "exponential");
        assert!(!settings.retry_non_idempotent);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = HttpRetryConfig {
            max_retry: 5,
            extra_retryable_statuses: vec![404, 429],
            backoff: BackoffConfig::Jitter {
                base_ms: 100,
                max_ms: 2000,
            },
            ..HttpRetryConfig::default()
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HttpRetryConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let text = r#"
            max_retry = 1
            request_timeout_ms = 500

            [backoff]
            kind = "constant"
            delay_ms = 50
        "#;
        let cfg: HttpRetryConfig = toml::from_str(text).unwrap();
        assert_eq!(cfg.max_retry, 1);
        assert_eq!(cfg.max_idle_conns, 15);
        assert_eq!(cfg.backoff, BackoffConfig::Constant { delay_ms: 50 });

        let settings = cfg.to_settings();
        assert_eq!(settings.request_timeout, Duration::from_millis(500));
        assert_eq!(settings.backoff_policy.delay(4), Duration::from_millis(50));
    }
}
