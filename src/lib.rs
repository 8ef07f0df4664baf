//! HTTP client with transparent retries.
//!
//! Wraps a request transport with a retry loop: per-attempt timeouts,
//! retryable status registry, backoff between attempts, and caller
//! cancellation. Failed calls report every attempt's reason in order.

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod resilience;

pub use config::{HttpSettings, SettingsBuilder};
pub use error::{AggregatedError, AttemptFailure, RetryError, RetryResult, Terminal, TransportError};
pub use http::{build_client, ReqwestTransport, RetryClient, RetryTransport, Transport};
pub use resilience::{BackoffPolicy, CancelSignal, RetryableStatuses};
