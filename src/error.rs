//! Error taxonomy for retried HTTP calls.
//!
//! # Layers
//! ```text
//! TransportError      one failed execution of the underlying transport
//!     → AttemptFailure    a retry reason tagged with its attempt number
//!     → AggregatedError   every reason of one logical call, in order, plus
//!                         the terminal marker (exhausted / cancelled)
//!     → RetryError        what public entry points return
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Result alias for the public API.
pub type RetryResult<T> = Result<T, RetryError>;

/// Failure of the underlying transport (connection refused, DNS, TLS, ...).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A nested retrying transport gave up.
    #[error(transparent)]
    Retry(Box<AggregatedError>),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// True when the transport itself gave up on a deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Http(e) => e.is_timeout(),
            TransportError::Retry(e) => e
                .failures()
                .last()
                .is_some_and(|f| matches!(f, AttemptFailure::Timeout { .. })),
            TransportError::Other(_) => false,
        }
    }
}

/// One retry reason, tagged with the 1-based attempt that produced it.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error("attempt({attempt}): {source}")]
    Transport {
        attempt: u32,
        #[source]
        source: TransportError,
    },

    #[error("request timeout attempt({attempt})")]
    Timeout { attempt: u32, timeout: Duration },

    #[error("attempt({attempt}): {reason}")]
    RetryableStatus {
        attempt: u32,
        status: StatusCode,
        reason: String,
    },

    #[error("attempt({attempt}): cancelled in flight")]
    CancelledInFlight { attempt: u32 },
}

impl AttemptFailure {
    pub fn attempt(&self) -> u32 {
        match self {
            AttemptFailure::Transport { attempt, .. }
            | AttemptFailure::Timeout { attempt, .. }
            | AttemptFailure::RetryableStatus { attempt, .. }
            | AttemptFailure::CancelledInFlight { attempt } => *attempt,
        }
    }

    /// Status observed on this attempt, if a response arrived.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AttemptFailure::RetryableStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// How a failed logical call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// Every permitted attempt failed with a retryable reason.
    MaxRetriesReached,
    /// The caller's signal fired before the next attempt could start.
    CancelledFromParent,
    /// The call was allowed a single attempt (non-idempotent method or
    /// non-replayable body) and that attempt failed.
    NotRetried,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::MaxRetriesReached => write!(f, "max retries reached"),
            Terminal::CancelledFromParent => write!(f, "cancelled from parent"),
            Terminal::NotRetried => write!(f, "request not retried"),
        }
    }
}

/// Full attempt history of one failed logical call.
#[derive(Debug)]
pub struct AggregatedError {
    failures: Vec<AttemptFailure>,
    terminal: Terminal,
}

impl AggregatedError {
    pub(crate) fn new(failures: Vec<AttemptFailure>, terminal: Terminal) -> Self {
        Self { failures, terminal }
    }

    /// Every attempt reason, in the order they occurred.
    pub fn failures(&self) -> &[AttemptFailure] {
        &self.failures
    }

    pub fn terminal(&self) -> Terminal {
        self.terminal
    }

    /// Number of attempts that actually reached the transport.
    pub fn attempts(&self) -> u32 {
        self.failures.iter().map(AttemptFailure::attempt).max().unwrap_or(0)
    }

    pub fn is_cancelled(&self) -> bool {
        self.terminal == Terminal::CancelledFromParent
    }

    pub fn is_exhausted(&self) -> bool {
        self.terminal == Terminal::MaxRetriesReached
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            write!(f, "{}; ", failure)?;
        }
        write!(f, "{}", self.terminal)
    }
}

impl std::error::Error for AggregatedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .last()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// Top-level error returned by the public API.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error(transparent)]
    Aggregated(#[from] AggregatedError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[source] reqwest::Error),
}

impl RetryError {
    /// The attempt history, when the error came out of the retry loop.
    pub fn as_aggregated(&self) -> Option<&AggregatedError> {
        match self {
            RetryError::Aggregated(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_display_keeps_every_reason_in_order() {
        let err = AggregatedError::new(
            vec![
                AttemptFailure::RetryableStatus {
                    attempt: 1,
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    reason: "service unavailable".into(),
                },
                AttemptFailure::Timeout {
                    attempt: 2,
                    timeout: Duration::from_secs(1),
                },
            ],
            Terminal::MaxRetriesReached,
        );

        assert_eq!(
            err.to_string(),
            "attempt(1): service unavailable; request timeout attempt(2); max retries reached"
        );
        assert_eq!(err.attempts(), 2);
        assert!(err.is_exhausted());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancelled_before_any_attempt() {
        let err = AggregatedError::new(Vec::new(), Terminal::CancelledFromParent);
        assert_eq!(err.to_string(), "cancelled from parent");
        assert_eq!(err.attempts(), 0);
        assert!(err.is_cancelled());
    }

    #[test]
    fn transport_failure_is_tagged() {
        let failure = AttemptFailure::Transport {
            attempt: 3,
            source: TransportError::Other("connection refused".into()),
        };
        assert_eq!(failure.to_string(), "attempt(3): connection refused");
        assert_eq!(failure.attempt(), 3);
        assert!(failure.status().is_none());
    }
}
