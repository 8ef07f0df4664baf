//! Retry eligibility.
//!
//! # Responsibilities
//! - Hold the registry of retryable status codes and their reasons
//! - Decide, per completed attempt, whether to retry and why
//! - Gate retries by method idempotence
//!
//! # Design Decisions
//! - Transport failures are always retryable
//! - The default registry is a constant table; every registry is a fresh copy
//! - Decisions never look at request or response bodies

use std::collections::BTreeMap;

use reqwest::{Method, StatusCode};

use crate::error::{AttemptFailure, TransportError};

/// Statuses retried out of the box, with their reasons.
pub const DEFAULT_RETRYABLE_STATUSES: [(u16, &str); 4] = [
    (500, "server cannot process"),
    (502, "bad gateway"),
    (503, "service unavailable"),
    (504, "gateway timeout"),
];

/// Status code → human-readable retry reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableStatuses {
    reasons: BTreeMap<u16, String>,
}

impl RetryableStatuses {
    /// A fresh copy of the defaults.
    pub fn defaults() -> Self {
        Self::extend(&[])
    }

    /// Defaults plus `additional` codes, each not already present getting its
    /// standard reason phrase.
    pub fn extend(additional: &[u16]) -> Self {
        let mut reasons: BTreeMap<u16, String> = DEFAULT_RETRYABLE_STATUSES
            .iter()
            .map(|(code, reason)| (*code, reason.to_string()))
            .collect();

        for code in additional {
            reasons.entry(*code).or_insert_with(|| status_text(*code));
        }

        Self { reasons }
    }

    pub fn reason(&self, status: StatusCode) -> Option<&str> {
        self.reasons.get(&status.as_u16()).map(String::as_str)
    }

    pub fn contains(&self, status: StatusCode) -> bool {
        self.reasons.contains_key(&status.as_u16())
    }

    pub fn codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.reasons.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Verdict for one completed attempt.
    ///
    /// `status` is `None` when no response arrived.
    pub fn decide(&self, status: Option<StatusCode>, failure: Option<TransportError>) -> RetryVerdict {
        if let Some(err) = failure {
            return RetryVerdict::retry(RetryReason::Transport(err));
        }

        match status.and_then(|s| self.reason(s).map(|r| (s, r))) {
            Some((status, reason)) => RetryVerdict::retry(RetryReason::Status {
                status,
                reason: reason.to_string(),
            }),
            None => RetryVerdict::stop(),
        }
    }
}

impl Default for RetryableStatuses {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Standard reason phrase for a status code.
pub fn status_text(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", code))
}

/// Why an attempt should be retried.
#[derive(Debug)]
pub enum RetryReason {
    Transport(TransportError),
    Status { status: StatusCode, reason: String },
}

impl RetryReason {
    /// Tag the reason with the attempt that produced it.
    pub fn into_failure(self, attempt: u32) -> AttemptFailure {
        match self {
            RetryReason::Transport(source) => AttemptFailure::Transport { attempt, source },
            RetryReason::Status { status, reason } => AttemptFailure::RetryableStatus {
                attempt,
                status,
                reason,
            },
        }
    }
}

/// Per-attempt verdict; lives for one loop iteration.
#[derive(Debug)]
pub struct RetryVerdict {
    pub should_retry: bool,
    pub reason: Option<RetryReason>,
}

impl RetryVerdict {
    fn retry(reason: RetryReason) -> Self {
        Self {
            should_retry: true,
            reason: Some(reason),
        }
    }

    fn stop() -> Self {
        Self {
            should_retry: false,
            reason: None,
        }
    }
}

/// Whether a request with `method` may be attempted more than once.
pub fn method_allows_retry(method: &Method, retry_non_idempotent: bool) -> bool {
    retry_non_idempotent || method.is_idempotent()
}
