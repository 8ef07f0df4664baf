//! Retry coordination for one logical call.
//!
//! # State Transitions
//! ```text
//! Ready → Attempting
//! Attempting → Success            response with an unregistered status
//! Attempting → Retrying           transport failure, timeout, registered status
//! Retrying → Attempting           after the backoff wait
//! (top of loop) → Cancelled       caller signal fired
//! (top of loop) → Exhausted       attempt budget consumed
//! ```
//!
//! Attempts are strictly sequential. Every retryable reason is kept and
//! returned in order if the call does not succeed.

use std::time::Duration;

use reqwest::{Request, Response};

use crate::config::HttpSettings;
use crate::error::{AggregatedError, AttemptFailure, Terminal};
use crate::http::transport::Transport;
use crate::observability::metrics;
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::cancel::CancelSignal;
use crate::resilience::retries::{method_allows_retry, RetryableStatuses};
use crate::resilience::timeouts::{execute_attempt, AttemptOutcome, AttemptResult};

/// Everything the retry loop needs, captured once per client.
#[derive(Debug, Clone)]
pub struct RetryConfiguration {
    pub max_retries: u32,
    pub per_attempt_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub retryable: RetryableStatuses,
    pub retry_non_idempotent: bool,
    pub debug_mode: bool,
}

impl RetryConfiguration {
    pub fn new(settings: &HttpSettings, extra_retryable: &[u16]) -> Self {
        Self {
            max_retries: settings.max_retry,
            per_attempt_timeout: settings.request_timeout,
            backoff: settings.backoff_policy.clone(),
            retryable: RetryableStatuses::extend(extra_retryable),
            retry_non_idempotent: settings.retry_non_idempotent,
            debug_mode: settings.debug_mode,
        }
    }
}

impl Default for RetryConfiguration {
    fn default() -> Self {
        Self::new(&HttpSettings::default(), &[])
    }
}

/// How many attempts a request may get.
///
/// The two one-attempt budgets end differently on a registered status.
/// `max_retries = 0` still runs the retry decision, so the status becomes a
/// failure and the call ends `MaxRetriesReached`. A single-shot request is
/// outside the retry policy altogether: its response goes back as-is and only
/// a missing response (transport failure, timeout) ends `NotRetried`.
#[derive(Debug, Clone, Copy)]
struct Budget {
    attempts: u32,
    /// Cut to one attempt by method or body, not by `max_retries`.
    single_shot: bool,
}

impl Budget {
    fn for_request(config: &RetryConfiguration, request: &Request) -> Self {
        let full = config.max_retries.saturating_add(1);
        if full == 1 {
            return Self {
                attempts: 1,
                single_shot: false,
            };
        }

        if !method_allows_retry(request.method(), config.retry_non_idempotent) {
            tracing::debug!(method = %request.method(), "Method is not idempotent, single attempt");
            return Self {
                attempts: 1,
                single_shot: true,
            };
        }

        if request.try_clone().is_none() {
            tracing::debug!("Request body cannot be replayed, single attempt");
            return Self {
                attempts: 1,
                single_shot: true,
            };
        }

        Self {
            attempts: full,
            single_shot: false,
        }
    }

    fn exhausted(&self) -> Terminal {
        if self.single_shot {
            Terminal::NotRetried
        } else {
            Terminal::MaxRetriesReached
        }
    }
}

/// Drive attempts until success, exhaustion or cancellation.
pub async fn run<T>(
    transport: &T,
    config: &RetryConfiguration,
    request: Request,
    signal: &CancelSignal,
) -> Result<Response, AggregatedError>
where
    T: Transport + ?Sized,
{
    let budget = Budget::for_request(config, &request);
    let mut pending = Some(request);
    let mut failures: Vec<AttemptFailure> = Vec::new();
    let mut attempt: u32 = 1;

    loop {
        if signal.is_cancelled() {
            tracing::debug!(attempts = attempt - 1, "Cancelled from parent");
            metrics::record_call("cancelled");
            return Err(AggregatedError::new(failures, Terminal::CancelledFromParent));
        }

        if attempt > budget.attempts {
            let terminal = budget.exhausted();
            tracing::debug!(attempts = budget.attempts, terminal = %terminal, "Retry budget consumed");
            metrics::record_call(if budget.single_shot { "not_retried" } else { "exhausted" });
            return Err(AggregatedError::new(failures, terminal));
        }

        let Some(current) = next_request(&mut pending, attempt < budget.attempts) else {
            // Only reachable if a replayable body stopped being replayable.
            metrics::record_call("not_retried");
            return Err(AggregatedError::new(failures, Terminal::NotRetried));
        };

        let outcome = execute_attempt(
            transport,
            current,
            attempt,
            config.per_attempt_timeout,
            signal,
        )
        .await;
        let status = outcome.status();

        let failure = match classify(config, outcome, budget.single_shot) {
            Classified::Done(response) => {
                metrics::record_attempt("success");
                metrics::record_call("success");
                tracing::debug!(attempt, status = %response.status(), "Request completed");
                return Ok(response);
            }
            Classified::Retry(failure) => failure,
            Classified::Abort(failure) => {
                metrics::record_attempt("cancelled");
                failures.push(failure);
                attempt += 1;
                continue;
            }
            Classified::Stop => {
                metrics::record_call("not_retried");
                return Err(AggregatedError::new(failures, Terminal::NotRetried));
            }
        };

        metrics::record_attempt(attempt_label(&failure));
        log_attempt_failure(
            config.debug_mode,
            attempt,
            status,
            attempt < budget.attempts,
            &failure,
        );
        failures.push(failure);

        if attempt < budget.attempts {
            let delay = config.backoff.delay(attempt);
            metrics::record_backoff(delay);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = signal.cancelled() => {
                    tracing::debug!(attempt, "Cancelled during backoff");
                }
            }
        }

        attempt += 1;
    }
}

enum Classified {
    /// Terminal response, handed to the caller as-is.
    Done(Response),
    /// Retryable failure.
    Retry(AttemptFailure),
    /// The caller's signal cut the attempt short.
    Abort(AttemptFailure),
    /// No response and nothing to retry.
    Stop,
}

fn classify(config: &RetryConfiguration, outcome: AttemptOutcome, single_shot: bool) -> Classified {
    let attempt = outcome.attempt;
    let (response, failure) = match outcome.result {
        AttemptResult::Response(response) => (Some(response), None),
        AttemptResult::Failed(err) => (None, Some(err)),
        AttemptResult::TimedOut(timeout) => {
            return Classified::Retry(AttemptFailure::Timeout { attempt, timeout })
        }
        AttemptResult::Cancelled => {
            return Classified::Abort(AttemptFailure::CancelledInFlight { attempt })
        }
    };

    let verdict = config
        .retryable
        .decide(response.as_ref().map(Response::status), failure);
    let should_retry = verdict.should_retry;

    match (verdict.reason, response) {
        // A registered status on a request that may not be retried goes back
        // to the caller as an ordinary response.
        (Some(_), Some(response)) if single_shot => Classified::Done(response),
        (Some(reason), _) if should_retry => Classified::Retry(reason.into_failure(attempt)),
        (_, Some(response)) => Classified::Done(response),
        (_, None) => Classified::Stop,
    }
}

fn next_request(pending: &mut Option<Request>, more_to_come: bool) -> Option<Request> {
    if more_to_come {
        if let Some(copy) = pending.as_ref().and_then(Request::try_clone) {
            return Some(copy);
        }
    }
    pending.take()
}

fn attempt_label(failure: &AttemptFailure) -> &'static str {
    match failure {
        AttemptFailure::Transport { .. } => "transport_error",
        AttemptFailure::Timeout { .. } => "timeout",
        AttemptFailure::RetryableStatus { .. } => "retryable_status",
        AttemptFailure::CancelledInFlight { .. } => "cancelled",
    }
}

fn log_attempt_failure(
    debug_mode: bool,
    attempt: u32,
    status: Option<reqwest::StatusCode>,
    will_retry: bool,
    failure: &AttemptFailure,
) {
    let status = status.map(|s| i32::from(s.as_u16())).unwrap_or(-1);
    if debug_mode {
        tracing::info!(attempt, status, will_retry, reason = %failure, "Attempt failed");
    } else {
        tracing::trace!(attempt, status, will_retry, reason = %failure, "Attempt failed");
    }
}
