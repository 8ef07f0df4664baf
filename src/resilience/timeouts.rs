//! Single-attempt execution under a deadline.
//!
//! # Responsibilities
//! - Race one transport call against the per-attempt timer
//! - Abort the call when the caller's signal fires mid-flight
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities inside a `select!`
//! - The losing branch is dropped, which cancels the in-flight request and
//!   returns its connection instead of leaving it running unobserved
//! - Timeouts are distinct from transport errors

use std::time::Duration;

use reqwest::{Request, Response, StatusCode};

use crate::error::TransportError;
use crate::http::transport::Transport;
use crate::resilience::cancel::CancelSignal;

/// What one attempt produced.
#[derive(Debug)]
pub struct AttemptOutcome {
    /// 1-based.
    pub attempt: u32,
    pub result: AttemptResult,
}

#[derive(Debug)]
pub enum AttemptResult {
    /// A response arrived, whatever its status.
    Response(Response),
    /// The transport failed outright.
    Failed(TransportError),
    /// The per-attempt timer fired first.
    TimedOut(Duration),
    /// The caller's signal fired first.
    Cancelled,
}

impl AttemptOutcome {
    /// Observed status, `None` when no response arrived.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.result {
            AttemptResult::Response(r) => Some(r.status()),
            _ => None,
        }
    }
}

/// Run exactly one attempt.
pub async fn execute_attempt<T>(
    transport: &T,
    request: Request,
    attempt: u32,
    timeout: Duration,
    signal: &CancelSignal,
) -> AttemptOutcome
where
    T: Transport + ?Sized,
{
    let result = tokio::select! {
        biased;
        _ = signal.cancelled() => AttemptResult::Cancelled,
        res = tokio::time::timeout(timeout, transport.execute(request)) => match res {
            Ok(Ok(response)) => AttemptResult::Response(response),
            Ok(Err(e)) => AttemptResult::Failed(e),
            Err(_) => AttemptResult::TimedOut(timeout),
        },
    };

    AttemptOutcome { attempt, result }
}
