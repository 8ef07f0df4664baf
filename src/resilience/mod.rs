//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Logical call:
//!     → coordinator.rs (attempt budget, cancellation check, error history)
//!     → timeouts.rs (one attempt raced against its timer and the caller)
//!     → On failure: retries.rs (retryable? why?)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Every attempt has a deadline; a late attempt is cancelled, not abandoned
//! - Retries only for idempotent requests unless explicitly allowed
//! - Connection errors always retryable; statuses from a registry
//! - Cancellation is observed before each attempt, during it, and during backoff

pub mod backoff;
pub mod cancel;
pub mod coordinator;
pub mod retries;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use cancel::CancelSignal;
pub use coordinator::RetryConfiguration;
pub use retries::{RetryVerdict, RetryableStatuses, DEFAULT_RETRYABLE_STATUSES};
