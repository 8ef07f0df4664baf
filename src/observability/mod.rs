//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! retry loop
//!     → logging.rs (structured log events, debug-mode retry lines)
//!     → metrics.rs (attempt / call counters, backoff histogram)
//! ```
//!
//! # Design Decisions
//! - Every logical call runs in its own span with a call ID
//! - Debug-mode retry lines are info-level; otherwise trace-level

pub mod logging;
pub mod metrics;
