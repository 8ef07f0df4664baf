//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller request
//!     → client.rs (RetryClient / RetryTransport)
//!     → resilience::coordinator (retry loop)
//!     → transport.rs (underlying transport, pooled connections)
//!     → response or aggregated error back to the caller
//! ```

pub mod client;
pub mod transport;

pub use client::{build_client, RetryClient, RetryTransport};
pub use transport::{ReqwestTransport, Transport};
