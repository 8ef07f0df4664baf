//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment / TOML file / builder calls
//!     → loader.rs (parse into HttpRetryConfig) or builder.rs
//!     → HttpSettings (runtime values)
//!     → validation.rs (semantic checks)
//!     → captured by the client, immutable from then on
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Malformed values surface as errors, never as a process abort
//! - Validation separates syntactic (serde) from semantic checks

pub mod builder;
pub mod loader;
pub mod schema;
pub mod validation;

pub use builder::SettingsBuilder;
pub use loader::{from_env, load_config, ConfigError};
pub use schema::{BackoffConfig, HttpRetryConfig, HttpSettings};
pub use validation::{validate_settings, ValidationError};
