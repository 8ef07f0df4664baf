//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function over the settings; runs before a client is built

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::HttpSettings;

/// Upper bound on `max_retry`; anything above is treated as a typo.
pub const MAX_RETRY_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request_timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("max_retry {0} exceeds the limit of {limit}", limit = MAX_RETRY_LIMIT)]
    TooManyRetries(u32),

    #[error("{0} is not a valid HTTP status code")]
    InvalidStatus(u16),
}

/// Semantic checks on settings and the extra retryable statuses.
pub fn validate_settings(
    settings: &HttpSettings,
    extra_retryable: &[u16],
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.request_timeout == Duration::ZERO {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if settings.max_retry > MAX_RETRY_LIMIT {
        errors.push(ValidationError::TooManyRetries(settings.max_retry));
    }

    for code in extra_retryable {
        if !(100..=999).contains(code) {
            errors.push(ValidationError::InvalidStatus(*code));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_settings(&HttpSettings::default(), &[404, 429]).is_ok());
    }

    #[test]
    fn zero_idle_conns_is_allowed() {
        let settings = HttpSettings::builder().max_idle_conns(0).max_retry(0).build();
        assert!(validate_settings(&settings, &[]).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let settings = HttpSettings::builder()
            .request_timeout(Duration::ZERO)
            .max_retry(1000)
            .build();
        let errors = validate_settings(&settings, &[42, 503, 1000]).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroRequestTimeout,
                ValidationError::TooManyRetries(1000),
                ValidationError::InvalidStatus(42),
                ValidationError::InvalidStatus(1000),
            ]
        );
    }
}
