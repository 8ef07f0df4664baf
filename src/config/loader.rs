//! Configuration loading from the environment and from disk.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::schema::HttpRetryConfig;
use crate::config::validation::ValidationError;

pub const ENV_MAX_RETRY: &str = "MAX_REQUEST_RETRY";
pub const ENV_DEBUG_MODE: &str = "DEBUG_MODE";
pub const ENV_INSECURE: &str = "INSECURE";
pub const ENV_MAX_IDLE_CONNECTIONS: &str = "MAX_IDLE_CONNECTIONS";
pub const ENV_CONNECTION_TIMEOUT: &str = "CONNECTION_TIMEOUT";
pub const ENV_TLS_TIMEOUT: &str = "TLS_TIMEOUT";
pub const ENV_CONTINUE_TIMEOUT: &str = "CONTINUE_TIMEOUT";
pub const ENV_HEADER_TIMEOUT: &str = "HEADER_TIMEOUT";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
pub const ENV_RETRY_NON_IDEMPOTENT: &str = "RETRY_NON_IDEMPOTENT";
pub const ENV_RETRY_STATUS_CODES: &str = "RETRY_STATUS_CODES";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env {
        key: String,
        value: String,
        reason: String,
    },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value, reason } => {
                write!(f, "Invalid value {:?} for {}: {}", value, key, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HttpRetryConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Defaults overlaid with the process environment.
pub fn from_env() -> Result<HttpRetryConfig, ConfigError> {
    from_env_vars(
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
    )
}

/// Defaults overlaid with the given `(key, value)` pairs. Unknown keys are ignored.
pub fn from_env_vars<I, K, V>(vars: I) -> Result<HttpRetryConfig, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut config = HttpRetryConfig::default();
    apply_env_vars(&mut config, vars)?;
    Ok(config)
}

/// Overlay environment values on an existing configuration.
pub fn apply_env_vars<I, K, V>(config: &mut HttpRetryConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in vars {
        let (key, value) = (key.as_ref(), value.as_ref().trim());
        match key {
            ENV_MAX_RETRY => config.max_retry = parse_env(key, value, |v| v.parse().ok())?,
            ENV_DEBUG_MODE => config.debug_mode = parse_env(key, value, parse_bool)?,
            ENV_INSECURE => config.insecure = parse_env(key, value, parse_bool)?,
            ENV_MAX_IDLE_CONNECTIONS => {
                config.max_idle_conns = parse_env(key, value, |v| v.parse().ok())?
            }
            ENV_CONNECTION_TIMEOUT => config.idle_conn_timeout_ms = parse_env_ms(key, value)?,
            ENV_TLS_TIMEOUT => config.tls_handshake_timeout_ms = parse_env_ms(key, value)?,
            ENV_CONTINUE_TIMEOUT => config.expect_continue_timeout_ms = parse_env_ms(key, value)?,
            ENV_HEADER_TIMEOUT => config.response_header_timeout_ms = parse_env_ms(key, value)?,
            ENV_REQUEST_TIMEOUT => config.request_timeout_ms = parse_env_ms(key, value)?,
            ENV_RETRY_NON_IDEMPOTENT => {
                config.retry_non_idempotent = parse_env(key, value, parse_bool)?
            }
            ENV_RETRY_STATUS_CODES => {
                config.extra_retryable_statuses = parse_env(key, value, parse_status_list)?
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_env<T>(key: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, ConfigError> {
    parse(value).ok_or_else(|| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
        reason: "unrecognized value".to_string(),
    })
}

fn parse_env_ms(key: &str, value: &str) -> Result<u64, ConfigError> {
    let duration = parse_env(key, value, parse_duration)?;
    u64::try_from(duration.as_millis()).map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
        reason: "out of range".to_string(),
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_status_list(value: &str) -> Option<Vec<u16>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Parse `500ms`, `10s`, `2m`, `1h`, or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    match unit.trim() {
        "ms" => Some(Duration::from_millis(amount)),
        "" | "s" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_secs(amount.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(amount.checked_mul(3600)?)),
        _ => None,
    }
}
