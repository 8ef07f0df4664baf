//! `http-retry`: issue one HTTP request through the retrying client.
//!
//! Settings come from the environment (a `.env` file is honoured) or from a
//! TOML file, then command-line flags override them.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::json;
use url::Url;

use http_retry::config::{self, HttpRetryConfig};
use http_retry::observability::logging::init_logging;
use http_retry::{build_client, RetryError};

#[derive(Parser)]
#[command(name = "http-retry")]
#[command(about = "Send an HTTP request with automatic retries", long_about = None)]
struct Cli {
    /// TOML settings file; the environment is used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    #[arg(long)]
    max_retry: Option<u32>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Extra status code to retry on (repeatable)
    #[arg(long = "retry-status")]
    retry_status: Vec<u16>,

    #[arg(long)]
    debug: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Print the outcome as a JSON document
    #[arg(long)]
    json: bool,

    url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::from_env()?,
    };
    apply_flags(&mut file_config, &cli);

    init_logging(log_directive(&file_config));
    tracing::debug!(
        timeout = ?Duration::from_millis(file_config.request_timeout_ms),
        max_retry = file_config.max_retry,
        debug_mode = file_config.debug_mode,
        "Settings loaded"
    );

    let client = build_client(
        Some(file_config.to_settings()),
        &file_config.extra_retryable_statuses,
    )?;

    let url = Url::parse(&cli.url)?;
    let method = Method::from_bytes(cli.method.to_uppercase().as_bytes())?;
    let mut builder = client.request(method, url);
    for header in &cli.headers {
        let (name, value) = parse_header(header)?;
        builder = builder.header(name, value);
    }
    if let Some(body) = cli.data {
        builder = builder.body(body);
    }

    match client.send(builder).await {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await?;
            if cli.json {
                let doc = json!({ "status": status.as_u16(), "body": body });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}", status);
                if !body.is_empty() {
                    println!("{}", body);
                }
            }
            Ok(status.is_success())
        }
        Err(RetryError::Aggregated(e)) => {
            tracing::debug!(attempts = e.attempts(), terminal = %e.terminal(), "Request failed");
            if cli.json {
                let doc = json!({
                    "terminal": e.terminal().to_string(),
                    "attempts": e.attempts(),
                    "failures": e.failures().iter().map(ToString::to_string).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn apply_flags(config: &mut HttpRetryConfig, cli: &Cli) {
    if let Some(max_retry) = cli.max_retry {
        config.max_retry = max_retry;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    if cli.debug {
        config.debug_mode = true;
    }
    if cli.insecure {
        config.insecure = true;
    }
    config
        .extra_retryable_statuses
        .extend(cli.retry_status.iter().copied());
}

/// Default log filter; debug mode must let the per-attempt `info` lines through.
fn log_directive(config: &HttpRetryConfig) -> &'static str {
    if config.debug_mode {
        "http_retry=debug"
    } else {
        "http_retry=warn"
    }
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), Box<dyn std::error::Error>> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header must be `Name: value`, got {:?}", raw))?;
    Ok((
        HeaderName::from_bytes(name.trim().as_bytes())?,
        HeaderValue::from_str(value.trim())?,
    ))
}
