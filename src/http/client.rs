//! Retrying client.
//!
//! # Responsibilities
//! - Wrap any [`Transport`] with the retry loop behind the same contract
//! - Build the default reqwest-backed client from settings
//! - Give each logical call a span with its own call ID

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::loader::ConfigError;
use crate::config::{validate_settings, HttpSettings};
use crate::error::{AggregatedError, RetryError, RetryResult, TransportError};
use crate::http::transport::{ReqwestTransport, Transport};
use crate::resilience::cancel::CancelSignal;
use crate::resilience::coordinator::{self, RetryConfiguration};
use crate::resilience::retries::RetryableStatuses;

/// A transport that retries on top of another transport.
///
/// Implements [`Transport`] itself, so it can stand in wherever the inner
/// transport was used.
#[derive(Debug)]
pub struct RetryTransport<T> {
    inner: T,
    config: Arc<RetryConfiguration>,
}

impl<T: Transport> RetryTransport<T> {
    pub fn new(inner: T, config: RetryConfiguration) -> Self {
        Self {
            inner,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RetryConfiguration {
        &self.config
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Run the request through the retry loop, honouring `signal`.
    pub async fn execute_with_cancel(
        &self,
        request: Request,
        signal: &CancelSignal,
    ) -> Result<Response, AggregatedError> {
        let call_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "retry_call",
            %call_id,
            method = %request.method(),
            url = %request.url(),
        );

        coordinator::run(&self.inner, &self.config, request, signal)
            .instrument(span)
            .await
    }
}

#[async_trait]
impl<T: Transport> Transport for RetryTransport<T> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.execute_with_cancel(request, &CancelSignal::none())
            .await
            .map_err(|e| TransportError::Retry(Box::new(e)))
    }
}

/// HTTP client with transparent retries.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RetryClient {
    transport: Arc<RetryTransport<ReqwestTransport>>,
    settings: Arc<HttpSettings>,
}

impl RetryClient {
    pub fn new(settings: HttpSettings, extra_retryable: &[u16]) -> RetryResult<Self> {
        build_client(Some(settings), extra_retryable)
    }

    /// The pooled reqwest client underneath, for building requests.
    pub fn http(&self) -> &reqwest::Client {
        self.transport.inner().client()
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.http().get(url)
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.http().request(method, url)
    }

    /// Issue `request`, retrying per the client's settings.
    ///
    /// Returns either a response or the full attempt history, never both.
    pub async fn execute(&self, request: Request) -> RetryResult<Response> {
        self.execute_with_cancel(request, &CancelSignal::none()).await
    }

    pub async fn execute_with_cancel(
        &self,
        request: Request,
        signal: &CancelSignal,
    ) -> RetryResult<Response> {
        Ok(self.transport.execute_with_cancel(request, signal).await?)
    }

    /// Build and issue a request from a builder obtained via [`RetryClient::get`]
    /// or [`RetryClient::request`].
    pub async fn send(&self, builder: RequestBuilder) -> RetryResult<Response> {
        let request = builder.build().map_err(RetryError::InvalidRequest)?;
        self.execute(request).await
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    pub fn retryable_statuses(&self) -> &RetryableStatuses {
        &self.transport.config().retryable
    }
}

#[async_trait]
impl Transport for RetryClient {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        Transport::execute(self.transport.as_ref(), request).await
    }
}

/// Build a retrying client. `None` uses [`HttpSettings::default`].
///
/// `extra_retryable` adds status codes to the default retryable set.
pub fn build_client(
    settings: Option<HttpSettings>,
    extra_retryable: &[u16],
) -> RetryResult<RetryClient> {
    let settings = settings.unwrap_or_default();
    validate_settings(&settings, extra_retryable).map_err(ConfigError::Validation)?;

    let transport = ReqwestTransport::new(&settings).map_err(RetryError::Build)?;
    let config = RetryConfiguration::new(&settings, extra_retryable);

    tracing::info!(
        max_retry = settings.max_retry,
        request_timeout = ?settings.request_timeout,
        backoff = settings.backoff_policy.name(),
        retryable = ?config.retryable.codes().collect::<Vec<_>>(),
        "Retry client built"
    );

    Ok(RetryClient {
        transport: Arc::new(RetryTransport::new(transport, config)),
        settings: Arc::new(settings),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationError;
    use std::time::Duration;

    #[test]
    fn build_with_defaults() {
        let client = build_client(None, &[]).unwrap();
        assert_eq!(client.settings().max_retry, 3);
        assert!(!client.settings().insecure);
        assert_eq!(
            client.retryable_statuses().codes().collect::<Vec<_>>(),
            vec![500, 502, 503, 504]
        );
    }

    #[test]
    fn extra_statuses_extend_the_registry() {
        let client = build_client(Some(HttpSettings::builder().build()), &[404]).unwrap();
        assert!(client
            .retryable_statuses()
            .contains(reqwest::StatusCode::NOT_FOUND));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = HttpSettings::builder()
            .request_timeout(Duration::ZERO)
            .build();
        let err = build_client(Some(settings), &[]).unwrap_err();
        match err {
            RetryError::Config(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroRequestTimeout]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn retry_transports_compose() {
        struct Refusing;

        #[async_trait]
        impl Transport for Refusing {
            async fn execute(&self, _request: Request) -> Result<Response, TransportError> {
                Err(TransportError::Other("connection refused".into()))
            }
        }

        let settings = HttpSettings::builder()
            .max_retry(1)
            .backoff_fn(|_| Duration::from_millis(1))
            .build();
        let inner = RetryTransport::new(Refusing, RetryConfiguration::new(&settings, &[]));
        let outer = RetryTransport::new(inner, RetryConfiguration::new(&settings, &[]));

        let request = Request::new(Method::GET, "http://127.0.0.1:1/".parse().unwrap());
        let err = outer
            .execute_with_cancel(request, &CancelSignal::none())
            .await
            .unwrap_err();

        assert_eq!(err.failures().len(), 2);
        let first = err.failures()[0].to_string();
        assert!(first.contains("connection refused"));
        assert!(first.contains("max retries reached"));
    }
}
