//! Request transport abstraction.
//!
//! # Responsibilities
//! - Define the "request in, response or failure out" contract
//! - Provide the default reqwest-backed transport and its connection pool

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};

use crate::config::HttpSettings;
use crate::error::TransportError;

/// Executes one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        (**self).execute(request).await
    }
}

/// Transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the pooled client from connection-level settings.
    ///
    /// The per-attempt timeout is not applied here; the retry layer owns it.
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(settings.max_idle_conns)
            .pool_idle_timeout(settings.idle_conn_timeout)
            .connect_timeout(settings.tls_handshake_timeout)
            .read_timeout(settings.response_header_timeout)
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .danger_accept_invalid_certs(settings.insecure)
            .build()?;

        tracing::debug!(
            max_idle_conns = settings.max_idle_conns,
            idle_conn_timeout = ?settings.idle_conn_timeout,
            tls_handshake_timeout = ?settings.tls_handshake_timeout,
            response_header_timeout = ?settings.response_header_timeout,
            expect_continue_timeout = ?settings.expect_continue_timeout,
            insecure = settings.insecure,
            "Transport built"
        );

        Ok(Self { client })
    }

    /// Wrap an existing client as-is.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.client.execute(request).await?)
    }
}
