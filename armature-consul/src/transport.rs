//! Pluggable HTTP transport.
//!
//! The pipeline never talks to the network directly. It hands a fully built
//! [`TransportRequest`] to an [`HttpTransport`] and gets a
//! [`TransportResponse`] back. [`ReqwestTransport`] is the default
//! implementation; tests and embedders can plug in their own.

use crate::{ConsulError, Headers, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Boxed error returned by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Capability to send one HTTP request and receive its response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and wait for the complete response.
    ///
    /// Any failure to obtain a response (connect, I/O, timeout) is returned
    /// as an error. Non-2xx responses are *not* errors at this level.
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, BoxError>;
}

/// A request ready to be put on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute request URI.
    pub uri: String,
    /// Request headers.
    pub headers: Headers,
    /// Encoded request body.
    pub body: Option<Bytes>,
    /// Per-call timeout the transport should honor.
    pub timeout: Option<Duration>,
}

/// A response as received from the wire.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Numeric status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Response headers.
    pub headers: Headers,
    /// Complete response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response with the canonical reason phrase for `status`.
    pub fn new(status: u16) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            reason,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Set a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Override the reason phrase.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Get a header line (all values folded, empty if absent).
    pub fn header_line(&self, name: &str) -> String {
        self.headers.line(name)
    }
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client.
    pub fn new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(format!("armature-consul/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConsulError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, BoxError> {
        let method = http::Method::from_bytes(request.method.as_bytes())?;
        let mut builder = self.inner.request(method, request.uri.as_str());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = Headers::from(response.headers());
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
