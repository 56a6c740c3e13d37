//! HTTP transport abstraction.
//!
//! A transport is the Rust form of a "custom fetch": it receives the final
//! method/URL/headers/body of a call and returns the response. The default
//! implementation is [`ReqwestTransport`]; callers may supply their own per
//! client or per call (for tests, proxies, or non-reqwest stacks).

use crate::error::ApiError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use std::pin::Pin;

/// Byte stream of a streaming response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

/// Transport-level request data.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    pub fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Transport-level response data.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Streaming response: headers are available, the body is consumed lazily.
pub struct TransportStreamResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl std::fmt::Debug for TransportStreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportStreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Custom HTTP transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute a request and buffer the whole response body.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError>;

    /// Execute a request and return as soon as response headers arrive.
    async fn execute_stream(
        &self,
        request: TransportRequest,
    ) -> Result<TransportStreamResponse, ApiError>;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn builder(&self, request: TransportRequest) -> reqwest::RequestBuilder {
        let mut rb = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            rb = rb.body(body);
        }
        rb
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        let resp = self.builder(request).send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Http(format!("Failed to read body: {e}")))?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_stream(
        &self,
        request: TransportRequest,
    ) -> Result<TransportStreamResponse, ApiError> {
        let resp = self.builder(request).send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ApiError::Http(format!("Stream error: {e}"))));
        Ok(TransportStreamResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
