//! API client context.
//!
//! `ApiClient` owns everything generated endpoints share: the base URL, the
//! default headers, the transport and the interceptors. Clones share the same
//! state, so `set_api_base` on one clone is seen by every other clone.

use crate::builder::ApiClientBuilder;
use crate::execution::http::headers::merge_headers;
use crate::execution::http::interceptor::HttpInterceptor;
use crate::execution::http::transport::HttpTransport;
use crate::execution::request::RequestEndpoint;
use crate::options::ApiOptions;
use crate::streaming::StreamEndpoint;
use crate::types::{Method, RequestEncoding, ResponseDecoding};
use reqwest::header::HeaderMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

pub(crate) struct ClientInner {
    pub(crate) api_base: RwLock<String>,
    pub(crate) default_headers: HeaderMap,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) interceptors: Arc<[Arc<dyn HttpInterceptor>]>,
    pub(crate) sse_retry: Duration,
}

/// Shared context for generated endpoints.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

static_assertions::assert_impl_all!(ApiClient: Send, Sync, Clone);

impl ApiClient {
    pub(crate) fn from_inner(inner: ClientInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Client with default settings and the given base URL.
    pub fn new(api_base: impl Into<String>) -> Result<Self, crate::error::ApiError> {
        ApiClientBuilder::new().api_base(api_base).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// The base URL for a call: the per-call override when present, else the
    /// client's current base URL.
    pub fn api_base(&self, options: Option<&ApiOptions>) -> String {
        match options.and_then(|o| o.api_base.as_ref()) {
            Some(base) => base.clone(),
            None => self
                .inner
                .api_base
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Replace the base URL for all subsequent calls made through this
    /// client or any of its clones. Calls already issued are unaffected.
    pub fn set_api_base(&self, api_base: impl Into<String>) {
        let api_base = api_base.into();
        tracing::debug!(target: "tapi_client::http", api_base = %api_base, "api base updated");
        *self
            .inner
            .api_base
            .write()
            .unwrap_or_else(PoisonError::into_inner) = api_base;
    }

    /// Describe a request endpoint.
    pub fn request<Req, Res>(
        &self,
        encoding: RequestEncoding,
        method: Method,
        path: impl Into<String>,
        decoding: ResponseDecoding,
    ) -> RequestEndpoint<Req, Res> {
        RequestEndpoint::new(self.clone(), encoding, method, path.into(), decoding)
    }

    /// Describe an event-stream endpoint whose path is built from `params`.
    pub fn stream<P, T, F>(&self, url: F, decoding: ResponseDecoding) -> StreamEndpoint<P, T>
    where
        F: Fn(&P) -> String + Send + Sync + 'static,
    {
        StreamEndpoint::new(self.clone(), Arc::new(url), decoding)
    }

    /// Transport for a call: the per-call transport when present.
    pub(crate) fn transport_for(&self, options: Option<&ApiOptions>) -> Arc<dyn HttpTransport> {
        options
            .and_then(|o| o.transport.clone())
            .unwrap_or_else(|| self.inner.transport.clone())
    }

    /// Default headers with the per-call headers layered on top.
    pub(crate) fn headers_for(&self, options: Option<&ApiOptions>) -> HeaderMap {
        let base = self.inner.default_headers.clone();
        match options {
            Some(o) if !o.headers.is_empty() => merge_headers(base, &o.headers),
            _ => base,
        }
    }

    pub(crate) fn interceptors(&self) -> Arc<[Arc<dyn HttpInterceptor>]> {
        self.inner.interceptors.clone()
    }

    pub(crate) fn sse_retry(&self) -> Duration {
        self.inner.sse_retry
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_base", &self.api_base(None))
            .field("default_headers", &self.inner.default_headers.len())
            .field("interceptors", &self.inner.interceptors.len())
            .field("sse_retry", &self.inner.sse_retry)
            .finish()
    }
}
