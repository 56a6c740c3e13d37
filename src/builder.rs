//! Client builder.
//!
//! Collects HTTP settings, interceptors and defaults, then produces an
//! [`ApiClient`]. Settings can also be picked up from the environment with
//! [`ApiClientBuilder::from_env`].

use crate::client::{ApiClient, ClientInner};
use crate::defaults;
use crate::error::ApiError;
use crate::execution::http::headers::HttpHeaderBuilder;
use crate::execution::http::interceptor::{HttpInterceptor, LoggingInterceptor};
use crate::execution::http::transport::{HttpTransport, ReqwestTransport};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Builder for [`ApiClient`].
#[derive(Clone, Default)]
pub struct ApiClientBuilder {
    api_base: Option<String>,
    headers: HashMap<String, String>,
    user_agent: Option<String>,
    http_client: Option<reqwest::Client>,
    transport: Option<Arc<dyn HttpTransport>>,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    http_debug: bool,
    sse_retry: Option<Duration>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded from environment variables:
    /// - `TAPI_API_BASE`: base URL
    /// - `TAPI_USER_AGENT`: user agent
    /// - `TAPI_HTTP_DEBUG`: enable the logging interceptor (`1`, `true`, `on`, `yes`)
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(base) = std::env::var(defaults::env::API_BASE) {
            builder = builder.api_base(base);
        }
        if let Ok(ua) = std::env::var(defaults::env::USER_AGENT) {
            builder = builder.user_agent(ua);
        }
        if let Ok(val) = std::env::var(defaults::env::HTTP_DEBUG) {
            builder = builder.http_debug(parse_flag(&val));
        }
        builder
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Add a default header sent with every call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a preconfigured reqwest client (proxies, TLS, timeouts).
    /// Ignored when a custom transport is set.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Install the built-in [`LoggingInterceptor`].
    pub fn http_debug(mut self, enabled: bool) -> Self {
        self.http_debug = enabled;
        self
    }

    /// Event-stream reconnect delay used until the server sends `retry:`.
    pub fn sse_retry(mut self, delay: Duration) -> Self {
        self.sse_retry = Some(delay);
        self
    }

    pub fn build(self) -> Result<ApiClient, ApiError> {
        let default_headers = HttpHeaderBuilder::new()
            .with_user_agent(
                self.user_agent
                    .as_deref()
                    .unwrap_or(defaults::http::USER_AGENT),
            )?
            .with_custom_headers(&self.headers)?
            .build();

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => {
                let client = match self.http_client {
                    Some(c) => c,
                    None => reqwest::Client::builder().build().map_err(|e| {
                        ApiError::Configuration(format!("Failed to build HTTP client: {e}"))
                    })?,
                };
                Arc::new(ReqwestTransport::new(client))
            }
        };

        let mut interceptors = self.interceptors;
        if self.http_debug {
            interceptors.push(Arc::new(LoggingInterceptor));
        }

        Ok(ApiClient::from_inner(ClientInner {
            api_base: RwLock::new(self.api_base.unwrap_or_default()),
            default_headers,
            transport,
            interceptors: interceptors.into(),
            sse_retry: self.sse_retry.unwrap_or(defaults::sse::RECONNECT_DELAY),
        }))
    }
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
