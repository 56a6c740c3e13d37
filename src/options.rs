//! Per-call options.

use crate::execution::http::transport::HttpTransport;
use std::collections::HashMap;
use std::sync::Arc;

/// Options accepted by every generated call.
///
/// All fields are optional; `ApiOptions::default()` behaves like passing no
/// options at all.
#[derive(Clone, Default)]
pub struct ApiOptions {
    /// Overrides the client's base URL for this call only.
    pub api_base: Option<String>,
    /// Alternate transport for this call only.
    pub transport: Option<Arc<dyn HttpTransport>>,
    /// Extra headers, layered over the client's default headers.
    pub headers: HashMap<String, String>,
}

impl ApiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl std::fmt::Debug for ApiOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiOptions")
            .field("api_base", &self.api_base)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}
