//! HTTP Interceptor interfaces
//!
//! Interceptors can observe and tweak outgoing requests before they are
//! handed to the transport, observe response statuses, be notified of
//! errors, and receive raw SSE events. The hooks are best-effort and should
//! avoid expensive work.

use crate::error::ApiError;
use crate::execution::http::transport::TransportRequest;

/// Context passed to interceptors describing the call.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub request_id: String,
    pub method: crate::types::Method,
    pub url: String,
    pub stream: bool,
}

/// Generate a unique id for one call (or one stream connection).
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// HTTP interceptor trait
pub trait HttpInterceptor: Send + Sync {
    /// Called before the request is handed to the transport. Interceptors may
    /// add headers or rewrite the request. Returning an error short-circuits
    /// the call.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        _request: &mut TransportRequest,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    /// Called once response headers are available.
    fn on_response(&self, _ctx: &HttpRequestContext, _status: u16) {}

    /// Called when the call fails (transport error, non-success status,
    /// decoding error).
    fn on_error(&self, _ctx: &HttpRequestContext, _error: &ApiError) {}

    /// Called for every SSE event received on a stream, before decoding.
    fn on_sse_event(&self, _ctx: &HttpRequestContext, _event: &eventsource_stream::Event) {}
}

/// Run `on_before_send` for every interceptor, in order.
pub(crate) fn apply_before_send(
    interceptors: &[std::sync::Arc<dyn HttpInterceptor>],
    ctx: &HttpRequestContext,
    request: &mut TransportRequest,
) -> Result<(), ApiError> {
    for it in interceptors {
        it.on_before_send(ctx, request)?;
    }
    Ok(())
}

pub(crate) fn notify_error(
    interceptors: &[std::sync::Arc<dyn HttpInterceptor>],
    ctx: &HttpRequestContext,
    error: &ApiError,
) {
    for it in interceptors {
        it.on_error(ctx, error);
    }
}

/// A simple logging interceptor backed by `tracing` (no bodies or header values).
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        request: &mut TransportRequest,
    ) -> Result<(), ApiError> {
        tracing::debug!(target: "tapi_client::http", request_id=%ctx.request_id, method=%ctx.method, url=%ctx.url, stream=%ctx.stream, headers=request.headers.len(), "sending request");
        Ok(())
    }

    fn on_response(&self, ctx: &HttpRequestContext, status: u16) {
        tracing::debug!(target: "tapi_client::http", request_id=%ctx.request_id, url=%ctx.url, status=%status, "response received");
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &ApiError) {
        tracing::debug!(target: "tapi_client::http", request_id=%ctx.request_id, url=%ctx.url, stream=%ctx.stream, err=%error, "request error");
    }

    fn on_sse_event(&self, ctx: &HttpRequestContext, event: &eventsource_stream::Event) {
        tracing::trace!(target: "tapi_client::sse", request_id=%ctx.request_id, url=%ctx.url, event_name=%event.event, "sse event");
    }
}
