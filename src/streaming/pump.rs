//! Connection loop behind an event stream.
//!
//! Follows EventSource rules: `Open` once the server accepts the
//! connection, then one `Message` per dispatched `message` event. A dropped
//! connection is reported as an `Error` and retried after the reconnect
//! delay (with `Last-Event-ID`); a non-success status or a wrong content type
//! is reported and ends the stream.

use crate::defaults;
use crate::error::{ApiError, StreamError};
use crate::execution::http::interceptor::{
    HttpInterceptor, HttpRequestContext, apply_before_send, generate_request_id, notify_error,
};
use crate::execution::http::transport::{ByteStream, HttpTransport, TransportRequest};
use crate::streaming::StreamEvent;
use crate::streaming::listener::ListenerSlot;
use crate::streaming::sse::{FieldTracker, SseStreamExt};
use crate::types::{Method, ResponseDecoding};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub(crate) struct Pump<T> {
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) interceptors: Arc<[Arc<dyn HttpInterceptor>]>,
    pub(crate) decoding: ResponseDecoding,
    pub(crate) retry: Duration,
    pub(crate) slot: Arc<ListenerSlot<T>>,
    pub(crate) token: CancellationToken,
}

/// How one connection attempt ended.
enum Outcome {
    Reconnect,
    Stop,
}

impl<T: DeserializeOwned + Send + 'static> Pump<T> {
    pub(crate) async fn run(mut self) {
        let mut last_event_id: Option<String> = None;
        loop {
            match self.connect_once(&mut last_event_id).await {
                Outcome::Stop => break,
                Outcome::Reconnect => {}
            }
            tracing::debug!(target: "tapi_client::sse", url=%self.url, retry_ms=self.retry.as_millis() as u64, "reconnecting event stream");
            tokio::select! {
                _ = self.token.cancelled() => break,
                _ = tokio::time::sleep(self.retry) => {}
            }
        }
        self.slot.close();
        tracing::debug!(target: "tapi_client::sse", url=%self.url, "event stream closed");
    }

    fn emit(&self, event: StreamEvent<T>) {
        if self.token.is_cancelled() {
            return;
        }
        self.slot.deliver(event);
    }

    fn request(&self, last_event_id: Option<&str>) -> TransportRequest {
        let mut headers = self.headers.clone();
        headers.insert(ACCEPT, HeaderValue::from_static(defaults::sse::CONTENT_TYPE));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if let Some(id) = last_event_id
            && let Ok(value) = HeaderValue::from_str(id)
        {
            headers.insert(defaults::sse::LAST_EVENT_ID, value);
        }
        TransportRequest {
            method: reqwest::Method::GET,
            url: self.url.clone(),
            headers,
            body: None,
        }
    }

    async fn connect_once(&mut self, last_event_id: &mut Option<String>) -> Outcome {
        let ctx = HttpRequestContext {
            request_id: generate_request_id(),
            method: Method::Get,
            url: self.url.clone(),
            stream: true,
        };

        let mut request = self.request(last_event_id.as_deref());
        if let Err(e) = apply_before_send(&self.interceptors, &ctx, &mut request) {
            notify_error(&self.interceptors, &ctx, &e);
            self.emit(StreamEvent::Error(StreamError::Request(e.to_string())));
            return Outcome::Stop;
        }

        let connected = tokio::select! {
            _ = self.token.cancelled() => return Outcome::Stop,
            r = self.transport.execute_stream(request) => r,
        };
        let resp = match connected {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(target: "tapi_client::sse", url=%self.url, err=%e, "event stream connection failed");
                notify_error(&self.interceptors, &ctx, &e);
                self.emit(StreamEvent::Error(StreamError::Connection(e.to_string())));
                return Outcome::Reconnect;
            }
        };
        for it in self.interceptors.iter() {
            it.on_response(&ctx, resp.status);
        }

        if !(200..300).contains(&resp.status) {
            let body = tokio::select! {
                _ = self.token.cancelled() => return Outcome::Stop,
                b = read_body(resp.body) => b,
            };
            let err = ApiError::status(resp.status, body.clone());
            notify_error(&self.interceptors, &ctx, &err);
            self.emit(StreamEvent::Error(StreamError::Status {
                status: resp.status,
                body,
            }));
            return Outcome::Stop;
        }

        let content_type = resp
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type
            .to_ascii_lowercase()
            .starts_with(defaults::sse::CONTENT_TYPE)
        {
            self.emit(StreamEvent::Error(StreamError::ContentType(content_type)));
            return Outcome::Stop;
        }

        tracing::debug!(target: "tapi_client::sse", request_id=%ctx.request_id, url=%self.url, "event stream open");
        self.emit(StreamEvent::Open);

        let fields = Arc::new(Mutex::new(FieldTracker::new(last_event_id.as_deref())));
        let body = {
            let fields = fields.clone();
            resp.body.inspect_ok(move |chunk| {
                fields
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .feed(chunk)
            })
        };
        let mut events = body.into_sse_stream();
        let outcome = loop {
            let next = tokio::select! {
                _ = self.token.cancelled() => break Outcome::Stop,
                n = events.next() => n,
            };
            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    self.emit(StreamEvent::Error(StreamError::Connection(e.to_string())));
                    break Outcome::Reconnect;
                }
                None => {
                    self.emit(StreamEvent::Error(StreamError::Connection(
                        "connection closed by server".to_string(),
                    )));
                    break Outcome::Reconnect;
                }
            };

            for it in self.interceptors.iter() {
                it.on_sse_event(&ctx, &event);
            }
            // Only unnamed (`message`) events reach the listener.
            if !event.event.is_empty() && event.event != "message" {
                tracing::trace!(target: "tapi_client::sse", event_name=%event.event, "ignoring named event");
                continue;
            }

            match self.decoding.decode_event::<T>(event.data) {
                Ok(data) => self.emit(StreamEvent::Message(data)),
                Err(e @ ApiError::UnsupportedDecoding(_)) => {
                    tracing::error!(target: "tapi_client::sse", url=%self.url, err=%e, "closing event stream");
                    self.emit(StreamEvent::Error(StreamError::Decode(e.to_string())));
                    break Outcome::Stop;
                }
                Err(e) => {
                    tracing::warn!(target: "tapi_client::sse", url=%self.url, err=%e, "dropping undecodable event");
                    self.emit(StreamEvent::Error(StreamError::Decode(e.to_string())));
                }
            }
        };

        let fields = fields.lock().unwrap_or_else(PoisonError::into_inner);
        *last_event_id = fields.last_event_id().map(str::to_string);
        if let Some(retry) = fields.retry() {
            self.retry = retry;
        }
        outcome
    }
}

/// Body of a rejected connection as lossy UTF-8; empty if it cannot be read.
async fn read_body(body: ByteStream) -> String {
    let bytes = body
        .try_fold(Vec::new(), |mut acc, chunk| async move {
            acc.extend_from_slice(&chunk);
            Ok(acc)
        })
        .await
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
