//! Request factory.
//!
//! A [`RequestEndpoint`] describes one generated HTTP endpoint: how the
//! request value is encoded, the verb, the path, and how a successful
//! response is decoded. Calling it issues exactly one network call, started
//! eagerly on the current Tokio runtime, and returns a [`PendingResponse`].

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::execution::http::headers::HttpHeaderBuilder;
use crate::execution::http::interceptor::{
    HttpInterceptor, HttpRequestContext, apply_before_send, generate_request_id, notify_error,
};
use crate::execution::http::transport::{HttpTransport, TransportRequest};
use crate::options::ApiOptions;
use crate::types::{Method, RequestEncoding, ResponseDecoding};
use crate::utils::cancel::{AbortHandle, new_abort_handle, run_abortable};
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// One generated HTTP endpoint.
pub struct RequestEndpoint<Req, Res> {
    client: ApiClient,
    encoding: RequestEncoding,
    method: Method,
    path: Arc<str>,
    decoding: ResponseDecoding,
    _marker: PhantomData<fn(&Req) -> Res>,
}

impl<Req, Res> Clone for RequestEndpoint<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            encoding: self.encoding,
            method: self.method,
            path: self.path.clone(),
            decoding: self.decoding,
            _marker: PhantomData,
        }
    }
}

impl<Req, Res> std::fmt::Debug for RequestEndpoint<Req, Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEndpoint")
            .field("encoding", &self.encoding)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("decoding", &self.decoding)
            .finish()
    }
}

/// Everything needed to hand a call to the transport.
struct PreparedCall {
    ctx: HttpRequestContext,
    request: TransportRequest,
    transport: Arc<dyn HttpTransport>,
    runtime: tokio::runtime::Handle,
}

impl<Req, Res> RequestEndpoint<Req, Res> {
    pub(crate) fn new(
        client: ApiClient,
        encoding: RequestEncoding,
        method: Method,
        path: String,
        decoding: ResponseDecoding,
    ) -> Self {
        Self {
            client,
            encoding,
            method,
            path: path.into(),
            decoding,
            _marker: PhantomData,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn encoding(&self) -> RequestEncoding {
        self.encoding
    }

    pub fn decoding(&self) -> ResponseDecoding {
        self.decoding
    }
}

impl<Req, Res> RequestEndpoint<Req, Res>
where
    Req: Serialize,
    Res: DeserializeOwned + Send + 'static,
{
    /// Issue the call.
    ///
    /// Never fails synchronously: if the call cannot even be started the
    /// error is logged and the returned response is already rejected.
    pub fn call(&self, req: &Req, options: Option<&ApiOptions>) -> PendingResponse<Res> {
        let abort = new_abort_handle();
        let prepared = match self.prepare(req, options) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(target: "tapi_client::http", method=%self.method, path=%self.path, err=%e, "failed to start request");
                return PendingResponse::rejected(e, abort);
            }
        };

        let PreparedCall {
            ctx,
            request,
            transport,
            runtime,
        } = prepared;
        let interceptors = self.client.interceptors();
        let decoding = self.decoding;
        let token = abort.token();

        let task = runtime.spawn(async move {
            let result = run_abortable(
                token,
                execute(&ctx, request, transport.as_ref(), &interceptors, decoding),
            )
            .await;
            match &result {
                Ok(_) => {
                    tracing::debug!(target: "tapi_client::http", request_id=%ctx.request_id, url=%ctx.url, "request settled");
                }
                Err(ApiError::Aborted) => {
                    tracing::debug!(target: "tapi_client::http", request_id=%ctx.request_id, url=%ctx.url, "request aborted");
                }
                Err(e) => notify_error(&interceptors, &ctx, e),
            }
            result
        });

        PendingResponse::spawned(task, abort)
    }

    fn prepare(&self, req: &Req, options: Option<&ApiOptions>) -> Result<PreparedCall, ApiError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ApiError::Runtime(format!("no Tokio runtime to drive the request: {e}")))?;

        let mut url = format!("{}{}", self.client.api_base(options), self.path);
        let mut headers = HttpHeaderBuilder::from_map(self.client.headers_for(options));
        let mut body = None;
        match self.encoding {
            RequestEncoding::None => {}
            RequestEncoding::Json => {
                body = Some(bytes::Bytes::from(serde_json::to_vec(req)?));
                headers = headers.with_json_content_type();
            }
            RequestEncoding::Query => append_query(&mut url, req)?,
        }
        reqwest::Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;

        let ctx = HttpRequestContext {
            request_id: generate_request_id(),
            method: self.method,
            url: url.clone(),
            stream: false,
        };
        let mut request = TransportRequest {
            method: self.method.into(),
            url,
            headers: headers.build(),
            body,
        };
        apply_before_send(&self.client.interceptors(), &ctx, &mut request)?;

        Ok(PreparedCall {
            ctx,
            request,
            transport: self.client.transport_for(options),
            runtime,
        })
    }
}

async fn execute<Res: DeserializeOwned>(
    ctx: &HttpRequestContext,
    request: TransportRequest,
    transport: &dyn HttpTransport,
    interceptors: &[Arc<dyn HttpInterceptor>],
    decoding: ResponseDecoding,
) -> Result<Res, ApiError> {
    let resp = transport.execute(request).await?;
    for it in interceptors {
        it.on_response(ctx, resp.status);
    }
    if !resp.is_success() {
        return Err(ApiError::status(resp.status, resp.text()));
    }
    decoding.decode(resp.text())
}

/// Append the request's top-level fields to `url` as query parameters.
///
/// Strings are sent verbatim, other values as their JSON text; nulls are
/// skipped.
fn append_query<Req: Serialize>(url: &mut String, req: &Req) -> Result<(), ApiError> {
    let fields = match serde_json::to_value(req)? {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => return Ok(()),
        other => {
            return Err(ApiError::Json(format!(
                "query request must serialize to an object, got {other}"
            )));
        }
    };

    let pairs: Vec<String> = fields
        .into_iter()
        .filter_map(|(k, v)| {
            let v = match v {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some(format!(
                "{}={}",
                urlencoding::encode(&k),
                urlencoding::encode(&v)
            ))
        })
        .collect();
    if pairs.is_empty() {
        return Ok(());
    }

    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&pairs.join("&"));
    Ok(())
}

/// The in-flight result of one call, paired with its abort handle.
///
/// Await it to get the decoded response. Dropping it does not abort the call.
pub struct PendingResponse<T> {
    data: BoxFuture<'static, Result<T, ApiError>>,
    abort: AbortHandle,
}

impl<T: Send + 'static> PendingResponse<T> {
    fn spawned(task: tokio::task::JoinHandle<Result<T, ApiError>>, abort: AbortHandle) -> Self {
        Self {
            data: Box::pin(async move {
                match task.await {
                    Ok(result) => result,
                    Err(e) if e.is_cancelled() => Err(ApiError::Aborted),
                    Err(e) => Err(ApiError::Runtime(format!("request task failed: {e}"))),
                }
            }),
            abort,
        }
    }

    fn rejected(error: ApiError, abort: AbortHandle) -> Self {
        Self {
            data: Box::pin(futures::future::ready(Err(error))),
            abort,
        }
    }
}

impl<T> PendingResponse<T> {
    /// Abort the call if it is still in flight. Idempotent; no effect once
    /// the call has settled.
    pub fn abort(&self) {
        self.abort.abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Split into the response future and the abort handle.
    pub fn into_parts(self) -> (BoxFuture<'static, Result<T, ApiError>>, AbortHandle) {
        (self.data, self.abort)
    }
}

impl<T> Future for PendingResponse<T> {
    type Output = Result<T, ApiError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().data.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for PendingResponse<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResponse")
            .field("aborted", &self.abort.is_aborted())
            .finish_non_exhaustive()
    }
}
