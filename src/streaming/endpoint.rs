//! Stream factory.

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::options::ApiOptions;
use crate::streaming::StreamEvent;
use crate::streaming::handle::EventStreamHandle;
use crate::streaming::listener::ListenerSlot;
use crate::streaming::pump::Pump;
use crate::types::ResponseDecoding;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type UrlBuilder<P> = Arc<dyn Fn(&P) -> String + Send + Sync>;

/// One generated event-stream endpoint.
///
/// The path is computed from the call parameters; each `open` makes its own
/// connection to `api_base + path`.
pub struct StreamEndpoint<P, T> {
    client: ApiClient,
    url: UrlBuilder<P>,
    decoding: ResponseDecoding,
    _marker: PhantomData<fn() -> T>,
}

impl<P, T> Clone for StreamEndpoint<P, T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            decoding: self.decoding,
            _marker: PhantomData,
        }
    }
}

impl<P, T> std::fmt::Debug for StreamEndpoint<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEndpoint")
            .field("decoding", &self.decoding)
            .finish_non_exhaustive()
    }
}

impl<P, T> StreamEndpoint<P, T> {
    pub(crate) fn new(client: ApiClient, url: UrlBuilder<P>, decoding: ResponseDecoding) -> Self {
        Self {
            client,
            url,
            decoding,
            _marker: PhantomData,
        }
    }

    pub fn decoding(&self) -> ResponseDecoding {
        self.decoding
    }

    /// The path this endpoint would connect to for `params`.
    pub fn path(&self, params: &P) -> String {
        (self.url)(params)
    }
}

impl<P, T> StreamEndpoint<P, T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Connect immediately and return the handle.
    ///
    /// The listener slot starts empty: anything that happens before
    /// [`EventStreamHandle::listen`] (including `Open`) is dropped. Use
    /// [`open_with`](Self::open_with) to observe the whole stream.
    ///
    /// Fails without connecting when there is no Tokio runtime or the URL is
    /// invalid.
    pub fn open(
        &self,
        params: &P,
        options: Option<&ApiOptions>,
    ) -> Result<EventStreamHandle<T>, ApiError> {
        self.start(params, options, None)
    }

    /// Like [`open`](Self::open), with `handler` registered before the
    /// connection starts.
    pub fn open_with<F>(
        &self,
        params: &P,
        options: Option<&ApiOptions>,
        handler: F,
    ) -> Result<EventStreamHandle<T>, ApiError>
    where
        F: Fn(StreamEvent<T>) + Send + Sync + 'static,
    {
        self.start(params, options, Some(Arc::new(handler)))
    }

    fn start(
        &self,
        params: &P,
        options: Option<&ApiOptions>,
        handler: Option<crate::streaming::StreamListener<T>>,
    ) -> Result<EventStreamHandle<T>, ApiError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ApiError::Runtime(format!("no Tokio runtime to drive the event stream: {e}"))
        })?;

        let url = format!("{}{}", self.client.api_base(options), self.path(params));
        if let Err(e) = reqwest::Url::parse(&url) {
            let err = ApiError::InvalidUrl(format!("{url}: {e}"));
            tracing::error!(target: "tapi_client::sse", err=%err, "failed to open event stream");
            return Err(err);
        }

        let slot = Arc::new(ListenerSlot::new());
        if let Some(handler) = handler {
            slot.set(handler);
        }
        let token = CancellationToken::new();

        tracing::debug!(target: "tapi_client::sse", url=%url, decoding=%self.decoding, "opening event stream");
        let pump = Pump {
            url,
            headers: self.client.headers_for(options),
            transport: self.client.transport_for(options),
            interceptors: self.client.interceptors(),
            decoding: self.decoding,
            retry: self.client.sse_retry(),
            slot: slot.clone(),
            token: token.clone(),
        };
        runtime.spawn(pump.run());

        Ok(EventStreamHandle::new(slot, token))
    }
}
