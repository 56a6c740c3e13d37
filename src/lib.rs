//! tapi-client
//!
//! Runtime for generated HTTP and Server-Sent-Events API clients.
//!
//! Generated code builds endpoints from an [`ApiClient`]:
//! - [`ApiClient::request`] describes an HTTP call; calling the endpoint
//!   returns a [`PendingResponse`] that can be awaited or aborted.
//! - [`ApiClient::stream`] describes an event stream; opening it returns an
//!   [`EventStreamHandle`] with `listen`, `events` and `cancel`.
//!
//! ```rust,ignore
//! use tapi_client::prelude::*;
//!
//! let client = ApiClient::new("https://api.example.com")?;
//! let get_user: RequestEndpoint<(), User> =
//!     client.request(RequestEncoding::None, Method::Get, "/users/42", ResponseDecoding::Json);
//! let user = get_user.call(&(), None).await?;
//! ```
#![deny(unsafe_code)]

pub mod builder;
pub mod client;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod options;
pub mod streaming;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use builder::ApiClientBuilder;
pub use client::ApiClient;
pub use error::{ApiError, StreamError};
pub use execution::http::interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};
pub use execution::http::transport::{
    HttpTransport, ReqwestTransport, TransportRequest, TransportResponse, TransportStreamResponse,
};
pub use execution::{PendingResponse, RequestEndpoint};
pub use options::ApiOptions;
pub use streaming::{EventReceiver, EventStreamHandle, StreamEndpoint, StreamEvent, StreamListener};
pub use types::{Method, RequestEncoding, ResponseDecoding};
pub use utils::AbortHandle;

/// Everything generated client code needs.
pub mod prelude {
    pub use crate::{
        AbortHandle, ApiClient, ApiClientBuilder, ApiError, ApiOptions, EventStreamHandle,
        Method, PendingResponse, RequestEncoding, RequestEndpoint, ResponseDecoding,
        StreamEndpoint, StreamError, StreamEvent,
    };
}
