//! Core error types.

use thiserror::Error;

/// Errors produced while building, sending or decoding an API call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-success status.
    ///
    /// The message is the response body text, unmodified.
    #[error("{body}")]
    Status { status: u16, body: String },

    /// A response decoding tag that the runtime does not understand.
    #[error("Unknown response type {0}")]
    UnknownResponseType(String),

    /// A request encoding tag that the runtime does not understand.
    #[error("Unknown request type {0}")]
    UnknownRequestType(String),

    /// An HTTP method name that the runtime does not understand.
    #[error("Unknown method {0}")]
    UnknownMethod(String),

    /// The decoding is not valid for event-stream messages.
    #[error("Unknown response type: {0}")]
    UnsupportedDecoding(String),

    /// The request was aborted through its handle before it settled.
    #[error("The request was aborted")]
    Aborted,

    /// Transport-level failure (connect, send, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The base URL and path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid client or per-call configuration (headers, user agent).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No async runtime was available to drive the call.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A payload could not be converted into the endpoint's response type.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create a status error carrying the response body.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// HTTP status code, when the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body text, when the error came from a response.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Whether the error is a local programming/configuration mistake rather
    /// than something the server or network did.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownResponseType(_)
                | Self::UnknownRequestType(_)
                | Self::UnknownMethod(_)
                | Self::UnsupportedDecoding(_)
                | Self::InvalidUrl(_)
                | Self::Configuration(_)
                | Self::Runtime(_)
        )
    }
}

/// Failures delivered to an event-stream listener as `StreamEvent::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The connection could not be established or was interrupted.
    /// The stream reconnects after the current retry delay.
    #[error("Event stream connection error: {0}")]
    Connection(String),

    /// The server rejected the stream. No reconnect is attempted.
    #[error("Event stream rejected with status {status}")]
    Status { status: u16, body: String },

    /// The server answered with something other than `text/event-stream`.
    /// No reconnect is attempted.
    #[error("Event stream has unexpected content type {0:?}")]
    ContentType(String),

    /// A message payload could not be decoded.
    #[error("Event stream decode error: {0}")]
    Decode(String),

    /// An interceptor refused to send the connection request.
    /// No reconnect is attempted.
    #[error("Event stream request rejected: {0}")]
    Request(String),
}

impl StreamError {
    /// Whether the stream stops after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Status { .. } | Self::ContentType(_) | Self::Request(_)
        )
    }
}
