//! Default values and environment variable names.

pub mod http {
    /// User agent sent when none is configured.
    pub const USER_AGENT: &str = concat!("tapi-client/", env!("CARGO_PKG_VERSION"));
}

pub mod sse {
    use std::time::Duration;

    /// Reconnect delay used until the server sends a `retry:` field.
    pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);
    pub const CONTENT_TYPE: &str = "text/event-stream";
    pub const LAST_EVENT_ID: &str = "last-event-id";
}

pub mod env {
    pub const API_BASE: &str = "TAPI_API_BASE";
    pub const USER_AGENT: &str = "TAPI_USER_AGENT";
    pub const HTTP_DEBUG: &str = "TAPI_HTTP_DEBUG";
    pub const LOG_LEVEL: &str = "TAPI_LOG_LEVEL";
    pub const LOG_FORMAT: &str = "TAPI_LOG_FORMAT";
    pub const LOG_FILE: &str = "TAPI_LOG_FILE";
}
