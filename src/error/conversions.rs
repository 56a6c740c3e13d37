//! Type Conversions for ApiError
//!
//! From trait implementations for converting common error types into
//! `ApiError`.

use super::types::ApiError;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::InvalidUrl(err.to_string());
        }
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ApiError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::Configuration(format!("Invalid header value: {err}"))
    }
}

impl From<reqwest::header::InvalidHeaderName> for ApiError {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        Self::Configuration(format!("Invalid header name: {err}"))
    }
}
