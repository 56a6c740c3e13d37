//! Request encodings and response decodings.
//!
//! Generated code refers to these by their lowercase tags (`"none"`,
//! `"json"`, `"text"`, `"query"`). Parsing an unknown tag fails immediately.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// How the outgoing request value is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestEncoding {
    /// No body, no content type.
    #[default]
    None,
    /// JSON body with `Content-Type: application/json`.
    Json,
    /// Top-level fields appended to the URL query string.
    Query,
}

impl RequestEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Json => "json",
            Self::Query => "query",
        }
    }
}

impl FromStr for RequestEncoding {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "json" => Ok(Self::Json),
            "query" => Ok(Self::Query),
            other => Err(ApiError::UnknownRequestType(other.to_string())),
        }
    }
}

impl fmt::Display for RequestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful response body (or an event payload) is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseDecoding {
    /// Always the empty string.
    #[default]
    None,
    /// The raw body text.
    Text,
    /// The body parsed as JSON.
    Json,
}

impl ResponseDecoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Decode a successful response body into `T`.
    ///
    /// `None` and `Text` go through a JSON string value, so `T` is usually
    /// `String` (or `serde_json::Value`) for those decodings.
    pub fn decode<T: DeserializeOwned>(&self, body: String) -> Result<T, ApiError> {
        match self {
            Self::None => from_string_value(String::new()),
            Self::Text => from_string_value(body),
            Self::Json => serde_json::from_str(&body).map_err(ApiError::from),
        }
    }

    /// Decode one event-stream payload into `T`.
    ///
    /// Only `Text` and `Json` are meaningful for event streams.
    pub fn decode_event<T: DeserializeOwned>(&self, data: String) -> Result<T, ApiError> {
        match self {
            Self::Text => from_string_value(data),
            Self::Json => serde_json::from_str(&data).map_err(ApiError::from),
            Self::None => Err(ApiError::UnsupportedDecoding(self.as_str().to_string())),
        }
    }
}

fn from_string_value<T: DeserializeOwned>(s: String) -> Result<T, ApiError> {
    serde_json::from_value(serde_json::Value::String(s))
        .map_err(|e| ApiError::Decode(format!("expected a string-compatible type: {e}")))
}

impl FromStr for ResponseDecoding {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ApiError::UnknownResponseType(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseDecoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
