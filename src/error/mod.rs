//! Error Handling Module
//!
//! This module provides the error types surfaced by generated endpoints:
//! - `ApiError` for request construction, transport and decoding failures
//! - `StreamError` for failures delivered through an event stream
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use tapi_client::error::ApiError;
//!
//! let error = ApiError::status(404, "not found");
//! assert_eq!(error.to_string(), "not found");
//! assert_eq!(error.status_code(), Some(404));
//! ```

mod conversions;
pub mod types;

pub use types::*;
