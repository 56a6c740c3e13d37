//! HTTP Utilities
//!
//! This module contains HTTP-related utilities:
//! - Header management
//! - HTTP interceptors
//! - Pluggable transports

pub mod headers;
pub mod interceptor;
pub mod transport;

// Re-export main types
pub use headers::*;
pub use interceptor::*;
pub use transport::*;
