//! Execution layer: HTTP plumbing and the request factory.

pub mod http;
pub mod request;

pub use request::{PendingResponse, RequestEndpoint};
