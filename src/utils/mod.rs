//! Utility modules for tapi-client

pub mod cancel;

pub use cancel::{AbortHandle, new_abort_handle};
