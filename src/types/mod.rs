//! Endpoint description types shared by the request and stream factories.

mod encoding;
mod method;

pub use encoding::*;
pub use method::*;
