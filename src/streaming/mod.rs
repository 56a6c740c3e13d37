//! Streaming Module
//!
//! Server-Sent-Events endpoints:
//! - `StreamEndpoint` opens one connection per call
//! - `EventStreamHandle` exposes cancellation and the single listener slot
//! - `EventReceiver` is the async `Stream` view of the same events
//! - `SseStreamExt` turns byte streams into SSE events

mod endpoint;
mod events;
mod handle;
mod listener;
mod pump;
mod sse;

pub use endpoint::*;
pub use events::*;
pub use handle::*;
pub use listener::StreamListener;
pub use sse::*;
