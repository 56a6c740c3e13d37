//! Cancellation utilities
//!
//! Provides first-class cancellation handles for requests and event streams.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// A handle that can be used to abort an in-flight call.
///
/// Aborting is idempotent; once the call has settled it has no effect.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle {
    token: CancellationToken,
}

impl AbortHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. Any future or stream observing this handle stops
    /// as soon as possible and drops its connection.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn aborted(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Drive `future` until it completes or `token` is cancelled.
///
/// Cancellation drops `future`, which closes any connection it owns.
pub(crate) async fn run_abortable<F, T>(token: CancellationToken, future: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Aborted),
        out = future => out,
    }
}

/// Create a standalone abort handle that can be shared across tasks.
pub fn new_abort_handle() -> AbortHandle {
    AbortHandle::new()
}
