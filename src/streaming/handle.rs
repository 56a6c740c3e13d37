//! Handle to one open event stream.

use crate::streaming::StreamEvent;
use crate::streaming::listener::ListenerSlot;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancel and listen to one open event stream.
///
/// Clones share the connection. The connection is closed by `cancel()`, or
/// when the last clone (and every `EventReceiver` taken from it) is dropped.
pub struct EventStreamHandle<T> {
    slot: Arc<ListenerSlot<T>>,
    token: CancellationToken,
    guard: Arc<DropGuard>,
}

impl<T> Clone for EventStreamHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            token: self.token.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<T> std::fmt::Debug for EventStreamHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl<T> EventStreamHandle<T> {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl<T: Send + 'static> EventStreamHandle<T> {
    pub(crate) fn new(slot: Arc<ListenerSlot<T>>, token: CancellationToken) -> Self {
        let guard = Arc::new(token.clone().drop_guard());
        Self { slot, token, guard }
    }

    /// Close the connection. Idempotent; no event is delivered after the
    /// first call returns.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!(target: "tapi_client::sse", "event stream cancelled");
        }
        self.token.cancel();
        self.slot.close();
    }

    /// Register the handler, replacing any previous one. Events that fired
    /// before registration are not replayed.
    pub fn listen<F>(&self, handler: F)
    where
        F: Fn(StreamEvent<T>) + Send + Sync + 'static,
    {
        self.slot.set(Arc::new(handler));
    }

    /// Take the listener slot and receive events as an async stream.
    ///
    /// Like `listen`, this replaces the current handler and only sees events
    /// from now on. The stream ends when the connection is closed or another
    /// handler takes the slot.
    pub fn events(&self) -> EventReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slot.set(Arc::new(move |event| {
            let _ = tx.send(event);
        }));
        EventReceiver {
            rx,
            _guard: self.guard.clone(),
        }
    }
}

/// Async `Stream` view of an event stream. See [`EventStreamHandle::events`].
pub struct EventReceiver<T> {
    rx: mpsc::UnboundedReceiver<StreamEvent<T>>,
    _guard: Arc<DropGuard>,
}

impl<T> Stream for EventReceiver<T> {
    type Item = StreamEvent<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for EventReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReceiver").finish_non_exhaustive()
    }
}
