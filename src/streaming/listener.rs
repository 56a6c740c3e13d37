//! Single listener slot shared by a stream handle and its pump task.

use crate::streaming::StreamEvent;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Event handler registered with `EventStreamHandle::listen`.
pub type StreamListener<T> = Arc<dyn Fn(StreamEvent<T>) + Send + Sync>;

struct SlotState<T> {
    handler: Option<StreamListener<T>>,
    closed: bool,
    /// Threads currently running the handler.
    in_flight: Vec<ThreadId>,
}

/// At most one handler; last registration wins. Once closed, the slot
/// drops any handler it is given and delivers nothing.
pub(crate) struct ListenerSlot<T> {
    state: Mutex<SlotState<T>>,
    idle: Condvar,
}

impl<T> ListenerSlot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                handler: None,
                closed: false,
                in_flight: Vec::new(),
            }),
            idle: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, handler: StreamListener<T>) {
        let mut state = self.lock();
        if !state.closed {
            state.handler = Some(handler);
        }
    }

    /// Deliver one event. Returns whether a handler received it.
    ///
    /// The handler is invoked outside the lock so it may call `listen` or
    /// `cancel` on its own handle.
    pub(crate) fn deliver(&self, event: StreamEvent<T>) -> bool {
        let me = thread::current().id();
        let handler = {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            let handler = state.handler.clone();
            if handler.is_some() {
                state.in_flight.push(me);
            }
            handler
        };
        let Some(handler) = handler else {
            return false;
        };
        let _done = InFlight { slot: self, thread: me };
        handler(event);
        true
    }

    /// Close the slot. On return no handler is running on another thread
    /// and none will run again. A handler that closes its own slot returns
    /// immediately.
    pub(crate) fn close(&self) {
        let me = thread::current().id();
        let handler = {
            let mut state = self.lock();
            state.closed = true;
            let handler = state.handler.take();
            while state.in_flight.iter().any(|t| *t != me) {
                state = self
                    .idle
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            handler
        };
        // Dropped outside the lock; a handler may own channel senders.
        drop(handler);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Clears one in-flight entry, also when the handler panics.
struct InFlight<'a, T> {
    slot: &'a ListenerSlot<T>,
    thread: ThreadId,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        if let Some(pos) = state.in_flight.iter().position(|t| *t == self.thread) {
            state.in_flight.swap_remove(pos);
        }
        drop(state);
        self.slot.idle.notify_all();
    }
}
