use crate::error::StreamError;

/// One event delivered to an event-stream listener.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    /// The connection was accepted by the server. Precedes any message.
    Open,
    /// A decoded message payload.
    Message(T),
    /// A stream-level failure. The stream keeps reconnecting unless the
    /// error is fatal; closing it is the caller's decision.
    Error(StreamError),
}

impl<T> StreamEvent<T> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> Option<&T> {
        match self {
            Self::Message(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_message(self) -> Option<T> {
        match self {
            Self::Message(data) => Some(data),
            _ => None,
        }
    }
}
