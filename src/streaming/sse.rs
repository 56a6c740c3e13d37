//! Byte stream to SSE event adapter.

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use std::time::Duration;

/// Parse a byte stream as `text/event-stream` (UTF-8 safe across chunk
/// boundaries).
pub trait SseStreamExt: Sized {
    fn into_sse_stream(self) -> EventStream<Self>;
}

impl<S, B, E> SseStreamExt for S
where
    S: Stream<Item = Result<B, E>> + Sized,
    B: AsRef<[u8]>,
{
    fn into_sse_stream(self) -> EventStream<Self> {
        self.eventsource()
    }
}

/// Follows the `id:` and `retry:` fields of a raw event stream.
///
/// The event parser only yields records that carry data, so a record like
/// `retry: 10` or `id: 7` on its own never surfaces as an event. This scans
/// the same bytes line by line and keeps the reconnect state up to date for
/// every dispatched record, data or not.
#[derive(Debug, Default)]
pub(crate) struct FieldTracker {
    line: Vec<u8>,
    after_cr: bool,
    started: bool,
    id_buffer: String,
    last_event_id: String,
    retry: Option<Duration>,
}

impl FieldTracker {
    /// Tracker for a new connection that resumes from `last_event_id`.
    pub(crate) fn new(last_event_id: Option<&str>) -> Self {
        let id = last_event_id.unwrap_or_default().to_string();
        Self {
            id_buffer: id.clone(),
            last_event_id: id,
            ..Self::default()
        }
    }

    pub(crate) fn feed(&mut self, chunk: &[u8]) {
        for &b in chunk {
            if self.after_cr {
                self.after_cr = false;
                if b == b'\n' {
                    continue;
                }
            }
            match b {
                b'\r' => {
                    self.after_cr = true;
                    self.end_line();
                }
                b'\n' => self.end_line(),
                _ => self.line.push(b),
            }
        }
    }

    /// Id of the last dispatched record, `None` when unset or reset.
    pub(crate) fn last_event_id(&self) -> Option<&str> {
        (!self.last_event_id.is_empty()).then_some(self.last_event_id.as_str())
    }

    /// Reconnect delay from the most recent valid `retry:` field.
    pub(crate) fn retry(&self) -> Option<Duration> {
        self.retry
    }

    fn end_line(&mut self) {
        let raw = std::mem::take(&mut self.line);
        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if !self.started {
            self.started = true;
            if let Some(rest) = line.strip_prefix('\u{feff}') {
                line = rest.to_string();
            }
        }

        if line.is_empty() {
            self.last_event_id = self.id_buffer.clone();
            return;
        }
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };
        match field {
            "id" if !value.contains('\0') => self.id_buffer = value.to_string(),
            "retry" if !value.is_empty() && value.bytes().all(|c| c.is_ascii_digit()) => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn tracker_sees_records_without_data() {
        let mut t = FieldTracker::new(None);
        t.feed(b"retry: 10\n\nid: 7\n\n");
        assert_eq!(t.retry(), Some(Duration::from_millis(10)));
        assert_eq!(t.last_event_id(), Some("7"));
    }

    #[test]
    fn tracker_commits_id_only_on_dispatch() {
        let mut t = FieldTracker::new(Some("3"));
        t.feed(b"id: 4\ndata: x\n");
        assert_eq!(t.last_event_id(), Some("3"));
        t.feed(b"\n");
        assert_eq!(t.last_event_id(), Some("4"));
        // An empty id resets it.
        t.feed(b"id\n\n");
        assert_eq!(t.last_event_id(), None);
    }

    #[test]
    fn tracker_handles_split_crlf_and_bad_retry() {
        let mut t = FieldTracker::new(None);
        t.feed(b"\xEF\xBB\xBFid: a\r");
        t.feed(b"\n\r\nretry: soon\r\n\r\n: retry: 5\n\n");
        assert_eq!(t.last_event_id(), Some("a"));
        assert_eq!(t.retry(), None);
        t.feed(b"retry:250\n\n");
        assert_eq!(t.retry(), Some(Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn parses_events_split_across_chunks() {
        let chunks: Vec<Result<&[u8], std::io::Error>> = vec![
            Ok(b": keep-alive\n\nda".as_slice()),
            Ok(b"ta: {\"a\":1}\nid: 7\n\n".as_slice()),
            Ok(b"event: ping\ndata: x\n\n".as_slice()),
        ];
        let mut sse = futures_util::stream::iter(chunks).into_sse_stream();

        let first = sse.next().await.unwrap().unwrap();
        assert_eq!(first.data, "{\"a\":1}");
        assert_eq!(first.id, "7");

        let second = sse.next().await.unwrap().unwrap();
        assert_eq!(second.event, "ping");
        assert_eq!(second.data, "x");

        assert!(sse.next().await.is_none());
    }
}
