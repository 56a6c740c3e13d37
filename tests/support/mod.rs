//! Shared test helpers: a scripted in-memory transport and event collectors.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tapi_client::{
    ApiError, HttpTransport, StreamEvent, TransportRequest, TransportResponse,
    TransportStreamResponse,
};
use tokio::sync::mpsc;

enum Connection {
    Refuse(String),
    Respond {
        status: u16,
        content_type: &'static str,
        body: mpsc::UnboundedReceiver<Bytes>,
    },
}

/// Transport that answers stream connections from a script.
///
/// Each queued connection is used once, in order. The body of an accepted
/// connection is fed through the returned sender; dropping the sender closes
/// the connection from the "server" side. Once the script is exhausted new
/// connections hang until cancelled.
#[derive(Default)]
pub struct ScriptedTransport {
    connections: Mutex<VecDeque<Connection>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn refuse(&self, message: &str) {
        self.push(Connection::Refuse(message.to_string()));
    }

    pub fn respond(&self, status: u16, content_type: &'static str) -> ServerBody {
        let (tx, rx) = mpsc::unbounded_channel();
        self.push(Connection::Respond {
            status,
            content_type,
            body: rx,
        });
        ServerBody { tx }
    }

    /// Accept a connection as a well-behaved SSE server.
    pub fn accept(&self) -> ServerBody {
        self.respond(200, "text/event-stream; charset=utf-8")
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, connection: Connection) {
        self.connections.lock().unwrap().push_back(connection);
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        Err(ApiError::Http(format!(
            "scripted transport only streams ({})",
            request.url
        )))
    }

    async fn execute_stream(
        &self,
        request: TransportRequest,
    ) -> Result<TransportStreamResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let next = self.connections.lock().unwrap().pop_front();
        match next {
            None => futures::future::pending().await,
            Some(Connection::Refuse(message)) => Err(ApiError::Http(message)),
            Some(Connection::Respond {
                status,
                content_type,
                mut body,
            }) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
                let stream = async_stream::stream! {
                    while let Some(chunk) = body.recv().await {
                        yield Ok::<Bytes, ApiError>(chunk);
                    }
                };
                Ok(TransportStreamResponse {
                    status,
                    headers,
                    body: Box::pin(stream),
                })
            }
        }
    }
}

/// Server side of one scripted connection.
pub struct ServerBody {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ServerBody {
    pub fn send(&self, raw: &str) {
        let _ = self.tx.send(Bytes::from(raw.to_string()));
    }

    /// Close the connection.
    pub fn close(self) {}
}

/// Listener that forwards every event into a channel.
pub fn channel_listener<T: Send + 'static>() -> (
    impl Fn(StreamEvent<T>) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<StreamEvent<T>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |event| {
            let _ = tx.send(event);
        },
        rx,
    )
}

/// Next event, or `None` once the listener has been dropped.
pub async fn next_event<T>(rx: &mut mpsc::UnboundedReceiver<StreamEvent<T>>) -> Option<StreamEvent<T>> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a stream event")
}
