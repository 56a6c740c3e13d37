//! Request endpoint tests against wiremock servers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tapi_client::prelude::*;
use tapi_client::{
    HttpInterceptor, HttpRequestContext, HttpTransport, TransportRequest, TransportResponse,
    TransportStreamResponse,
};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
}

#[derive(Serialize)]
struct NewUser {
    name: String,
}

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(server.uri()).unwrap()
}

#[tokio::test]
async fn get_user_decodes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let get_user: RequestEndpoint<(), User> = client.request(
        RequestEncoding::Json,
        Method::Get,
        "/users/42",
        ResponseDecoding::Json,
    );
    let user = get_user.call(&(), None).await.unwrap();
    assert_eq!(
        user,
        User {
            id: 42,
            name: "Ada".to_string()
        }
    );
}

#[tokio::test]
async fn non_success_status_rejects_with_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let get_user: RequestEndpoint<(), User> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/users/42",
        ResponseDecoding::Json,
    );
    let err = get_user.call(&(), None).await.unwrap_err();
    assert_eq!(err.to_string(), "not found");
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn status_error_ignores_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let delete: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Delete,
        "/users/1",
        ResponseDecoding::None,
    );
    let err = assert_err!(delete.call(&(), None).await);
    assert_eq!(err, ApiError::status(500, ""));
}

#[tokio::test]
async fn json_encoding_sends_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Grace"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7, "name": "Grace"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let create: RequestEndpoint<NewUser, User> = client.request(
        RequestEncoding::Json,
        Method::Post,
        "/users",
        ResponseDecoding::Json,
    );
    let user = assert_ok!(
        create
            .call(
                &NewUser {
                    name: "Grace".to_string()
                },
                None
            )
            .await
    );
    assert_eq!(user.id, 7);
}

#[tokio::test]
async fn none_encoding_sends_no_body_or_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let ping: RequestEndpoint<NewUser, String> = client.request(
        RequestEncoding::None,
        Method::Put,
        "/ping",
        ResponseDecoding::None,
    );
    let out = ping
        .call(
            &NewUser {
                name: "ignored".to_string(),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(out, "");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn text_decoding_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/motd"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"looks\":\"like json\"}"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let motd: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/motd",
        ResponseDecoding::Text,
    );
    assert_eq!(
        motd.call(&(), None).await.unwrap(),
        "{\"looks\":\"like json\"}"
    );
}

#[tokio::test]
async fn invalid_json_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let get_user: RequestEndpoint<(), User> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/users/1",
        ResponseDecoding::Json,
    );
    let err = get_user.call(&(), None).await.unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));
}

#[derive(Serialize)]
struct Search {
    q: String,
    limit: u32,
    cursor: Option<String>,
}

#[tokio::test]
async fn query_encoding_appends_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust lang"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let search: RequestEndpoint<Search, Vec<String>> = client.request(
        RequestEncoding::Query,
        Method::Get,
        "/search",
        ResponseDecoding::Json,
    );
    let hits = search
        .call(
            &Search {
                q: "rust lang".to_string(),
                limit: 10,
                cursor: None,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(hits, vec!["a", "b"]);

    let received = server.received_requests().await.unwrap();
    assert!(received[0].body.is_empty());
    assert!(!received[0].url.query().unwrap_or_default().contains("cursor"));
}

#[tokio::test]
async fn abort_before_settlement_rejects_with_aborted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let slow: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/slow",
        ResponseDecoding::Text,
    );
    let pending = slow.call(&(), None);
    pending.abort();
    pending.abort();
    let out = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("aborted call should settle promptly");
    assert!(out.unwrap_err().is_aborted());
}

#[tokio::test]
async fn abort_after_settlement_has_no_effect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let fast: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/fast",
        ResponseDecoding::Text,
    );
    let pending = fast.call(&(), None);
    let abort = pending.abort_handle();
    assert_eq!(pending.await.unwrap(), "done");
    abort.abort();
    abort.abort();
    assert!(abort.is_aborted());
}

#[tokio::test]
async fn each_call_reads_the_current_base() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for (server, body) in [(&first, "first"), (&second, "second")] {
        Mock::given(method("GET"))
            .and(path("/who"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    let client = client_for(&first).await;
    let who: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/who",
        ResponseDecoding::Text,
    );
    let in_flight = who.call(&(), None);
    client.clone().set_api_base(second.uri());

    assert_eq!(in_flight.await.unwrap(), "first");
    assert_eq!(who.call(&(), None).await.unwrap(), "second");

    let options = ApiOptions::new().with_api_base(first.uri());
    assert_eq!(who.call(&(), Some(&options)).await.unwrap(), "first");
}

#[tokio::test]
async fn default_and_per_call_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("x-tenant", "acme"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .api_base(server.uri())
        .header("x-tenant", "acme")
        .build()
        .unwrap();
    let me: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/me",
        ResponseDecoding::Text,
    );
    let options = ApiOptions::new().with_header("authorization", "Bearer abc");
    assert_eq!(me.call(&(), Some(&options)).await.unwrap(), "ok");
}

/// Transport that answers every call locally and counts them.
#[derive(Default)]
struct CannedTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl HttpTransport for CannedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TransportResponse {
            status: 200,
            headers: Default::default(),
            body: format!("{} {}", request.method, request.url).into(),
        })
    }

    async fn execute_stream(
        &self,
        _request: TransportRequest,
    ) -> Result<TransportStreamResponse, ApiError> {
        Err(ApiError::Http("not streaming".to_string()))
    }
}

#[tokio::test]
async fn per_call_transport_replaces_the_client() {
    let client = ApiClient::new("http://never.invalid").unwrap();
    let transport = Arc::new(CannedTransport::default());
    let echo: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Patch,
        "/echo",
        ResponseDecoding::Text,
    );
    let options = ApiOptions::new().with_transport(transport.clone());
    let out = echo.call(&(), Some(&options)).await.unwrap();
    assert_eq!(out, "PATCH http://never.invalid/echo");
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

struct Signer;

impl HttpInterceptor for Signer {
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        request: &mut TransportRequest,
    ) -> Result<(), ApiError> {
        if request.url.ends_with("/forbidden") {
            return Err(ApiError::Configuration("refusing to sign".to_string()));
        }
        request
            .headers
            .insert("x-signature", reqwest::header::HeaderValue::from_static("signed"));
        Ok(())
    }
}

#[tokio::test]
async fn interceptors_can_rewrite_or_reject() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signed"))
        .and(header("x-signature", "signed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .api_base(server.uri())
        .interceptor(Arc::new(Signer))
        .http_debug(true)
        .build()
        .unwrap();
    let signed: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/signed",
        ResponseDecoding::Text,
    );
    assert_eq!(signed.call(&(), None).await.unwrap(), "ok");

    let forbidden: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/forbidden",
        ResponseDecoding::Text,
    );
    let pending = forbidden.call(&(), None);
    pending.abort();
    assert_eq!(
        pending.await.unwrap_err(),
        ApiError::Configuration("refusing to sign".to_string())
    );
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    // Bind and release a port so nothing is listening on it.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = ApiClient::new(format!("http://{addr}")).unwrap();
    let get: RequestEndpoint<(), String> = client.request(
        RequestEncoding::None,
        Method::Get,
        "/",
        ResponseDecoding::Text,
    );
    let err = get.call(&(), None).await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)), "{err:?}");
}
