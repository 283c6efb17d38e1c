//! Execution engine: refresh-and-retry, classification, timeouts, transport failures.

mod common;

use async_trait::async_trait;
use common::{scripted_client, MockBackend, ScriptedTransport, Step};
use mockito::Matcher;
use restbase::{
    ClientConfig, ErrorKind, HttpRequest, HttpResponse, Method, Payload, RequestDescriptor,
    RestbaseClientBuilder, TokenState, Transport, TransportError,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_401_refreshes_once_and_replays_request() {
    let mut backend = MockBackend::new().await;
    let rejected = backend
        .server
        .mock("GET", "/data/read")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a1")
        .with_status(401)
        .with_body(r#"{"message":"jwt expired"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = backend
        .server
        .mock("POST", "/auth/refresh-token")
        .match_body(Matcher::Json(json!({"refreshToken": "r1"})))
        .with_status(200)
        .with_body(r#"{"accessToken":"a2"}"#)
        .expect(1)
        .create_async()
        .await;
    let replayed = backend
        .server
        .mock("GET", "/data/read")
        .match_header("authorization", "Bearer a2")
        .match_query(Matcher::UrlEncoded("tableName".into(), "t".into()))
        .with_status(200)
        .with_body(r#"[{"x":1}]"#)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client_with_tokens(TokenState::new("a1", "r1"));
    let rows = client.read("t", None).await.unwrap();

    assert_eq!(rows, vec![json!({"x": 1})]);
    let state = client.token_state().await;
    assert_eq!(state.access_token.as_deref(), Some("a2"));
    assert_eq!(state.refresh_token.as_deref(), Some("r1"));
    rejected.assert_async().await;
    refresh.assert_async().await;
    replayed.assert_async().await;
}

#[tokio::test]
async fn test_second_401_is_final() {
    let mut backend = MockBackend::new().await;
    let first = backend
        .server
        .mock("GET", "/data/read")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = backend
        .server
        .mock("POST", "/auth/refresh-token")
        .with_status(200)
        .with_body(r#"{"accessToken":"a2"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = backend
        .server
        .mock("GET", "/data/read")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer a2")
        .with_status(401)
        .with_body(r#"{"message":"still expired"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client_with_tokens(TokenState::new("a1", "r1"));
    let err = client.read("t", None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("still expired"));
    first.assert_async().await;
    refresh.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_401_without_refresh_token_is_not_retried() {
    let mut backend = MockBackend::new().await;
    let rejected = backend
        .server
        .mock("POST", "/data/insert")
        .with_status(401)
        .with_body(r#"{"message":"unauthorized"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = backend
        .server
        .mock("POST", "/auth/refresh-token")
        .expect(0)
        .create_async()
        .await;

    let client = backend.client_with_tokens(TokenState {
        access_token: Some("a1".into()),
        refresh_token: None,
    });
    let record = json!({"a": 1});
    let err = client
        .create("t", record.as_object().unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.kind(), ErrorKind::Http);
    rejected.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_failed_refresh_surfaces_auth_expired() {
    let mut backend = MockBackend::new().await;
    let rejected = backend
        .server
        .mock("DELETE", "/data/delete")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = backend
        .server
        .mock("POST", "/auth/refresh-token")
        .with_status(401)
        .with_body(r#"{"message":"refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client_with_tokens(TokenState::new("a1", "r1"));
    let err = client.delete("t", "x").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthExpired);
    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("refresh token revoked"));
    assert_eq!(client.access_token().await.as_deref(), Some("a1"));
    rejected.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_auth_service_401_is_never_retried() {
    let mut backend = MockBackend::new().await;
    let login = backend
        .server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"message":"bad credentials"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = backend
        .server
        .mock("POST", "/auth/refresh-token")
        .expect(0)
        .create_async()
        .await;

    let client = backend.client_with_tokens(TokenState::new("a1", "r1"));
    let err = client.login("ada@example.com", "wrong").await.unwrap_err();

    match err {
        restbase::Error::Http { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    login.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_http_error_without_json_message_keeps_body() {
    let mut backend = MockBackend::new().await;
    let _m = backend
        .server
        .mock("GET", "/data/table-data")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let client = backend.client();
    let err = client.get_table_data("public", "users").await.unwrap_err();
    match err {
        restbase::Error::Http { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_success_bodies_are_tagged() {
    let mut backend = MockBackend::new().await;
    let _raw = backend
        .server
        .mock("GET", "/data/table-data")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("not json at all")
        .create_async()
        .await;
    let _empty = backend
        .server
        .mock("DELETE", "/data/delete")
        .with_status(204)
        .create_async()
        .await;

    let client = backend.client();
    assert_eq!(
        client.get_table_data("public", "users").await.unwrap(),
        Payload::Raw("not json at all".into())
    );
    assert_eq!(client.delete("users", "x").await.unwrap(), Payload::Empty);
}

#[tokio::test]
async fn test_headers_without_token() {
    let mut backend = MockBackend::new().await;
    let m = backend
        .server
        .mock("GET", "/data/read")
        .match_query(Matcher::Any)
        .match_header("content-type", "application/json")
        .match_header("x-tenant", "acme")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let config = backend.config().with_data_header("X-Tenant", "acme");
    let client = RestbaseClientBuilder::new(config).build().unwrap();
    assert!(client.get_all("users").await.unwrap().is_empty());
    m.assert_async().await;
}

#[tokio::test]
async fn test_execute_accepts_custom_descriptors() {
    let mut backend = MockBackend::new().await;
    let m = backend
        .server
        .mock("PATCH", "/data/custom/op")
        .match_query(Matcher::UrlEncoded("dry_run".into(), "1".into()))
        .match_header("x-trace", "t-1")
        .match_body(Matcher::Json(json!({"k": "v"})))
        .with_status(200)
        .with_body(r#"{"done":true}"#)
        .expect(1)
        .create_async()
        .await;

    let client = backend.client();
    let method: Method = "patch".parse().unwrap();
    let payload = client
        .execute(
            &RequestDescriptor::data(method, "/custom/op")
                .with_query("dry_run", "1")
                .with_header("X-Trace", "t-1")
                .with_body(json!({"k": "v"})),
        )
        .await
        .unwrap();
    assert_eq!(payload.as_json(), Some(&json!({"done": true})));
    m.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_backend_is_network_unavailable() {
    common::init_tracing();
    // Port 1 is reserved and nothing listens on it.
    let client = RestbaseClientBuilder::new(ClientConfig::new(
        "http://127.0.0.1:1/auth",
        "http://127.0.0.1:1/data",
    ))
    .timeout(Duration::from_secs(5))
    .build()
    .unwrap();

    let err = client.get_all("users").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkUnavailable);
}

#[tokio::test]
async fn test_invalid_config_fails_fast() {
    let err = RestbaseClientBuilder::new(ClientConfig::new("auth.local", "https://d.example.com"))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_slow_transport_times_out() {
    let transport = ScriptedTransport::new(vec![Step::Delay(
        Duration::from_millis(500),
        200,
        "[]",
    )]);
    let client = scripted_client(
        transport.clone(),
        TokenState::default(),
        Duration::from_millis(50),
    );

    let err = client.get_all("users").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_retry_gets_a_fresh_timeout_window() {
    let transport = ScriptedTransport::new(vec![
        Step::Delay(Duration::from_millis(120), 401, ""),
        Step::Respond(200, r#"{"accessToken":"a2"}"#),
        Step::Delay(Duration::from_millis(120), 200, r#"[{"x":1}]"#),
    ]);
    let client = scripted_client(
        transport.clone(),
        TokenState::new("a1", "r1"),
        Duration::from_millis(200),
    );

    let rows = client.get_all("users").await.unwrap();
    assert_eq!(rows, vec![json!({"x": 1})]);

    let sent = transport.requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0].header("authorization"), Some("Bearer a1"));
    assert!(sent[1].url.path().ends_with("/refresh-token"));
    assert_eq!(sent[2].header("authorization"), Some("Bearer a2"));
    assert_eq!(sent[0].url, sent[2].url);
}

#[tokio::test]
async fn test_transport_failures_are_classified() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail(|| TransportError::Connect("dns error".into())),
        Step::Fail(|| TransportError::Timeout),
        Step::Fail(|| TransportError::Body("connection reset mid-body".into())),
        Step::Fail(|| TransportError::Other("tls handshake".into())),
    ]);
    let client = scripted_client(transport, TokenState::default(), Duration::from_secs(1));

    let mut kinds = Vec::new();
    for _ in 0..4 {
        kinds.push(client.get_all("users").await.unwrap_err().kind());
    }
    assert_eq!(
        kinds,
        vec![
            ErrorKind::NetworkUnavailable,
            ErrorKind::Timeout,
            ErrorKind::InvalidResponseFormat,
            ErrorKind::Transport,
        ]
    );
}

#[tokio::test]
async fn test_engine_errors_carry_client_request_id() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail(|| TransportError::Body("connection reset mid-body".into())),
        Step::RespondBytes(200, b"[{\"x\":\xff}]"),
    ]);
    let client = scripted_client(transport, TokenState::default(), Duration::from_secs(1));

    let body_read = client.get_all("users").await.unwrap_err();
    assert_eq!(body_read.kind(), ErrorKind::InvalidResponseFormat);
    let first_id = body_read.context().unwrap().request_id.clone();
    assert!(first_id.is_some());

    let not_utf8 = client.get_all("users").await.unwrap_err();
    assert_eq!(not_utf8.kind(), ErrorKind::InvalidResponseFormat);
    let second_id = not_utf8.context().unwrap().request_id.clone();
    assert!(second_id.is_some());
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_generic_transport_failure_keeps_cause() {
    let transport = ScriptedTransport::new(vec![Step::Fail(|| {
        TransportError::Other(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "tls handshake",
        )))
    })]);
    let client = scripted_client(transport, TokenState::default(), Duration::from_secs(1));

    let err = client.get_all("users").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    let transport_err = std::error::Error::source(&err).expect("transport error");
    let cause = std::error::Error::source(transport_err).expect("underlying cause");
    assert_eq!(cause.to_string(), "tls handshake");
}

/// Rejects anything but the refreshed token and counts refresh calls.
struct RotatingBackend {
    refreshes: AtomicUsize,
}

#[async_trait]
impl Transport for RotatingBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url.path().ends_with("/refresh-token") {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            return Ok(HttpResponse::new(200, r#"{"accessToken":"fresh"}"#));
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        match request.header("authorization") {
            Some("Bearer fresh") => Ok(HttpResponse::new(200, "[]")),
            _ => Ok(HttpResponse::new(401, "")),
        }
    }
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    common::init_tracing();
    let backend = Arc::new(RotatingBackend {
        refreshes: AtomicUsize::new(0),
    });
    let client = RestbaseClientBuilder::new(ClientConfig::new(
        "https://auth.example.com",
        "https://data.example.com",
    ))
    .transport(backend.clone())
    .tokens(TokenState::new("stale", "r1"))
    .build()
    .unwrap();

    let calls = (0..5).map(|_| client.get_all("users"));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(client.access_token().await.as_deref(), Some("fresh"));
}
