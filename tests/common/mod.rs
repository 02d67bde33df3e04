//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use logging_http_client::observability::logging::MemorySink;
use logging_http_client::{ConfigStore, Logger, LoggingClient};

/// `x-source` value every stub response carries.
pub const STUB_SOURCE: &str = "stub-server";

/// Running stub backend.
pub struct StubServer {
    pub addr: SocketAddr,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a stub backend on an ephemeral port.
///
/// Routes:
/// - `/echo` (any method): JSON with the method, request headers and body
/// - `/status/{code}`: empty-ish response with that status
/// - `/delay/{ms}`: 200 after sleeping `ms` milliseconds
/// - `/json`: fixed JSON document
pub async fn start_stub_server() -> StubServer {
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/delay/{ms}", get(delay))
        .route("/json", get(|| async { Json(json!({ "message": "hello" })) }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    StubServer { addr }
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let payload: Value = json!({
        "method": method.as_str(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    });
    ([("x-source", STUB_SOURCE)], Json(payload))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, [("x-source", STUB_SOURCE)], format!("status {code}"))
}

async fn delay(Path(ms): Path<u64>) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

/// Isolated store, in-memory logger and client wired together.
pub struct Harness {
    pub store: Arc<ConfigStore>,
    pub sink: Arc<MemorySink>,
    pub client: LoggingClient,
}

pub fn harness() -> Harness {
    harness_with(|builder| builder)
}

pub fn harness_with(
    customize: impl FnOnce(logging_http_client::LoggingClientBuilder) -> logging_http_client::LoggingClientBuilder,
) -> Harness {
    let store = Arc::new(ConfigStore::new());
    let (logger, sink) = Logger::memory("integration");
    let builder = LoggingClient::builder()
        .config(store.clone())
        .logger(logger)
        .source("integration-test")
        .no_proxy();
    let client = customize(builder).build().unwrap();
    Harness {
        store,
        sink,
        client,
    }
}
