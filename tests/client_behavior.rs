//! Client behavior tests: verbs, identity headers, sessions and transport errors.

use std::time::Duration;

use http::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use uuid::Uuid;

use logging_http_client::observability::hooks::{REQUEST_MESSAGE, RESPONSE_MESSAGE};
use logging_http_client::{with_source_header, HttpMethod, ResponseSourcePolicy};

mod common;

#[tokio::test]
async fn test_every_verb_is_sent_and_logged() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    for method in HttpMethod::ALL {
        let url = stub.url("/echo");
        let builder = match method {
            HttpMethod::Get => h.client.get(url.as_str()),
            HttpMethod::Post => h.client.post(url.as_str()),
            HttpMethod::Put => h.client.put(url.as_str()),
            HttpMethod::Delete => h.client.delete(url.as_str()),
            HttpMethod::Patch => h.client.patch(url.as_str()),
            HttpMethod::Head => h.client.head(url.as_str()),
            HttpMethod::Options => h.client.options(url.as_str()),
        };
        let response = builder.send().await.unwrap();
        assert_eq!(response.status(), 200, "{method}");

        if method != HttpMethod::Head {
            let echoed: Value = response.json().unwrap();
            assert_eq!(echoed["method"], method.as_str());
        }
    }

    let methods: Vec<String> = h
        .sink
        .with_message(REQUEST_MESSAGE)
        .iter()
        .map(|entry| entry.http().unwrap()["request_method"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(methods, ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"]);
    assert_eq!(h.sink.with_message(RESPONSE_MESSAGE).len(), 7);
}

#[tokio::test]
async fn test_identity_headers_are_sent() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    let response = h.client.get(stub.url("/echo")).send().await.unwrap();
    let echoed: Value = response.json().unwrap();

    let request_id = echoed["headers"]["x-request-id"].as_str().unwrap();
    assert_eq!(Uuid::parse_str(request_id).unwrap().get_version_num(), 4);
    assert_eq!(echoed["headers"]["x-source"], "integration-test");
    assert!(echoed["headers"].get("x-correlation-id").is_none());
}

#[tokio::test]
async fn test_preset_identity_headers_are_preserved() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    let mut headers = with_source_header("caller-system").unwrap();
    headers.insert("x-request-id", HeaderValue::from_static("preset-id-1"));
    let response = h
        .client
        .get(stub.url("/echo"))
        .headers(headers)
        .send()
        .await
        .unwrap();

    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["headers"]["x-request-id"], "preset-id-1");
    assert_eq!(echoed["headers"]["x-source"], "caller-system");

    let responses = h.sink.with_message(RESPONSE_MESSAGE);
    assert_eq!(responses[0].http().unwrap()["request_id"], "preset-id-1");
}

#[tokio::test]
async fn test_shared_headers_apply_without_overriding() {
    let stub = common::start_stub_server().await;
    let mut shared = HeaderMap::new();
    shared.insert("x-tenant", HeaderValue::from_static("acme"));
    shared.insert("x-team", HeaderValue::from_static("payments"));
    let h = common::harness_with(|builder| builder.shared_headers(shared));

    let response = h
        .client
        .get(stub.url("/echo"))
        .header("x-team", "ledger")
        .send()
        .await
        .unwrap();
    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["headers"]["x-tenant"], "acme");
    assert_eq!(echoed["headers"]["x-team"], "ledger");

    h.client.clear_shared_headers();
    let response = h.client.get(stub.url("/echo")).send().await.unwrap();
    let echoed: Value = response.json().unwrap();
    assert!(echoed["headers"].get("x-tenant").is_none());
}

#[tokio::test]
async fn test_non_reusable_session() {
    let stub = common::start_stub_server().await;
    let h = common::harness_with(|builder| builder.reusable_session(false));
    assert!(!h.client.is_reusable_session());

    for _ in 0..3 {
        let response = h.client.get(stub.url("/status/201")).send().await.unwrap();
        assert_eq!(response.status(), 201);
    }
    assert_eq!(h.sink.with_message(RESPONSE_MESSAGE).len(), 3);
}

#[tokio::test]
async fn test_timeout_surfaces_and_skips_response_hooks() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    let err = h
        .client
        .get(stub.url("/delay/2000"))
        .timeout(Duration::from_millis(100))
        .send()
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
    assert_eq!(h.sink.with_message(REQUEST_MESSAGE).len(), 1);
    assert!(h.sink.with_message(RESPONSE_MESSAGE).is_empty());
}

#[tokio::test]
async fn test_client_timeout_option() {
    let stub = common::start_stub_server().await;
    let h = common::harness_with(|builder| builder.timeout(Duration::from_millis(100)));

    let err = h.client.get(stub.url("/delay/2000")).send().await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let h = common::harness();

    let err = h
        .client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap_err();

    assert!(err.is_connect(), "{err}");
    assert!(h.sink.with_message(RESPONSE_MESSAGE).is_empty());
}

#[tokio::test]
async fn test_response_source_falls_back_to_host() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    // /delay responses carry no x-source header.
    h.client.get(stub.url("/delay/0")).send().await.unwrap();
    h.store.set_response_source_policy(ResponseSourcePolicy::HeaderOnly);
    h.client.get(stub.url("/delay/0")).send().await.unwrap();

    let responses = h.sink.with_message(RESPONSE_MESSAGE);
    assert_eq!(
        responses[0].http().unwrap()["response_source"],
        stub.addr.to_string()
    );
    assert!(responses[1].http().unwrap().get("response_source").is_none());
}

#[tokio::test]
async fn test_query_builder_params_are_logged() {
    let stub = common::start_stub_server().await;
    let h = common::harness();

    h.client
        .get(stub.url("/echo"))
        .query(&[("name", "a b"), ("tag", "x"), ("tag", "y")])
        .send()
        .await
        .unwrap();

    let requests = h.sink.with_message(REQUEST_MESSAGE);
    let params = &requests[0].http().unwrap()["request_query_params"];
    assert_eq!(params["name"], "a b");
    assert_eq!(params["tag"], "x, y");
}

#[tokio::test]
async fn test_one_shot_functions_use_global_store() {
    let stub = common::start_stub_server().await;

    let response = logging_http_client::get(stub.url("/status/200"))
        .unwrap()
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.request().request_id().is_some());

    let response = logging_http_client::post(stub.url("/echo"))
        .unwrap()
        .header("x-trace", "one-shot")
        .json(&json!({ "key": "value" }))
        .send()
        .await
        .unwrap();
    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["body"], r#"{"key":"value"}"#);
    assert_eq!(echoed["headers"]["x-trace"], "one-shot");

    let response = logging_http_client::one_shot(HttpMethod::Put, stub.url("/echo"))
        .unwrap()
        .body("raw")
        .send()
        .await
        .unwrap();
    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["method"], "PUT");
    assert_eq!(echoed["body"], "raw");
}
