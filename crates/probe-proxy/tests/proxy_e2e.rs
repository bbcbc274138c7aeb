//! End-to-end proxy tests: a real proxy server in front of a mock upstream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use probe_proxy::{router, ProxyConfig, UPSTREAM_MODEL};

#[derive(Clone)]
struct Upstream {
    status: StatusCode,
    reply: String,
    seen: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn upstream_messages(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    upstream.seen.lock().unwrap().push((headers, body));
    (upstream.status, upstream.reply.clone())
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start a mock upstream and a proxy pointing at it. Returns the proxy base
/// URL and the upstream's request log.
async fn start(status: StatusCode, reply: &str) -> (String, Upstream) {
    let upstream = Upstream {
        status,
        reply: reply.to_string(),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let upstream_app = Router::new()
        .route("/v1/messages", post(upstream_messages))
        .with_state(upstream.clone());
    let upstream_base = serve(upstream_app).await;

    let config = ProxyConfig::new("server-secret")
        .with_upstream_url(format!("{upstream_base}/v1/messages"))
        .with_timeout_secs(5);
    let proxy_base = serve(router(config).unwrap()).await;
    (proxy_base, upstream)
}

async fn post_messages(base: &str, body: impl Into<reqwest::Body>) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/anthropic/messages"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let payload = response.json().await.unwrap_or(Value::Null);
    (status, payload)
}

#[tokio::test]
async fn forwards_messages_and_returns_text() {
    let (base, upstream) = start(
        StatusCode::OK,
        r#"{"content": [{"type": "text", "text": "hello from claude"}]}"#,
    )
    .await;
    let messages = json!([
        {"role": "user", "content": "test"},
        {"role": "assistant", "content": "earlier"},
        {"role": "user", "content": "again"}
    ]);

    let (status, payload) =
        post_messages(&base, json!({"messages": messages}).to_string()).await;

    assert_eq!(status, 200);
    assert_eq!(payload, json!({"text": "hello from claude"}));

    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-api-key"], "server-secret");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["messages"], messages);
    assert_eq!(body["model"], json!(UPSTREAM_MODEL));
    assert_eq!(body["max_tokens"], json!(1000));
    assert!(body["system"]
        .as_str()
        .is_some_and(|s| s.ends_with("This is part of the Emergence Archive research program.")));
}

#[tokio::test]
async fn caller_key_is_never_forwarded() {
    let (base, upstream) = start(StatusCode::OK, r#"{"content": [{"text": "ok"}]}"#).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/anthropic/messages"))
        .header("x-api-key", "caller-key")
        .json(&json!({"messages": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let seen = upstream.seen.lock().unwrap();
    assert_eq!(seen[0].0["x-api-key"], "server-secret");
}

#[tokio::test]
async fn empty_upstream_content_yields_marker() {
    let (base, _upstream) = start(StatusCode::OK, r#"{"content": "invalid"}"#).await;

    let (status, payload) = post_messages(&base, r#"{"messages": []}"#).await;

    assert_eq!(status, 200);
    assert_eq!(payload, json!({"text": "[No response]"}));
}

#[tokio::test]
async fn malformed_bodies_are_rejected_without_upstream_call() {
    let (base, upstream) = start(StatusCode::OK, r#"{"content": []}"#).await;

    for body in ["not json", r#"{"messages": "hi"}"#, r#"{"prompt": "hi"}"#, ""] {
        let (status, payload) = post_messages(&base, body).await;
        assert_eq!(status, 400, "body {body:?}");
        assert!(payload["error"].is_string());
    }
    assert!(upstream.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let (base, _upstream) = start(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;

    let (status, payload) = post_messages(&base, r#"{"messages": []}"#).await;

    assert_eq!(status, 502);
    assert!(payload["error"]
        .as_str()
        .is_some_and(|e| e.contains("status 500")));
}

#[tokio::test]
async fn non_json_upstream_is_bad_gateway() {
    let (base, _upstream) = start(StatusCode::OK, "<html>oops</html>").await;

    let (status, payload) = post_messages(&base, r#"{"messages": []}"#).await;

    assert_eq!(status, 502);
    assert_eq!(payload["error"], json!("Anthropic response was not valid JSON"));
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let config = ProxyConfig::new("k")
        .with_upstream_url("http://127.0.0.1:9/v1/messages")
        .with_timeout_secs(2);
    let base = serve(router(config).unwrap()).await;

    let (status, _) = post_messages(&base, r#"{"messages": []}"#).await;
    assert_eq!(status, 502);
}

#[tokio::test]
async fn slow_upstream_times_out_as_bad_gateway() {
    let slow = Router::new().route(
        "/v1/messages",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({"content": [{"text": "too late"}]}))
        }),
    );
    let upstream_base = serve(slow).await;
    let config = ProxyConfig::new("k")
        .with_upstream_url(format!("{upstream_base}/v1/messages"))
        .with_timeout_secs(1);
    let base = serve(router(config).unwrap()).await;

    let (status, payload) = post_messages(&base, r#"{"messages": []}"#).await;

    assert_eq!(status, 502);
    assert!(payload["error"]
        .as_str()
        .is_some_and(|e| e.contains("timed out")));
}

#[tokio::test]
async fn serves_page_and_404s_elsewhere() {
    let (base, _upstream) = start(StatusCode::OK, "{}").await;
    let client = reqwest::Client::new();

    for path in ["/", "/consciousness-forge"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        assert!(response.text().await.unwrap().contains("Consciousness Forge"));
    }

    let response = client.get(format!("{base}/nope")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = client.post(format!("{base}/api/other")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
