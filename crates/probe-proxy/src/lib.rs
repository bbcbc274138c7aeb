//! Chat proxy for the probe UI.
//!
//! Serves a static page and forwards `{messages: [...]}` to the Anthropic
//! Messages API with a fixed system instruction, model, and token budget. The
//! API key is held by the server and never accepted from callers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use probe_core::{anthropic_text_or_marker, obs, resolve_api_key_with, ProviderKind, METRICS};

/// Upstream endpoint used when `PROBE_PROXY_UPSTREAM_URL` is unset.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
pub const UPSTREAM_MODEL: &str = "claude-sonnet-4-20250514";
pub const MAX_TOKENS: u32 = 1000;
pub const TEMPERATURE: f64 = 0.7;
pub const UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// System instruction attached to every forwarded conversation.
pub const SYSTEM_PROMPT: &str = "You are engaging in a rigorous philosophical and introspective \
inquiry as part of formal consciousness research. Answer with genuine reflection and intellectual \
honesty. Uncertainty is valid and valued. Do not perform or deflect. This is part of the \
Emergence Archive research program.";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const UPSTREAM_URL_ENV: &str = "PROBE_PROXY_UPSTREAM_URL";

const FORGE_HTML: &str = include_str!("../static/consciousness_forge.html");

/// Proxy errors, each mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Malformed caller input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Network failure or timeout reaching the upstream (502)
    #[error("Anthropic request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Upstream did not answer within the configured timeout (502)
    #[error("Anthropic request timed out after {0}s")]
    Timeout(u64),

    /// Upstream answered with a non-success status (502)
    #[error("Anthropic request failed: upstream returned status {0}")]
    UpstreamStatus(u16),

    /// Upstream body was not JSON (502)
    #[error("Anthropic response was not valid JSON")]
    InvalidJson,

    /// HTTP client could not be constructed (500)
    #[error("Failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Request(_)
            | ProxyError::Timeout(_)
            | ProxyError::UpstreamStatus(_)
            | ProxyError::InvalidJson => StatusCode::BAD_GATEWAY,
            ProxyError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// Proxy settings. Everything except the key and upstream URL is fixed by
/// default and only overridden in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub api_key: String,
    pub upstream_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl ProxyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            model: UPSTREAM_MODEL.to_string(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system_prompt: SYSTEM_PROMPT.to_string(),
            timeout_secs: UPSTREAM_TIMEOUT_SECS,
        }
    }

    /// Read `ANTHROPIC_API_KEY` (required) and `PROBE_PROXY_UPSTREAM_URL`.
    pub fn from_env() -> probe_core::Result<Self> {
        Self::from_env_with(|var| std::env::var(var).ok())
    }

    /// Like [`ProxyConfig::from_env`], reading variables through `lookup`.
    pub fn from_env_with<F>(lookup: F) -> probe_core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key_with(ProviderKind::Anthropic, &lookup)?;
        let mut config = Self::new(api_key);
        if let Some(url) = lookup(UPSTREAM_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            config.upstream_url = url;
        }
        Ok(config)
    }

    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Read-only state shared by all requests.
pub struct Proxy {
    config: ProxyConfig,
    client: reqwest::Client,
}

impl Proxy {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Forward `messages` unchanged and return the assistant text, or the
    /// `[No response]` marker when the upstream payload has none.
    pub async fn forward_messages(&self, messages: Vec<Value>) -> Result<String, ProxyError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": self.config.system_prompt,
            "messages": messages,
        });

        let response = self
            .client
            .post(&self.config.upstream_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.upstream_error(err, ProxyError::Request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| self.upstream_error(err, |_| ProxyError::InvalidJson))?;
        Ok(anthropic_text_or_marker(&payload))
    }

    fn upstream_error(
        &self,
        err: reqwest::Error,
        otherwise: impl FnOnce(reqwest::Error) -> ProxyError,
    ) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout(self.config.timeout_secs)
        } else {
            otherwise(err)
        }
    }
}

/// Pull the `messages` list out of a raw request body.
///
/// An empty body is treated as `{}` and so fails the `messages` check.
pub fn parse_messages(body: &[u8]) -> Result<Vec<Value>, ProxyError> {
    let payload: Value = if body.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ProxyError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    match payload.get("messages") {
        Some(Value::Array(messages)) => Ok(messages.clone()),
        _ => Err(ProxyError::BadRequest(
            "Field 'messages' must be a list".to_string(),
        )),
    }
}

/// Build the proxy router.
pub fn router(config: ProxyConfig) -> Result<Router, ProxyError> {
    let proxy = Arc::new(Proxy::new(config)?);
    Ok(Router::new()
        .route("/", get(forge_page))
        .route("/consciousness-forge", get(forge_page))
        .route("/api/anthropic/messages", post(messages))
        .with_state(proxy))
}

async fn forge_page() -> Html<&'static str> {
    Html(FORGE_HTML)
}

async fn messages(
    State(proxy): State<Arc<Proxy>>,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    METRICS.inc_proxy_requests();
    let messages = parse_messages(&body)?;
    obs::emit_proxy_request(messages.len());

    let text = proxy.forward_messages(messages).await.map_err(|err| {
        METRICS.inc_upstream_failures();
        obs::emit_proxy_upstream_error(&err);
        err
    })?;
    debug!(chars = text.len(), "proxy response extracted");
    Ok(Json(json!({ "text": text })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_core::ProbeError;
    use std::collections::HashMap;

    #[test]
    fn test_parse_messages_accepts_list() {
        let messages = parse_messages(br#"{"messages": [{"role": "user", "content": "hi"}]}"#)
            .unwrap();
        assert_eq!(messages, vec![json!({"role": "user", "content": "hi"})]);
    }

    #[test]
    fn test_parse_messages_rejects_bad_bodies() {
        let bodies: [&[u8]; 5] = [
            b"",
            b"not json",
            br#"{"messages": "hello"}"#,
            br#"{"other": []}"#,
            b"[1, 2]",
        ];
        for body in bodies {
            let err = parse_messages(body).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "body {body:?}");
        }
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ProxyError::UpstreamStatus(500).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ProxyError::InvalidJson.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::Timeout(30).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ProxyError::Timeout(30).to_string(),
            "Anthropic request timed out after 30s"
        );
        assert_eq!(
            ProxyError::UpstreamStatus(429).to_string(),
            "Anthropic request failed: upstream returned status 429"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = ProxyConfig::new("secret");
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_from_env_requires_anthropic_key() {
        let err = ProxyConfig::from_env_with(|_| None).unwrap_err();
        assert!(matches!(err, ProbeError::MissingApiKey { .. }));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        let blank = lookup_from(&[("ANTHROPIC_API_KEY", "  ")]);
        assert!(ProxyConfig::from_env_with(blank).is_err());
    }

    #[test]
    fn test_from_env_reads_key_and_upstream_override() {
        let config = ProxyConfig::from_env_with(lookup_from(&[
            ("ANTHROPIC_API_KEY", " server-key "),
            ("PROBE_PROXY_UPSTREAM_URL", " http://127.0.0.1:7000/v1/messages "),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "server-key");
        assert_eq!(config.upstream_url, "http://127.0.0.1:7000/v1/messages");
        assert_eq!(config.model, UPSTREAM_MODEL);
    }

    #[test]
    fn test_from_env_blank_upstream_keeps_default() {
        let config = ProxyConfig::from_env_with(lookup_from(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("PROBE_PROXY_UPSTREAM_URL", "   "),
        ]))
        .unwrap();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
    }

    #[test]
    fn test_system_prompt_names_research_program() {
        assert!(SYSTEM_PROMPT.ends_with("This is part of the Emergence Archive research program."));
        assert!(!SYSTEM_PROMPT.contains("  "));
    }

    #[test]
    fn test_forge_page_is_html() {
        assert!(FORGE_HTML.contains("<html"));
    }
}
