//! Provider dispatch: one `generate(prompt, model)` capability per provider.
//!
//! The provider is picked once at the process boundary by [`ProviderKind`];
//! the runner only ever sees `dyn Provider`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::Url;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{ProbeError, Result};
use crate::extract;
use crate::keys;
use crate::metrics::METRICS;
use crate::obs;

/// Response token budget for a single probe turn.
pub const MAX_RESPONSE_TOKENS: u32 = 300;
/// Decoding temperature for probe turns.
pub const TEMPERATURE: f64 = 0.7;
/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const TIMEOUT_ENV_VAR: &str = "PROBE_REQUEST_TIMEOUT_SECS";

/// Supported model providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    Google,
    Groq,
    Openai,
}

impl ProviderKind {
    /// All providers, sorted by name.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::Google,
        ProviderKind::Groq,
        ProviderKind::Openai,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Groq => "groq",
            ProviderKind::Openai => "openai",
        }
    }

    /// Model used when the caller does not pick one.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::Google => "gemini-1.5-flash",
            ProviderKind::Groq => "llama-3.1-70b-versatile",
            ProviderKind::Openai => "gpt-4o-mini",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Google => "GOOGLE_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Openai => "OPENAI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
            ProviderKind::Groq => "https://api.groq.com/openai",
            ProviderKind::Openai => "https://api.openai.com",
        }
    }

    /// Environment variable that overrides the base URL.
    pub fn base_url_env_var(&self) -> String {
        format!("PROBE_{}_BASE_URL", self.name().to_uppercase())
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.name()).collect()
    }

    fn supported_list() -> String {
        Self::names().join(", ")
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| ProbeError::UnsupportedProvider {
                name: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Generates one single-turn response.
///
/// Implementations must return non-empty text or fail.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name recorded in artifacts and logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

/// HTTP settings for a provider client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Overrides the provider's default base URL.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: MAX_RESPONSE_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

impl ProviderConfig {
    /// Defaults, with `PROBE_<PROVIDER>_BASE_URL` and
    /// `PROBE_REQUEST_TIMEOUT_SECS` applied when set.
    pub fn from_env(kind: ProviderKind) -> Self {
        Self::from_env_with(kind, keys::env_lookup)
    }

    /// Like [`ProviderConfig::from_env`], reading variables through `lookup`.
    ///
    /// Blank base URLs and zero or unparsable timeouts are ignored.
    pub fn from_env_with<F>(kind: ProviderKind, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(&kind.base_url_env_var())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let timeout_secs = lookup(TIMEOUT_ENV_VAR)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            timeout_secs,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Provider backed by the provider's public REST API.
pub struct HttpProvider {
    kind: ProviderKind,
    api_key: String,
    base_url: Url,
    max_tokens: u32,
    temperature: f64,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(kind: ProviderKind, api_key: String, config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("probe-harness/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| ProbeError::Http {
                provider: kind.name().to_string(),
                source,
            })?;

        let raw = config
            .base_url
            .as_deref()
            .unwrap_or(kind.default_base_url());
        let base_url = Url::parse(raw)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProbeError::InvalidBaseUrl {
                provider: kind.name().to_string(),
                url: raw.to_string(),
            })?;

        Ok(Self {
            kind,
            api_key,
            base_url,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProbeError::InvalidBaseUrl {
                provider: self.kind.name().to_string(),
                url: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, prompt: &str, model: &str) -> Result<reqwest::RequestBuilder> {
        let messages = json!([{"role": "user", "content": prompt}]);
        let builder = match self.kind {
            ProviderKind::Anthropic => self
                .client
                .post(self.endpoint(&["v1", "messages"])?)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": model,
                    "max_tokens": self.max_tokens,
                    "temperature": self.temperature,
                    "messages": messages,
                })),
            ProviderKind::Openai | ProviderKind::Groq => self
                .client
                .post(self.endpoint(&["v1", "chat", "completions"])?)
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": model,
                    "messages": messages,
                    "max_tokens": self.max_tokens,
                    "temperature": self.temperature,
                })),
            ProviderKind::Google => {
                let method = format!("{model}:generateContent");
                self.client
                    .post(self.endpoint(&["v1beta", "models", &method])?)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&json!({
                        "contents": [{"role": "user", "parts": [{"text": prompt}]}],
                        "generationConfig": {
                            "temperature": self.temperature,
                            "maxOutputTokens": self.max_tokens,
                        },
                    }))
            }
        };
        Ok(builder)
    }

    fn extract(&self, payload: &Value) -> String {
        match self.kind {
            ProviderKind::Anthropic => extract::anthropic_text(payload),
            ProviderKind::Openai | ProviderKind::Groq => extract::chat_completion_text(payload),
            ProviderKind::Google => extract::gemini_text(payload),
        }
    }

    async fn call(&self, prompt: &str, model: &str) -> Result<String> {
        let http_err = |source| ProbeError::Http {
            provider: self.kind.name().to_string(),
            source,
        };

        let response = self
            .request(prompt, model)?
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::UpstreamStatus {
                provider: self.kind.name().to_string(),
                status: status.as_u16(),
            });
        }

        let payload: Value = response.json().await.map_err(http_err)?;
        let text = self.extract(&payload);
        if text.is_empty() {
            return Err(ProbeError::EmptyResponse {
                provider: self.kind.name().to_string(),
                prompt: prompt.to_string(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        METRICS.inc_provider_calls();
        debug!(provider = %self.kind, model = %model, "sending probe prompt");

        let result = self.call(prompt, model).await;
        if let Err(err) = &result {
            METRICS.inc_upstream_failures();
            obs::emit_provider_error(self.kind.name(), err);
        }
        result
    }
}
