//! Domain-level error taxonomy for probe sessions.

/// Broad failure class, used by callers that only care about policy
/// (abort vs. reject vs. report as gateway error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential, unsupported provider, unusable probe file or
    /// base URL.
    Configuration,
    /// Unknown probe id.
    Input,
    /// Empty/malformed provider response, network or HTTP failure.
    Upstream,
    /// Artifact or probe file I/O.
    Io,
}

/// Probe harness errors.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Unsupported provider '{name}'. Supported providers: {supported}.")]
    UnsupportedProvider { name: String, supported: String },

    #[error("Missing API key for provider '{provider}'. Set environment variable {env_var}.")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },

    #[error("Invalid probes file: {0}")]
    InvalidProbeFile(String),

    #[error("Unknown probe id(s): {}", .0.join(", "))]
    UnknownProbeIds(Vec<String>),

    #[error("Invalid base URL for provider '{provider}': {url}")]
    InvalidBaseUrl { provider: String, url: String },

    #[error("Provider '{provider}' returned an empty response for prompt: {prompt:?}")]
    EmptyResponse { provider: String, prompt: String },

    #[error("{provider} request failed with status {status}")]
    UpstreamStatus { provider: String, status: u16 },

    #[error("{provider} request failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("probe file parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Classify this error into the harness taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::UnsupportedProvider { .. }
            | ProbeError::MissingApiKey { .. }
            | ProbeError::InvalidProbeFile(_)
            | ProbeError::InvalidBaseUrl { .. }
            | ProbeError::Yaml(_) => ErrorKind::Configuration,
            ProbeError::UnknownProbeIds(_) => ErrorKind::Input,
            ProbeError::EmptyResponse { .. }
            | ProbeError::UpstreamStatus { .. }
            | ProbeError::Http { .. } => ErrorKind::Upstream,
            ProbeError::Serialization(_) | ProbeError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type for probe harness operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
