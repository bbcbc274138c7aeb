//! Provider credential resolution.
//!
//! Keys are only ever read from the environment. The `*_with` variants take
//! an explicit lookup so callers (and tests) can substitute the source.

use serde::Serialize;

use crate::domain::{ProbeError, Result};
use crate::provider::{HttpProvider, ProviderConfig, ProviderKind};

pub(crate) fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Return the API key for `kind` from its environment variable.
///
/// Missing, empty, or whitespace-only values are a configuration error that
/// names the variable to set.
pub fn resolve_api_key(kind: ProviderKind) -> Result<String> {
    resolve_api_key_with(kind, env_lookup)
}

pub fn resolve_api_key_with<F>(kind: ProviderKind, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(kind.env_var())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ProbeError::MissingApiKey {
            provider: kind.name().to_string(),
            env_var: kind.env_var(),
        })
}

/// Which providers have a usable key configured.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct KeyAvailability {
    pub available: Vec<ProviderKind>,
    pub missing: Vec<ProviderKind>,
}

/// Partition every supported provider by key availability.
pub fn validate_all() -> KeyAvailability {
    validate_all_with(env_lookup)
}

pub fn validate_all_with<F>(lookup: F) -> KeyAvailability
where
    F: Fn(&str) -> Option<String>,
{
    let mut availability = KeyAvailability::default();
    for kind in ProviderKind::ALL {
        if resolve_api_key_with(kind, &lookup).is_ok() {
            availability.available.push(kind);
        } else {
            availability.missing.push(kind);
        }
    }
    availability
}

/// Build an HTTP client for `kind` using its environment key.
pub fn client_for(kind: ProviderKind, config: &ProviderConfig) -> Result<HttpProvider> {
    let api_key = resolve_api_key(kind)?;
    HttpProvider::new(kind, api_key, config)
}
