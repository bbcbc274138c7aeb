//! In-memory provider fake (testing only).
//!
//! `ScriptedProvider` replays a fixed list of responses in order and records
//! every prompt it was asked to answer.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ProbeError, Result};
use crate::provider::Provider;

/// A provider that answers from a script.
///
/// An exhausted script or an empty scripted response fails the call the
/// same way a real provider returning no text would.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(name: &str, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(prompt, model)` pairs received so far, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), model.to_string()));

        match self.responses.lock().unwrap().pop_front() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ProbeError::EmptyResponse {
                provider: self.name.clone(),
                prompt: prompt.to_string(),
            }),
        }
    }
}
