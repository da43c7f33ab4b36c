//! Classification model configuration

use crate::routing::Provider;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lightweight models used by the model-based routing modes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Characters of the user message included in the prompt
    pub max_prompt_chars: usize,
    pub local: LocalClassifierConfig,
    pub remote: RemoteClassifierConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: 500,
            local: LocalClassifierConfig::default(),
            remote: RemoteClassifierConfig::default(),
        }
    }
}

/// Local classifier reached through Ollama's generate endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalClassifierConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LocalClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:0.5b".to_string(),
            timeout_seconds: 15,
        }
    }
}

impl LocalClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Remote classifier reached through a provider's chat completions API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteClassifierConfig {
    /// Provider whose base URL and API key are used
    pub provider: Provider,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for RemoteClassifierConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenRouter,
            model: "openai/gpt-4o-mini".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl RemoteClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
