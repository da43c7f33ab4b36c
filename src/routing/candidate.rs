//! Backend identities: providers and (provider, model) candidates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream provider a candidate is served by.
///
/// The set is closed; each variant has exactly one adapter registered with
/// the routing engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenRouter aggregated API (<https://openrouter.ai>)
    #[default]
    OpenRouter,
    /// OpenAI API
    OpenAI,
    /// Local Ollama daemon
    Ollama,
}

impl Provider {
    /// All providers, in declaration order.
    pub const ALL: [Provider; 3] = [Provider::OpenRouter, Provider::OpenAI, Provider::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::OpenAI => "openai",
            Provider::Ollama => "ollama",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(Provider::OpenRouter),
            "openai" => Ok(Provider::OpenAI),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specific (provider, model) pair eligible to serve a category.
///
/// Written in configuration as `"provider:model"`, as a bare model name
/// which is served by the default provider, or as a `{ provider, model }`
/// table. Only a known provider name is
/// treated as a prefix, so `"llama3:8b"` stays a single OpenRouter model id
/// while `"ollama:llama3:8b"` targets Ollama.
///
/// ```
/// use llm_router::routing::{ModelCandidate, Provider};
///
/// let c: ModelCandidate = "z-ai/glm-5".parse().unwrap();
/// assert_eq!(c.provider, Provider::OpenRouter);
/// assert_eq!(c.id(), "openrouter:z-ai/glm-5");
///
/// let local: ModelCandidate = "ollama:llama3:8b".parse().unwrap();
/// assert_eq!(local.provider, Provider::Ollama);
/// assert_eq!(local.model, "llama3:8b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ModelCandidate {
    pub provider: Provider,
    pub model: String,
}

impl ModelCandidate {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Stable key used for circuit state and metrics labels.
    pub fn id(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

impl FromStr for ModelCandidate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("model name cannot be empty".to_string());
        }

        if let Some((prefix, rest)) = s.split_once(':') {
            if let Ok(provider) = prefix.parse::<Provider>() {
                if rest.is_empty() {
                    return Err(format!("missing model name after '{}:'", prefix));
                }
                return Ok(Self::new(provider, rest));
            }
        }

        Ok(Self::new(Provider::default(), s))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateRepr {
    Id(String),
    Table {
        #[serde(default)]
        provider: Provider,
        model: String,
    },
}

impl<'de> Deserialize<'de> for ModelCandidate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match CandidateRepr::deserialize(deserializer)? {
            CandidateRepr::Id(id) => id.parse().map_err(serde::de::Error::custom),
            CandidateRepr::Table { provider, model } => {
                if model.trim().is_empty() {
                    return Err(serde::de::Error::custom("model name cannot be empty"));
                }
                Ok(Self::new(provider, model.trim()))
            }
        }
    }
}

impl From<ModelCandidate> for String {
    fn from(candidate: ModelCandidate) -> Self {
        candidate.id()
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}
