//! Routing configuration

use crate::classifier::keywords::{CODE_KEYWORDS, CONVERSATION_KEYWORDS, REASONING_KEYWORDS};
use crate::config::error::ConfigError;
use crate::routing::{ModelCandidate, Provider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Model used when no category list can be resolved.
pub const DEFAULT_MODEL: &str = "openai/gpt-5-nano";

/// How requests that are not tool calls or continuations get a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Keyword matching only
    #[default]
    Keywords,
    /// Ask the local classification model, keywords on failure
    LocalModel,
    /// Ask the remote classification model, keywords on failure
    RemoteModel,
    /// Local model, then remote model, then keywords
    Hybrid,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Keywords => "keywords",
            RoutingMode::LocalModel => "local_model",
            RoutingMode::RemoteModel => "remote_model",
            RoutingMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "keywords" | "keyword" => Ok(RoutingMode::Keywords),
            "local_model" | "local" => Ok(RoutingMode::LocalModel),
            "remote_model" | "remote" => Ok(RoutingMode::RemoteModel),
            "hybrid" => Ok(RoutingMode::Hybrid),
            _ => Err(format!("Invalid routing mode: {}", s)),
        }
    }
}

impl std::fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Continuation detection variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationMode {
    /// Match against a set of acknowledgement patterns
    #[default]
    Patterns,
    /// Any message shorter than `word_threshold` words
    WordCount,
}

/// Continuation detection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuationConfig {
    pub mode: ContinuationMode,
    /// Messages with fewer words than this are continuations (word_count mode)
    pub word_threshold: usize,
    /// Regex patterns replacing the built-in set (patterns mode); matched case-insensitively
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            mode: ContinuationMode::Patterns,
            word_threshold: 3,
            patterns: Vec::new(),
        }
    }
}

/// One routing category: ordered candidates plus the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoryConfig {
    pub models: Vec<ModelCandidate>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Routing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub mode: RoutingMode,
    pub default_model: ModelCandidate,
    /// Deadline for each provider attempt
    pub attempt_timeout_seconds: u64,
    pub continuation: ContinuationConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: RoutingMode::Keywords,
            default_model: ModelCandidate::new(Provider::default(), DEFAULT_MODEL),
            attempt_timeout_seconds: 60,
            continuation: ContinuationConfig::default(),
        }
    }
}

fn models(ids: &[&str]) -> Vec<ModelCandidate> {
    ids.iter()
        .map(|id| ModelCandidate::new(Provider::OpenRouter, *id))
        .collect()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Built-in categories with their default model lists and keywords.
pub fn default_categories() -> BTreeMap<String, CategoryConfig> {
    let mut categories = BTreeMap::new();
    categories.insert(
        "code".to_string(),
        CategoryConfig {
            models: models(&["z-ai/glm-5", "openrouter/aurora-alpha", "openai/gpt-4o-mini"]),
            keywords: words(CODE_KEYWORDS),
            description: Some("Programming, debugging and tooling questions".to_string()),
        },
    );
    categories.insert(
        "reasoning".to_string(),
        CategoryConfig {
            models: models(&["openrouter/aurora-alpha", "z-ai/glm-5", "moonshotai/kimi-k2.5"]),
            keywords: words(REASONING_KEYWORDS),
            description: Some("Analysis, math and step-by-step explanations".to_string()),
        },
    );
    categories.insert(
        "conversation".to_string(),
        CategoryConfig {
            models: models(&["z-ai/glm-5", "openai/gpt-4o-mini", "openrouter/aurora-alpha"]),
            keywords: words(CONVERSATION_KEYWORDS),
            description: Some("Small talk and general questions".to_string()),
        },
    );
    categories.insert(
        "tools".to_string(),
        CategoryConfig {
            models: models(&["openrouter/aurora-alpha", "moonshotai/kimi-k2.5", "z-ai/glm-5"]),
            keywords: Vec::new(),
            description: Some("Requests with function calling".to_string()),
        },
    );
    categories
}

/// Check category names and model lists.
pub fn validate_categories(categories: &BTreeMap<String, CategoryConfig>) -> Result<(), ConfigError> {
    for (name, category) in categories {
        validate_category(name, category)?;
    }
    Ok(())
}

pub fn validate_category(name: &str, category: &CategoryConfig) -> Result<(), ConfigError> {
    let valid_name = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !valid_name {
        return Err(ConfigError::Validation {
            field: format!("categories.{}", name),
            message: "name must be non-empty lowercase ascii, digits, '_' or '-'".to_string(),
        });
    }
    if category.models.is_empty() {
        return Err(ConfigError::Validation {
            field: format!("categories.{}.models", name),
            message: "at least one model is required".to_string(),
        });
    }
    Ok(())
}
