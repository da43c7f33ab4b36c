//! Provider connection configuration

use crate::routing::Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-provider connection settings, one section per provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openrouter: ProviderConfig,
    pub openai: ProviderConfig,
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenRouter => &self.openrouter,
            Provider::OpenAI => &self.openai,
            Provider::Ollama => &self.ollama,
        }
    }
}

/// Connection settings for one provider. Unset fields use the provider's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Extra headers sent with every request, merged over the defaults
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn base_url(&self, provider: Provider) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            match provider {
                Provider::OpenRouter => "https://openrouter.ai/api/v1",
                Provider::OpenAI => "https://api.openai.com/v1",
                Provider::Ollama => "http://localhost:11434",
            }
            .to_string()
        })
    }

    pub fn api_key_env(&self, provider: Provider) -> Option<String> {
        self.api_key_env.clone().or_else(|| match provider {
            Provider::OpenRouter => Some("OPENROUTER_API_KEY".to_string()),
            Provider::OpenAI => Some("OPENAI_API_KEY".to_string()),
            Provider::Ollama => None,
        })
    }

    /// API key read from the configured environment variable, if set and non-empty.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        self.api_key_env(provider)
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }

    pub fn headers(&self, provider: Provider) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if provider == Provider::OpenRouter {
            headers.insert("HTTP-Referer".to_string(), "http://localhost:3456".to_string());
            headers.insert("X-Title".to_string(), "LLM Router".to_string());
        }
        headers.extend(self.headers.clone());
        headers
    }
}
