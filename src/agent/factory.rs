//! Adapter factory: one [`ProviderAdapter`] per provider, built from configuration.

use super::{OllamaAdapter, OpenAICompatibleAdapter, ProviderAdapter};
use crate::config::ProvidersConfig;
use crate::routing::Provider;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Shared adapter table keyed by provider.
pub type AdapterMap = HashMap<Provider, Arc<dyn ProviderAdapter>>;

/// Build the adapter for every provider.
///
/// A missing API key is not fatal: the adapter is still registered and the
/// provider will answer with 401, which the router treats as a normal
/// candidate failure.
///
/// # Examples
///
/// ```
/// use llm_router::agent::build_adapters;
/// use llm_router::config::ProvidersConfig;
/// use llm_router::routing::Provider;
///
/// let adapters = build_adapters(&ProvidersConfig::default(), reqwest::Client::new());
/// assert_eq!(adapters.len(), 3);
/// assert_eq!(adapters[&Provider::Ollama].provider(), Provider::Ollama);
/// ```
pub fn build_adapters(config: &ProvidersConfig, client: Client) -> AdapterMap {
    let mut adapters: AdapterMap = HashMap::new();

    for provider in Provider::ALL {
        let settings = config.get(provider);
        let base_url = settings.base_url(provider);

        let adapter: Arc<dyn ProviderAdapter> = match provider {
            Provider::Ollama => Arc::new(OllamaAdapter::new(base_url, client.clone())),
            Provider::OpenRouter | Provider::OpenAI => {
                let api_key = settings.api_key(provider);
                if api_key.is_none() {
                    warn!(
                        provider = %provider,
                        env = settings.api_key_env(provider).unwrap_or_default(),
                        "API key not set, requests to this provider will fail"
                    );
                }
                Arc::new(OpenAICompatibleAdapter::new(
                    provider,
                    base_url,
                    api_key,
                    settings.headers(provider),
                    client.clone(),
                ))
            }
        };
        adapters.insert(provider, adapter);
    }

    adapters
}
