//! OpenAI-compatible adapter (OpenRouter, OpenAI).

use super::{millis, AgentError, ProviderAdapter};
use crate::api::types::ChatCompletionRequest;
use crate::routing::{ModelCandidate, Provider};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Adapter for providers that speak `POST {base}/chat/completions`.
///
/// The request is forwarded with the candidate's model substituted, unset
/// fields dropped and streaming disabled.
pub struct OpenAICompatibleAdapter {
    provider: Provider,
    /// Base URL including the API version segment (e.g. "https://openrouter.ai/api/v1")
    base_url: String,
    api_key: Option<String>,
    /// Static headers sent with every call
    headers: BTreeMap<String, String>,
    client: Client,
}

impl OpenAICompatibleAdapter {
    pub fn new(
        provider: Provider,
        base_url: impl Into<String>,
        api_key: Option<String>,
        headers: BTreeMap<String, String>,
        client: Client,
    ) -> Self {
        Self {
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            headers,
            client,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAICompatibleAdapter {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn call(
        &self,
        candidate: &ModelCandidate,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value, AgentError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut payload = request.clone();
        payload.model = candidate.model.clone();
        payload.stream = false;

        let mut req = self.client.post(&url).timeout(timeout).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = req
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, millis(timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse response body: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ChatMessage;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "router".to_string(),
            messages: vec![ChatMessage::new("user", text)],
            stream: true,
            ..Default::default()
        }
    }

    fn adapter(base_url: String) -> OpenAICompatibleAdapter {
        let mut headers = BTreeMap::new();
        headers.insert("X-Title".to_string(), "LLM Router".to_string());
        OpenAICompatibleAdapter::new(
            Provider::OpenRouter,
            base_url,
            Some("sk-or-test".to_string()),
            headers,
            Client::new(),
        )
    }

    #[tokio::test]
    async fn test_call_substitutes_model_and_forwards_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(header("x-title", "LLM Router"))
            .and(body_partial_json(json!({
                "model": "z-ai/glm-5",
                "stream": false,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "gen-1",
                "object": "chat.completion",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi!"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = adapter(server.uri())
            .call(
                &ModelCandidate::new(Provider::OpenRouter, "z-ai/glm-5"),
                &request("Hello"),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(body["id"], "gen-1");
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = adapter(server.uri())
            .call(
                &ModelCandidate::new(Provider::OpenRouter, "z-ai/glm-5"),
                &request("Hello"),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AgentError::Upstream {
                status: 429,
                message: "rate limited".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = adapter(server.uri())
            .call(
                &ModelCandidate::new(Provider::OpenRouter, "z-ai/glm-5"),
                &request("Hello"),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let err = adapter("http://127.0.0.1:1".to_string())
            .call(
                &ModelCandidate::new(Provider::OpenRouter, "z-ai/glm-5"),
                &request("Hello"),
                Duration::from_secs(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Network(_)));
    }
}
