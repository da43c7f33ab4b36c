//! Transports used by the model-based classification stages.

use super::ClassifierError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Sends a classification prompt to a lightweight model and returns its raw reply.
#[async_trait]
pub trait ClassifierTransport: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn ask(&self, prompt: &str, timeout: Duration) -> Result<String, ClassifierError>;
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Ollama generate-style transport (`POST /api/generate`).
pub struct OllamaGenerateTransport {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerateTransport {
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ClassifierTransport for OllamaGenerateTransport {
    fn name(&self) -> &str {
        "local"
    }

    async fn ask(&self, prompt: &str, timeout: Duration) -> Result<String, ClassifierError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": 0 }
        });

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::from_reqwest(e, millis(timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
        Ok(parsed.response)
    }
}

/// OpenAI-compatible chat transport (`POST {base}/chat/completions`).
pub struct ChatCompletionsTransport {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsTransport {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ClassifierTransport for ChatCompletionsTransport {
    fn name(&self) -> &str {
        "remote"
    }

    async fn ask(&self, prompt: &str, timeout: Duration) -> Result<String, ClassifierError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": 10,
            "temperature": 0
        });

        let mut request = self.client.post(&url).timeout(timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::from_reqwest(e, millis(timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::InvalidResponse("no choices in reply".to_string()))
    }
}
