//! Ollama adapter.
//!
//! Uses the generate-style `POST /api/generate` endpoint and reshapes the
//! reply into an OpenAI `chat.completion` body, so callers never see the
//! difference.

use super::{millis, AgentError, ProviderAdapter};
use crate::api::types::ChatCompletionRequest;
use crate::routing::{ModelCandidate, Provider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

pub struct OllamaAdapter {
    /// Base URL (e.g., "http://localhost:11434")
    base_url: String,
    client: Client,
}

/// Ollama /api/generate response format (non-streaming)
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaAdapter {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

/// Split messages into a system prompt and a flattened transcript ending
/// with an open assistant turn.
pub fn flatten_messages(request: &ChatCompletionRequest) -> (Option<String>, String) {
    let mut system = Vec::new();
    let mut transcript = String::new();

    for message in &request.messages {
        let text = message.text();
        match message.role.as_str() {
            "system" => system.push(text),
            "assistant" => transcript.push_str(&format!("Assistant: {}\n\n", text)),
            "tool" => transcript.push_str(&format!("Tool: {}\n\n", text)),
            _ => transcript.push_str(&format!("User: {}\n\n", text)),
        }
    }
    transcript.push_str("Assistant:");

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n"))
    };
    (system, transcript)
}

fn generate_options(request: &ChatCompletionRequest) -> Map<String, Value> {
    let mut options = Map::new();
    if let Some(t) = request.temperature {
        options.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = request.top_p {
        options.insert("top_p".to_string(), json!(p));
    }
    if let Some(max) = request.max_tokens {
        options.insert("num_predict".to_string(), json!(max));
    }
    if let Some(stop) = &request.stop {
        options.insert("stop".to_string(), json!(stop));
    }
    options
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    async fn call(
        &self,
        candidate: &ModelCandidate,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<Value, AgentError> {
        let url = format!("{}/api/generate", self.base_url);
        let (system, prompt) = flatten_messages(request);

        let mut body = json!({
            "model": candidate.model,
            "prompt": prompt,
            "stream": false,
        });
        if let Some(system) = system {
            body["system"] = Value::String(system);
        }
        let options = generate_options(request);
        if !options.is_empty() {
            body["options"] = Value::Object(options);
        }

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&body)
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

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse Ollama generate response: {}", e))
        })?;

        Ok(to_chat_completion(&candidate.model, generated))
    }
}

fn to_chat_completion(model: &str, generated: GenerateResponse) -> Value {
    let prompt_tokens = generated.prompt_eval_count.unwrap_or(0);
    let completion_tokens = generated.eval_count.unwrap_or(0);

    json!({
        "id": format!("chatcmpl-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "created": chrono::Utc::now().timestamp(),
        "model": model,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": generated.response },
            "finish_reason": generated.done_reason.unwrap_or_else(|| "stop".to_string()),
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens,
        }
    })
}
