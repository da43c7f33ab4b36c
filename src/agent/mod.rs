//! Provider adapters.
//!
//! Each [`Provider`] has one adapter that turns the canonical chat request
//! into whatever its API expects and hands back an OpenAI-shaped JSON body.
//! The routing engine only sees this trait and never branches on provider.

use async_trait::async_trait;
use std::time::Duration;

pub mod error;
pub mod factory;
pub mod ollama;
pub mod openai;

pub use error::AgentError;
pub use factory::{build_adapters, AdapterMap};
pub use ollama::OllamaAdapter;
pub use openai::OpenAICompatibleAdapter;

use crate::api::types::ChatCompletionRequest;
use crate::routing::{ModelCandidate, Provider};

/// Uniform call interface for one provider.
///
/// # Cancellation Safety
///
/// Dropping the returned future aborts the in-flight HTTP request.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + 'static {
    /// Provider this adapter serves.
    fn provider(&self) -> Provider;

    /// Send `request` to `candidate.model`.
    ///
    /// Returns the provider's response body on a 2xx status. Any other
    /// status, transport error or timeout is an [`AgentError`].
    async fn call(
        &self,
        candidate: &ModelCandidate,
        request: &ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value, AgentError>;
}

pub(crate) fn millis(timeout: Duration) -> u64 {
    timeout.as_millis().min(u128::from(u64::MAX)) as u64
}
