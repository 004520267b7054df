use async_trait::async_trait;
use marquee_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Generate a response constrained to a single JSON value.
    ///
    /// Providers without a native JSON mode fall back to [`LlmClient::generate`]
    /// and rely on the system prompt alone.
    async fn generate_json(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.generate(prompt, system_prompt, max_tokens, temperature)
            .await
    }

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
