use crate::config::ChatEndpoint;
use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use marquee_common::{MarqueeError, Result};
use marquee_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Chat-completions client for OpenAI and Azure OpenAI.
pub struct ChatCompletionsClient {
    client: HttpClient,
    endpoint: ChatEndpoint,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One element in the `choices` array
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: u32,
}

impl ChatCompletionsClient {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: ChatEndpoint) -> Result<Self> {
        if endpoint.api_key().trim().is_empty() {
            return Err(MarqueeError::Config(
                "LLM API key is empty; set it in config or the environment".to_string(),
            ));
        }
        let client = HttpClient::new(endpoint.base_url())
            .map_err(|e| MarqueeError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self { client, endpoint })
    }

    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        response_format: Option<ResponseFormat>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let model = match &self.endpoint {
            ChatEndpoint::OpenAi { model, .. } => Some(model.as_str()),
            ChatEndpoint::Azure { .. } => None,
        };

        let req = ChatRequest {
            model,
            messages,
            temperature,
            max_tokens,
            response_format,
        };

        let opts = match &self.endpoint {
            ChatEndpoint::OpenAi { api_key, .. } => RequestOpts {
                auth: Some(Auth::Bearer(api_key.as_str())),
                ..Default::default()
            },
            ChatEndpoint::Azure {
                api_key,
                api_version,
                ..
            } => {
                let value = HeaderValue::from_str(api_key.trim())
                    .map_err(|e| MarqueeError::Config(format!("invalid api-key header: {e}")))?;
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static("api-key"),
                        value,
                    }),
                    query: Some(vec![("api-version", Cow::Borrowed(api_version.as_str()))]),
                    ..Default::default()
                }
            }
        };

        tracing::debug!(
            target: "marquee.llm",
            model = %self.endpoint.model(),
            prompt_chars = prompt.len(),
            json_mode = req.response_format.is_some(),
            "chat completion request"
        );

        let resp: ChatResponse = self
            .client
            .post_json_opts(&self.endpoint.completions_path(), &req, opts)
            .await
            .map_err(http_to_marquee)?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| MarqueeError::Llm("model returned no message content".to_string()))?;

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.map(|u| u.total_tokens),
        })
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.complete(prompt, system_prompt, max_tokens, temperature, None)
            .await
    }

    async fn generate_json(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let format = ResponseFormat {
            kind: "json_object",
        };
        self.complete(prompt, system_prompt, max_tokens, temperature, Some(format))
            .await
    }

    fn model_name(&self) -> &str {
        self.endpoint.model()
    }
}

fn http_to_marquee(e: HttpError) -> MarqueeError {
    MarqueeError::Llm(format!("{e}"))
}
