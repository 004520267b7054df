//! LLM integration for Marquee.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and a
//! chat-completions implementation that talks to either OpenAI or Azure
//! OpenAI. [`build_llm_client`] turns a [`config::ChatEndpoint`] into a
//! shareable client.
//!
//! # Examples
//! ```no_run
//! use marquee_llm::{build_llm_client, config::ChatEndpoint};
//!
//! let endpoint = ChatEndpoint::OpenAi {
//!     api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
//!     model: marquee_llm::DEFAULT_OPENAI_MODEL.to_string(),
//!     base_url: marquee_llm::OPENAI_API_BASE.to_string(),
//! };
//! let client = build_llm_client(endpoint)?;
//! assert!(!client.model_name().is_empty());
//! # Ok::<(), marquee_common::MarqueeError>(())
//! ```
pub mod config;
pub mod openai;
pub mod traits;

use config::ChatEndpoint;
use openai::ChatCompletionsClient;
use std::sync::Arc;
use traits::LlmClient;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-35-turbo";

/// Construct the client for the configured endpoint.
pub fn build_llm_client(
    endpoint: ChatEndpoint,
) -> marquee_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    tracing::info!(
        target: "marquee.llm",
        model = %endpoint.model(),
        base = %endpoint.base_url(),
        "initialising chat completions client"
    );
    let client = ChatCompletionsClient::new(endpoint)?;
    Ok(Arc::new(client))
}
