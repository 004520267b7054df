use serde::{Deserialize, Serialize};

/// Azure API version used when the caller does not pin one.
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-03-15-preview";

/// Where chat-completion requests are sent and how they authenticate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEndpoint {
    /// api.openai.com or any OpenAI-compatible gateway; bearer auth.
    OpenAi {
        api_key: String,
        model: String,
        base_url: String,
    },
    /// Azure OpenAI resource; `api-key` header and a deployment name.
    Azure {
        api_key: String,
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

impl ChatEndpoint {
    /// Model (OpenAI) or deployment (Azure) name.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi { model, .. } => model,
            Self::Azure { deployment, .. } => deployment,
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Self::OpenAi { api_key, .. } | Self::Azure { api_key, .. } => api_key,
        }
    }

    /// Base URL the HTTP client is anchored to.
    pub fn base_url(&self) -> &str {
        match self {
            Self::OpenAi { base_url, .. } => base_url,
            Self::Azure { endpoint, .. } => endpoint,
        }
    }

    /// Path of the chat-completions resource relative to [`Self::base_url`].
    pub fn completions_path(&self) -> String {
        match self {
            Self::OpenAi { .. } => "chat/completions".to_string(),
            Self::Azure { deployment, .. } => {
                format!("openai/deployments/{deployment}/chat/completions")
            }
        }
    }
}
