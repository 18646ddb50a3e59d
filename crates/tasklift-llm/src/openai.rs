//! OpenAI-compatible chat completions
//!
//! One implementation serves both OpenAI and Azure OpenAI. They differ only
//! in URL shape and authentication header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tasklift_domain::{CompletionOptions, ModelCapability, ModelError};
use tracing::debug;

/// Default OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Azure OpenAI API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Default HTTP timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    OpenAi {
        base_url: String,
        model: String,
    },
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Chat-completions backend for OpenAI and Azure OpenAI
pub struct OpenAiModel {
    flavor: Flavor,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiModel {
    fn build_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    }

    /// OpenAI backend for a model such as "gpt-4o-mini"
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            flavor: Flavor::OpenAi {
                base_url: OPENAI_BASE_URL.to_string(),
                model: model.into(),
            },
            api_key: api_key.into(),
            client: Self::build_client(),
        }
    }

    /// Azure OpenAI backend for a deployment
    pub fn azure(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            flavor: Flavor::Azure {
                endpoint: endpoint.into().trim_end_matches('/').to_string(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            },
            api_key: api_key.into(),
            client: Self::build_client(),
        }
    }

    /// Point an OpenAI backend at a compatible server
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Flavor::OpenAi { base_url, .. } = &mut self.flavor {
            *base_url = url.into().trim_end_matches('/').to_string();
        }
        self
    }

    fn chat_url(&self) -> String {
        match &self.flavor {
            Flavor::OpenAi { base_url, .. } => format!("{}/chat/completions", base_url),
            Flavor::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, deployment, api_version
            ),
        }
    }

    fn build_request(&self, prompt: &str, options: &CompletionOptions) -> ChatRequest<'_> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system_preamble {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let model = match &self.flavor {
            Flavor::OpenAi { model, .. } => Some(model.as_str()),
            Flavor::Azure { .. } => None,
        };

        ChatRequest {
            model,
            messages,
            temperature: options.temperature,
            response_format: options
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl ModelCapability for OpenAiModel {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ModelError> {
        let request = self.client.post(self.chat_url());
        let request = match &self.flavor {
            Flavor::OpenAi { .. } => request.bearer_auth(&self.api_key),
            Flavor::Azure { .. } => request.header("api-key", &self.api_key),
        };

        let response = request
            .json(&self.build_request(prompt, options))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ModelError::Transport(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        match status {
            reqwest::StatusCode::NOT_FOUND => {
                return Err(ModelError::ModelNotAvailable(self.name().to_string()));
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(ModelError::RateLimited),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(ModelError::Transport(format!(
                    "Authentication failed (HTTP {})",
                    status
                )));
            }
            _ => {}
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Transport(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(format!("Failed to parse response: {}", e)))?;

        debug!(model = self.name(), "Chat completion finished");
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| ModelError::Malformed("No content in response".to_string()))
    }

    fn name(&self) -> &str {
        match &self.flavor {
            Flavor::OpenAi { model, .. } => model,
            Flavor::Azure { deployment, .. } => deployment,
        }
    }
}
