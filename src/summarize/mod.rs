use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{resolve_credential, GenerationConfig, GENERATION_KEY_ENV};
use crate::utils::preview;
use crate::{PipelineResult, SummarizerError};

/// Instruction prepended to every transcript sent for summarization
pub const INSTRUCTION: &str =
    "Convert this transcript into a numbered list format (1., 2., 3., etc.):";

/// Turns transcript text into a condensed summary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`; `api_key` overrides the configured default for this call only
    async fn summarize(&self, text: &str, api_key: Option<String>) -> PipelineResult<String>;
}

/// Summarizer backed by the Deepseek chat-completions API
pub struct DeepseekClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    default_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl ProviderError {
    fn is_authentication_failure(&self) -> bool {
        self.kind.as_deref() == Some("authentication_error")
            || self.message.to_lowercase().contains("authentication")
    }
}

impl DeepseekClient {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            default_api_key: config.api_key.clone(),
        }
    }
}

/// Map a non-success provider response onto the error taxonomy
fn classify_failure(status: StatusCode, body: &str) -> SummarizerError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.is_authentication_failure() => {
            SummarizerError::Authentication(envelope.error.message)
        }
        Ok(envelope) => SummarizerError::UpstreamGeneration(envelope.error.message),
        Err(_) => SummarizerError::UpstreamGeneration(format!("HTTP {}", status)),
    }
}

#[async_trait]
impl Summarizer for DeepseekClient {
    async fn summarize(&self, text: &str, api_key: Option<String>) -> PipelineResult<String> {
        let api_key = resolve_credential(api_key.as_deref(), self.default_api_key.as_deref())
            .ok_or_else(|| {
                SummarizerError::MissingCredential(format!(
                    "Deepseek API key is required. Please provide it in the form or set {} in the environment.",
                    GENERATION_KEY_ENV
                ))
            })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{}\n{}", INSTRUCTION, text),
            }],
            temperature: self.temperature,
        };

        tracing::debug!("Requesting summary from {} ({} chars of input)", self.model, text.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizerError::UpstreamGeneration(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("API Error Details: {} {}", status, preview(&body, 500));
            return Err(classify_failure(status, &body));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::UpstreamGeneration(e.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                SummarizerError::UpstreamGeneration("response contained no choices".to_string())
            })
    }
}
