use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{resolve_credential, TranscriptConfig, TRANSCRIPT_KEY_ENV};
use crate::resolver::VideoId;
use crate::utils::preview;
use crate::{PipelineResult, SummarizerError};

/// Source of caption text for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the full transcript, caption fragments joined by single spaces.
    /// `api_key` overrides the configured default for this call only.
    async fn fetch_transcript(
        &self,
        video_id: &VideoId,
        api_key: Option<String>,
    ) -> PipelineResult<String>;
}

/// Transcript client backed by the SearchAPI.io `youtube_transcripts` engine
pub struct SearchApiClient {
    client: Client,
    endpoint: String,
    engine: String,
    default_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    transcripts: Option<Vec<CaptionEntry>>,
}

#[derive(Debug, Deserialize)]
struct CaptionEntry {
    text: String,
}

/// Error payload; SearchAPI.io sends `{"error": "..."}`, proxies sometimes nest a message
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Object { message: String },
}

impl ErrorDetail {
    fn into_message(self) -> String {
        match self {
            ErrorDetail::Text(message) | ErrorDetail::Object { message } => message,
        }
    }
}

fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!(
            "transcript provider returned HTTP {}: {}",
            status,
            envelope.error.into_message()
        ),
        Err(_) => format!("transcript provider returned HTTP {}", status),
    }
}

impl SearchApiClient {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            engine: config.engine.clone(),
            default_api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl TranscriptSource for SearchApiClient {
    async fn fetch_transcript(
        &self,
        video_id: &VideoId,
        api_key: Option<String>,
    ) -> PipelineResult<String> {
        let api_key = resolve_credential(api_key.as_deref(), self.default_api_key.as_deref())
            .ok_or_else(|| {
                SummarizerError::MissingCredential(format!(
                    "SearchAPI.io API key is required. Please provide it in the form or set {} in the environment.",
                    TRANSCRIPT_KEY_ENV
                ))
            })?;

        tracing::debug!("Requesting transcript for video: {}", video_id);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", self.engine.as_str()),
                ("video_id", video_id.as_str()),
                ("api_key", api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SummarizerError::UpstreamTransport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Transcript provider returned {}: {}", status, preview(&body, 200));
            return Err(SummarizerError::UpstreamTransport(describe_failure(status, &body)));
        }

        let payload: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::UpstreamTransport(e.without_url().to_string()))?;

        let entries = payload.transcripts.unwrap_or_default();
        let transcript = entries
            .iter()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.trim().is_empty() {
            return Err(SummarizerError::NoTranscript(video_id.to_string()));
        }

        tracing::info!(
            "Fetched transcript for {} ({} caption entries, {} chars)",
            video_id,
            entries.len(),
            transcript.len()
        );

        Ok(transcript)
    }
}
