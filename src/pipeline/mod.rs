use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::resolver::{self, VideoId};
use crate::store::{
    ArtifactStore, FileStore, HistoryEntry, HistoryStore, ProgressState, ProgressStore,
};
use crate::summarize::{DeepseekClient, Summarizer};
use crate::transcript::{SearchApiClient, TranscriptSource};
use crate::{PipelineResult, SummarizerError};

pub const FETCHING_TRANSCRIPT: &str = "Fetching transcript...";
pub const GENERATING_SUMMARY: &str = "Generating summary...";

/// One summarization request, as posted to `/summarize`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryRequest {
    /// Video link or bare identifier
    #[serde(default)]
    pub url: Option<String>,

    /// Transcription-provider key overriding the configured default
    #[serde(default, rename = "searchapi_key")]
    pub transcript_key: Option<String>,

    /// Generation-provider key overriding the configured default
    #[serde(default, rename = "deepseek_key")]
    pub summary_key: Option<String>,
}

impl SummaryRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct SummaryArtifact {
    pub video_id: VideoId,
    pub source_url: String,
    pub summary: String,

    /// Reference returned by the artifact store; `None` if saving failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_file: Option<String>,
}

/// Sequences resolve -> fetch -> summarize -> persist.
///
/// Only the first three stages can fail a run. Progress updates, the artifact write and
/// the history append are logged on failure and otherwise ignored.
pub struct SummaryPipeline {
    transcripts: Arc<dyn TranscriptSource>,
    summarizer: Arc<dyn Summarizer>,
    progress: Arc<dyn ProgressStore>,
    history: Arc<dyn HistoryStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl SummaryPipeline {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        summarizer: Arc<dyn Summarizer>,
        progress: Arc<dyn ProgressStore>,
        history: Arc<dyn HistoryStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            transcripts,
            summarizer,
            progress,
            history,
            artifacts,
        }
    }

    /// Production wiring: HTTP provider clients and JSON files under the data directory
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(FileStore::from_config(config));

        Self::new(
            Arc::new(SearchApiClient::new(&config.transcript)),
            Arc::new(DeepseekClient::new(&config.generation)),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// Replace where progress updates are reported
    pub fn with_progress(mut self, progress: Arc<dyn ProgressStore>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, request: &SummaryRequest) -> PipelineResult<SummaryArtifact> {
        let url = request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| SummarizerError::Validation("Missing YouTube URL".to_string()))?;

        let video_id = resolver::resolve(url)?;
        tracing::info!("Summarizing video {} from {}", video_id, url);

        self.signal(FETCHING_TRANSCRIPT).await;
        let transcript = self
            .transcripts
            .fetch_transcript(&video_id, request.transcript_key.clone())
            .await?;

        self.signal(GENERATING_SUMMARY).await;
        let summary = self
            .summarizer
            .summarize(&transcript, request.summary_key.clone())
            .await?;

        let mut artifact = SummaryArtifact {
            video_id,
            source_url: url.to_string(),
            summary,
            summary_file: None,
        };

        artifact.summary_file = self.save_summary(&artifact).await;
        self.record_history(&artifact).await;

        tracing::info!("Finished summary for {}", artifact.video_id);
        Ok(artifact)
    }

    pub async fn progress(&self) -> ProgressState {
        self.progress.get().await
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.list().await
    }

    async fn signal(&self, message: &str) {
        if let Err(e) = self.progress.set(message).await {
            tracing::warn!("Failed to update progress: {}", e);
        }
    }

    async fn save_summary(&self, artifact: &SummaryArtifact) -> Option<String> {
        match self.artifacts.write(&artifact.video_id, &artifact.summary).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!("Failed to save summary for {}: {}", artifact.video_id, e);
                None
            }
        }
    }

    async fn record_history(&self, artifact: &SummaryArtifact) {
        let mut entry = HistoryEntry::new(artifact.video_id.clone(), artifact.source_url.clone());
        if let Some(reference) = &artifact.summary_file {
            entry = entry.with_summary_file(reference.clone());
        }
        if let Err(e) = self.history.append(entry).await {
            tracing::warn!("Failed to save history for {}: {}", artifact.video_id, e);
        }
    }
}
