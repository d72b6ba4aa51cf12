//! Shared state written by the pipeline: progress signal, query history, summary artifacts.
//!
//! All writes here are advisory from the pipeline's point of view. Callers log and drop
//! the errors these traits return; reads never fail and fall back to defaults instead.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::resolver::VideoId;
use crate::PipelineResult;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Last known status of the most recent pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub message: String,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ProgressState {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// State reported when nothing has been recorded yet
    pub fn ready() -> Self {
        Self::new("Ready")
    }
}

/// One completed summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub video_id: VideoId,

    /// Link exactly as the user supplied it
    pub url: String,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Reference to the stored summary artifact
    pub summary_file: String,
}

impl HistoryEntry {
    pub fn new(video_id: VideoId, url: impl Into<String>) -> Self {
        let summary_file = video_id.artifact_file_name();
        Self {
            video_id,
            url: url.into(),
            timestamp: Utc::now(),
            summary_file,
        }
    }

    /// Record the reference returned by the artifact store
    pub fn with_summary_file(mut self, summary_file: impl Into<String>) -> Self {
        self.summary_file = summary_file.into();
        self
    }
}

/// RFC 3339, or a naive ISO 8601 datetime taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    raw.parse::<NaiveDateTime>()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(serde::de::Error::custom)
}

/// Single last-writer-wins status record
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn set(&self, message: &str) -> PipelineResult<()>;

    /// Last written state, or `Ready` if none exists or it cannot be read
    async fn get(&self) -> ProgressState;
}

/// Append-only chronological log of completed summarizations
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Add `entry` after every existing one. Fails rather than replace a document it
    /// cannot read.
    async fn append(&self, entry: HistoryEntry) -> PipelineResult<()>;

    /// Stored entries in insertion order. Entries that cannot be decoded are skipped,
    /// and an unreadable document lists as empty.
    async fn list(&self) -> Vec<HistoryEntry>;
}

/// Durable storage of summary text keyed by video
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store (or overwrite) the summary for `video_id`, returning its reference
    async fn write(&self, video_id: &VideoId, summary: &str) -> PipelineResult<String>;
}
