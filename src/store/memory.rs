use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{ArtifactStore, HistoryEntry, HistoryStore, ProgressState, ProgressStore};
use crate::resolver::VideoId;
use crate::PipelineResult;

/// In-process store, used for progress in quiet CLI runs and by tests
#[derive(Default)]
pub struct MemoryStore {
    progress: Mutex<Option<ProgressState>>,
    history: Mutex<Vec<HistoryEntry>>,
    artifacts: Mutex<HashMap<VideoId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artifact(&self, video_id: &VideoId) -> Option<String> {
        self.artifacts.lock().await.get(video_id).cloned()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn set(&self, message: &str) -> PipelineResult<()> {
        *self.progress.lock().await = Some(ProgressState::new(message));
        Ok(())
    }

    async fn get(&self) -> ProgressState {
        self.progress.lock().await.clone().unwrap_or_else(ProgressState::ready)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, entry: HistoryEntry) -> PipelineResult<()> {
        self.history.lock().await.push(entry);
        Ok(())
    }

    async fn list(&self) -> Vec<HistoryEntry> {
        self.history.lock().await.clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn write(&self, video_id: &VideoId, summary: &str) -> PipelineResult<String> {
        self.artifacts
            .lock()
            .await
            .insert(video_id.clone(), summary.to_string());
        Ok(video_id.artifact_file_name())
    }
}
