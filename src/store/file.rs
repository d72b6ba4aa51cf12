use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ArtifactStore, HistoryEntry, HistoryStore, ProgressState, ProgressStore};
use crate::config::Config;
use crate::resolver::VideoId;
use crate::PipelineResult;

/// JSON-file backed store.
///
/// Each shared file has its own lock so concurrent requests in this process cannot
/// interleave a history read-modify-write. Files are replaced via rename, so a reader
/// never sees a partially written document.
pub struct FileStore {
    data_dir: PathBuf,
    history_path: PathBuf,
    progress_path: PathBuf,
    history_lock: Mutex<()>,
    progress_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>, history_file: &str, progress_file: &str) -> Self {
        let data_dir = data_dir.into();
        Self {
            history_path: data_dir.join(history_file),
            progress_path: data_dir.join(progress_file),
            data_dir,
            history_lock: Mutex::new(()),
            progress_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.storage.data_dir,
            &config.storage.history_file,
            &config.storage.progress_file,
        )
    }

    pub fn artifact_path(&self, video_id: &VideoId) -> PathBuf {
        self.data_dir.join(video_id.artifact_file_name())
    }

    /// History document with entries left undecoded, so an append carries forward
    /// whatever it does not understand. A missing file is an empty history.
    async fn read_history_raw(&self) -> PipelineResult<Vec<serde_json::Value>> {
        let content = match fs_err::tokio::read_to_string(&self.history_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }
}

/// Write `contents` next to `path` and rename it into place
async fn write_atomic(path: &Path, contents: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::tokio::create_dir_all(parent).await?;
        }
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = Uuid::new_v4().to_string();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, &suffix[..8]));

    fs_err::tokio::write(&tmp_path, contents).await?;
    if let Err(e) = fs_err::tokio::rename(&tmp_path, path).await {
        let _ = fs_err::tokio::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl ProgressStore for FileStore {
    async fn set(&self, message: &str) -> PipelineResult<()> {
        let state = ProgressState::new(message);
        let json = serde_json::to_vec(&state)?;

        let _guard = self.progress_lock.lock().await;
        write_atomic(&self.progress_path, &json).await
    }

    async fn get(&self) -> ProgressState {
        let content = match fs_err::tokio::read_to_string(&self.progress_path).await {
            Ok(content) => content,
            Err(_) => return ProgressState::ready(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!("Unreadable progress file: {}", e);
            ProgressState::ready()
        })
    }
}

#[async_trait]
impl HistoryStore for FileStore {
    async fn append(&self, entry: HistoryEntry) -> PipelineResult<()> {
        let _guard = self.history_lock.lock().await;

        let mut history = self.read_history_raw().await?;
        history.push(serde_json::to_value(&entry)?);

        let json = serde_json::to_vec_pretty(&history)?;
        write_atomic(&self.history_path, &json).await
    }

    async fn list(&self) -> Vec<HistoryEntry> {
        let raw = match self.read_history_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read history: {}", e);
                return Vec::new();
            }
        };

        raw.into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable history entry: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for FileStore {
    async fn write(&self, video_id: &VideoId, summary: &str) -> PipelineResult<String> {
        write_atomic(&self.artifact_path(video_id), summary.as_bytes()).await?;
        Ok(video_id.artifact_file_name())
    }
}
