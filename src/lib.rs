//! YouTube Summarizer - resolve a video link, fetch its transcript and condense it with an LLM
//!
//! This library provides the request-processing pipeline behind both the HTTP service and the
//! command-line tool: identifier extraction, transcript retrieval, summary generation, and
//! best-effort persistence of progress, summaries and query history.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod resolver;
pub mod server;
pub mod store;
pub mod summarize;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use pipeline::{SummaryArtifact, SummaryPipeline, SummaryRequest};
pub use resolver::VideoId;
pub use store::{HistoryEntry, ProgressState};

/// Result type used for application plumbing (config, server boot, CLI wiring)
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by every pipeline stage
pub type PipelineResult<T> = std::result::Result<T, SummarizerError>;

/// Error kinds produced by the summarization pipeline
#[derive(thiserror::Error, Debug)]
pub enum SummarizerError {
    #[error("{0}")]
    Validation(String),

    #[error("Could not extract YouTube video ID from URL. Please provide a valid YouTube URL.")]
    MalformedReference(String),

    #[error("{0}")]
    MissingCredential(String),

    #[error("No transcripts available for video ID: {0}. The video might not have captions or subtitles.")]
    NoTranscript(String),

    #[error("API Error: {0}")]
    UpstreamTransport(String),

    #[error("Deepseek API authentication failed: {0}. Please check your API key.")]
    Authentication(String),

    #[error("Deepseek API error: {0}")]
    UpstreamGeneration(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),
}

impl SummarizerError {
    /// Whether the caller can fix this by changing the request (HTTP 400) rather than
    /// it being an upstream or server-side fault (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        match self {
            SummarizerError::Validation(_)
            | SummarizerError::MalformedReference(_)
            | SummarizerError::MissingCredential(_)
            | SummarizerError::NoTranscript(_)
            | SummarizerError::Authentication(_) => true,
            SummarizerError::UpstreamTransport(_)
            | SummarizerError::UpstreamGeneration(_)
            | SummarizerError::Persistence(_) => false,
        }
    }
}

impl From<std::io::Error> for SummarizerError {
    fn from(err: std::io::Error) -> Self {
        SummarizerError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for SummarizerError {
    fn from(err: serde_json::Error) -> Self {
        SummarizerError::Persistence(err.to_string())
    }
}
