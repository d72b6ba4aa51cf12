use anyhow::Result;
use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::pipeline::SummaryArtifact;
use crate::store::{HistoryEntry, ProgressState, ProgressStore};
use crate::utils::extract_domain;
use crate::PipelineResult;

/// Render a finished summary for the terminal
pub fn format_summary(artifact: &SummaryArtifact, format: &OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Text => {
            let mut text = String::new();
            if let Some(reference) = &artifact.summary_file {
                text.push_str(&format!("Summary saved to {}\n", reference));
            }
            text.push_str(&format!("{}\n{}", "=".repeat(50), artifact.summary));
            text
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "video_id": artifact.video_id,
            "url": artifact.source_url,
            "summary_file": artifact.summary_file,
            "summary": artifact.summary,
        }))?,
    };

    Ok(content)
}

/// Print summary to console
pub fn print_summary(artifact: &SummaryArtifact, format: &OutputFormat) -> Result<()> {
    println!("{}", format_summary(artifact, format)?);
    Ok(())
}

/// Print stored history, oldest first
pub fn print_history(entries: &[HistoryEntry], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No summaries yet.");
            }
            for entry in entries {
                let source = extract_domain(&entry.url).unwrap_or_else(|| "id".to_string());
                println!(
                    "{}  {}  {:<12} {}",
                    style(entry.timestamp.format("%Y-%m-%d %H:%M:%S")).dim(),
                    style(entry.video_id.as_str()).bold(),
                    source,
                    entry.summary_file
                );
            }
        }
    }
    Ok(())
}

/// Progress signal shown as a terminal spinner
pub struct SpinnerProgress {
    bar: ProgressBar,
    last: Mutex<Option<ProgressState>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let template = "{spinner:.green} [{elapsed_precise}] {msg}";
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template(template) {
            bar.set_style(spinner_style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            bar,
            last: Mutex::new(None),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for SpinnerProgress {
    async fn set(&self, message: &str) -> PipelineResult<()> {
        self.bar.set_message(message.to_string());
        if let Ok(mut last) = self.last.lock() {
            *last = Some(ProgressState::new(message));
        }
        Ok(())
    }

    async fn get(&self) -> ProgressState {
        self.last
            .lock()
            .ok()
            .and_then(|last| last.clone())
            .unwrap_or_else(ProgressState::ready)
    }
}
