use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the default transcription-provider key
pub const TRANSCRIPT_KEY_ENV: &str = "SEARCHAPI_KEY";

/// Environment variable holding the default generation-provider key
pub const GENERATION_KEY_ENV: &str = "DEEPSEEK_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcription provider (SearchAPI.io)
    pub transcript: TranscriptConfig,

    /// Generation provider (Deepseek)
    pub generation: GenerationConfig,

    /// Where summaries, history and progress are written
    pub storage: StorageConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    pub endpoint: String,

    /// Search engine name passed to the provider
    pub engine: String,

    /// Default API key, overridable per request
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub endpoint: String,

    pub model: String,

    /// Sampling temperature sent with every request
    pub temperature: f32,

    /// Default API key, overridable per request
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding summary files, history and progress
    pub data_dir: PathBuf,

    pub history_file: String,

    pub progress_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcript: TranscriptConfig {
                endpoint: "https://www.searchapi.io/api/v1/search".to_string(),
                engine: "youtube_transcripts".to_string(),
                api_key: None,
            },
            generation: GenerationConfig {
                endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
                model: "deepseek-chat".to_string(),
                temperature: 0.7,
                api_key: None,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("."),
                history_file: "summary_history.json".to_string(),
                progress_file: "progress_status.json".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5001,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let config = Self::default();
            if let Err(e) = config.save().await {
                tracing::warn!("Could not write default config: {:#}", e);
            }
            config
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without touching the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        serde_yaml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("yt-summarizer").join("config.yaml"))
    }

    /// Environment keys take precedence over keys stored in the file
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(TRANSCRIPT_KEY_ENV) {
            if !key.trim().is_empty() {
                self.transcript.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var(GENERATION_KEY_ENV) {
            if !key.trim().is_empty() {
                self.generation.api_key = Some(key);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.transcript.endpoint).context("Invalid transcript endpoint")?;
        validate_endpoint(&self.generation.endpoint).context("Invalid generation endpoint")?;

        if self.generation.model.trim().is_empty() {
            anyhow::bail!("Generation model must be configured");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            anyhow::bail!(
                "Generation temperature must be between 0 and 2, got {}",
                self.generation.temperature
            );
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Transcript Endpoint: {}", self.transcript.endpoint);
        println!("  Transcript Key: {}", mask_key(self.transcript.api_key.as_deref()));
        println!("  Generation Endpoint: {}", self.generation.endpoint);
        println!("  Generation Model: {}", self.generation.model);
        println!("  Temperature: {}", self.generation.temperature);
        println!("  Generation Key: {}", mask_key(self.generation.api_key.as_deref()));
        println!("  Data Directory: {}", self.storage.data_dir.display());
        println!("  Server: {}:{}", self.server.host, self.server.port);
    }
}

/// Pick the per-request credential if given, otherwise the configured default.
/// Blank values count as absent.
pub fn resolve_credential(explicit: Option<&str>, fallback: Option<&str>) -> Option<String> {
    explicit
        .filter(|key| !key.trim().is_empty())
        .or_else(|| fallback.filter(|key| !key.trim().is_empty()))
        .map(str::to_string)
}

fn validate_endpoint(endpoint: &str) -> Result<Url> {
    let parsed = Url::parse(endpoint)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", endpoint))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed)
}

fn mask_key(key: Option<&str>) -> String {
    match key {
        Some(k) if k.chars().count() > 4 => {
            let tail: String = k.chars().skip(k.chars().count() - 4).collect();
            format!("****{}", tail)
        }
        Some(_) => "****".to_string(),
        None => "(not set)".to_string(),
    }
}
