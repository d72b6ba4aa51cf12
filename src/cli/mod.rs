use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "yt-summarizer",
    about = "YouTube Summarizer - Turn a video's transcript into a numbered-list summary",
    version,
    args_conflicts_with_subcommands = true,
    long_about = "Fetches a YouTube video's transcript through SearchAPI.io and condenses it with Deepseek. Pass a video ID or link to summarize once, or run `serve` (or no arguments) to start the HTTP service."
)]
pub struct Cli {
    /// Video ID or YouTube link to summarize
    #[arg(value_name = "VIDEO")]
    pub video: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format for summaries and history
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind (defaults to the configured host)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on (defaults to the configured port)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Show previously generated summaries
    History,

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
