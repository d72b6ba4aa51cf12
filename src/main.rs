use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_summarizer::cli::{Cli, Commands, OutputFormat};
use yt_summarizer::config::Config;
use yt_summarizer::output::{self, SpinnerProgress};
use yt_summarizer::pipeline::{SummaryPipeline, SummaryRequest};
use yt_summarizer::server::{self, AppState};
use yt_summarizer::store::{FileStore, HistoryStore, MemoryStore};
use yt_summarizer::{resolver, utils};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // One-shot runs keep the terminal for the summary itself
    let default_level = match (&cli.video, cli.verbose) {
        (_, true) => "yt_summarizer=debug,tower_http=debug",
        (Some(_), false) => "yt_summarizer=warn",
        (None, false) => "yt_summarizer=info,tower_http=info",
    };
    init_tracing(default_level, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_level.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().await?;

    if let Some(video) = cli.video.as_deref() {
        return summarize_once(&config, video, &cli.format, cli.quiet).await;
    }

    match cli.command {
        None => serve(&config, None, None).await,
        Some(Commands::Serve { host, port }) => serve(&config, host, port).await,
        Some(Commands::History) => {
            let entries = FileStore::from_config(&config).list().await;
            output::print_history(&entries, &cli.format)
        }
        Some(Commands::Config { show }) => {
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Run with --show to print the effective configuration.");
            }
            Ok(())
        }
    }
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = AppState::new(SummaryPipeline::from_config(config));
    server::run(state, &host, port).await
}

async fn summarize_once(
    config: &Config,
    video: &str,
    format: &OutputFormat,
    quiet: bool,
) -> Result<()> {
    let video_id = resolver::resolve(video)?;
    let started = Instant::now();

    let spinner = (!quiet).then(|| Arc::new(SpinnerProgress::new()));
    let pipeline = match &spinner {
        Some(spinner) => SummaryPipeline::from_config(config).with_progress(spinner.clone()),
        None => SummaryPipeline::from_config(config).with_progress(Arc::new(MemoryStore::new())),
    };

    let result = pipeline.run(&SummaryRequest::new(video_id.watch_url())).await;

    if let Some(spinner) = &spinner {
        spinner.finish();
    }
    let artifact = result?;

    output::print_summary(&artifact, format)?;
    if !quiet {
        eprintln!("Finished in {}", utils::format_duration(started.elapsed().as_secs_f64()));
    }

    Ok(())
}
