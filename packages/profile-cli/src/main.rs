// Command-line driver for site profile extraction

mod config;
mod manifest;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Settings;
use site_profile::{
    enforce_retention, AnalysisOutcome, Analyzer, CaptureRequest, FsDebugCapture, OpenAiGateway,
    RetentionPolicy,
};

#[derive(Parser)]
#[command(name = "analyze-site", about = "Extract a business profile from crawled pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze the pages listed in a manifest and print the result as JSON
    Analyze {
        /// Page manifest (JSON)
        manifest: PathBuf,

        /// Override the manifest's base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Skip inference even when an API key is configured
        #[arg(long)]
        no_inference: bool,

        /// Write the JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Apply the retention policy to the debug capture directory
    Prune {
        #[arg(long, default_value_t = 7)]
        max_age_days: u64,

        #[arg(long, default_value_t = 500)]
        max_total_mb: u64,

        #[arg(long, default_value_t = 100)]
        max_sessions: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,site_profile=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load configuration")?;
    tracing::debug!(settings = ?settings, "Configuration loaded");

    match cli.command {
        Command::Analyze {
            manifest,
            base_url,
            no_inference,
            output,
        } => analyze(&settings, manifest, base_url, no_inference, output).await,
        Command::Prune {
            max_age_days,
            max_total_mb,
            max_sessions,
        } => {
            let policy = RetentionPolicy {
                max_age: Duration::from_secs(max_age_days * 24 * 60 * 60),
                max_total_bytes: max_total_mb * 1024 * 1024,
                max_sessions,
            };
            prune(&settings, &policy).await
        }
    }
}

async fn analyze(
    settings: &Settings,
    manifest: PathBuf,
    base_url: Option<String>,
    no_inference: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let (manifest_base, pages) = manifest::load(&manifest).await?;
    let base_url = base_url.unwrap_or(manifest_base);
    tracing::info!(base_url = %base_url, pages = pages.len(), "Loaded page manifest");

    let config = settings.extraction_config();
    let config = if no_inference { config.with_inference(false) } else { config };
    let mut analyzer = Analyzer::new(config);

    if let Some(api_key) = &settings.openai_api_key {
        let mut gateway = OpenAiGateway::new(api_key.clone());
        if let Some(url) = &settings.openai_base_url {
            gateway = gateway.with_base_url(url.clone());
        }
        analyzer = analyzer.with_inference(Arc::new(gateway));
    }

    // Captured inline rather than through the observer so the write
    // finishes before the process exits
    let capture = settings.debug_dir.as_ref().map(|dir| FsDebugCapture::new(dir.clone()));
    let captured_pages = capture.as_ref().map(|_| Arc::new(pages.clone()));

    let outcome: AnalysisOutcome = analyzer
        .analyze(pages, &base_url)
        .await
        .context("Site analysis failed")?;

    if let (Some(capture), Some(pages)) = (capture, captured_pages) {
        let request = CaptureRequest {
            run_id: outcome.metadata.run_id,
            base_url: base_url.clone(),
            pages,
        };
        match capture.capture(&request).await {
            Ok(dir) => tracing::info!(dir = %dir.display(), "Pages captured"),
            Err(e) => tracing::warn!(error = %e, "Debug capture failed"),
        }
    }

    let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?;
    match output {
        Some(path) => tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}

async fn prune(settings: &Settings, policy: &RetentionPolicy) -> Result<()> {
    let dir = settings
        .debug_dir
        .as_ref()
        .context("SITE_PROFILE_DEBUG_DIR must be set to prune captures")?;

    let report = enforce_retention(dir, policy)
        .await
        .context("Retention pass failed")?;

    println!(
        "removed {} sessions ({} bytes), kept {}",
        report.removed, report.freed_bytes, report.kept
    );
    Ok(())
}
