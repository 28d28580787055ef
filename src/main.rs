//! Subtrans - batch subtitle translation
//!
//! Entry point: translate SRT files through a local ollama endpoint, and
//! extract or merge subtitle tracks with mkvtoolnix.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subtrans::cli::{Args, Commands};
use subtrans::config::Config;
use subtrans::setup::EnvironmentCheck;
use subtrans::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "subtrans.toml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Keep the guard alive so the file writer flushes on exit
    let _guard = setup_logging(args.verbose)?;
    info!("Starting subtrans");

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Translate { inputs, dir, model, batch_size, target_lang } => {
            if let Some(model) = model {
                config.translate.model = model;
            }
            if let Some(batch_size) = batch_size {
                config.translate.batch_size = batch_size;
            }
            if let Some(target_lang) = target_lang {
                config.translate.target_language = target_lang;
            }
            config.validate()?;

            EnvironmentCheck::new(&config).run().await;

            let workflow = Workflow::new(config)?.with_progress(true);
            let summary = if inputs.is_empty() {
                workflow.translate_directory(&dir).await?
            } else {
                workflow.translate_files(&inputs).await
            };
            println!(
                "Translated {} file(s); {} empty, {} missing, {} failed",
                summary.translated, summary.empty, summary.missing, summary.failed
            );
        }
        Commands::Extract { dir, track_id, output_dir } => {
            let track_id = track_id.unwrap_or(config.media.subtitle_track_id);
            info!("Extracting track {} from MKV files in {}", track_id, dir.display());

            let workflow = Workflow::new(config)?;
            let output_dir = output_dir.unwrap_or_else(|| workflow.extract_output_dir_for(&dir));
            let summary = workflow.extract_directory(&dir, track_id, &output_dir).await?;
            println!(
                "Extracted {} track(s) into {}; {} failed",
                summary.succeeded,
                output_dir.display(),
                summary.failed
            );
        }
        Commands::Merge { dir, language, charset } => {
            if let Some(language) = language {
                config.media.subtitle_language = language;
            }
            if let Some(charset) = charset {
                config.media.subtitle_charset = charset;
            }
            info!("Merging subtitles into videos in {}", dir.display());

            let workflow = Workflow::new(config)?;
            let summary = workflow.merge_directory(&dir).await?;
            println!(
                "Merged {} video(s); {} without subtitles, {} failed",
                summary.succeeded, summary.skipped, summary.failed
            );
        }
        Commands::Check => {
            let report = EnvironmentCheck::new(&config).run().await;
            println!("GPU:                 {}", report.gpu.as_deref().unwrap_or("not available"));
            println!("Translation service: {}", status(report.translation_service));
            println!("mkvextract:          {}", status(report.mkvextract));
            println!("mkvmerge:            {}", status(report.mkvmerge));
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
    }

    info!("subtrans finished");
    Ok(())
}

/// `--config` wins, then ./subtrans.toml, then defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

fn status(ok: bool) -> &'static str {
    if ok { "available" } else { "not available" }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".subtrans").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation
    let file_appender = rolling::daily(&log_dir, "subtrans.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subtrans.log").display());

    Ok(guard)
}
