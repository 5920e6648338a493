// This is the command-line entry point of the image compressor.
// All processing lives in the library; this file only parses arguments and prints.

mod cli;

use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use image_compressor_lib::commands::{self, library, OutputTarget};
use image_compressor_lib::core::{AppState, CompressorConfig, ProcessingSettings, Progress, ProgressType};
use image_compressor_lib::processing::BatchObserver;
use cli::{Cli, Command, CompressArgs, HistoryAction, PresetAction};

const DEFAULT_CONFIG: &str = "image-compressor.json";

/// Reports batch progress through the log.
struct LogObserver;

impl BatchObserver for LogObserver {
    fn on_progress(&self, progress: &Progress) {
        match (progress.progress_type, &progress.item_name, &progress.error) {
            (ProgressType::Start, _, _) => info!("{} ({} images)", progress.status, progress.total_tasks),
            (_, Some(name), Some(error)) => {
                info!("[{:>3}%] {} failed: {}", progress.progress_percentage, name, error)
            }
            (_, Some(name), None) => info!("[{:>3}%] {}", progress.progress_percentage, name),
            (_, None, _) => info!("[{:>3}%] {}", progress.progress_percentage, progress.status),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = CompressorConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let state = AppState::new(config);
    debug!("AppState ready");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(run(cli.command, state))
}

async fn run(command: Command, state: AppState) -> Result<()> {
    match command {
        Command::Compress(args) => compress(&state, args).await,
        Command::Presets { action } => {
            match action {
                PresetAction::List => {
                    let presets = library::list_presets(&state);
                    if presets.is_empty() {
                        println!("No presets saved");
                    }
                    for preset in presets {
                        println!("{}\t{}", preset.name, serde_json::to_string(&preset.settings)?);
                    }
                }
                PresetAction::Delete { name } => {
                    anyhow::ensure!(library::delete_preset(&state, &name), "No preset named '{name}'");
                    println!("Deleted preset '{name}'");
                }
                PresetAction::Rename { old, new } => {
                    anyhow::ensure!(
                        library::rename_preset(&state, &old, &new),
                        "Could not rename '{old}' to '{new}'"
                    );
                    println!("Renamed preset '{old}' to '{new}'");
                }
            }
            Ok(())
        }
        Command::History { action } => {
            match action {
                HistoryAction::Show => {
                    for entry in library::show_history(&state) {
                        println!(
                            "{}\t{} → {} bytes\t{}\tscore {}",
                            entry.original_file_name,
                            entry.original_file_size,
                            entry.compressed_file_size.map_or("?".to_string(), |s| s.to_string()),
                            entry.compressed_file_type.as_deref().unwrap_or("?"),
                            entry.quality_score.map_or("n/a".to_string(), |s| s.to_string()),
                        );
                    }
                }
                HistoryAction::Clear => {
                    anyhow::ensure!(library::clear_history(&state), "Failed to clear history");
                    println!("History cleared");
                }
            }
            Ok(())
        }
        Command::Export { file } => {
            let data = library::export_data(&state, &file).await?;
            println!(
                "Exported {} presets and {} history entries to {}",
                data.presets.len(), data.history.len(), file.display()
            );
            Ok(())
        }
        Command::Import { file } => {
            library::import_data(&state, &file).await?;
            println!("Imported {}", file.display());
            Ok(())
        }
    }
}

async fn compress(state: &AppState, args: CompressArgs) -> Result<()> {
    let base = match &args.preset {
        Some(name) => library::load_preset(state, name)?,
        None => state.store().load_settings().unwrap_or_else(ProcessingSettings::default),
    };
    let settings = args.apply(base);

    if let Some(name) = &args.save_preset {
        library::save_preset(state, name, &settings)?;
        info!("Saved preset '{}'", name);
    }

    let target = match &args.zip {
        Some(archive) => OutputTarget::Archive(archive.clone()),
        None => OutputTarget::Directory(args.out_dir.clone()),
    };
    let report = commands::compress_images(state, &args.inputs, &target, &settings, &LogObserver).await?;

    for file in &report.written {
        let location = match &target {
            OutputTarget::Archive(archive) => format!("{}:{}", archive.display(), file.file_name),
            OutputTarget::Directory(_) => file.path.display().to_string(),
        };
        println!(
            "{} → {} ({} → {} bytes, score {})",
            file.source_name,
            location,
            file.original_size,
            file.compressed_size,
            file.quality_score.map_or("n/a".to_string(), |s| s.to_string()),
        );
    }
    for (name, error) in &report.failed {
        eprintln!("{name}: {error}");
    }

    anyhow::ensure!(
        report.failed.is_empty(),
        "{} of {} files failed",
        report.failed.len(),
        report.total()
    );
    Ok(())
}
