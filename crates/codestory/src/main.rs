//! Describes one project archive from the command line.
//!
//! Loads settings, submits the archive to a [`TaskOrchestrator`], waits for
//! the task to finish and prints the status report followed by the result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use codestory::config::{load_config, validate_config, Settings};
use codestory::{telemetry, CodestoryError, TaskOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "codestory")]
#[command(about = "Scan a zipped project and print a sanitized description of it")]
#[command(version)]
struct Args {
    /// Zip archive containing the project
    archive: PathBuf,

    /// Settings file (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("codestory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(&settings.logging);
    info!("Starting codestory v{}", env!("CARGO_PKG_VERSION"));

    match run(&args.archive, &settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("codestory: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CodestoryError> {
    let mut settings = match path {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };
    settings.apply_env_overrides();
    validate_config(&settings)?;
    Ok(settings)
}

/// Returns whether the task completed.
async fn run(archive: &Path, settings: &Settings) -> Result<bool, CodestoryError> {
    let bytes = tokio::fs::read(archive)
        .await
        .map_err(|source| CodestoryError::ReadInput {
            path: archive.to_path_buf(),
            source,
        })?;

    let orchestrator = TaskOrchestrator::from_settings(settings);
    orchestrator.start_sweeper();

    let (receipt, handle) = orchestrator.submit(bytes)?;
    info!(
        "Task {} started for {} files",
        receipt.task_id,
        receipt.file_list.len()
    );

    let outcome = handle.wait().await?;
    if outcome.warnings > 0 {
        info!("Task finished with {} warnings", outcome.warnings);
    }

    let report = orchestrator.status(&receipt.task_id);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(result) = orchestrator.result(&receipt.task_id) {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(error) = outcome.error {
        eprintln!("codestory: {}", error);
    }

    orchestrator.shutdown().await;
    Ok(outcome.success)
}
