//! Main application entry point.

use clap::Parser;
use layercraft_app::{AppError, AppResult, Script, Session, write_png};
use layercraft_core::EngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;

/// Replay a LayerCraft editing session without opening a window.
#[derive(Parser, Debug)]
#[command(name = "layercraft", version, about = "Replay a LayerCraft editing session")]
struct Cli {
    /// Session script (JSON) to replay.
    #[arg(value_name = "SCRIPT.json")]
    script: PathBuf,

    /// Engine configuration (JSON). Missing fields take defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the active layer's mask to this PNG file.
    #[arg(short, long, value_name = "FILE.png")]
    mask_out: Option<PathBuf>,

    /// Print the summary on a single line.
    #[arg(long)]
    compact: bool,
}

fn run(cli: &Cli) -> AppResult<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let script = Script::from_json(&std::fs::read_to_string(&cli.script)?)?;
    log::info!("Replaying {} events from {}", script.events.len(), cli.script.display());

    let session = Session::replay(&script, config)?;
    let summary = session.summary();
    let json = if cli.compact {
        serde_json::to_string(&summary)?
    } else {
        serde_json::to_string_pretty(&summary)?
    };
    println!("{}", json);

    if let Some(path) = &cli.mask_out {
        let mask = session.mask().ok_or(AppError::NoMask)?;
        write_png(mask, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting LayerCraft");

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Session failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
