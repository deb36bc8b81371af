//! Tactics client - development tools
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded game as fast as possible
//! cargo run -p tactics_tools -- replay games/skirmish.ron
//!
//! # Watch it in real time from player 2's point of view
//! cargo run -p tactics_tools -- replay games/skirmish.ron --real-time --viewer 2
//!
//! # Check client configuration files
//! cargo run -p tactics_tools -- validate config/
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_client::prelude::ClientConfig;
use tactics_tools::replay::{self, Pacing, Recording, ReplayOptions};
use tactics_tools::validate;

#[derive(Parser)]
#[command(name = "tactics-tools")]
#[command(about = "Development tools for the tactics client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded game headlessly through the client
    Replay {
        /// Recording file (RON)
        file: PathBuf,

        /// Play animations at their real durations
        #[arg(long)]
        real_time: bool,

        /// Replay as seen by this player instead of a spectator
        #[arg(long)]
        viewer: Option<u8>,

        /// Client configuration (RON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate client configuration files
    Validate {
        /// A configuration file or a directory of them
        #[arg(default_value = "config")]
        path: PathBuf,
    },
    /// Check that every action in a recording is accepted
    Check {
        /// Recording file (RON)
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            file,
            real_time,
            viewer,
            config,
        } => run_replay(&file, real_time, viewer, config.as_deref()),
        Commands::Validate { path } => {
            tracing::info!("Validating configs in: {}", path.display());
            if path.is_dir() {
                validate::validate_config_directory(&path).map(|count| {
                    tracing::info!("Validation passed for {count} files");
                })
            } else {
                validate::validate_config(&path).map(|_| tracing::info!("Validation passed"))
            }
        }
        Commands::Check { file } => validate::validate_recording(&file).map(|responses| {
            tracing::info!("Recording is valid, {responses} responses");
        }),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run_replay(
    file: &Path,
    real_time: bool,
    viewer: Option<u8>,
    config: Option<&Path>,
) -> tactics_tools::error::Result<()> {
    let config = match config {
        Some(path) => validate::validate_config(path)?,
        None => ClientConfig::default(),
    };
    let options = ReplayOptions {
        viewer,
        pacing: if real_time {
            Pacing::RealTime
        } else {
            Pacing::FastForward
        },
        config,
    };
    let recording = Recording::load(file)?;
    let summary = replay::run(&recording, &options)?;
    println!("{summary}");
    Ok(())
}
