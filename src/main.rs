// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stream_compositor::config::Config;
use stream_compositor::constants::app_info;

mod cli;

#[derive(Parser)]
#[command(name = "stream-compositor")]
#[command(about = "Composite synchronized depth, color and motion streams")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/stream-compositor/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Live view in the terminal (default)
    Terminal,

    /// Render a few ticks headless and save the composited view as PNG
    Snapshot {
        /// Frame-sets to process before drawing
        #[arg(short, long, default_value = "5")]
        ticks: u32,

        /// Output file path (default: ~/Pictures/stream-compositor/SNAP_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render the point-cloud view
        #[arg(short, long)]
        point_cloud: bool,

        /// Horizontal drag applied before drawing, in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate_x: f32,

        /// Vertical drag applied before drawing, in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate_y: f32,
    },

    /// Show the sensor's streams and the processing blocks chosen for them
    Pipeline,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=stream_compositor=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    tracing::info!(version = app_info::version(), "Starting stream-compositor");

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(None),
    };

    match cli.command {
        None | Some(Commands::Terminal) => stream_compositor::terminal::run(config),
        Some(Commands::Snapshot {
            ticks,
            output,
            point_cloud,
            rotate_x,
            rotate_y,
        }) => cli::snapshot(
            &config,
            cli::SnapshotOptions {
                ticks,
                output,
                point_cloud,
                rotate: (rotate_x, rotate_y),
            },
        ),
        Some(Commands::Pipeline) => cli::show_pipeline(&config),
    }
}
