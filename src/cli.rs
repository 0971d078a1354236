//! Command-line interface for HexArena.

use clap::Parser;
use std::path::PathBuf;

/// Hex-grid autobattler combat simulator
#[derive(Parser, Debug)]
#[command(name = "hexarena")]
#[command(about = "Hex-grid autobattler combat simulator")]
#[command(version)]
pub struct Args {
    /// JSON match setup file
    #[arg(value_name = "SETUP_FILE")]
    pub setup: PathBuf,

    /// Output path for the match report (overrides the setup file)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Random seed (overrides the setup file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum match duration in seconds (overrides the setup file)
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
