//! Command-line driver for the headless XR frame simulation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use xr_sim::{simulate, SimConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate an XR compositor frame loop")]
struct Args {
    /// TOML file with simulation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to run
    #[arg(long)]
    frames: Option<u64>,

    /// Uniform ring size (2..=8)
    #[arg(long)]
    ring_size: Option<u32>,

    /// Frames each snapshot stays in flight on the GPU
    #[arg(long)]
    hold_frames: Option<u64>,

    /// Frame at which the renderer stops completing frames
    #[arg(long)]
    stall_at: Option<u64>,

    /// Orphan terminal events to inject
    #[arg(long)]
    orphans: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    if let Some(ring_size) = args.ring_size {
        config.frame_loop.ring_size = ring_size;
    }
    if let Some(hold_frames) = args.hold_frames {
        config.hold_frames = hold_frames;
    }
    if args.stall_at.is_some() {
        config.stall_at = args.stall_at;
    }
    if let Some(orphans) = args.orphans {
        config.orphans = orphans;
    }

    let report = simulate(&config)?;
    info!("final health: {:?}", report.health);
    Ok(())
}
