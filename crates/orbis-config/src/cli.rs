//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Orbis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "orbis", about = "Cube-sphere terrain LOD driver")]
pub struct CliArgs {
    /// Number of frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Level of the face roots.
    #[arg(long)]
    pub max_lod_level: Option<u8>,

    /// Side length of a level-0 node.
    #[arg(long)]
    pub node_dimension: Option<u32>,

    /// Radius of the zero-height surface.
    #[arg(long)]
    pub sphere_radius: Option<f64>,

    /// Seed for procedural height data.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(frames) = args.frames {
            self.camera.frames = frames;
        }
        if let Some(level) = args.max_lod_level {
            self.terrain.max_lod_level = level;
            // An explicit range table no longer fits a different depth.
            self.terrain.lod_ranges.clear();
        }
        if let Some(dim) = args.node_dimension {
            self.terrain.node_dimension = dim;
        }
        if let Some(radius) = args.sphere_radius {
            self.terrain.sphere_radius = radius;
        }
        if let Some(seed) = args.seed {
            self.streaming.seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
