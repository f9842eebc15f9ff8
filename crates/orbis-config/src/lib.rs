//! Configuration for the orbis terrain renderer.
//!
//! Settings persist to disk as RON files, can be overridden from the command
//! line via clap, and can be reloaded between frames. Every section falls
//! back to defaults for missing fields, so older files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CameraConfig, Config, DebugConfig, StreamingConfig, TerrainConfig};
pub use error::ConfigError;
