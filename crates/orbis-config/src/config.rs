//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
const CONFIG_FILE: &str = "config.ron";

/// Deepest supported LOD level; keeps face sizes well inside f64 integer range.
const MAX_SUPPORTED_LOD_LEVEL: u8 = 30;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Quadtree geometry and LOD policy.
    pub terrain: TerrainConfig,
    /// Patch data streaming.
    pub streaming: StreamingConfig,
    /// Scripted camera used by the headless driver.
    pub camera: CameraConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Terrain quadtree configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of a level-0 node in local units (grid cells per patch).
    pub node_dimension: u32,
    /// Level of the face roots. Leaves are level 0.
    pub max_lod_level: u8,
    /// Radius of the zero-height surface.
    pub sphere_radius: f64,
    /// Level `L` is refined while the camera is within
    /// `multiplier * node_dimension * 2^L`. Ignored when `lod_ranges` is set.
    pub lod_distance_multiplier: f64,
    /// Explicit refinement range per level, index 0 = finest. Empty = derived.
    pub lod_ranges: Vec<f64>,
    /// Frames a node may go unused before its data is released.
    pub time_to_live_in_memory: u32,
    /// Height range assumed for nodes whose data is not loaded yet.
    pub min_height: f64,
    /// See `min_height`.
    pub max_height: f64,
}

/// Patch data streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Maximum number of patch uploads completed per frame.
    pub uploads_per_frame: u32,
    /// Seed for procedural height data.
    pub seed: u32,
    /// Amplitude of the first noise octave.
    pub height_amplitude: f64,
    /// Frequency of the first noise octave, in cycles per sphere radius.
    pub base_frequency: f64,
    /// Number of noise octaves.
    pub octaves: u32,
}

/// Scripted camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Altitude above the surface on the first frame.
    pub start_altitude: f64,
    /// Altitude above the surface on the last frame.
    pub end_altitude: f64,
    /// Vertical field of view in degrees.
    pub field_of_view_deg: f64,
    /// Viewport width / height.
    pub aspect: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
    /// Number of frames to simulate.
    pub frames: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Emit a stats line every this many frames (0 = never).
    pub stats_interval: u32,
    /// Check the config file for changes every this many frames (0 = never).
    pub reload_interval: u32,
}

impl TerrainConfig {
    /// Side length of a whole face: `node_dimension * 2^max_lod_level`.
    #[must_use]
    pub fn face_size(&self) -> f64 {
        f64::from(self.node_dimension) * 2f64.powi(i32::from(self.max_lod_level))
    }

    /// Check ranges and consistency of the terrain settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_dimension == 0 {
            return Err(ConfigError::invalid(
                "terrain.node_dimension",
                "must be positive",
            ));
        }
        if self.max_lod_level > MAX_SUPPORTED_LOD_LEVEL {
            return Err(ConfigError::invalid(
                "terrain.max_lod_level",
                format!("must be at most {MAX_SUPPORTED_LOD_LEVEL}"),
            ));
        }
        if !(self.sphere_radius.is_finite() && self.sphere_radius > 0.0) {
            return Err(ConfigError::invalid(
                "terrain.sphere_radius",
                "must be positive and finite",
            ));
        }
        if !(self.lod_distance_multiplier.is_finite() && self.lod_distance_multiplier > 0.0) {
            return Err(ConfigError::invalid(
                "terrain.lod_distance_multiplier",
                "must be positive and finite",
            ));
        }
        if !self.lod_ranges.is_empty() {
            let levels = usize::from(self.max_lod_level) + 1;
            if self.lod_ranges.len() != levels {
                return Err(ConfigError::invalid(
                    "terrain.lod_ranges",
                    format!(
                        "expected {levels} entries (one per level), got {}",
                        self.lod_ranges.len()
                    ),
                ));
            }
            let mut previous = 0.0;
            for &range in &self.lod_ranges {
                if !(range.is_finite() && range > previous) {
                    return Err(ConfigError::invalid(
                        "terrain.lod_ranges",
                        "ranges must be positive and strictly increasing",
                    ));
                }
                previous = range;
            }
        }
        if self.time_to_live_in_memory == 0 {
            return Err(ConfigError::invalid(
                "terrain.time_to_live_in_memory",
                "must be at least one frame",
            ));
        }
        if !(self.min_height.is_finite() && self.max_height.is_finite()) {
            return Err(ConfigError::invalid(
                "terrain.min_height",
                "height bounds must be finite",
            ));
        }
        if self.min_height > self.max_height {
            return Err(ConfigError::invalid(
                "terrain.min_height",
                "must not exceed max_height",
            ));
        }
        if self.sphere_radius + self.min_height <= 0.0 {
            return Err(ConfigError::invalid(
                "terrain.min_height",
                "surface would dip through the sphere center",
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;
        if self.streaming.uploads_per_frame == 0 {
            return Err(ConfigError::invalid(
                "streaming.uploads_per_frame",
                "must be positive",
            ));
        }
        if !(self.streaming.height_amplitude.is_finite() && self.streaming.base_frequency.is_finite())
        {
            return Err(ConfigError::invalid(
                "streaming.height_amplitude",
                "noise parameters must be finite",
            ));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(ConfigError::invalid(
                "camera.far",
                "clip distances must satisfy 0 < near < far",
            ));
        }
        Ok(())
    }

    /// Platform config directory for orbis (e.g. `~/.config/orbis`).
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("orbis"))
    }
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            node_dimension: 16,
            max_lod_level: 10,
            sphere_radius: 8192.0,
            lod_distance_multiplier: 2.0,
            lod_ranges: Vec::new(),
            time_to_live_in_memory: 256,
            min_height: -256.0,
            max_height: 1024.0,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            uploads_per_frame: 8,
            seed: 0,
            height_amplitude: 600.0,
            base_frequency: 4.0,
            octaves: 5,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_altitude: 30_000.0,
            end_altitude: 50.0,
            field_of_view_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.5,
            far: 100_000.0,
            frames: 600,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 60,
            reload_interval: 120,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    ///
    /// A file that parses but fails validation is reported as an error and
    /// the caller keeps its current config.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }
}
