//! Quadtree geometry and LOD range configuration.

use orbis_collision::Interval;
use orbis_config::{ConfigError, TerrainConfig};
use orbis_cubesphere::CubeSphereMapper;

/// Frames a node may stay unused before its data is released.
pub const DEFAULT_TIME_TO_LIVE: u32 = 1 << 8;

/// Refinement distance per LOD level.
///
/// A node of level `L` is split into its children while the camera is
/// within `range(L)` of it. Index 0 is the finest level.
#[derive(Clone, Debug, PartialEq)]
pub struct LodRanges {
    ranges: Vec<f64>,
}

impl LodRanges {
    /// Create ranges from an explicit per-level table.
    ///
    /// # Panics
    ///
    /// Panics if the table is empty, or if ranges are not strictly
    /// increasing or contain non-positive values.
    pub fn custom(ranges: Vec<f64>) -> Self {
        assert!(!ranges.is_empty(), "must have at least one range");
        for (i, &r) in ranges.iter().enumerate() {
            assert!(r > 0.0, "ranges must be positive");
            if i > 0 {
                assert!(r > ranges[i - 1], "ranges must be strictly increasing");
            }
        }
        Self { ranges }
    }

    /// Derive `multiplier * node_dimension * 2^level` for levels `0..=max_level`.
    pub fn from_multiplier(multiplier: f64, node_dimension: f64, max_level: u8) -> Self {
        let ranges = (0..=max_level)
            .map(|level| multiplier * node_dimension * 2f64.powi(i32::from(level)))
            .collect();
        Self { ranges }
    }

    /// Refinement range for `level`. Levels past the table reuse its last entry.
    pub fn range(&self, level: u8) -> f64 {
        let index = usize::from(level).min(self.ranges.len() - 1);
        self.ranges[index]
    }

    /// Number of levels in the table.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Return a reference to the range table.
    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }
}

/// Everything the selector needs to know about the quadtree layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LodSettings {
    node_dimension: f64,
    max_level: u8,
    mapper: CubeSphereMapper,
    ranges: LodRanges,
    time_to_live: u32,
    default_heights: Interval,
}

impl LodSettings {
    /// Settings with derived ranges (multiplier 2), the default time to live
    /// and a flat `[0, 0]` height range for unloaded nodes.
    pub fn new(node_dimension: u32, max_level: u8, sphere_radius: f64) -> Self {
        let node_dimension = f64::from(node_dimension);
        let face_size = node_dimension * 2f64.powi(i32::from(max_level));
        Self {
            node_dimension,
            max_level,
            mapper: CubeSphereMapper::new(face_size, sphere_radius),
            ranges: LodRanges::from_multiplier(2.0, node_dimension, max_level),
            time_to_live: DEFAULT_TIME_TO_LIVE,
            default_heights: Interval::new(0.0, 0.0),
        }
    }

    /// Build validated settings from the terrain config section.
    pub fn from_config(config: &TerrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let settings = Self::new(
            config.node_dimension,
            config.max_lod_level,
            config.sphere_radius,
        );
        let ranges = if config.lod_ranges.is_empty() {
            LodRanges::from_multiplier(
                config.lod_distance_multiplier,
                settings.node_dimension,
                config.max_lod_level,
            )
        } else {
            LodRanges::custom(config.lod_ranges.clone())
        };
        Ok(settings
            .with_ranges(ranges)
            .with_time_to_live(config.time_to_live_in_memory)
            .with_default_heights(Interval::new(config.min_height, config.max_height)))
    }

    /// Replace the range table.
    ///
    /// # Panics
    ///
    /// Panics if the table does not have one entry per level.
    #[must_use]
    pub fn with_ranges(mut self, ranges: LodRanges) -> Self {
        assert_eq!(
            ranges.len(),
            usize::from(self.max_level) + 1,
            "range table must have one entry per level"
        );
        self.ranges = ranges;
        self
    }

    /// # Panics
    ///
    /// Panics if `frames` is zero.
    #[must_use]
    pub fn with_time_to_live(mut self, frames: u32) -> Self {
        assert!(frames > 0, "time to live must be at least one frame");
        self.time_to_live = frames;
        self
    }

    #[must_use]
    pub fn with_default_heights(mut self, heights: Interval) -> Self {
        self.default_heights = heights;
        self
    }

    /// `2^level`.
    pub fn scale(&self, level: u8) -> f64 {
        2f64.powi(i32::from(level))
    }

    /// Side length of a node of `level`: `node_dimension * 2^level`.
    pub fn size(&self, level: u8) -> f64 {
        self.node_dimension * self.scale(level)
    }

    /// Level of the face roots.
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Side length of a whole face: `size(max_level)`.
    pub fn face_size(&self) -> f64 {
        self.mapper.face_size()
    }

    /// Cube-to-sphere mapping shared by every node.
    pub fn mapper(&self) -> &CubeSphereMapper {
        &self.mapper
    }

    /// Refinement distance per level.
    pub fn ranges(&self) -> &LodRanges {
        &self.ranges
    }

    /// Frames a node may go unused before its data is released.
    pub fn time_to_live(&self) -> u32 {
        self.time_to_live
    }

    /// Height range assumed before a node's patch data arrives.
    pub fn default_heights(&self) -> Interval {
        self.default_heights
    }

    /// Whether existing trees stay valid under `other`.
    ///
    /// Ranges and time to live can change between frames. Anything that
    /// moves node footprints or bounding volumes cannot.
    pub fn same_geometry(&self, other: &LodSettings) -> bool {
        self.node_dimension == other.node_dimension
            && self.max_level == other.max_level
            && self.mapper == other.mapper
            && self.default_heights == other.default_heights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_size_are_exact() {
        let settings = LodSettings::new(16, 10, 1000.0);
        for level in 0..=10u8 {
            let expected_scale = f64::from(1u32 << level);
            assert_eq!(settings.scale(level), expected_scale);
            assert_eq!(settings.size(level), 16.0 * expected_scale);
        }
        assert_eq!(settings.face_size(), 16.0 * 1024.0);
    }

    #[test]
    fn test_derived_ranges_double_per_level() {
        let ranges = LodRanges::from_multiplier(2.0, 16.0, 3);
        assert_eq!(ranges.ranges(), &[32.0, 64.0, 128.0, 256.0]);
        assert_eq!(ranges.range(9), 256.0);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn test_non_increasing_ranges_panic() {
        LodRanges::custom(vec![100.0, 50.0, 200.0]);
    }

    #[test]
    #[should_panic(expected = "one entry per level")]
    fn test_range_table_must_match_depth() {
        let _ = LodSettings::new(16, 2, 100.0).with_ranges(LodRanges::custom(vec![1.0, 2.0]));
    }

    #[test]
    fn test_from_config_uses_explicit_ranges() {
        let config = TerrainConfig {
            node_dimension: 16,
            max_lod_level: 2,
            sphere_radius: 32.0,
            lod_ranges: vec![8.0, 16.0, 64.0],
            time_to_live_in_memory: 5,
            min_height: -1.0,
            max_height: 3.0,
            ..TerrainConfig::default()
        };
        let settings = LodSettings::from_config(&config).unwrap();
        assert_eq!(settings.ranges().ranges(), &[8.0, 16.0, 64.0]);
        assert_eq!(settings.time_to_live(), 5);
        assert_eq!(settings.default_heights(), Interval::new(-1.0, 3.0));
        assert_eq!(settings.face_size(), 64.0);
        assert_eq!(settings.mapper().sphere_radius(), 32.0);
    }

    #[test]
    fn test_from_config_derives_ranges_from_multiplier() {
        let config = TerrainConfig {
            node_dimension: 8,
            max_lod_level: 1,
            lod_distance_multiplier: 3.0,
            ..TerrainConfig::default()
        };
        let settings = LodSettings::from_config(&config).unwrap();
        assert_eq!(settings.ranges().ranges(), &[24.0, 48.0]);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = TerrainConfig {
            sphere_radius: 0.0,
            ..TerrainConfig::default()
        };
        assert!(LodSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_same_geometry_ignores_ranges_and_ttl() {
        let a = LodSettings::new(16, 3, 100.0);
        let b = a.clone().with_time_to_live(4).with_ranges(LodRanges::custom(vec![1.0, 2.0, 3.0, 4.0]));
        assert!(a.same_geometry(&b));
        let c = LodSettings::new(16, 3, 101.0);
        assert!(!a.same_geometry(&c));
    }
}
