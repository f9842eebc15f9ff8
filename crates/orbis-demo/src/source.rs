//! Procedural patch source with a per-frame upload budget.

use std::collections::HashMap;

use glam::DVec3;
use noise::{NoiseFn, Simplex};
use orbis_collision::Interval;
use orbis_config::StreamingConfig;
use orbis_lod::{
    LodSettings, PatchData, PatchKey, PatchSource, PatchStatus, TextureId, UploadQueue,
};
use tracing::trace;

/// Height samples per patch axis when measuring a patch's height range.
const HEIGHT_SAMPLES: usize = 9;

/// Multi-octave simplex noise over sphere directions.
pub struct HeightField {
    noise: Simplex,
    octaves: u32,
    amplitude: f64,
    base_frequency: f64,
}

impl HeightField {
    pub fn new(config: &StreamingConfig) -> Self {
        Self {
            noise: Simplex::new(config.seed),
            octaves: config.octaves,
            amplitude: config.height_amplitude,
            base_frequency: config.base_frequency,
        }
    }

    /// Height above the base sphere in direction `dir` (unit length).
    pub fn sample(&self, dir: DVec3) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.base_frequency;
        let mut amplitude = self.amplitude;
        for _ in 0..self.octaves {
            let p = dir * frequency;
            total += self.noise.get([p.x, p.y, p.z]) * amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        total
    }
}

/// Generates patch heights on demand and "uploads" at most
/// `uploads_per_frame` of them per [`ProceduralSource::pump`].
pub struct ProceduralSource {
    heights: HeightField,
    settings: LodSettings,
    queue: UploadQueue,
    resident: HashMap<PatchKey, PatchData>,
    uploads_per_frame: u32,
    next_texture: u64,
}

impl ProceduralSource {
    pub fn new(config: &StreamingConfig, settings: LodSettings) -> Self {
        Self {
            heights: HeightField::new(config),
            settings,
            queue: UploadQueue::new(),
            resident: HashMap::new(),
            uploads_per_frame: config.uploads_per_frame,
            next_texture: 1,
        }
    }

    /// Switch to new geometry. Everything resident or queued is dropped;
    /// callers release their nodes first.
    pub fn reconfigure(&mut self, config: &StreamingConfig, settings: LodSettings) {
        self.heights = HeightField::new(config);
        self.uploads_per_frame = config.uploads_per_frame;
        self.settings = settings;
        self.queue.clear();
        self.resident.clear();
    }

    /// Complete the highest-priority pending uploads. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut uploaded = 0;
        while uploaded < self.uploads_per_frame as usize {
            let Some(key) = self.queue.pop() else {
                break;
            };
            let data = PatchData {
                texture: TextureId(self.next_texture),
                heights: self.measure(key),
            };
            self.next_texture += 1;
            trace!(%key, texture = data.texture.0, "patch uploaded");
            self.resident.insert(key, data);
            uploaded += 1;
        }
        uploaded
    }

    pub fn resident(&self) -> usize {
        self.resident.len()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Height range over a sample grid of the patch footprint.
    fn measure(&self, key: PatchKey) -> Interval {
        let size = self.settings.size(key.level);
        let step = size / (HEIGHT_SAMPLES - 1) as f64;
        let mapper = self.settings.mapper();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for i in 0..HEIGHT_SAMPLES {
            for j in 0..HEIGHT_SAMPLES {
                let x = key.x as f64 + i as f64 * step;
                let z = key.z as f64 + j as f64 * step;
                let h = self.heights.sample(mapper.direction(x, z, key.face));
                min = min.min(h);
                max = max.max(h);
            }
        }
        Interval::new(min, max)
    }
}

impl PatchSource for ProceduralSource {
    fn request(&mut self, key: PatchKey, priority: f64) -> PatchStatus {
        match self.resident.get(&key) {
            Some(data) => PatchStatus::Ready(*data),
            None => {
                self.queue.push(key, priority);
                PatchStatus::Pending
            }
        }
    }

    fn release(&mut self, key: PatchKey) {
        self.resident.remove(&key);
        self.queue.remove(&key);
    }
}
