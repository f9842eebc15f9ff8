//! Stand-in for the GPU mesh-batch renderer: counts what would be drawn.

use orbis_lod::{InstanceData, InstancedRenderer};

#[derive(Debug, Default)]
pub struct StatsRenderer {
    pub frames: u64,
    pub instances: usize,
    pub bytes: usize,
    pub peak_instances: usize,
    pub untextured: usize,
}

impl InstancedRenderer for StatsRenderer {
    fn draw_instances(&mut self, instances: &[InstanceData]) {
        let bytes: &[u8] = bytemuck::cast_slice(instances);
        self.frames += 1;
        self.instances += instances.len();
        self.bytes += bytes.len();
        self.peak_instances = self.peak_instances.max(instances.len());
        self.untextured += instances
            .iter()
            .filter(|i| i.texture_id == InstanceData::NO_TEXTURE)
            .count();
    }
}
