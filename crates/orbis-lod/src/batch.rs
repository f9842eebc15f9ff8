//! Per-frame collection of selected patches for instanced drawing.

use bytemuck::{Pod, Zeroable};
use glam::DVec2;

use orbis_cubesphere::CubeFace;

use crate::{TextureId, TextureInfo};

/// One patch to draw this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRecord {
    /// Face the patch lies on.
    pub face: CubeFace,
    /// Face-local `(x, z)` of the patch origin.
    pub offset: DVec2,
    /// Side length of the patch (`node_dimension * 2^level`).
    pub scale: f64,
    /// LOD level of the patch.
    pub level: u8,
    /// Texture to sample, the node's own or an ancestor's.
    pub texture: Option<TextureId>,
    /// Region of `texture` the patch samples.
    pub texture_info: TextureInfo,
}

/// GPU instance layout of a [`RenderRecord`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// `[x, z, scale, level]`
    pub render_data: [f32; 4],
    /// `[u offset, v offset, uv scale, face index]`
    pub texture_info: [f32; 4],
    /// Texture id split into `[low, high]` 32-bit words.
    pub texture_id: [u32; 2],
}

impl InstanceData {
    /// Texture id written for patches without any texture.
    pub const NO_TEXTURE: [u32; 2] = [u32::MAX, u32::MAX];

    /// Pack `record`, narrowing coordinates to `f32`.
    #[must_use]
    pub fn from_record(record: &RenderRecord) -> Self {
        let texture_id = match record.texture {
            Some(TextureId(id)) => [id as u32, (id >> 32) as u32],
            None => Self::NO_TEXTURE,
        };
        Self {
            render_data: [
                record.offset.x as f32,
                record.offset.y as f32,
                record.scale as f32,
                f32::from(record.level),
            ],
            texture_info: [
                record.texture_info.offset.x as f32,
                record.texture_info.offset.y as f32,
                record.texture_info.scale as f32,
                record.face.index() as f32,
            ],
            texture_id,
        }
    }
}

/// Consumer of a frame's instance data (the GPU mesh-batch renderer).
pub trait InstancedRenderer {
    /// Draw one frame's patches in a single instanced call.
    fn draw_instances(&mut self, instances: &[InstanceData]);
}

/// Records appended by the selection pass, consumed once per frame.
#[derive(Debug, Default)]
pub struct RenderBatch {
    records: Vec<RenderRecord>,
}

impl RenderBatch {
    /// Create a new empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new batch with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Clear the batch for reuse next frame, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Append a selected patch.
    pub fn add(&mut self, record: RenderRecord) {
        self.records.push(record);
    }

    /// Records in the order they were added.
    pub fn records(&self) -> &[RenderRecord] {
        &self.records
    }

    /// Number of records this frame.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was selected this frame.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pack every record into its GPU layout.
    pub fn instance_data(&self) -> Vec<InstanceData> {
        self.records.iter().map(InstanceData::from_record).collect()
    }

    /// Hand this frame's instances to `renderer`.
    pub fn submit(&self, renderer: &mut dyn InstancedRenderer) {
        let instances = self.instance_data();
        renderer.draw_instances(&instances);
    }
}
