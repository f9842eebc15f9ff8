//! Quadtree nodes: lazy children, texture streaming, aging and eviction.

use glam::{DVec2, DVec3};
use tracing::trace;

use orbis_collision::{Frustum, Interval, SpherizedAabb};
use orbis_cubesphere::{Aabb, Sphere};

use crate::{
    LodSettings, PatchKey, PatchSource, PatchStatus, RenderBatch, RenderRecord, SelectionStats,
    TextureBinding, TextureId, compute_priority,
};

/// Streaming state of a node's own texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeTexture {
    /// Never requested, or released after eviction.
    Unloaded,
    /// Requested, not uploaded yet.
    Pending,
    /// Own texture resident on the GPU.
    Uploaded(TextureId),
    /// The source has no data for this node; ancestors' textures are used.
    Unavailable,
}

/// A square region of one cube face at one level of detail.
///
/// Children are created on first descent and dropped on eviction; the node
/// itself stays in the tree as a placeholder.
#[derive(Debug)]
pub struct QuadTreeNode {
    key: PatchKey,
    size: f64,
    heights: Interval,
    bounds: SpherizedAabb,
    texture: NodeTexture,
    children: [Option<Box<QuadTreeNode>>; 4],
    frames_since_use: u32,
}

/// Per-pass state threaded through the recursion.
pub(crate) struct Selection<'a> {
    pub camera: DVec3,
    pub frustum: &'a dyn Frustum,
    pub source: &'a mut dyn PatchSource,
    pub batch: &'a mut RenderBatch,
    pub settings: &'a LodSettings,
    pub stats: SelectionStats,
}

impl QuadTreeNode {
    /// Create an unloaded node for `key`, bounded by the default height range.
    pub fn new(key: PatchKey, settings: &LodSettings) -> Self {
        let size = settings.size(key.level);
        let heights = settings.default_heights();
        let bounds = SpherizedAabb::new(
            &local_box(key, size, heights),
            key.face,
            settings.mapper(),
        );
        Self {
            key,
            size,
            heights,
            bounds,
            texture: NodeTexture::Unloaded,
            children: [None, None, None, None],
            frames_since_use: 0,
        }
    }

    /// Identity of the node: face, level and origin.
    pub fn key(&self) -> PatchKey {
        self.key
    }

    /// LOD level; 0 for leaves.
    pub fn level(&self) -> u8 {
        self.key.level
    }

    /// Side length in face-local units.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Face-local `(x, z)` of the origin corner.
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.key.x as f64, self.key.z as f64)
    }

    /// Height range currently assumed for the node.
    pub fn heights(&self) -> Interval {
        self.heights
    }

    /// Bounding volume of the node's patch on the sphere.
    pub fn bounds(&self) -> &SpherizedAabb {
        &self.bounds
    }

    /// Streaming state of the node's own texture.
    pub fn texture(&self) -> NodeTexture {
        self.texture
    }

    /// Consecutive frames the node went without being used.
    pub fn frames_since_use(&self) -> u32 {
        self.frames_since_use
    }

    /// Reset liveness; the node counts as used this frame.
    pub fn mark_used(&mut self) {
        self.frames_since_use = 0;
    }

    /// Quadrant `index`, if it has been created.
    pub fn child(&self, index: usize) -> Option<&QuadTreeNode> {
        self.children.get(index)?.as_deref()
    }

    /// Existing children in quadrant order.
    pub fn children(&self) -> impl Iterator<Item = &QuadTreeNode> {
        self.children.iter().flatten().map(|c| c.as_ref())
    }

    /// Nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(QuadTreeNode::node_count).sum::<usize>()
    }

    /// Uploaded textures held by this subtree.
    pub fn resident_textures(&self) -> usize {
        let own = usize::from(matches!(self.texture, NodeTexture::Uploaded(_)));
        own + self
            .children()
            .map(QuadTreeNode::resident_textures)
            .sum::<usize>()
    }

    /// Create quadrant `index` if missing and return it.
    ///
    /// Quadrant `i` sits at `(x + (i & 1) * half, z + (i >> 1) * half)`.
    /// Returns `None` for leaves (level 0) and out-of-range indices.
    pub fn init_child(&mut self, index: usize, settings: &LodSettings) -> Option<&mut QuadTreeNode> {
        if index >= 4 {
            return None;
        }
        let key = self.key.child(index, self.size as u64)?;
        let child = self.children[index]
            .get_or_insert_with(|| Box::new(QuadTreeNode::new(key, settings)));
        Some(&mut **child)
    }

    /// One frame of not being used.
    ///
    /// Ages the whole subtree. Once the node has gone `time_to_live` frames
    /// without use, its texture and children are released. Returns the
    /// number of textures released.
    pub fn age(&mut self, source: &mut dyn PatchSource, time_to_live: u32) -> usize {
        self.frames_since_use = self.frames_since_use.saturating_add(1);
        let mut released = 0;
        for child in self.children.iter_mut().flatten() {
            released += child.age(source, time_to_live);
        }
        if self.frames_since_use >= time_to_live {
            released += self.evict(source);
        }
        released
    }

    /// Release this node's texture and drop its children.
    pub fn release(&mut self, source: &mut dyn PatchSource) -> usize {
        self.evict(source)
    }

    fn evict(&mut self, source: &mut dyn PatchSource) -> usize {
        let mut released = 0;
        for slot in &mut self.children {
            if let Some(mut child) = slot.take() {
                released += child.evict(source);
            }
        }
        match self.texture {
            NodeTexture::Uploaded(_) => {
                trace!(key = %self.key, "evicting patch texture");
                source.release(self.key);
                released += 1;
            }
            NodeTexture::Pending => source.release(self.key),
            NodeTexture::Unloaded | NodeTexture::Unavailable => {}
        }
        self.texture = NodeTexture::Unloaded;
        released
    }

    /// Pick the texture to draw this node with.
    ///
    /// The node's own texture wins. Otherwise the source is polled without
    /// blocking and `inherited`, the nearest ancestor's texture mapped to
    /// this node's quadrant, is used meanwhile.
    pub fn select_texture(
        &mut self,
        camera: DVec3,
        source: &mut dyn PatchSource,
        inherited: TextureBinding,
        settings: &LodSettings,
    ) -> TextureBinding {
        match self.texture {
            NodeTexture::Uploaded(id) => TextureBinding::own(id),
            NodeTexture::Unavailable => inherited,
            NodeTexture::Unloaded | NodeTexture::Pending => {
                let priority = compute_priority(self.bounds.distance_to(camera), self.key.level);
                match source.request(self.key, priority) {
                    PatchStatus::Ready(data) => {
                        self.texture = NodeTexture::Uploaded(data.texture);
                        self.set_heights(data.heights, settings);
                        TextureBinding::own(data.texture)
                    }
                    PatchStatus::Pending => {
                        self.texture = NodeTexture::Pending;
                        inherited
                    }
                    PatchStatus::Unavailable => {
                        self.texture = NodeTexture::Unavailable;
                        inherited
                    }
                }
            }
        }
    }

    /// Rebuild the bounding volume around a new height range.
    pub fn set_heights(&mut self, heights: Interval, settings: &LodSettings) {
        self.heights = heights;
        self.bounds = SpherizedAabb::new(
            &local_box(self.key, self.size, heights),
            self.key.face,
            settings.mapper(),
        );
    }

    pub(crate) fn select(&mut self, ctx: &mut Selection<'_>, inherited: TextureBinding) {
        ctx.stats.visited += 1;
        let time_to_live = ctx.settings.time_to_live();

        if !self.bounds.collides_with_frustum(ctx.frustum) {
            ctx.stats.culled += 1;
            ctx.stats.released += self.age(ctx.source, time_to_live);
            return;
        }

        self.mark_used();
        let binding = self.select_texture(ctx.camera, ctx.source, inherited, ctx.settings);

        let level = self.key.level;
        let range = Sphere::new(ctx.camera, ctx.settings.ranges().range(level));
        let refine = level > 0
            && self.texture != NodeTexture::Pending
            && self.bounds.collides_with_sphere(&range);

        if !refine {
            ctx.batch.add(self.render_record(binding));
            ctx.stats.selected += 1;
            for child in self.children.iter_mut().flatten() {
                ctx.stats.released += child.age(ctx.source, time_to_live);
            }
            return;
        }

        ctx.stats.descended += 1;
        for index in 0..4 {
            let child_binding = binding.child(index);
            if let Some(child) = self.init_child(index, ctx.settings) {
                child.select(ctx, child_binding);
            }
        }
    }

    fn render_record(&self, binding: TextureBinding) -> RenderRecord {
        RenderRecord {
            face: self.key.face,
            offset: self.origin(),
            scale: self.size,
            level: self.key.level,
            texture: binding.texture,
            texture_info: binding.info,
        }
    }
}

fn local_box(key: PatchKey, size: f64, heights: Interval) -> Aabb {
    let (x, z) = (key.x as f64, key.z as f64);
    Aabb::new(
        DVec3::new(x, heights.min, z),
        DVec3::new(x + size, heights.max, z + size),
    )
}
