//! Patch identity, texture bindings, and the data source contract.

use std::fmt;

use glam::DVec2;

use orbis_collision::Interval;
use orbis_cubesphere::CubeFace;

/// Opaque handle of a GPU texture owned by the patch source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Where a node samples inside the texture it is bound to.
///
/// A node drawing with an ancestor's texture covers the sub-rectangle
/// `offset .. offset + scale` of it in UV space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureInfo {
    /// UV of the node's origin corner inside the bound texture.
    pub offset: DVec2,
    /// UV extent of the node inside the bound texture.
    pub scale: f64,
}

impl TextureInfo {
    /// The node's own texture, covering `[0, 1]²`.
    pub const IDENTITY: TextureInfo = TextureInfo {
        offset: DVec2::ZERO,
        scale: 1.0,
    };

    /// Sub-rectangle of quadrant `child` (0..4, x bit then z bit).
    #[must_use]
    pub fn quadrant(self, child: usize) -> Self {
        let half = self.scale * 0.5;
        Self {
            offset: self.offset + DVec2::new((child & 1) as f64, (child >> 1) as f64) * half,
            scale: half,
        }
    }
}

impl Default for TextureInfo {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A texture plus the region of it that a node samples.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TextureBinding {
    /// `None` when neither the node nor any ancestor has data yet.
    pub texture: Option<TextureId>,
    /// Region of `texture` covered by the node.
    pub info: TextureInfo,
}

impl TextureBinding {
    /// No texture available.
    pub const NONE: TextureBinding = TextureBinding {
        texture: None,
        info: TextureInfo::IDENTITY,
    };

    /// A node's own texture.
    pub fn own(texture: TextureId) -> Self {
        Self {
            texture: Some(texture),
            info: TextureInfo::IDENTITY,
        }
    }

    /// The binding inherited by quadrant `child`.
    #[must_use]
    pub fn child(self, child: usize) -> Self {
        match self.texture {
            Some(_) => Self {
                texture: self.texture,
                info: self.info.quadrant(child),
            },
            None => Self::NONE,
        }
    }
}

/// Identifies one quadtree node: face, level, and origin in face-local units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchKey {
    /// Cube face the node lies on.
    pub face: CubeFace,
    /// LOD level; leaves are 0, face roots are the max level.
    pub level: u8,
    /// Local x of the node's origin corner.
    pub x: u64,
    /// Local z of the node's origin corner.
    pub z: u64,
}

impl PatchKey {
    /// Key of the root of `face`.
    pub fn root(face: CubeFace, max_level: u8) -> Self {
        Self {
            face,
            level: max_level,
            x: 0,
            z: 0,
        }
    }

    /// Key of quadrant `child` of a node with side length `size`.
    ///
    /// Returns `None` at level 0.
    pub fn child(self, child: usize, size: u64) -> Option<Self> {
        let level = self.level.checked_sub(1)?;
        let half = size / 2;
        Some(Self {
            face: self.face,
            level,
            x: self.x + (child & 1) as u64 * half,
            z: self.z + (child >> 1) as u64 * half,
        })
    }
}

/// Formats as the patch's relative resource path, `face/level/x_z`.
impl fmt::Display for PatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}_{}", self.face, self.level, self.x, self.z)
    }
}

/// A patch whose data reached the GPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchData {
    /// Handle of the uploaded texture.
    pub texture: TextureId,
    /// Height range of the patch, used to tighten its bounding volume.
    pub heights: Interval,
}

/// Outcome of a non-blocking patch request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PatchStatus {
    /// Requested and on its way; ask again next frame.
    Pending,
    /// Uploaded and ready to draw.
    Ready(PatchData),
    /// The source has no data for this patch.
    Unavailable,
}

/// Height-map loading and GPU texture management.
///
/// `request` must never block. Calling it again for a patch that is already
/// pending only refreshes its priority.
pub trait PatchSource {
    /// Ask for the texture of `key`. Higher `priority` is served first.
    fn request(&mut self, key: PatchKey, priority: f64) -> PatchStatus;

    /// Drop the texture of `key`, or cancel its pending request.
    fn release(&mut self, key: PatchKey);
}
