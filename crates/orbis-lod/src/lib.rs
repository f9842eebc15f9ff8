//! Continuous distance-adaptive LOD (CDLOD) selection over the six faces of a
//! cube-sphere.
//!
//! Each face is a quadtree whose root covers the whole face at the coarsest
//! level. Every frame [`LodSelector::select_nodes`] walks the trees, culls
//! against the view frustum, refines nodes the camera is close to, streams
//! patch data with ancestor fallback, and appends the chosen patches to a
//! [`RenderBatch`]. Nodes that go unused for too long release their data.

mod batch;
mod node;
mod priority_queue;
mod selector;
mod settings;
mod texture;

pub use batch::{InstanceData, InstancedRenderer, RenderBatch, RenderRecord};
pub use node::{NodeTexture, QuadTreeNode};
pub use priority_queue::{UploadQueue, compute_priority};
pub use selector::{LodSelector, SelectionStats};
pub use settings::{DEFAULT_TIME_TO_LIVE, LodRanges, LodSettings};
pub use texture::{
    PatchData, PatchKey, PatchSource, PatchStatus, TextureBinding, TextureId, TextureInfo,
};
