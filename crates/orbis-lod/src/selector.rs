//! Per-frame LOD selection over the six face quadtrees.

use glam::DVec3;
use tracing::{debug, info};

use orbis_collision::Frustum;
use orbis_cubesphere::CubeFace;

use crate::node::Selection;
use crate::{LodSettings, PatchKey, PatchSource, QuadTreeNode, RenderBatch, TextureBinding};

/// Counters for one selection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Nodes reached by the recursion.
    pub visited: usize,
    /// Nodes rejected by the frustum.
    pub culled: usize,
    /// Nodes appended to the batch.
    pub selected: usize,
    /// Nodes refined into their children.
    pub descended: usize,
    /// Textures released by aging.
    pub released: usize,
}

/// Owns the six face quadtrees and runs the selection pass.
pub struct LodSelector {
    settings: LodSettings,
    roots: Vec<QuadTreeNode>,
    frame: u64,
}

impl LodSelector {
    /// Create a selector with one unloaded root per face.
    pub fn new(settings: LodSettings) -> Self {
        let roots = build_roots(&settings);
        Self {
            settings,
            roots,
            frame: 0,
        }
    }

    /// Settings the current trees were built with.
    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// Root of `face`.
    pub fn root(&self, face: CubeFace) -> &QuadTreeNode {
        &self.roots[face.index()]
    }

    /// Nodes currently held across all faces.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(QuadTreeNode::node_count).sum()
    }

    /// Uploaded textures currently held across all faces.
    pub fn resident_textures(&self) -> usize {
        self.roots.iter().map(QuadTreeNode::resident_textures).sum()
    }

    /// Select the patches to draw from `camera` and append them to `batch`.
    ///
    /// The batch is cleared first. Nodes that are culled, or left unvisited
    /// below a selected node, are aged and may release their data.
    pub fn select_nodes(
        &mut self,
        camera: DVec3,
        frustum: &dyn Frustum,
        source: &mut dyn PatchSource,
        batch: &mut RenderBatch,
    ) -> SelectionStats {
        batch.clear();
        self.frame += 1;

        let mut ctx = Selection {
            camera,
            frustum,
            source,
            batch,
            settings: &self.settings,
            stats: SelectionStats::default(),
        };
        for root in &mut self.roots {
            root.select(&mut ctx, TextureBinding::NONE);
        }

        let stats = ctx.stats;
        debug!(
            frame = self.frame,
            visited = stats.visited,
            culled = stats.culled,
            selected = stats.selected,
            descended = stats.descended,
            released = stats.released,
            "LOD selection"
        );
        stats
    }

    /// Switch to new settings between frames.
    ///
    /// Range and time-to-live changes apply in place. Geometry changes
    /// release everything and rebuild the trees. Returns whether the trees
    /// were rebuilt.
    pub fn apply_settings(&mut self, settings: LodSettings, source: &mut dyn PatchSource) -> bool {
        let rebuild = !self.settings.same_geometry(&settings);
        self.settings = settings;
        if rebuild {
            let released = self.release_all(source);
            self.roots = build_roots(&self.settings);
            info!(
                released,
                max_level = self.settings.max_level(),
                face_size = self.settings.face_size(),
                "LOD trees rebuilt for new settings"
            );
        }
        rebuild
    }

    /// Release every texture and collapse each face to its root.
    pub fn release_all(&mut self, source: &mut dyn PatchSource) -> usize {
        self.roots.iter_mut().map(|root| root.release(source)).sum()
    }
}

fn build_roots(settings: &LodSettings) -> Vec<QuadTreeNode> {
    CubeFace::ALL
        .iter()
        .map(|&face| QuadTreeNode::new(PatchKey::root(face, settings.max_level()), settings))
        .collect()
}
