//! Bounding volume for the image of a face-local box on the cube-sphere.
//!
//! The volume combines three conservative bounds:
//! - four side planes (separating axes) built from the mapped box corners,
//!   each with the range of the curved patch projected onto it,
//! - the radial shell `[R + min_height, R + max_height]`,
//! - a world-space AABB from [`CubeSphereMapper::map_box`].
//!
//! A query only reports a miss when one of them separates, so a miss is
//! always real.

use glam::DVec3;

use orbis_cubesphere::{Aabb, CubeFace, CubeSphereMapper, Sphere};

use crate::{EPSILON, Frustum, Interval};

/// Lattice resolution per footprint axis used to sample side extents.
const EXTENT_SAMPLES: usize = 5;

// Corner labels of the local box. A-D lie on the max-x side, E-H on min-x.
const A: usize = 0; // (max, max, min)
const B: usize = 1; // (max, max, max)
const C: usize = 2; // (max, min, max)
const D: usize = 3; // (max, min, min)
const E: usize = 4; // (min, max, min)
const F: usize = 5; // (min, max, max)
const G: usize = 6; // (min, min, max)
const H: usize = 7; // (min, min, min)

/// Edge pairs `(a, b, c, d)` whose cross product `(v[a]-v[b]) x (v[c]-v[d])`
/// gives each side's normal.
const SIDE_EDGES: [[usize; 4]; 4] = [[G, C, B, C], [C, D, A, D], [D, H, E, H], [H, G, F, G]];

/// The four lateral sides of a patch volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Max-z side.
    Front = 0,
    /// Max-x side.
    Right = 1,
    /// Min-z side.
    Back = 2,
    /// Min-x side.
    Left = 3,
}

impl Side {
    /// All sides in separating-axis test order.
    pub const ALL: [Side; 4] = [Side::Front, Side::Right, Side::Back, Side::Left];
}

/// Conservative bounding volume of a face-local box after spherization.
#[derive(Clone, Debug)]
pub struct SpherizedAabb {
    normals: [DVec3; 4],
    extents: [Interval; 4],
    radial: Interval,
    sphere_box: Aabb,
}

impl SpherizedAabb {
    /// Build the volume for `local` (components `(x, height, z)`) on `face`.
    pub fn new(local: &Aabb, face: CubeFace, mapper: &CubeSphereMapper) -> Self {
        let (lo, hi) = (local.min, local.max);
        let labelled = [
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(lo.x, lo.y, lo.z),
        ];
        let corners = labelled.map(|p| mapper.map_point(p, face));
        let normals = SIDE_EDGES.map(|[a, b, c, d]| side_normal(&corners, a, b, c, d));

        let r0 = mapper.sphere_radius() + lo.y;
        let r1 = mapper.sphere_radius() + hi.y;
        let lattice = DirectionLattice::sample(local, face, mapper);
        let pad = 0.25 * r0.abs().max(r1.abs()) * lattice.max_chord * lattice.max_chord;
        let extents = normals.map(|n| lattice.project(n, r0, r1, pad));

        Self {
            normals,
            extents,
            radial: Interval::new(r0, r1),
            sphere_box: mapper.map_box(local, face),
        }
    }

    /// Unit normal of `side`, or zero when its edges are degenerate.
    pub fn normal(&self, side: Side) -> DVec3 {
        self.normals[side as usize]
    }

    /// World-space box enclosing the patch.
    pub fn sphere_box(&self) -> &Aabb {
        &self.sphere_box
    }

    /// Returns `false` only when the sphere provably misses the patch.
    pub fn collides_with_sphere(&self, sphere: &Sphere) -> bool {
        for (normal, extent) in self.normals.iter().zip(&self.extents) {
            let projected = Interval::around(normal.dot(sphere.center), sphere.radius);
            if !projected.intersects(extent) {
                return false;
            }
        }

        let radial = Interval::around(sphere.center.length(), sphere.radius);
        if !radial.intersects(&self.radial) {
            return false;
        }

        self.sphere_box.intersects_sphere(sphere)
    }

    /// Returns `false` only when the patch lies completely outside `frustum`.
    pub fn collides_with_frustum(&self, frustum: &dyn Frustum) -> bool {
        frustum.intersects_box(&self.sphere_box)
    }

    /// Lower bound on the distance from `point` to the patch.
    pub fn distance_to(&self, point: DVec3) -> f64 {
        self.sphere_box
            .distance_to_point(point)
            .max(self.radial.distance_to(point.length()))
    }
}

fn side_normal(v: &[DVec3; 8], a: usize, b: usize, c: usize, d: usize) -> DVec3 {
    let e1 = v[a] - v[b];
    let e2 = v[c] - v[d];
    if e1.length() < EPSILON || e2.length() < EPSILON {
        return DVec3::ZERO;
    }
    e1.cross(e2).normalize_or_zero()
}

/// Unit directions over an evenly spaced lattice of the box footprint.
struct DirectionLattice {
    directions: [[DVec3; EXTENT_SAMPLES]; EXTENT_SAMPLES],
    /// Longest chord between lattice neighbours (axis and diagonal).
    max_chord: f64,
}

impl DirectionLattice {
    fn sample(local: &Aabb, face: CubeFace, mapper: &CubeSphereMapper) -> Self {
        let steps = (EXTENT_SAMPLES - 1) as f64;
        let size = local.max - local.min;
        let mut directions = [[DVec3::ZERO; EXTENT_SAMPLES]; EXTENT_SAMPLES];
        for (i, row) in directions.iter_mut().enumerate() {
            let x = local.min.x + size.x * i as f64 / steps;
            for (j, dir) in row.iter_mut().enumerate() {
                let z = local.min.z + size.z * j as f64 / steps;
                *dir = mapper.direction(x, z, face);
            }
        }

        let mut max_chord: f64 = 0.0;
        for i in 0..EXTENT_SAMPLES {
            for j in 0..EXTENT_SAMPLES {
                let here = directions[i][j];
                if i + 1 < EXTENT_SAMPLES {
                    max_chord = max_chord.max((here - directions[i + 1][j]).length());
                }
                if j + 1 < EXTENT_SAMPLES {
                    max_chord = max_chord.max((here - directions[i][j + 1]).length());
                }
                if i + 1 < EXTENT_SAMPLES && j + 1 < EXTENT_SAMPLES {
                    max_chord = max_chord.max((here - directions[i + 1][j + 1]).length());
                }
            }
        }

        Self {
            directions,
            max_chord,
        }
    }

    /// Range of `r * dir . normal` over the lattice and both radii, widened
    /// by `pad` for the curvature between samples.
    fn project(&self, normal: DVec3, r0: f64, r1: f64, pad: f64) -> Interval {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for dir in self.directions.iter().flatten() {
            let d = dir.dot(normal);
            for r in [r0, r1] {
                min = min.min(r * d);
                max = max.max(r * d);
            }
        }
        Interval {
            min: min - pad,
            max: max + pad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoCulling, ViewFrustum};
    use glam::DMat4;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    fn local_box(x: f64, z: f64, size: f64, h0: f64, h1: f64) -> Aabb {
        Aabb::new(DVec3::new(x, h0, z), DVec3::new(x + size, h1, z + size))
    }

    /// Every mapped interior point must collide with a zero-radius sphere.
    #[test]
    fn test_interior_points_always_collide() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(4);
        for (node_dim, max_level, radius) in [(16.0, 6, 512.0), (16.0, 4, 100.0), (32.0, 8, 4000.0)] {
            let face_size: f64 = node_dim * 2f64.powi(max_level);
            let mapper = CubeSphereMapper::new(face_size, radius);
            for _ in 0..300 {
                let face = CubeFace::ALL[rng.gen_range(0..6)];
                let level = rng.gen_range(0..=max_level);
                let size = node_dim * 2f64.powi(level);
                let cells = (face_size / size) as u32;
                let x = f64::from(rng.gen_range(0..cells)) * size;
                let z = f64::from(rng.gen_range(0..cells)) * size;
                let h0 = rng.gen_range(-10.0..10.0);
                let h1 = h0 + rng.gen_range(0.0..30.0);
                let local = local_box(x, z, size, h0, h1);
                let volume = SpherizedAabb::new(&local, face, &mapper);
                for _ in 0..8 {
                    let p = DVec3::new(
                        rng.gen_range(x..=x + size),
                        rng.gen_range(h0..=h1),
                        rng.gen_range(z..=z + size),
                    );
                    let q = mapper.map_point(p, face);
                    assert!(
                        volume.collides_with_sphere(&Sphere::new(q, 0.0)),
                        "{face:?} level {level} at ({x}, {z}): {p:?} -> {q:?} missed"
                    );
                }
            }
        }
    }

    #[test]
    fn test_far_sphere_does_not_collide() {
        let mapper = CubeSphereMapper::new(64.0, 32.0);
        let volume = SpherizedAabb::new(&local_box(0.0, 0.0, 16.0, 0.0, 4.0), CubeFace::PosX, &mapper);
        // Other side of the planet.
        assert!(!volume.collides_with_sphere(&Sphere::new(DVec3::new(-40.0, 0.0, 0.0), 5.0)));
        // Straight above the patch but well beyond its radial shell.
        let above = mapper.map_point(DVec3::new(8.0, 200.0, 8.0), CubeFace::PosX);
        assert!(!volume.collides_with_sphere(&Sphere::new(above, 10.0)));
        assert!(volume.collides_with_sphere(&Sphere::new(above, 200.0)));
    }

    /// Sides of a box with real height get unit normals.
    #[test]
    fn test_normals_are_unit_for_solid_boxes() {
        let mapper = CubeSphereMapper::new(64.0, 32.0);
        let volume = SpherizedAabb::new(&local_box(16.0, 16.0, 16.0, -2.0, 6.0), CubeFace::NegY, &mapper);
        for side in Side::ALL {
            let len = volume.normal(side).length();
            assert!((len - 1.0).abs() < 1e-9, "{side:?}: {len}");
        }
    }

    /// A flat box has degenerate side edges: its normals collapse to zero and
    /// those axes never separate, leaving the radial and box tests in charge.
    #[test]
    fn test_degenerate_edges_fall_back_to_zero_normal() {
        let mapper = CubeSphereMapper::new(64.0, 32.0);
        let volume = SpherizedAabb::new(&local_box(0.0, 0.0, 32.0, 0.0, 0.0), CubeFace::PosZ, &mapper);
        for side in Side::ALL {
            assert_eq!(volume.normal(side), DVec3::ZERO, "{side:?}");
            let extent = volume.extents[side as usize];
            assert!(extent.intersects(&Interval::around(0.0, 0.0)));
        }
        let on_patch = mapper.map_point(DVec3::new(10.0, 0.0, 20.0), CubeFace::PosZ);
        assert!(volume.collides_with_sphere(&Sphere::new(on_patch, 0.0)));
        assert!(!volume.collides_with_sphere(&Sphere::new(-on_patch, 1.0)));
    }

    #[test]
    fn test_radial_extent_and_sphere_box() {
        let mapper = CubeSphereMapper::new(64.0, 100.0);
        let local = local_box(0.0, 32.0, 32.0, -5.0, 10.0);
        let volume = SpherizedAabb::new(&local, CubeFace::PosY, &mapper);
        assert_eq!(volume.radial, Interval::new(95.0, 110.0));
        assert_eq!(*volume.sphere_box(), mapper.map_box(&local, CubeFace::PosY));
        for x in [local.min.x, local.max.x] {
            for y in [local.min.y, local.max.y] {
                for z in [local.min.z, local.max.z] {
                    let corner = mapper.map_point(DVec3::new(x, y, z), CubeFace::PosY);
                    assert!(volume.sphere_box().contains(corner));
                }
            }
        }
    }

    #[test]
    fn test_distance_is_lower_bound() {
        let mapper = CubeSphereMapper::new(64.0, 32.0);
        let volume = SpherizedAabb::new(&local_box(0.0, 0.0, 32.0, 0.0, 0.0), CubeFace::PosX, &mapper);
        let on_patch = mapper.map_point(DVec3::new(16.0, 0.0, 16.0), CubeFace::PosX);
        assert_eq!(volume.distance_to(on_patch), 0.0);

        let above = mapper.map_point(DVec3::new(16.0, 50.0, 16.0), CubeFace::PosX);
        let d = volume.distance_to(above);
        assert!(d > 0.0);
        assert!(d <= (above - on_patch).length() + 1e-9);
    }

    #[test]
    fn test_frustum_uses_sphere_box() {
        let mapper = CubeSphereMapper::new(64.0, 32.0);
        let volume = SpherizedAabb::new(&local_box(16.0, 16.0, 32.0, 0.0, 0.0), CubeFace::PosZ, &mapper);
        assert!(volume.collides_with_frustum(&NoCulling));

        let eye = DVec3::new(0.0, 0.0, 100.0);
        let proj = DMat4::perspective_rh(std::f64::consts::FRAC_PI_4, 1.0, 0.1, 1000.0);
        let facing = ViewFrustum::from_view_projection(&(proj * DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Y)));
        assert!(volume.collides_with_frustum(&facing));

        let away = ViewFrustum::from_view_projection(
            &(proj * DMat4::look_at_rh(eye, DVec3::new(0.0, 0.0, 200.0), DVec3::Y)),
        );
        assert!(!volume.collides_with_frustum(&away));
    }
}
