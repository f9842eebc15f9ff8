//! Face-local to sphere mapping.
//!
//! A face-local point `(x, height, z)` with `x, z` in `[0, face_size]` is
//! first placed on the `[-1, 1]` cube through the face's axis table, then
//! pushed onto the unit sphere with the Everitt mapping and finally scaled
//! by `sphere_radius + height`.

use glam::DVec3;

use crate::{Aabb, CubeFace};

/// Analytic cube-to-sphere mapping (Everitt/Mathworld).
///
/// ```text
/// sx = x * sqrt(1 - y²/2 - z²/2 + y²z²/3)
/// sy = y * sqrt(1 - x²/2 - z²/2 + x²z²/3)
/// sz = z * sqrt(1 - x²/2 - y²/2 + x²y²/3)
/// ```
///
/// The radicands are clamped to `[0, 1]`, so inputs slightly off the cube
/// never produce NaN.
#[inline]
#[must_use]
pub fn cubify(cube_point: DVec3) -> DVec3 {
    let x2 = cube_point.x * cube_point.x;
    let y2 = cube_point.y * cube_point.y;
    let z2 = cube_point.z * cube_point.z;

    DVec3::new(
        cube_point.x * warp_factor(y2, z2),
        cube_point.y * warp_factor(x2, z2),
        cube_point.z * warp_factor(x2, y2),
    )
}

#[inline]
fn warp_factor(a2: f64, b2: f64) -> f64 {
    (1.0 - a2 * 0.5 - b2 * 0.5 + a2 * b2 / 3.0)
        .clamp(0.0, 1.0)
        .sqrt()
}

/// Maps face-local points and boxes onto the sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeSphereMapper {
    face_size: f64,
    sphere_radius: f64,
}

impl CubeSphereMapper {
    /// Create a mapper for faces of side `face_size` (local units) and a
    /// sphere of radius `sphere_radius`.
    #[must_use]
    pub fn new(face_size: f64, sphere_radius: f64) -> Self {
        Self {
            face_size,
            sphere_radius,
        }
    }

    /// Side length of a face in local units.
    #[must_use]
    pub fn face_size(&self) -> f64 {
        self.face_size
    }

    /// Radius of the zero-height surface.
    #[must_use]
    pub fn sphere_radius(&self) -> f64 {
        self.sphere_radius
    }

    /// Place the face-local `(x, z)` of `local` on the `[-1, 1]` cube.
    #[must_use]
    pub fn to_unit_cube(&self, local: DVec3, face: CubeFace) -> DVec3 {
        let half = self.face_size * 0.5;
        let s = (local.x - half) / half;
        let t = (local.z - half) / half;
        face.swizzle().apply(DVec3::new(s, 1.0, t))
    }

    /// Unit direction from the sphere center through face-local `(x, z)`.
    #[must_use]
    pub fn direction(&self, x: f64, z: f64, face: CubeFace) -> DVec3 {
        cubify(self.to_unit_cube(DVec3::new(x, 0.0, z), face))
    }

    /// Map a face-local point `(x, height, z)` to its position on the sphere.
    #[must_use]
    pub fn map_point(&self, local: DVec3, face: CubeFace) -> DVec3 {
        cubify(self.to_unit_cube(local, face)) * (self.sphere_radius + local.y)
    }

    /// Conservative world-space box around the image of a face-local box.
    ///
    /// Every point of `local` maps inside the returned box. The bound is
    /// computed with interval arithmetic over the cubify formula, so it is
    /// sound for boxes straddling the face center as well.
    #[must_use]
    pub fn map_box(&self, local: &Aabb, face: CubeFace) -> Aabb {
        let a = self.to_unit_cube(local.min, face).to_array();
        let b = self.to_unit_cube(local.max, face).to_array();

        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        let mut sq_lo = [0.0; 3];
        let mut sq_hi = [0.0; 3];
        for i in 0..3 {
            lo[i] = a[i].min(b[i]);
            hi[i] = a[i].max(b[i]);
            let (l2, h2) = (lo[i] * lo[i], hi[i] * hi[i]);
            sq_lo[i] = if lo[i] <= 0.0 && hi[i] >= 0.0 {
                0.0
            } else {
                l2.min(h2)
            };
            sq_hi[i] = l2.max(h2);
        }

        let r0 = self.sphere_radius + local.min.y;
        let r1 = self.sphere_radius + local.max.y;

        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            let j = (i + 1) % 3;
            let k = (i + 2) % 3;
            // The warp factor decreases in both squared arguments.
            let f_min = warp_factor(sq_hi[j], sq_hi[k]);
            let f_max = warp_factor(sq_lo[j], sq_lo[k]);
            let (u_min, u_max) = product_range(lo[i], hi[i], f_min, f_max);
            let (w_min, w_max) = product_range(u_min, u_max, r0, r1);
            min[i] = w_min;
            max[i] = w_max;
        }

        Aabb {
            min: DVec3::from_array(min),
            max: DVec3::from_array(max),
        }
    }
}

/// Range of `x * y` for `x` in `[a0, a1]` and `y` in `[b0, b1]`.
#[inline]
fn product_range(a0: f64, a1: f64, b0: f64, b1: f64) -> (f64, f64) {
    let p = [a0 * b0, a0 * b1, a1 * b0, a1 * b1];
    let min = p.iter().copied().fold(f64::INFINITY, f64::min);
    let max = p.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}
