//! View-frustum tests against world-space boxes.

use glam::{DMat4, DVec3, DVec4};

use orbis_cubesphere::Aabb;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Anything that can reject boxes lying completely outside the view.
///
/// Implementations may report false positives but never false negatives.
pub trait Frustum {
    /// Returns `true` if the box is at least partially inside.
    fn intersects_box(&self, aabb: &Aabb) -> bool;
}

/// A frustum that accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCulling;

impl Frustum for NoCulling {
    fn intersects_box(&self, _aabb: &Aabb) -> bool {
        true
    }
}

/// A view frustum defined by six inward-pointing planes extracted from
/// a view-projection matrix with `[0, 1]` clip depth.
#[derive(Clone, Debug)]
pub struct ViewFrustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `DVec4(a, b, c, d)` where `(a, b, c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [DVec4; 6],
}

impl ViewFrustum {
    /// Extract frustum planes from a combined view-projection matrix
    /// using the Griggs-Hartmann method.
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [DVec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // 0 <= z_clip <= w_clip
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }
}

impl Frustum for ViewFrustum {
    /// Positive-vertex test: for each plane, the corner furthest along the
    /// plane normal decides. Conservative near frustum corners.
    fn intersects_box(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            let p = DVec3::select(normal.cmpge(DVec3::ZERO), aabb.max, aabb.min);
            if normal.dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> DMat4 {
        let view = DMat4::look_to_rh(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y);
        let proj = DMat4::perspective_rh(std::f64::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0);
        proj * view
    }

    fn aabb(min: [f64; 3], max: [f64; 3]) -> Aabb {
        Aabb::new(DVec3::from_array(min), DVec3::from_array(max))
    }

    #[test]
    fn test_object_in_front_visible() {
        let frustum = ViewFrustum::from_view_projection(&default_camera_vp());
        assert!(frustum.intersects_box(&aabb([-1.0, -1.0, -5.0], [1.0, 1.0, -3.0])));
    }

    #[test]
    fn test_object_partially_in_frustum_is_visible() {
        let frustum = ViewFrustum::from_view_projection(&default_camera_vp());
        assert!(frustum.intersects_box(&aabb([-100.0, -1.0, -10.0], [1.0, 1.0, -5.0])));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let frustum = ViewFrustum::from_view_projection(&default_camera_vp());

        // Behind camera
        assert!(!frustum.intersects_box(&aabb([-1.0, -1.0, 5.0], [1.0, 1.0, 10.0])));
        // Far left
        assert!(!frustum.intersects_box(&aabb([-1000.0, 0.0, -5.0], [-999.0, 1.0, -4.0])));
        // Far right
        assert!(!frustum.intersects_box(&aabb([999.0, 0.0, -5.0], [1000.0, 1.0, -4.0])));
        // Far above
        assert!(!frustum.intersects_box(&aabb([0.0, 999.0, -5.0], [1.0, 1000.0, -4.0])));
        // Far below
        assert!(!frustum.intersects_box(&aabb([0.0, -1000.0, -5.0], [1.0, -999.0, -4.0])));
        // Beyond far plane
        assert!(!frustum.intersects_box(&aabb([0.0, 0.0, -2000.0], [1.0, 1.0, -1500.0])));
    }

    #[test]
    fn test_planes_are_normalized() {
        let frustum = ViewFrustum::from_view_projection(&default_camera_vp());
        for plane in &frustum.planes {
            let len = plane.truncate().length();
            assert!((len - 1.0).abs() < 1e-9, "plane normal not normalized: {len}");
        }
    }

    #[test]
    fn test_no_culling_accepts_everything() {
        assert!(NoCulling.intersects_box(&aabb([1e9, 1e9, 1e9], [2e9, 2e9, 2e9])));
    }
}
