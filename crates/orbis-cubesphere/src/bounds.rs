//! Axis-aligned boxes and spheres in f64 space.
//!
//! The same [`Aabb`] type is used for face-local boxes, where the components
//! are `(x, height, z)`, and for world-space bounds around mapped patches.

use glam::DVec3;

/// An axis-aligned bounding box with `min <= max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the box.
    pub min: DVec3,
    /// Maximum corner of the box.
    pub max: DVec3,
}

/// A sphere given by center and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: DVec3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl Aabb {
    /// Create a box spanning two arbitrary corners.
    ///
    /// The components are reordered so that `min <= max`.
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Whether `point` lies inside or on the boundary of the box.
    #[must_use]
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// The point of the box closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: DVec3) -> DVec3 {
        point.clamp(self.min, self.max)
    }

    /// Euclidean distance from `point` to the box (zero inside).
    #[must_use]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        (point - self.closest_point(point)).length()
    }

    /// Whether the sphere touches or overlaps the box.
    #[must_use]
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point(sphere.center);
        (sphere.center - closest).length_squared() <= sphere.radius * sphere.radius
    }
}

impl Sphere {
    /// Create a sphere.
    #[must_use]
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }
}
