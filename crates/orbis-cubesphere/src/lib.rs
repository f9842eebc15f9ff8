//! Cube-sphere geometry: face orientation tables, local bounding boxes, and the
//! nonlinear mapping of face-local points and boxes onto a sphere of fixed radius.

mod bounds;
mod cube_face;
mod projection;

pub use bounds::{Aabb, Sphere};
pub use cube_face::{AxisSwizzle, CubeFace};
pub use projection::{CubeSphereMapper, cubify};
