//! Conservative collision tests for curved terrain patches.
//!
//! A [`SpherizedAabb`] bounds the image of a face-local box on the
//! cube-sphere and answers sphere and frustum queries without ever reporting
//! a miss for a real overlap.

mod frustum;
mod interval;
mod spherized_aabb;

pub use frustum::{Frustum, NoCulling, ViewFrustum};
pub use interval::{EPSILON, Interval};
pub use spherized_aabb::{Side, SpherizedAabb};
