//! Scripted camera: a slow spiral descent toward one cube face.

use glam::{DMat4, DVec3};
use orbis_config::CameraConfig;
use orbis_cubesphere::CubeFace;

/// Face the camera descends toward.
const TARGET_FACE: CubeFace = CubeFace::PosY;

pub struct ScriptedCamera {
    config: CameraConfig,
    sphere_radius: f64,
}

impl ScriptedCamera {
    pub fn new(config: CameraConfig, sphere_radius: f64) -> Self {
        Self {
            config,
            sphere_radius,
        }
    }

    /// Altitude above the base sphere on `frame`, falling geometrically from
    /// `start_altitude` to `end_altitude`.
    pub fn altitude(&self, frame: u32) -> f64 {
        let t = self.progress(frame);
        let start = self.config.start_altitude.max(1e-3);
        let end = self.config.end_altitude.max(1e-3);
        start * (end / start).powf(t)
    }

    /// Eye position relative to the planet center.
    pub fn position(&self, frame: u32) -> DVec3 {
        let angle = self.progress(frame) * std::f64::consts::TAU;
        let dir = (TARGET_FACE.normal()
            + 0.3 * angle.sin() * TARGET_FACE.tangent()
            + 0.3 * angle.cos() * TARGET_FACE.bitangent())
        .normalize();
        dir * (self.sphere_radius + self.altitude(frame))
    }

    /// Combined view-projection matrix looking at the planet center.
    pub fn view_projection(&self, frame: u32) -> DMat4 {
        let eye = self.position(frame);
        let view = DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Z);
        let proj = DMat4::perspective_rh(
            self.config.field_of_view_deg.to_radians(),
            self.config.aspect,
            self.config.near,
            self.config.far,
        );
        proj * view
    }

    fn progress(&self, frame: u32) -> f64 {
        if self.config.frames <= 1 {
            return 1.0;
        }
        (f64::from(frame) / f64::from(self.config.frames - 1)).clamp(0.0, 1.0)
    }
}
