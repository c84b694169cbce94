//! Orbit camera controller.
//!
//! Keeps a camera on a sphere around a target point. Input is fed as plain
//! deltas (degrees, scroll steps) so the controller works with any windowing
//! layer.

use glam::{Vec2, Vec3};

use super::camera::Camera;
use super::transform::Transform;

#[derive(Debug, Clone)]
pub struct OrbitController {
    /// Degrees around +Y.
    pub yaw: f32,
    /// Degrees above the horizon, clamped to avoid flipping over the pole.
    pub pitch: f32,
    pub radius: f32,
    pub target: Vec3,

    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the pending rotation kept each 60 Hz tick; `0.0` disables damping.
    pub damping: f32,

    pub pending: Vec2,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            yaw: 30.0,
            pitch: 20.0,
            radius: 3.5,
            target: Vec3::ZERO,
            zoom_speed: 0.1,
            min_distance: 0.5,
            max_distance: 100.0,
            damping: 0.0,
            pending: Vec2::ZERO,
        }
    }
}

impl OrbitController {
    const PITCH_LIMIT: f32 = 89.0;

    /// Queues a rotation in degrees.
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.pending += Vec2::new(delta_yaw, delta_pitch);
    }

    /// Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        let scale = (1.0 - self.zoom_speed).powf(steps.abs());
        if steps > 0.0 {
            self.radius *= scale;
        } else {
            self.radius /= scale;
        }
        self.radius = self.radius.clamp(self.min_distance, self.max_distance);
    }

    /// World-space eye position for the current angles.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.target
            + self.radius * Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }

    /// Applies queued input and moves the camera entity.
    pub fn update(&mut self, transform: &mut Transform, camera: &mut Camera, delta_time: f32) {
        let applied = if self.damping > 0.0 {
            let retention = self.damping.powf(delta_time * 60.0);
            let applied = self.pending * (1.0 - retention);
            self.pending *= retention;
            applied
        } else {
            std::mem::take(&mut self.pending)
        };

        self.yaw = (self.yaw + applied.x).rem_euclid(360.0);
        self.pitch = (self.pitch + applied.y).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);

        transform.set_position(self.eye());
        camera.target = self.target;
        camera.up = Vec3::Y;
    }
}
