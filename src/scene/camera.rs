use glam::{Mat4, Vec3};

/// Perspective camera. Its position is the entity's [`Transform`](super::Transform) position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// The first primary camera found drives the frame.
    pub primary: bool,
    /// World-space point the camera looks at.
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: 60.0,
            near: 0.1,
            far: 1000.0,
            primary: false,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn new_perspective(fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            near,
            far,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[must_use]
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        self.target = target;
        self.up = up;
        self
    }

    /// Right-handed view matrix from `position` towards `target`.
    #[must_use]
    pub fn view_matrix(&self, position: Vec3) -> Mat4 {
        let forward = self.target - position;
        let target = if forward.length_squared() < 1e-12 {
            position + Vec3::NEG_Z
        } else {
            self.target
        };
        Mat4::look_at_rh(position, target, self.up)
    }

    /// `[0, 1]` depth-range perspective projection.
    #[must_use]
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }
}
