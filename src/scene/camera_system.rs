//! Camera System
//!
//! Finds the primary camera and derives the per-frame uniform block and the
//! culling frustum from it. A world without a primary camera produces no
//! frame; callers skip rendering for that tick.

use glam::{UVec2, Vec2, Vec3};

use super::camera::Camera;
use super::transform::Transform;
use super::world::World;
use crate::core::Frustum;
use crate::renderer::uniforms::PerFrameData;

/// Camera-derived data for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView {
    pub frame: PerFrameData,
    pub frustum: Frustum,
    pub camera_position: Vec3,
}

pub struct CameraSystem;

impl CameraSystem {
    #[must_use]
    pub fn update(world: &World, viewport: UVec2, time: f32, delta_time: f32) -> Option<FrameView> {
        let (_, transform, camera) = world
            .join::<Transform, Camera>()
            .find(|(_, _, camera)| camera.primary)?;

        let aspect = if viewport.y > 0 {
            viewport.x as f32 / viewport.y as f32
        } else {
            1.0
        };

        let position = transform.position;
        let frame = PerFrameData::new(
            camera.view_matrix(position),
            camera.projection_matrix(aspect),
            position,
            Vec2::new(viewport.x as f32, viewport.y as f32),
            time,
            delta_time,
        );

        Some(FrameView {
            frustum: Frustum::from_view_projection(frame.view_projection),
            camera_position: position,
            frame,
        })
    }
}
