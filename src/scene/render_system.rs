//! Render System
//!
//! Walks every entity that has both a [`Transform`] and a [`MeshRenderer`],
//! culls it against the camera frustum and turns the survivors into
//! [`RenderCommand`]s.
//!
//! # Per-entity Steps
//!
//! 1. Hidden (`visible == false`): skipped, not counted.
//! 2. Counted in `total`; the mesh is resolved (a stale handle panics).
//! 3. World-space AABB test; outside means `culled` and no command.
//! 4. Material textures are resolved, unset or stale slots fall back to the
//!    registry defaults.
//! 5. Camera distance from the world translation becomes the sort key and the
//!    command is submitted.
//!
//! Output depends only on world, registry and camera state.

use glam::Vec3;

use super::mesh_renderer::MeshRenderer;
use super::transform::Transform;
use super::world::World;
use crate::core::{Frustum, TextureHandle};
use crate::renderer::command::RenderCommand;
use crate::renderer::queue::RenderQueue;
use crate::resources::{Material, ResourceRegistry};

/// Entity counts of one gather.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Visible-flagged entities considered.
    pub total: u32,
    /// Rejected by the frustum.
    pub culled: u32,
    /// Submitted to the queue.
    pub visible: u32,
}

impl CullStats {
    #[must_use]
    pub fn culled_ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.culled as f32 / self.total as f32
        }
    }
}

pub struct RenderSystem;

impl RenderSystem {
    pub fn gather_commands(
        world: &World,
        registry: &ResourceRegistry,
        queue: &mut RenderQueue,
        camera_position: Vec3,
        frustum: &Frustum,
    ) -> CullStats {
        let mut stats = CullStats::default();
        let default_material = Material::default();

        for (_, transform, renderer) in world.join::<Transform, MeshRenderer>() {
            if !renderer.visible {
                continue;
            }

            let mesh = registry.mesh(renderer.mesh);
            let model = *transform.world_matrix();

            stats.total += 1;

            // Meshes without extent have nothing to test; never cull them.
            if !mesh.local_bounds.is_degenerate() && !frustum.contains_aabb(&mesh.local_bounds, &model) {
                stats.culled += 1;
                continue;
            }

            stats.visible += 1;

            let material = renderer
                .material
                .and_then(|h| registry.try_material(h))
                .unwrap_or(&default_material);

            let resolve = |slot: Option<TextureHandle>, fallback: TextureHandle| {
                slot.filter(|&h| registry.is_texture_valid(h)).unwrap_or(fallback)
            };

            let command = RenderCommand {
                index_count: mesh.index_count,
                base_vertex: mesh.base_vertex,
                base_index: mesh.base_index,
                model_matrix: model,
                normal_matrix: model.inverse().transpose(),
                albedo_texture: resolve(material.albedo_texture, registry.default_albedo()),
                normal_texture: resolve(material.normal_texture, registry.default_normal()),
                metallic_roughness_texture: resolve(
                    material.metallic_roughness_texture,
                    registry.default_metallic_roughness(),
                ),
                albedo_factor: material.albedo_factor,
                metallic_factor: material.metallic_factor,
                roughness_factor: material.roughness_factor,
                opacity: material.opacity,
                casts_shadow: renderer.casts_shadow,
                transparent: material.is_transparent(),
                distance_to_camera: transform.world_position().distance(camera_position),
            };

            queue.submit(command);
        }

        if stats.culled > 0 {
            log::trace!(
                "RenderSystem: {}/{} meshes culled ({:.0}%)",
                stats.culled,
                stats.total,
                stats.culled_ratio() * 100.0
            );
        }

        stats
    }
}
