//! Per-draw descriptors produced by scene traversal.

use glam::{Mat4, Vec3};

use super::uniforms::{MaterialData, PerObjectData};
use crate::core::TextureHandle;

/// Everything a pass needs to issue one draw, fully resolved.
///
/// Texture handles are never null: unset material slots have already been
/// replaced by the registry's defaults. Commands live for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCommand {
    // === Geometry (shared mega-buffer) ===
    pub index_count: u32,
    pub base_vertex: i32,
    pub base_index: u32,

    // === Transform ===
    pub model_matrix: Mat4,
    /// Inverse-transpose of `model_matrix`.
    pub normal_matrix: Mat4,

    // === Material ===
    pub albedo_texture: TextureHandle,
    pub normal_texture: TextureHandle,
    pub metallic_roughness_texture: TextureHandle,
    pub albedo_factor: Vec3,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub opacity: f32,

    // === Flags & sorting ===
    pub casts_shadow: bool,
    pub transparent: bool,
    pub distance_to_camera: f32,
}

impl Default for RenderCommand {
    fn default() -> Self {
        Self {
            index_count: 0,
            base_vertex: 0,
            base_index: 0,
            model_matrix: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
            albedo_texture: TextureHandle::INVALID,
            normal_texture: TextureHandle::INVALID,
            metallic_roughness_texture: TextureHandle::INVALID,
            albedo_factor: Vec3::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.5,
            opacity: 1.0,
            casts_shadow: true,
            transparent: false,
            distance_to_camera: 0.0,
        }
    }
}

impl RenderCommand {
    /// World-space origin of the model.
    #[inline]
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        self.model_matrix.w_axis.truncate()
    }

    #[inline]
    #[must_use]
    pub fn index_range(&self) -> std::ops::Range<u32> {
        self.base_index..self.base_index + self.index_count
    }

    #[must_use]
    pub fn object_data(&self) -> PerObjectData {
        PerObjectData {
            model: self.model_matrix,
            normal_matrix: self.normal_matrix,
        }
    }

    #[must_use]
    pub fn material_data(&self) -> MaterialData {
        MaterialData {
            albedo_factor: self.albedo_factor,
            metallic_factor: self.metallic_factor,
            roughness_factor: self.roughness_factor,
            opacity: self.opacity,
            ..MaterialData::default()
        }
    }

    /// Key for caching the material bind group of this draw.
    #[inline]
    #[must_use]
    pub fn texture_key(&self) -> [TextureHandle; 3] {
        [
            self.albedo_texture,
            self.normal_texture,
            self.metallic_roughness_texture,
        ]
    }
}
