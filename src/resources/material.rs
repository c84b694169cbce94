//! PBR material parameters.

use glam::Vec3;

use crate::core::TextureHandle;

/// How a surface composites with what is behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Written to the G-buffer and lit by the deferred lighting pass.
    #[default]
    Opaque,
    /// Forward-lit and blended over the lit image, sorted back-to-front.
    Blend,
}

/// Metallic-roughness material.
///
/// Texture slots left as `None` fall back to the registry's default textures
/// when draw commands are assembled: white albedo, flat normal and the
/// neutral ORM texture (R = occlusion, G = roughness, B = metallic).
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub albedo_texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub metallic_roughness_texture: Option<TextureHandle>,

    pub albedo_factor: Vec3,
    pub metallic_factor: f32,
    pub roughness_factor: f32,

    /// Only meaningful with [`AlphaMode::Blend`].
    pub opacity: f32,
    pub alpha_mode: AlphaMode,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_texture: None,
            normal_texture: None,
            metallic_roughness_texture: None,
            albedo_factor: Vec3::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.5,
            opacity: 1.0,
            alpha_mode: AlphaMode::Opaque,
        }
    }
}

impl Material {
    #[must_use]
    pub fn with_albedo(mut self, color: Vec3) -> Self {
        self.albedo_factor = color;
        self
    }

    #[must_use]
    pub fn with_metallic_roughness(mut self, metallic: f32, roughness: f32) -> Self {
        self.metallic_factor = metallic;
        self.roughness_factor = roughness;
        self
    }

    /// Switches to [`AlphaMode::Blend`] with the given opacity.
    #[must_use]
    pub fn transparent(mut self, opacity: f32) -> Self {
        self.alpha_mode = AlphaMode::Blend;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.alpha_mode == AlphaMode::Blend
    }
}
