//! GPU Uniform Data Contracts
//!
//! Host-side mirrors of the uniform blocks declared in
//! `shaders/chunks/uniforms.wgsl`. Layouts follow WGSL uniform address-space
//! rules (16-byte alignment for `vec3`, `mat4x4` and struct size) and are
//! pinned by the compile-time assertions below; a mismatch fails the build
//! instead of producing garbage on the GPU.
//!
//! # Binding Model (`@group(0)`)
//!
//! | Binding | Block            | Update rate          | Dynamic offset |
//! |---------|------------------|----------------------|----------------|
//! | 0       | [`PerFrameData`] | once per frame       | no             |
//! | 1       | [`PerObjectData`]| once per draw slot   | yes            |
//! | 2       | [`ShadowData`]   | once per frame       | no             |
//! | 3       | [`MaterialData`] | once per draw slot   | yes            |

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

pub const FRAME_BINDING: u32 = 0;
pub const OBJECT_BINDING: u32 = 1;
pub const SHADOW_BINDING: u32 = 2;
pub const MATERIAL_BINDING: u32 = 3;

/// Camera and timing data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerFrameData {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub camera_position: Vec3,
    pub _pad0: f32,
    pub resolution: Vec2,
    pub time: f32,
    pub delta_time: f32,
}

impl Default for PerFrameData {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            inverse_view_projection: Mat4::IDENTITY,
            camera_position: Vec3::ZERO,
            _pad0: 0.0,
            resolution: Vec2::ONE,
            time: 0.0,
            delta_time: 0.0,
        }
    }
}

impl PerFrameData {
    /// Fills the derived matrices from `view` and `projection`.
    #[must_use]
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3, resolution: Vec2, time: f32, delta_time: f32) -> Self {
        let view_projection = projection * view;
        Self {
            view,
            projection,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            camera_position,
            _pad0: 0.0,
            resolution,
            time,
            delta_time,
        }
    }
}

/// Model and normal matrix of one draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerObjectData {
    pub model: Mat4,
    /// Inverse-transpose of `model`.
    pub normal_matrix: Mat4,
}

impl Default for PerObjectData {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
        }
    }
}

/// Directional light and its light-space transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowData {
    pub light_space: Mat4,
    pub light_direction: Vec3,
    pub _pad0: f32,
    pub light_color: Vec3,
    pub light_intensity: f32,
}

impl Default for ShadowData {
    fn default() -> Self {
        Self {
            light_space: Mat4::IDENTITY,
            light_direction: Vec3::new(1.0, -2.0, 1.0).normalize(),
            _pad0: 0.0,
            light_color: Vec3::ONE,
            light_intensity: 3.0,
        }
    }
}

/// Scalar material factors of one draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialData {
    pub albedo_factor: Vec3,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub opacity: f32,
    pub _pad0: Vec2,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            albedo_factor: Vec3::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.5,
            opacity: 1.0,
            _pad0: Vec2::ZERO,
        }
    }
}

// ============================================================================
// Layout assertions
// ============================================================================

const _: () = {
    assert!(size_of::<PerFrameData>() == 288);
    assert!(offset_of!(PerFrameData, view) == 0);
    assert!(offset_of!(PerFrameData, projection) == 64);
    assert!(offset_of!(PerFrameData, view_projection) == 128);
    assert!(offset_of!(PerFrameData, inverse_view_projection) == 192);
    assert!(offset_of!(PerFrameData, camera_position) == 256);
    assert!(offset_of!(PerFrameData, resolution) == 272);
    assert!(offset_of!(PerFrameData, time) == 280);
    assert!(offset_of!(PerFrameData, delta_time) == 284);

    assert!(size_of::<PerObjectData>() == 128);
    assert!(offset_of!(PerObjectData, normal_matrix) == 64);

    assert!(size_of::<ShadowData>() == 96);
    assert!(offset_of!(ShadowData, light_direction) == 64);
    assert!(offset_of!(ShadowData, light_color) == 80);
    assert!(offset_of!(ShadowData, light_intensity) == 92);

    assert!(size_of::<MaterialData>() == 32);
    assert!(offset_of!(MaterialData, roughness_factor) == 16);
};
