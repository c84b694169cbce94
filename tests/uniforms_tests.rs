//! Uniform Contract Tests
//!
//! Tests for:
//! - Host struct sizes and field offsets matching the WGSL blocks
//! - Derived per-frame matrices
//! - Frame context and shadow light-space construction

use std::mem::{offset_of, size_of};

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use dusk::renderer::passes::shadow::light_space_matrix;
use dusk::renderer::{FrameContext, MaterialData, PerFrameData, PerObjectData, ShadowData, ShadowSettings};
use dusk::scene::DirectionalLight;

// ============================================================================
// Layout
// ============================================================================

#[test]
fn uniform_sizes_are_sixteen_byte_multiples() {
    assert_eq!(size_of::<PerFrameData>(), 288);
    assert_eq!(size_of::<PerObjectData>(), 128);
    assert_eq!(size_of::<ShadowData>(), 96);
    assert_eq!(size_of::<MaterialData>(), 32);

    for size in [
        size_of::<PerFrameData>(),
        size_of::<PerObjectData>(),
        size_of::<ShadowData>(),
        size_of::<MaterialData>(),
    ] {
        assert_eq!(size % 16, 0);
    }
}

#[test]
fn vec3_fields_start_on_sixteen_byte_boundaries() {
    assert_eq!(offset_of!(PerFrameData, camera_position) % 16, 0);
    assert_eq!(offset_of!(ShadowData, light_direction) % 16, 0);
    assert_eq!(offset_of!(ShadowData, light_color) % 16, 0);
    assert_eq!(offset_of!(MaterialData, albedo_factor), 0);
    // Scalars pack into the tail of the preceding vec3.
    assert_eq!(offset_of!(MaterialData, metallic_factor), 12);
    assert_eq!(offset_of!(ShadowData, light_intensity), 92);
}

#[test]
fn frame_data_bytes_follow_field_order() {
    let data = PerFrameData {
        time: 4.5,
        resolution: Vec2::new(640.0, 480.0),
        ..PerFrameData::default()
    };
    let bytes = bytemuck::bytes_of(&data);
    let floats: &[f32] = bytemuck::cast_slice(bytes);

    assert_eq!(floats[272 / 4], 640.0);
    assert_eq!(floats[276 / 4], 480.0);
    assert_eq!(floats[280 / 4], 4.5);
}

// ============================================================================
// Derived Data
// ============================================================================

#[test]
fn per_frame_new_derives_view_projection_and_inverse() {
    let view = Mat4::look_at_rh(Vec3::new(2.0, 3.0, 4.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 50.0);
    let data = PerFrameData::new(view, projection, Vec3::new(2.0, 3.0, 4.0), Vec2::new(1.0, 1.0), 0.0, 0.0);

    assert!(data.view_projection.abs_diff_eq(projection * view, 1e-6));
    assert!((data.view_projection * data.inverse_view_projection).abs_diff_eq(Mat4::IDENTITY, 1e-3));
}

#[test]
fn frame_context_normalizes_light_direction() {
    let light = DirectionalLight {
        direction: Vec3::new(0.0, -4.0, 0.0),
        color: Vec3::new(1.0, 0.5, 0.25),
        intensity: 2.0,
    };
    let ctx = FrameContext {
        light,
        ..FrameContext::default()
    };
    let shadow = ctx.shadow_data();

    assert!((shadow.light_direction - Vec3::NEG_Y).length() < 1e-6);
    assert_eq!(shadow.light_color, Vec3::new(1.0, 0.5, 0.25));
    assert_eq!(shadow.light_intensity, 2.0);
}

#[test]
fn zero_light_direction_falls_back_to_straight_down() {
    let ctx = FrameContext {
        light: DirectionalLight {
            direction: Vec3::ZERO,
            ..DirectionalLight::default()
        },
        ..FrameContext::default()
    };
    assert_eq!(ctx.shadow_data().light_direction, Vec3::NEG_Y);
}

// ============================================================================
// Light Space
// ============================================================================

#[test]
fn origin_maps_to_shadow_map_centre() {
    let settings = ShadowSettings::default();
    let m = light_space_matrix(Vec3::new(1.0, -2.0, 1.0), &settings);
    let clip = m * Vec3::ZERO.extend(1.0);
    let ndc = clip.xyz() / clip.w;

    assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    // Eye sits at depth / 2, so the origin lands half-way through the depth range.
    let expected = (settings.depth * 0.5 - 0.1) / (settings.depth - 0.1);
    assert!((ndc.z - expected).abs() < 1e-4);
}

#[test]
fn light_volume_spans_extent() {
    let settings = ShadowSettings {
        extent: 4.0,
        ..ShadowSettings::default()
    };
    // Straight down: up vector switches to X, world X maps to light-space Y.
    let m = light_space_matrix(Vec3::NEG_Y, &settings);
    let edge = m * Vec3::new(4.0, 0.0, 0.0).extend(1.0);

    assert!((edge.y.abs() - 1.0).abs() < 1e-5, "{edge:?}");
    assert!(edge.x.abs() < 1e-5);
    assert!(m.is_finite());
}

#[test]
fn degenerate_light_direction_still_builds_a_matrix() {
    let m = light_space_matrix(Vec3::ZERO, &ShadowSettings::default());
    assert!(m.is_finite());
    assert_eq!(m, light_space_matrix(Vec3::NEG_Y, &ShadowSettings::default()));
}
