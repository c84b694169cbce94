//! Frustum and AABB Tests
//!
//! Tests for:
//! - Plane extraction from a view-projection matrix (unit normals)
//! - Conservative AABB containment under model transforms
//! - Sphere containment
//! - Aabb construction, expansion and transformation

use glam::{Mat4, Vec3};

use dusk::core::{Aabb, Frustum};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

/// Camera at `(0, 0, 5)` looking down -Z, 90° vertical FOV.
fn make_test_frustum() -> Frustum {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 100.0);
    Frustum::from_view_projection(projection * view)
}

fn unit_cube() -> Aabb {
    Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
}

// ============================================================================
// Plane Extraction
// ============================================================================

#[test]
fn planes_have_unit_normals() {
    let frustum = make_test_frustum();
    for plane in frustum.planes() {
        assert!(approx(plane.truncate().length(), 1.0), "plane {plane:?}");
    }
}

#[test]
fn planes_have_unit_normals_for_off_axis_cameras() {
    let eyes = [
        Vec3::new(10.0, 3.0, -4.0),
        Vec3::new(-2.0, 8.0, 1.0),
        Vec3::new(0.5, -6.0, 0.5),
    ];
    for eye in eyes {
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(45f32.to_radians(), 16.0 / 9.0, 0.5, 250.0);
        let frustum = Frustum::from_view_projection(projection * view);
        for plane in frustum.planes() {
            assert!(approx(plane.truncate().length(), 1.0));
        }
    }
}

#[test]
fn planes_from_orthographic_projection_are_normalized() {
    let view = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.1), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::orthographic_rh(-8.0, 8.0, -8.0, 8.0, 0.1, 20.0);
    let frustum = Frustum::from_view_projection(projection * view);
    for plane in frustum.planes() {
        assert!(approx(plane.truncate().length(), 1.0));
    }
}

// ============================================================================
// AABB Containment
// ============================================================================

#[test]
fn aabb_inside() {
    let frustum = make_test_frustum();
    assert!(frustum.contains_aabb(&unit_cube(), &Mat4::IDENTITY));
}

#[test]
fn aabb_far_to_the_side_is_outside() {
    let frustum = make_test_frustum();
    let model = Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));
    assert!(!frustum.contains_aabb(&unit_cube(), &model));
}

#[test]
fn aabb_behind_camera_is_outside() {
    let frustum = make_test_frustum();
    let model = Mat4::from_translation(Vec3::new(0.0, 0.0, 20.0));
    assert!(!frustum.contains_aabb(&unit_cube(), &model));
}

#[test]
fn aabb_beyond_far_plane_is_outside() {
    let frustum = make_test_frustum();
    let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -200.0));
    assert!(!frustum.contains_aabb(&unit_cube(), &model));
}

#[test]
fn aabb_straddling_a_plane_is_kept() {
    let frustum = make_test_frustum();
    // At distance 5 the half-width of a 90° frustum is 5; the box spans x = 4.5..5.5.
    let model = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
    assert!(frustum.contains_aabb(&unit_cube(), &model));
}

#[test]
fn aabb_scaled_into_view_is_kept() {
    let frustum = make_test_frustum();
    // Centre is outside, but the scaled box reaches back into the frustum.
    let model = Mat4::from_scale_rotation_translation(
        Vec3::splat(20.0),
        glam::Quat::IDENTITY,
        Vec3::new(12.0, 0.0, 0.0),
    );
    assert!(frustum.contains_aabb(&unit_cube(), &model));
}

// ============================================================================
// Sphere Containment
// ============================================================================

#[test]
fn sphere_inside() {
    let frustum = make_test_frustum();
    assert!(frustum.contains_sphere(Vec3::ZERO, 1.0));
}

#[test]
fn sphere_outside_left() {
    let frustum = make_test_frustum();
    assert!(!frustum.contains_sphere(Vec3::new(-100.0, 0.0, 0.0), 1.0));
}

#[test]
fn sphere_outside_behind() {
    let frustum = make_test_frustum();
    assert!(!frustum.contains_sphere(Vec3::new(0.0, 0.0, 50.0), 1.0));
}

#[test]
fn sphere_straddling_boundary() {
    let frustum = make_test_frustum();
    assert!(frustum.contains_sphere(Vec3::new(5.5, 0.0, 0.0), 1.0));
}

// ============================================================================
// Aabb
// ============================================================================

#[test]
fn aabb_from_points() {
    let aabb = Aabb::from_points([
        Vec3::new(1.0, -2.0, 0.0),
        Vec3::new(-1.0, 4.0, 3.0),
        Vec3::new(0.0, 0.0, -5.0),
    ]);
    assert!(vec3_approx(aabb.min, Vec3::new(-1.0, -2.0, -5.0)));
    assert!(vec3_approx(aabb.max, Vec3::new(1.0, 4.0, 3.0)));
}

#[test]
fn aabb_empty_is_invalid_and_degenerate() {
    let aabb = Aabb::from_points(std::iter::empty());
    assert!(!aabb.is_valid());
    assert!(aabb.is_degenerate());
}

#[test]
fn aabb_single_point_is_degenerate() {
    let aabb = Aabb::from_points([Vec3::ONE]);
    assert!(aabb.is_valid());
    assert!(aabb.is_degenerate());
}

#[test]
fn aabb_flat_plane_is_not_degenerate() {
    let aabb = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
    assert!(!aabb.is_degenerate());
}

#[test]
fn aabb_expand_never_shrinks() {
    let mut aabb = unit_cube();
    aabb.expand_point(Vec3::ZERO);
    assert_eq!(aabb, unit_cube());

    aabb.expand_aabb(&Aabb::EMPTY);
    assert_eq!(aabb, unit_cube());

    aabb.expand_point(Vec3::new(2.0, 0.0, 0.0));
    assert!(approx(aabb.max.x, 2.0));
    assert!(approx(aabb.min.x, -0.5));
}

#[test]
fn aabb_corners_cover_both_extremes() {
    let corners = unit_cube().corners();
    assert!(corners.contains(&Vec3::splat(-0.5)));
    assert!(corners.contains(&Vec3::splat(0.5)));
    assert_eq!(corners.len(), 8);
}

#[test]
fn aabb_transformed_by_rotation_grows() {
    let rotated = unit_cube().transformed(&Mat4::from_rotation_y(45f32.to_radians()));
    let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
    assert!(approx(rotated.max.x, half_diagonal));
    assert!(approx(rotated.max.y, 0.5));
    assert!(vec3_approx(rotated.center(), Vec3::ZERO));
}
