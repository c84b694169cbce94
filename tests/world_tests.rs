//! World & Scene System Tests
//!
//! Tests for:
//! - Entity lifecycle and component columns
//! - Joins across two component types
//! - TransformSystem dirty tracking
//! - Camera selection and orbit control

use glam::{Mat4, UVec2, Vec3};

use dusk::scene::{
    Camera, CameraSystem, DirectionalLight, MeshRenderer, OrbitController, Scene, Transform, TransformSystem,
    World,
};

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

// ============================================================================
// Entities & Components
// ============================================================================

#[test]
fn spawn_add_get() {
    let mut world = World::new();
    let e = world.spawn();
    world.add(e, Transform::from_position(Vec3::X));

    assert!(world.is_alive(e));
    assert!(world.has::<Transform>(e));
    assert!(!world.has::<Camera>(e));
    assert_eq!(world.get::<Transform>(e).map(|t| t.position), Some(Vec3::X));
}

#[test]
fn add_replaces_existing_component() {
    let mut world = World::new();
    let e = world.spawn();
    world.add(e, Transform::from_position(Vec3::X));
    world.add(e, Transform::from_position(Vec3::Y));

    assert_eq!(world.iter::<Transform>().count(), 1);
    assert_eq!(world.get::<Transform>(e).map(|t| t.position), Some(Vec3::Y));
}

#[test]
fn remove_detaches_one_component() {
    let mut world = World::new();
    let e = world.spawn();
    world.add(e, Transform::default());
    world.add(e, DirectionalLight::default());

    assert!(world.remove::<DirectionalLight>(e).is_some());
    assert!(!world.has::<DirectionalLight>(e));
    assert!(world.has::<Transform>(e));
    assert!(world.remove::<DirectionalLight>(e).is_none());
}

#[test]
fn despawn_removes_everything_and_ids_are_not_reused() {
    let mut world = World::new();
    let old = world.spawn();
    world.add(old, Transform::default());

    assert!(world.despawn(old));
    assert!(!world.despawn(old));
    assert!(!world.is_alive(old));
    assert!(world.get::<Transform>(old).is_none());

    let new = world.spawn();
    assert_ne!(old, new);
    assert!(!world.has::<Transform>(new));
    assert_eq!(world.entity_count(), 1);
}

#[test]
#[should_panic(expected = "dead entity")]
fn add_to_dead_entity_panics() {
    let mut world = World::new();
    let e = world.spawn();
    world.despawn(e);
    world.add(e, Transform::default());
}

#[test]
fn join_yields_only_entities_with_both() {
    let mut world = World::new();
    let only_transform = world.spawn();
    world.add(only_transform, Transform::default());

    let both = world.spawn();
    world.add(both, Transform::default());
    world.add(both, MeshRenderer::new(dusk::MeshHandle::INVALID));

    let only_renderer = world.spawn();
    world.add(only_renderer, MeshRenderer::new(dusk::MeshHandle::INVALID));

    let joined: Vec<_> = world.join::<Transform, MeshRenderer>().map(|(e, _, _)| e).collect();
    assert_eq!(joined, vec![both]);
}

#[test]
fn get_mut_edits_in_place() {
    let mut world = World::new();
    let e = world.spawn();
    world.add(e, DirectionalLight::default());
    if let Some(light) = world.get_mut::<DirectionalLight>(e) {
        light.intensity = 9.0;
    }
    assert_eq!(world.get::<DirectionalLight>(e).map(|l| l.intensity), Some(9.0));
}

// ============================================================================
// TransformSystem
// ============================================================================

#[test]
fn transform_system_updates_only_dirty() {
    let mut world = World::new();
    let a = world.spawn();
    let b = world.spawn();
    world.add(a, Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
    world.add(b, Transform::default());

    assert_eq!(TransformSystem::update(&mut world), 2);
    assert_eq!(TransformSystem::update(&mut world), 0);

    if let Some(t) = world.get_mut::<Transform>(a) {
        t.set_position(Vec3::new(5.0, 0.0, 0.0));
    }
    assert_eq!(TransformSystem::update(&mut world), 1);
    assert_eq!(world.get::<Transform>(a).map(Transform::world_position), Some(Vec3::new(5.0, 0.0, 0.0)));
}

#[test]
fn world_matrix_is_translate_rotate_scale() {
    let t = Transform::from_position(Vec3::new(1.0, 0.0, 0.0))
        .with_rotation(Vec3::new(0.0, 90.0, 0.0))
        .with_scale(Vec3::splat(2.0));

    let m = t.compute_matrix();
    // +X scaled to 2, rotated 90° about Y onto -Z, then translated.
    assert!(approx_vec(m.transform_point3(Vec3::X), Vec3::new(1.0, 0.0, -2.0)));

    let expected = Mat4::from_translation(Vec3::X)
        * Mat4::from_rotation_y(90f32.to_radians())
        * Mat4::from_scale(Vec3::splat(2.0));
    assert!(m.abs_diff_eq(expected, 1e-6));
}

// ============================================================================
// Cameras
// ============================================================================

#[test]
fn camera_system_requires_a_primary_camera() {
    let mut world = World::new();
    let e = world.spawn();
    world.add(e, Transform::default());
    world.add(e, Camera::default());
    assert!(CameraSystem::update(&world, UVec2::new(10, 10), 0.0, 0.0).is_none());

    world.add(e, Camera::default().primary());
    assert!(CameraSystem::update(&world, UVec2::new(10, 10), 0.0, 0.0).is_some());
}

#[test]
fn camera_system_tolerates_zero_height_viewport() {
    let mut scene = Scene::new();
    scene.spawn_camera(Vec3::new(0.0, 0.0, 5.0), Camera::default());
    let view = scene.update(0.0, 0.0, UVec2::new(100, 0));
    assert!(view.is_some_and(|v| v.frame.projection.is_finite()));
}

#[test]
fn camera_at_target_looks_down_negative_z() {
    let camera = Camera::default();
    let view = camera.view_matrix(Vec3::ZERO);
    assert!(view.is_finite());
    assert!(approx_vec(view.transform_point3(Vec3::new(0.0, 0.0, -1.0)), Vec3::new(0.0, 0.0, -1.0)));
}

// ============================================================================
// Scene & Orbit
// ============================================================================

#[test]
fn scene_light_defaults_when_absent() {
    let scene = Scene::new();
    assert_eq!(scene.light(), DirectionalLight::default());
}

#[test]
fn orbit_moves_camera_around_target() {
    let mut scene = Scene::new();
    let orbit = OrbitController {
        yaw: 0.0,
        pitch: 0.0,
        radius: 4.0,
        ..OrbitController::default()
    };
    scene.spawn_camera(orbit.eye(), Camera::default());
    scene.orbit = Some(orbit);

    let view = scene.update(0.0, 0.016, UVec2::new(64, 64)).unwrap();
    assert!(approx_vec(view.camera_position, Vec3::new(0.0, 0.0, 4.0)));

    if let Some(orbit) = scene.orbit.as_mut() {
        orbit.rotate(90.0, 0.0);
    }
    let view = scene.update(0.016, 0.016, UVec2::new(64, 64)).unwrap();
    assert!(approx_vec(view.camera_position, Vec3::new(4.0, 0.0, 0.0)));
}

#[test]
fn orbit_pitch_is_clamped_and_zoom_bounded() {
    let mut orbit = OrbitController::default();
    let mut transform = Transform::default();
    let mut camera = Camera::default();

    orbit.rotate(0.0, 500.0);
    orbit.update(&mut transform, &mut camera, 0.016);
    assert!(orbit.pitch <= 89.0);

    for _ in 0..200 {
        orbit.zoom(1.0);
    }
    assert!((orbit.radius - orbit.min_distance).abs() < 1e-6);
}
