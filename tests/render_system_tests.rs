//! RenderSystem Tests
//!
//! Tests for:
//! - End-to-end gather: camera + box produces one command
//! - Frustum culling statistics
//! - Hidden entities, transparent routing, default texture fallback
//! - Camera system without a primary camera

use glam::{UVec2, Vec2, Vec3};

use dusk::core::{MaterialHandle, TextureHandle};
use dusk::renderer::RenderQueue;
use dusk::resources::{Material, MeshVertex, RawMesh, ResourceRegistry};
use dusk::scene::{Camera, CullStats, FrameView, MeshRenderer, RenderSystem, Scene, Transform};
use dusk::create_box;

const VIEWPORT: UVec2 = UVec2::new(800, 600);

struct Fixture {
    registry: ResourceRegistry,
    scene: Scene,
    cube: dusk::MeshHandle,
}

/// Camera at `(0, 0, 3)` looking at the origin, 60° FOV, near 0.1, far 100.
fn fixture() -> Fixture {
    let mut registry = ResourceRegistry::new();
    let cube = registry.add_mesh(&create_box(0.5));
    let mut scene = Scene::new();
    scene.spawn_camera(Vec3::new(0.0, 0.0, 3.0), Camera::new_perspective(60.0, 0.1, 100.0));
    Fixture { registry, scene, cube }
}

fn gather(f: &mut Fixture, queue: &mut RenderQueue) -> (CullStats, FrameView) {
    let view = f.scene.update(0.0, 0.016, VIEWPORT).expect("scene has a primary camera");
    let stats = RenderSystem::gather_commands(&f.scene.world, &f.registry, queue, view.camera_position, &view.frustum);
    (stats, view)
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn single_box_in_view_produces_one_command() {
    let mut f = fixture();
    f.scene.spawn_mesh(Transform::default(), MeshRenderer::new(f.cube));

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);

    assert_eq!(
        stats,
        CullStats {
            total: 1,
            culled: 0,
            visible: 1
        }
    );
    assert_eq!(queue.opaque_commands().len(), 1);

    let cmd = &queue.opaque_commands()[0];
    assert!((cmd.distance_to_camera - 3.0).abs() < 1e-5);
    assert_eq!(cmd.index_count, 36);
    assert_eq!(cmd.base_vertex, 0);
    assert!(cmd.casts_shadow);
    assert!(!cmd.transparent);
}

#[test]
fn frame_view_matches_camera() {
    let mut f = fixture();
    let mut queue = RenderQueue::new();
    let (_, view) = gather(&mut f, &mut queue);

    assert_eq!(view.camera_position, Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(view.frame.resolution, Vec2::new(800.0, 600.0));
    let roundtrip = view.frame.view_projection * view.frame.inverse_view_projection;
    assert!(roundtrip.abs_diff_eq(glam::Mat4::IDENTITY, 1e-3));
}

#[test]
fn box_outside_frustum_is_culled() {
    let mut f = fixture();
    f.scene.spawn_mesh(Transform::default(), MeshRenderer::new(f.cube));
    f.scene
        .spawn_mesh(Transform::from_position(Vec3::new(100.0, 0.0, 0.0)), MeshRenderer::new(f.cube));
    f.scene
        .spawn_mesh(Transform::from_position(Vec3::new(0.0, 0.0, 10.0)), MeshRenderer::new(f.cube));

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.culled, 2);
    assert_eq!(stats.visible, 1);
    assert_eq!(queue.len(), 1);
    assert!((stats.culled_ratio() - 2.0 / 3.0).abs() < 1e-6);
}

#[test]
fn hidden_entities_are_not_counted() {
    let mut f = fixture();
    let hidden = MeshRenderer {
        visible: false,
        ..MeshRenderer::new(f.cube)
    };
    f.scene.spawn_mesh(Transform::default(), hidden);

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);

    assert_eq!(stats, CullStats::default());
    assert!(queue.is_empty());
}

#[test]
fn degenerate_bounds_are_never_culled() {
    let mut f = fixture();
    let point = RawMesh::new(vec![MeshVertex::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO, Vec3::X)], vec![0, 0, 0]);
    let mesh = f.registry.add_mesh(&point);
    f.scene
        .spawn_mesh(Transform::from_position(Vec3::new(500.0, 0.0, 0.0)), MeshRenderer::new(mesh));

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);

    assert_eq!(stats.culled, 0);
    assert_eq!(stats.visible, 1);
}

#[test]
fn entities_without_mesh_renderer_are_ignored() {
    let mut f = fixture();
    let entity = f.scene.world.spawn();
    f.scene.world.add(entity, Transform::default());

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);
    assert_eq!(stats.total, 0);
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn missing_material_uses_default_textures() {
    let mut f = fixture();
    f.scene.spawn_mesh(Transform::default(), MeshRenderer::new(f.cube));

    let mut queue = RenderQueue::new();
    gather(&mut f, &mut queue);

    let cmd = queue.opaque_commands()[0];
    assert_eq!(cmd.albedo_texture, f.registry.default_albedo());
    assert_eq!(cmd.normal_texture, f.registry.default_normal());
    assert_eq!(cmd.metallic_roughness_texture, f.registry.default_metallic_roughness());
    assert_eq!(cmd.albedo_factor, Vec3::ONE);
    assert_eq!(cmd.roughness_factor, 0.5);
}

#[test]
fn stale_texture_slot_falls_back_to_default() {
    let mut f = fixture();
    let material = f.registry.create_material(Material {
        albedo_texture: Some(TextureHandle::from_raw_parts(77, 0)),
        ..Material::default().with_albedo(Vec3::new(1.0, 0.0, 0.0))
    });
    f.scene
        .spawn_mesh(Transform::default(), MeshRenderer::new(f.cube).with_material(material));

    let mut queue = RenderQueue::new();
    gather(&mut f, &mut queue);

    let cmd = queue.opaque_commands()[0];
    assert_eq!(cmd.albedo_texture, f.registry.default_albedo());
    assert_eq!(cmd.albedo_factor, Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn stale_material_falls_back_to_default_material() {
    let mut f = fixture();
    let renderer = MeshRenderer::new(f.cube).with_material(MaterialHandle::from_raw_parts(9, 3));
    f.scene.spawn_mesh(Transform::default(), renderer);

    let mut queue = RenderQueue::new();
    let (stats, _) = gather(&mut f, &mut queue);

    assert_eq!(stats.visible, 1);
    assert_eq!(queue.opaque_commands()[0].albedo_factor, Vec3::ONE);
}

#[test]
fn transparent_material_routes_to_transparent_queue() {
    let mut f = fixture();
    let glass = f.registry.create_material(Material::default().transparent(0.25));
    f.scene
        .spawn_mesh(Transform::default(), MeshRenderer::new(f.cube).with_material(glass));

    let mut queue = RenderQueue::new();
    gather(&mut f, &mut queue);

    assert!(queue.opaque_commands().is_empty());
    assert_eq!(queue.transparent_commands().len(), 1);
    assert_eq!(queue.transparent_commands()[0].opacity, 0.25);
}

#[test]
fn shadow_flag_is_carried_through() {
    let mut f = fixture();
    f.scene
        .spawn_mesh(Transform::default(), MeshRenderer::new(f.cube).with_shadows(false));

    let mut queue = RenderQueue::new();
    gather(&mut f, &mut queue);

    assert!(!queue.opaque_commands()[0].casts_shadow);
    assert_eq!(queue.shadow_casters().count(), 0);
}

// ============================================================================
// Determinism & Failure Modes
// ============================================================================

#[test]
fn gather_is_deterministic() {
    let mut f = fixture();
    for x in [-1.0, 0.0, 1.0] {
        f.scene
            .spawn_mesh(Transform::from_position(Vec3::new(x, 0.0, 0.0)), MeshRenderer::new(f.cube));
    }

    let mut first = RenderQueue::new();
    let mut second = RenderQueue::new();
    gather(&mut f, &mut first);
    gather(&mut f, &mut second);

    assert_eq!(first.opaque_commands(), second.opaque_commands());
}

#[test]
fn scene_without_camera_yields_no_frame() {
    let mut scene = Scene::new();
    scene.spawn_mesh(Transform::default(), MeshRenderer::new(dusk::MeshHandle::INVALID));
    assert!(scene.update(0.0, 0.016, VIEWPORT).is_none());
}

#[test]
#[should_panic(expected = "invalid")]
fn stale_mesh_handle_panics() {
    let mut f = fixture();
    f.scene.spawn_mesh(
        Transform::default(),
        MeshRenderer::new(dusk::MeshHandle::from_raw_parts(42, 0)),
    );
    let mut queue = RenderQueue::new();
    gather(&mut f, &mut queue);
}
