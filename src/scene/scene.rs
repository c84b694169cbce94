//! Scene: the world plus the systems that run on it every frame.

use glam::{UVec2, Vec3};

use super::camera::Camera;
use super::camera_system::{CameraSystem, FrameView};
use super::light::DirectionalLight;
use super::mesh_renderer::MeshRenderer;
use super::orbit::OrbitController;
use super::transform::Transform;
use super::transform_system::TransformSystem;
use super::world::{Entity, World};
use crate::resources::primitives::{create_box, create_plane};
use crate::resources::{Material, ResourceRegistry};

#[derive(Debug, Default)]
pub struct Scene {
    pub world: World,
    /// Drives the primary camera when set.
    pub orbit: Option<OrbitController>,
    camera_entity: Option<Entity>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a primary camera at `position`.
    pub fn spawn_camera(&mut self, position: Vec3, camera: Camera) -> Entity {
        let entity = self.world.spawn();
        self.world.add(entity, Transform::from_position(position));
        self.world.add(entity, Camera { primary: true, ..camera });
        self.camera_entity = Some(entity);
        entity
    }

    pub fn spawn_light(&mut self, light: DirectionalLight) -> Entity {
        let entity = self.world.spawn();
        self.world.add(entity, light);
        entity
    }

    pub fn spawn_mesh(&mut self, transform: Transform, renderer: MeshRenderer) -> Entity {
        let entity = self.world.spawn();
        self.world.add(entity, transform);
        self.world.add(entity, renderer);
        entity
    }

    /// First directional light in the world, or the default light.
    #[must_use]
    pub fn light(&self) -> DirectionalLight {
        self.world
            .iter::<DirectionalLight>()
            .next()
            .map(|(_, light)| *light)
            .unwrap_or_default()
    }

    pub fn light_mut(&mut self) -> Option<&mut DirectionalLight> {
        self.world.iter_mut::<DirectionalLight>().next().map(|(_, light)| light)
    }

    #[must_use]
    pub fn camera_entity(&self) -> Option<Entity> {
        self.camera_entity
    }

    /// Runs orbit control, transforms and the camera system.
    ///
    /// `None` when the world has no primary camera.
    pub fn update(&mut self, time: f32, delta_time: f32, viewport: UVec2) -> Option<FrameView> {
        if let (Some(orbit), Some(entity)) = (self.orbit.as_mut(), self.camera_entity) {
            let camera = self.world.get::<Camera>(entity).copied();
            let transform = self.world.get::<Transform>(entity).cloned();
            if let (Some(mut camera), Some(mut transform)) = (camera, transform) {
                orbit.update(&mut transform, &mut camera, delta_time);
                self.world.add(entity, camera);
                self.world.add(entity, transform);
            }
        }

        TransformSystem::update(&mut self.world);
        CameraSystem::update(&self.world, viewport, time, delta_time)
    }

    /// A lit PBR box on a ground plane, an orbiting camera and a warm sun.
    pub fn setup_orbit_box_demo(&mut self, registry: &mut ResourceRegistry) {
        let cube = registry.add_mesh(&create_box(0.5));
        let ground = registry.add_mesh(&create_plane(5.0, 1));

        let box_material = registry.create_material(
            Material::default()
                .with_albedo(Vec3::new(0.9, 0.35, 0.2))
                .with_metallic_roughness(0.1, 0.4),
        );
        let ground_material = registry.create_material(
            Material::default().with_metallic_roughness(0.0, 0.8),
        );
        let glass = registry.create_material(
            Material::default()
                .with_albedo(Vec3::new(0.3, 0.6, 1.0))
                .transparent(0.4),
        );

        self.spawn_mesh(Transform::default(), MeshRenderer::new(cube).with_material(box_material));
        self.spawn_mesh(
            Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
            MeshRenderer::new(ground).with_material(ground_material),
        );
        self.spawn_mesh(
            Transform::from_position(Vec3::new(1.2, 0.0, 0.6)).with_scale(Vec3::splat(0.6)),
            MeshRenderer::new(cube).with_material(glass).with_shadows(false),
        );

        let orbit = OrbitController::default();
        self.spawn_camera(orbit.eye(), Camera::new_perspective(60.0, 0.1, 1000.0));
        self.orbit = Some(orbit);

        self.spawn_light(DirectionalLight::new(
            Vec3::new(0.4, -0.8, 0.4),
            Vec3::new(1.0, 0.95, 0.85),
            4.0,
        ));
    }
}
