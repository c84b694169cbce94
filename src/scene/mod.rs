//! Scene module
//!
//! Entity storage and the per-frame systems that feed the renderer:
//! - World: entities and component columns
//! - Transform / Camera / DirectionalLight / MeshRenderer: components
//! - TransformSystem, CameraSystem, RenderSystem: per-frame systems
//! - OrbitController: camera orbit helper
//! - Scene: owns the world and runs the systems in order

pub mod camera;
pub mod camera_system;
pub mod light;
pub mod mesh_renderer;
pub mod orbit;
pub mod render_system;
pub mod scene;
pub mod transform;
pub mod transform_system;
pub mod world;

pub use camera::Camera;
pub use camera_system::{CameraSystem, FrameView};
pub use light::DirectionalLight;
pub use mesh_renderer::MeshRenderer;
pub use orbit::OrbitController;
pub use render_system::{CullStats, RenderSystem};
pub use scene::Scene;
pub use transform::Transform;
pub use transform_system::TransformSystem;
pub use world::{Component, Entity, World};
