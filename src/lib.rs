#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use core::{Aabb, Frustum, Handle, HandlePool, MaterialHandle, MeshHandle, ShaderHandle, TextureHandle};
pub use errors::{DuskError, Result};
pub use renderer::{FrameContext, RenderCommand, RenderQueue, Renderer, RendererSettings};
pub use resources::{Material, MeshVertex, RawMesh, ResourceRegistry};
pub use resources::primitives::*;
pub use scene::{Camera, DirectionalLight, MeshRenderer, RenderSystem, Scene, Transform, World};
