//! CPU-side resources and their registry.
//!
//! Nothing in this module touches the GPU directly:
//! - Mesh: vertex format, CPU meshes, mega-buffer slices
//! - MeshBuffer: the append-only geometry allocator
//! - Image / Texture: decoded pixels with mip chains
//! - Material: metallic-roughness parameters
//! - Shader: include preprocessing and hot-reload bookkeeping
//! - ResourceRegistry: owns all of the above behind generation-checked handles

pub mod image;
pub mod material;
pub mod mesh;
pub mod mesh_buffer;
pub mod mesh_loader;
pub mod primitives;
pub mod registry;
pub mod shader;
pub mod shader_preprocessor;
pub mod texture;

pub use image::Image;
pub use material::{AlphaMode, Material};
pub use mesh::{GpuMesh, MeshVertex, RawMesh};
pub use mesh_buffer::{MAX_INDICES, MAX_VERTICES, MeshAllocation, MeshBuffer, PendingUpload};
pub use mesh_loader::MeshLoader;
pub use registry::ResourceRegistry;
pub use shader::{Shader, ShaderCompiler};
pub use shader_preprocessor::{LineDirectiveStyle, LineMap, ProcessedShader, ShaderPreprocessor, SourceLocation};
pub use texture::Texture;
