//! Resource Registry
//!
//! Owns every CPU-side resource the renderer draws with:
//!
//! | Pool        | Handle            | Source                                  |
//! |-------------|-------------------|-----------------------------------------|
//! | meshes      | [`MeshHandle`]    | [`ResourceRegistry::load_mesh`], [`ResourceRegistry::add_mesh`] |
//! | textures    | [`TextureHandle`] | [`ResourceRegistry::load_texture`], defaults |
//! | materials   | [`MaterialHandle`]| [`ResourceRegistry::create_material`]   |
//! | shaders     | [`ShaderHandle`]  | [`ResourceRegistry::load_shader`]       |
//!
//! Mesh geometry is appended to the shared [`MeshBuffer`]; the renderer
//! drains its pending uploads once per frame.
//!
//! # Path Caching
//!
//! File-backed meshes and textures are cached by canonical path, so two
//! spellings of the same file (`a/../a/box.obj`, `./a/box.obj`) resolve to the
//! same handle and the file is imported once.
//!
//! # Shader Hot Reload
//!
//! Tracked shaders remember the modification time of every file they depend
//! on. [`ResourceRegistry::poll_shader_reload`] compares those against the
//! filesystem once per frame and recompiles changed shaders through a
//! [`ShaderCompiler`]. A failed reload keeps the previous program.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustc_hash::FxHashMap;

use super::image::Image;
use super::material::Material;
use super::mesh::{GpuMesh, RawMesh};
use super::mesh_buffer::MeshBuffer;
use super::mesh_loader::MeshLoader;
use super::shader::{Shader, ShaderCompiler};
use super::texture::Texture;
use crate::core::{
    HandlePool, MaterialHandle, MaterialTag, MeshHandle, MeshTag, ShaderHandle, ShaderTag,
    TextureHandle, TextureTag,
};
use crate::errors::{DuskError, Result};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];
/// R = occlusion 1.0, G = roughness 0.5, B = metallic 0.0
const NEUTRAL_ORM: [u8; 4] = [255, 128, 0, 255];

/// Reload bookkeeping for one tracked shader.
#[derive(Debug)]
struct ShaderRecord {
    handle: ShaderHandle,
    dependencies: Vec<PathBuf>,
    /// `None` where the file's metadata could not be read.
    timestamps: Vec<Option<SystemTime>>,
}

impl ShaderRecord {
    fn refresh(&mut self, dependencies: &[PathBuf]) {
        self.dependencies = dependencies.to_vec();
        self.timestamps = dependencies.iter().map(|p| modified_time(p)).collect();
    }

    fn is_stale(&self) -> bool {
        self.dependencies
            .iter()
            .zip(&self.timestamps)
            .any(|(path, old)| match modified_time(path) {
                // Unreadable files are ignored until they come back.
                None => false,
                Some(now) => Some(now) != *old,
            })
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn canonical(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|_| DuskError::AssetNotFound(path.to_path_buf()))
}

pub struct ResourceRegistry {
    mesh_buffer: MeshBuffer,

    meshes: HandlePool<GpuMesh, MeshTag>,
    textures: HandlePool<Texture, TextureTag>,
    materials: HandlePool<Material, MaterialTag>,
    shaders: HandlePool<Shader, ShaderTag>,

    mesh_cache: FxHashMap<PathBuf, MeshHandle>,
    texture_cache: FxHashMap<PathBuf, TextureHandle>,

    default_albedo: TextureHandle,
    default_normal: TextureHandle,
    default_metallic_roughness: TextureHandle,

    tracked_shaders: Vec<ShaderRecord>,
    last_reloaded_shader: Option<String>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    /// Creates an empty registry with the three default textures in place.
    #[must_use]
    pub fn new() -> Self {
        let mut textures = HandlePool::new();
        let default_albedo = textures.insert(Texture::new("Default Albedo", Image::solid(WHITE, true)));
        let default_normal =
            textures.insert(Texture::new("Default Normal", Image::solid(FLAT_NORMAL, false)));
        let default_metallic_roughness =
            textures.insert(Texture::new("Default ORM", Image::solid(NEUTRAL_ORM, false)));

        log::info!("ResourceRegistry: created default fallback textures");

        Self {
            mesh_buffer: MeshBuffer::new(),
            meshes: HandlePool::new(),
            textures,
            materials: HandlePool::new(),
            shaders: HandlePool::new(),
            mesh_cache: FxHashMap::default(),
            texture_cache: FxHashMap::default(),
            default_albedo,
            default_normal,
            default_metallic_roughness,
            tracked_shaders: Vec::new(),
            last_reloaded_shader: None,
        }
    }

    // ========================================================================
    // Meshes
    // ========================================================================

    /// Uploads in-memory geometry. Never cached.
    pub fn add_mesh(&mut self, raw: &RawMesh) -> MeshHandle {
        let allocation = self.mesh_buffer.upload(&raw.vertices, &raw.indices);
        self.meshes.insert(GpuMesh {
            base_vertex: allocation.base_vertex as i32,
            base_index: allocation.base_index,
            index_count: raw.indices.len() as u32,
            local_bounds: raw.local_bounds,
        })
    }

    /// Loads the first submesh of `path`, cached by canonical path.
    ///
    /// Use [`ResourceRegistry::load_all_meshes`] for multi-mesh files.
    pub fn load_mesh(&mut self, path: impl AsRef<Path>) -> Result<MeshHandle> {
        let path = path.as_ref();
        let key = canonical(path)?;
        if let Some(&handle) = self.mesh_cache.get(&key) {
            return Ok(handle);
        }

        let raws = MeshLoader::load(&key);
        let first = raws.first().ok_or_else(|| DuskError::MeshLoad {
            path: path.to_path_buf(),
            reason: "importer returned no meshes".into(),
        })?;

        let handle = self.add_mesh(first);
        self.mesh_cache.insert(key, handle);
        log::info!("Loaded mesh '{}' -> {handle:?}", path.display());
        Ok(handle)
    }

    /// Uploads every submesh of `path`. Not cached: each call uploads again.
    pub fn load_all_meshes(&mut self, path: impl AsRef<Path>) -> Result<Vec<MeshHandle>> {
        let key = canonical(path.as_ref())?;
        let raws = MeshLoader::load(&key);
        Ok(raws.iter().map(|raw| self.add_mesh(raw)).collect())
    }

    /// # Panics
    ///
    /// Panics on a stale or invalid handle.
    #[track_caller]
    #[must_use]
    pub fn mesh(&self, handle: MeshHandle) -> &GpuMesh {
        self.meshes.get(handle)
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn mesh_buffer(&self) -> &MeshBuffer {
        &self.mesh_buffer
    }

    pub fn mesh_buffer_mut(&mut self) -> &mut MeshBuffer {
        &mut self.mesh_buffer
    }

    // ========================================================================
    // Textures
    // ========================================================================

    /// Decodes an image file, cached by canonical path.
    pub fn load_texture(
        &mut self,
        path: impl AsRef<Path>,
        srgb: bool,
        generate_mipmaps: bool,
    ) -> Result<TextureHandle> {
        let path = path.as_ref();
        let key = canonical(path)?;
        if let Some(&handle) = self.texture_cache.get(&key) {
            return Ok(handle);
        }

        let image = Image::load(&key, srgb, generate_mipmaps)?;
        let label = key
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());

        let handle = self.textures.insert(Texture {
            label,
            source: Some(key.clone()),
            image,
        });
        self.texture_cache.insert(key, handle);
        log::info!("Loaded texture '{}' -> {handle:?}", path.display());
        Ok(handle)
    }

    /// Registers an in-memory image. Never cached.
    pub fn add_texture(&mut self, label: impl Into<String>, image: Image) -> TextureHandle {
        self.textures.insert(Texture::new(label, image))
    }

    #[track_caller]
    #[must_use]
    pub fn texture(&self, handle: TextureHandle) -> &Texture {
        self.textures.get(handle)
    }

    #[must_use]
    pub fn is_texture_valid(&self, handle: TextureHandle) -> bool {
        self.textures.is_valid(handle)
    }

    #[must_use]
    pub fn default_albedo(&self) -> TextureHandle {
        self.default_albedo
    }

    #[must_use]
    pub fn default_normal(&self) -> TextureHandle {
        self.default_normal
    }

    #[must_use]
    pub fn default_metallic_roughness(&self) -> TextureHandle {
        self.default_metallic_roughness
    }

    // ========================================================================
    // Materials
    // ========================================================================

    pub fn create_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    #[track_caller]
    #[must_use]
    pub fn material(&self, handle: MaterialHandle) -> &Material {
        self.materials.get(handle)
    }

    #[must_use]
    pub fn try_material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.try_get(handle)
    }

    #[track_caller]
    pub fn material_mut(&mut self, handle: MaterialHandle) -> &mut Material {
        self.materials.get_mut(handle)
    }

    // ========================================================================
    // Shaders
    // ========================================================================

    /// Preprocesses `path`. The result still has to be compiled by the renderer.
    pub fn load_shader(&mut self, label: impl Into<String>, path: impl AsRef<Path>) -> Result<ShaderHandle> {
        let shader = Shader::load(label, path)?;
        log::debug!(
            "Loaded shader '{}' ({} dependencies)",
            shader.label,
            shader.dependencies().len()
        );
        Ok(self.shaders.insert(shader))
    }

    #[track_caller]
    #[must_use]
    pub fn shader(&self, handle: ShaderHandle) -> &Shader {
        self.shaders.get(handle)
    }

    /// Starts watching the current dependency set of `handle`.
    ///
    /// Tracking the same shader twice has no further effect.
    #[track_caller]
    pub fn track_shader_for_reload(&mut self, handle: ShaderHandle) {
        if self.tracked_shaders.iter().any(|r| r.handle == handle) {
            return;
        }
        let dependencies = self.shaders.get(handle).dependencies().to_vec();
        let mut record = ShaderRecord {
            handle,
            dependencies: Vec::new(),
            timestamps: Vec::new(),
        };
        record.refresh(&dependencies);
        self.tracked_shaders.push(record);
    }

    #[must_use]
    pub fn tracked_shader_count(&self) -> usize {
        self.tracked_shaders.len()
    }

    /// Reloads every tracked shader whose dependencies changed on disk.
    ///
    /// Returns the handles that were recompiled successfully this call.
    pub fn poll_shader_reload(&mut self, compiler: &mut dyn ShaderCompiler) -> Vec<ShaderHandle> {
        let mut reloaded = Vec::new();

        for record in &mut self.tracked_shaders {
            if !record.is_stale() {
                continue;
            }

            let Some(shader) = self.shaders.try_get_mut(record.handle) else {
                continue;
            };

            log::info!("Shader source changed, reloading '{}'", shader.file_name());

            // Files the failed attempt depended on, watched alongside the
            // current set so fixing any of them triggers the next attempt.
            let mut attempted: Vec<PathBuf> = Vec::new();
            let outcome = shader.reprocess().and_then(|processed| {
                if xxhash_rust::xxh3::xxh3_128(processed.source.as_bytes()) == shader.hash {
                    // Touched but unchanged: nothing to compile.
                    return Ok(None);
                }
                let mut candidate = shader.clone();
                candidate.commit(processed);
                if let Err(err) = compiler.compile(record.handle, &candidate) {
                    attempted = candidate.dependencies().to_vec();
                    return Err(err);
                }
                Ok(Some(candidate))
            });

            match outcome {
                Ok(Some(candidate)) => {
                    *shader = candidate;
                    record.refresh(shader.dependencies());
                    self.last_reloaded_shader = Some(shader.file_name());
                    reloaded.push(record.handle);
                }
                Ok(None) => {
                    let dependencies = record.dependencies.clone();
                    record.refresh(&dependencies);
                }
                Err(err) => {
                    log::warn!(
                        "Shader reload failed for '{}', keeping previous program: {err}",
                        shader.file_name()
                    );
                    if let DuskError::Io { path, .. } = &err {
                        attempted.push(path.clone());
                    }
                    let mut watched = record.dependencies.clone();
                    for path in attempted {
                        if !watched.contains(&path) {
                            watched.push(path);
                        }
                    }
                    record.refresh(&watched);
                }
            }
        }

        reloaded
    }

    /// File name of the most recently reloaded shader.
    #[must_use]
    pub fn last_reloaded_shader(&self) -> Option<&str> {
        self.last_reloaded_shader.as_deref()
    }
}
