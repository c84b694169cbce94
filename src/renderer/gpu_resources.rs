//! GPU mirrors of registry resources.
//!
//! - [`GpuMeshBuffer`]: the shared vertex/index buffers, allocated once at
//!   full mega-buffer capacity and filled from the registry's pending uploads.
//! - [`GpuTextureCache`]: lazily created `wgpu::Texture`s keyed by
//!   [`TextureHandle`].

use rustc_hash::FxHashMap;

use crate::core::TextureHandle;
use crate::resources::mesh_buffer::{INDEX_BUFFER_SIZE, VERTEX_BUFFER_SIZE};
use crate::resources::{MeshBuffer, ResourceRegistry};

pub struct GpuMeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

impl GpuMeshBuffer {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mega Vertex Buffer"),
            size: VERTEX_BUFFER_SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mega Index Buffer"),
            size: INDEX_BUFFER_SIZE,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!(
            "Allocated mega-buffer: {:.1} MiB vertices, {:.1} MiB indices",
            VERTEX_BUFFER_SIZE as f64 / (1024.0 * 1024.0),
            INDEX_BUFFER_SIZE as f64 / (1024.0 * 1024.0),
        );

        Self {
            vertex_buffer,
            index_buffer,
        }
    }

    /// Writes every pending allocation into the GPU buffers.
    pub fn sync(&self, queue: &wgpu::Queue, mesh_buffer: &mut MeshBuffer) {
        for upload in mesh_buffer.take_pending() {
            if !upload.vertex_bytes.is_empty() {
                queue.write_buffer(&self.vertex_buffer, upload.vertex_offset, &upload.vertex_bytes);
            }
            if !upload.index_bytes.is_empty() {
                queue.write_buffer(&self.index_buffer, upload.index_offset, &upload.index_bytes);
            }
        }
    }

    /// Binds both buffers for indexed base-vertex draws.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}

pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

#[derive(Default)]
pub struct GpuTextureCache {
    textures: FxHashMap<TextureHandle, GpuTexture>,
}

impl GpuTextureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `handle` if it has no GPU copy yet.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        registry: &ResourceRegistry,
        handle: TextureHandle,
    ) {
        if self.textures.contains_key(&handle) {
            return;
        }
        let texture = registry.texture(handle);
        let image = &texture.image;

        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let gpu = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&texture.label),
            size,
            mip_level_count: image.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: image.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, pixels) in image.mips.iter().enumerate() {
            let width = (image.width >> level).max(1);
            let height = (image.height >> level).max(1);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        log::debug!("Uploaded texture '{}' ({}x{})", texture.label, image.width, image.height);

        let view = gpu.create_view(&wgpu::TextureViewDescriptor::default());
        self.textures.insert(handle, GpuTexture { texture: gpu, view });
    }

    #[must_use]
    pub fn view(&self, handle: TextureHandle) -> Option<&wgpu::TextureView> {
        self.textures.get(&handle).map(|t| &t.view)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
