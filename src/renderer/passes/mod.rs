//! The four frame stages, in execution order:
//!
//! ```text
//! ShadowPass ──► GeometryPass ──► LightingPass ──► PostProcessPass
//!  shadow map     G-buffer         HDR colour        output image
//! ```
//!
//! Each pass is a concrete type driven directly by the
//! [`Renderer`](super::Renderer). Passes own their attachments and
//! pipelines; `on_resize` recreates every size-dependent attachment, and
//! `refresh` rebuilds pipelines whose shader was hot-reloaded.

pub mod geometry;
pub mod lighting;
pub mod post_process;
pub mod shadow;

pub use geometry::GeometryPass;
pub use lighting::LightingPass;
pub use post_process::PostProcessPass;
pub use shadow::ShadowPass;

use super::shader_cache::ShaderCache;
use crate::core::ShaderHandle;
use crate::errors::{DuskError, Result};

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const GBUFFER_NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const GBUFFER_ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const GBUFFER_MATERIAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A texture with its default view.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Creates a 2D target usable as an attachment and a sampled texture.
    #[must_use]
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Result of a [`ShaderPipeline::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRefresh {
    /// The shader revision has not changed since the last attempt.
    Unchanged,
    Rebuilt,
    /// The rebuild failed; the previous pipeline stays in use.
    Kept,
}

/// A value built from a given shader revision.
///
/// A failed rebuild leaves the current value in place and remembers the
/// revision it failed on, so the same broken source is not retried every
/// frame.
pub(crate) struct Versioned<P> {
    revision: u64,
    failed_revision: Option<u64>,
    value: P,
}

impl<P> Versioned<P> {
    pub fn new(revision: u64, value: P) -> Self {
        Self {
            revision,
            failed_revision: None,
            value,
        }
    }

    pub fn refresh(&mut self, latest: u64, build: impl FnOnce() -> Result<P>) -> PipelineRefresh {
        if latest == self.revision || self.failed_revision == Some(latest) {
            return PipelineRefresh::Unchanged;
        }
        match build() {
            Ok(value) => {
                self.value = value;
                self.revision = latest;
                self.failed_revision = None;
                PipelineRefresh::Rebuilt
            }
            Err(err) => {
                log::warn!("{err}; keeping pipeline from revision {}", self.revision);
                self.failed_revision = Some(latest);
                PipelineRefresh::Kept
            }
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self) -> &P {
        &self.value
    }
}

/// Runs `build` inside a validation error scope and reports what it caught.
pub(crate) fn build_validated<P>(device: &wgpu::Device, label: &str, build: impl FnOnce() -> P) -> Result<P> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        None => Ok(value),
        Some(err) => Err(DuskError::ShaderCompile {
            label: label.to_owned(),
            message: err.to_string(),
        }),
    }
}

/// A render pipeline tied to the shader revision it was built from.
pub(crate) struct ShaderPipeline {
    shader: ShaderHandle,
    label: String,
    pipeline: Versioned<wgpu::RenderPipeline>,
}

impl ShaderPipeline {
    /// Builds the initial pipeline. Pipeline validation errors are returned.
    pub fn new(
        device: &wgpu::Device,
        shaders: &ShaderCache,
        shader: ShaderHandle,
        build: impl FnOnce(&wgpu::ShaderModule) -> wgpu::RenderPipeline,
    ) -> Result<Self> {
        let compiled = shaders.get(shader).ok_or_else(|| DuskError::ShaderCompile {
            label: format!("{shader:?}"),
            message: "shader has no compiled module".to_owned(),
        })?;
        let label = compiled.label.clone();
        let pipeline = build_validated(device, &label, || build(&compiled.module))?;
        Ok(Self {
            shader,
            label,
            pipeline: Versioned::new(compiled.revision, pipeline),
        })
    }

    /// Rebuilds the pipeline if the cached module is newer. A rebuild that
    /// fails validation keeps the previous pipeline.
    pub fn refresh(
        &mut self,
        device: &wgpu::Device,
        shaders: &ShaderCache,
        build: impl FnOnce(&wgpu::ShaderModule) -> wgpu::RenderPipeline,
    ) -> PipelineRefresh {
        let Some(compiled) = shaders.get(self.shader) else {
            return PipelineRefresh::Unchanged;
        };
        let label = &self.label;
        let outcome = self
            .pipeline
            .refresh(compiled.revision, || build_validated(device, label, || build(&compiled.module)));
        if outcome == PipelineRefresh::Rebuilt {
            log::debug!("Rebuilt pipeline for '{}' (revision {})", self.label, self.pipeline.revision());
        }
        outcome
    }

    #[inline]
    pub fn get(&self) -> &wgpu::RenderPipeline {
        self.pipeline.get()
    }
}

pub(crate) fn pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    let bind_group_layouts: Vec<Option<&wgpu::BindGroupLayout>> =
        bind_group_layouts.iter().copied().map(Some).collect();
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &bind_group_layouts,
        immediate_size: 0,
    })
}

/// Fullscreen-triangle pipeline: `vs_main`/`fs_main`, no vertex buffers, no depth.
pub(crate) fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

pub(crate) fn color_attachment(
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(message: &str) -> Result<String> {
        Err(DuskError::ShaderCompile {
            label: "lighting".to_owned(),
            message: message.to_owned(),
        })
    }

    #[test]
    fn same_revision_skips_the_builder() {
        let mut versioned = Versioned::new(3, "v3".to_string());
        let outcome = versioned.refresh(3, || panic!("builder must not run"));
        assert_eq!(outcome, PipelineRefresh::Unchanged);
        assert_eq!(versioned.get(), "v3");
    }

    #[test]
    fn newer_revision_rebuilds() {
        let mut versioned = Versioned::new(1, "v1".to_string());
        assert_eq!(versioned.refresh(2, || Ok("v2".to_string())), PipelineRefresh::Rebuilt);
        assert_eq!(versioned.get(), "v2");
        assert_eq!(versioned.revision(), 2);
    }

    #[test]
    fn failed_rebuild_keeps_previous_value() {
        let mut versioned = Versioned::new(1, "v1".to_string());
        let outcome = versioned.refresh(2, || failing("entry point 'fs_main' not found"));

        assert_eq!(outcome, PipelineRefresh::Kept);
        assert_eq!(versioned.get(), "v1");
        assert_eq!(versioned.revision(), 1);
    }

    #[test]
    fn failed_revision_is_not_retried_until_the_next_one() {
        let mut versioned = Versioned::new(1, "v1".to_string());
        versioned.refresh(2, || failing("binding mismatch"));

        assert_eq!(versioned.refresh(2, || panic!("retried a known-bad revision")), PipelineRefresh::Unchanged);
        assert_eq!(versioned.refresh(3, || Ok("v3".to_string())), PipelineRefresh::Rebuilt);
        assert_eq!(versioned.get(), "v3");
    }
}
