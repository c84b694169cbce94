//! Directional shadow map.
//!
//! Depth-only render of every shadow caster from the light's point of view
//! into a square `Depth32Float` map. The light volume is a fixed orthographic
//! box centred on the world origin ([`ShadowSettings`]), not fitted to the
//! scene. Front faces are culled so only back faces write depth, which keeps
//! lit surfaces from shadowing themselves.

use glam::{Mat4, Vec3};

use super::{DEPTH_FORMAT, RenderTarget, ShaderPipeline, pipeline_layout};
use crate::core::ShaderHandle;
use crate::errors::Result;
use crate::renderer::bind_groups::FrameBindings;
use crate::renderer::gpu_resources::GpuMeshBuffer;
use crate::renderer::gpu_timer::{GpuStage, StageTiming};
use crate::renderer::queue::RenderQueue;
use crate::renderer::settings::ShadowSettings;
use crate::renderer::shader_cache::ShaderCache;
use crate::resources::MeshVertex;

/// Light view-projection for a directional light travelling along `direction`.
///
/// The eye sits `depth / 2` units back along the light direction looking at
/// the origin; the projection spans `±extent` horizontally and vertically and
/// `0.1..depth` in depth. `Y` is used as the up vector unless the light is
/// nearly vertical, in which case `X` is.
#[must_use]
pub fn light_space_matrix(direction: Vec3, settings: &ShadowSettings) -> Mat4 {
    let dir = direction.normalize_or(Vec3::NEG_Y);
    let up = if dir.y.abs() >= 0.99 { Vec3::X } else { Vec3::Y };
    let eye = -dir * settings.depth * 0.5;

    let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
    let e = settings.extent;
    let projection = Mat4::orthographic_rh(-e, e, -e, e, 0.1, settings.depth);
    projection * view
}

pub struct ShadowPass {
    settings: ShadowSettings,
    map: RenderTarget,
    layout: wgpu::PipelineLayout,
    pipeline: ShaderPipeline,
}

impl ShadowPass {
    pub fn new(
        device: &wgpu::Device,
        frame: &FrameBindings,
        shaders: &ShaderCache,
        shader: ShaderHandle,
        settings: ShadowSettings,
    ) -> Result<Self> {
        let map = RenderTarget::new(device, "Shadow Map", settings.map_size, settings.map_size, DEPTH_FORMAT);
        let layout = pipeline_layout(device, "Shadow Pipeline Layout", &[frame.layout()]);
        let pipeline = ShaderPipeline::new(device, shaders, shader, |module| Self::build(device, &layout, module))?;

        log::info!("Shadow map allocated: {0}x{0}", settings.map_size);

        Ok(Self {
            settings,
            map,
            layout,
            pipeline,
        })
    }

    fn build(device: &wgpu::Device, layout: &wgpu::PipelineLayout, module: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    pub fn refresh(&mut self, device: &wgpu::Device, shaders: &ShaderCache) {
        let layout = &self.layout;
        self.pipeline.refresh(device, shaders, |module| Self::build(device, layout, module));
    }

    /// The shadow map has a fixed resolution.
    pub fn on_resize(&mut self, _width: u32, _height: u32) {}

    #[must_use]
    pub fn light_space(&self, direction: Vec3) -> Mat4 {
        light_space_matrix(direction, &self.settings)
    }

    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameBindings,
        meshes: &GpuMeshBuffer,
        queue: &RenderQueue,
        timing: Option<StageTiming<'_>>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: timing.map(|t| t.pass(GpuStage::Shadow)),
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(self.pipeline.get());
        meshes.bind(&mut pass);

        for (slot, cmd) in queue.shadow_casters() {
            pass.set_bind_group(0, frame.bind_group(), &frame.offsets(slot));
            pass.draw_indexed(cmd.index_range(), cmd.base_vertex, 0..1);
        }
    }

    #[must_use]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.map.view
    }

    #[must_use]
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }
}
