//! G-buffer fill.
//!
//! | Target   | Format        | Contents                          |
//! |----------|---------------|-----------------------------------|
//! | normal   | `Rgba16Float` | world-space normal                |
//! | albedo   | `Rgba8Unorm`  | base colour                       |
//! | material | `Rgba8Unorm`  | occlusion, roughness, metallic    |
//! | depth    | `Depth32Float`| hardware depth, read by lighting  |
//!
//! Opaque commands only, drawn front to back as sorted by the queue.

use super::{
    DEPTH_FORMAT, GBUFFER_ALBEDO_FORMAT, GBUFFER_MATERIAL_FORMAT, GBUFFER_NORMAL_FORMAT, RenderTarget,
    ShaderPipeline, color_attachment, pipeline_layout,
};
use crate::core::ShaderHandle;
use crate::errors::Result;
use crate::renderer::bind_groups::{FrameBindings, MaterialBindings};
use crate::renderer::gpu_resources::GpuMeshBuffer;
use crate::renderer::gpu_timer::{GpuStage, StageTiming};
use crate::renderer::queue::RenderQueue;
use crate::renderer::shader_cache::ShaderCache;
use crate::resources::MeshVertex;

pub struct GBuffer {
    pub normal: RenderTarget,
    pub albedo: RenderTarget,
    pub material: RenderTarget,
    pub depth: RenderTarget,
}

impl GBuffer {
    #[must_use]
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            normal: RenderTarget::new(device, "GBuffer Normal", width, height, GBUFFER_NORMAL_FORMAT),
            albedo: RenderTarget::new(device, "GBuffer Albedo", width, height, GBUFFER_ALBEDO_FORMAT),
            material: RenderTarget::new(device, "GBuffer Material", width, height, GBUFFER_MATERIAL_FORMAT),
            depth: RenderTarget::new(device, "GBuffer Depth", width, height, DEPTH_FORMAT),
        }
    }
}

pub struct GeometryPass {
    gbuffer: GBuffer,
    layout: wgpu::PipelineLayout,
    pipeline: ShaderPipeline,
}

impl GeometryPass {
    pub fn new(
        device: &wgpu::Device,
        frame: &FrameBindings,
        materials: &MaterialBindings,
        shaders: &ShaderCache,
        shader: ShaderHandle,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let layout = pipeline_layout(device, "GBuffer Pipeline Layout", &[frame.layout(), materials.layout()]);
        let pipeline = ShaderPipeline::new(device, shaders, shader, |module| Self::build(device, &layout, module))?;

        Ok(Self {
            gbuffer: GBuffer::new(device, width, height),
            layout,
            pipeline,
        })
    }

    fn build(device: &wgpu::Device, layout: &wgpu::PipelineLayout, module: &wgpu::ShaderModule) -> wgpu::RenderPipeline {
        let target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("GBuffer Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[
                    target(GBUFFER_NORMAL_FORMAT),
                    target(GBUFFER_ALBEDO_FORMAT),
                    target(GBUFFER_MATERIAL_FORMAT),
                ],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
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

    pub fn on_resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.gbuffer = GBuffer::new(device, width, height);
    }

    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameBindings,
        materials: &MaterialBindings,
        meshes: &GpuMeshBuffer,
        queue: &RenderQueue,
        timing: Option<StageTiming<'_>>,
    ) {
        let clear = wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &[
                color_attachment(&self.gbuffer.normal.view, clear),
                color_attachment(&self.gbuffer.albedo.view, clear),
                color_attachment(&self.gbuffer.material.view, clear),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.gbuffer.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: timing.map(|t| t.pass(GpuStage::GBuffer)),
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(self.pipeline.get());
        meshes.bind(&mut pass);

        for (slot, cmd) in queue.opaque_commands().iter().enumerate() {
            let Some(material) = materials.get(&cmd.texture_key()) else {
                continue;
            };
            pass.set_bind_group(0, frame.bind_group(), &frame.offsets(slot as u32));
            pass.set_bind_group(1, material, &[]);
            pass.draw_indexed(cmd.index_range(), cmd.base_vertex, 0..1);
        }
    }

    #[must_use]
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }
}
