//! Deferred lighting into the HDR target.
//!
//! A fullscreen triangle reads the G-buffer and the shadow map and evaluates
//! the Cook-Torrance BRDF for the directional light. The HDR target is cleared
//! every frame, so a frame with no geometry yields the clear colour.
//!
//! Transparent commands cannot live in the G-buffer. They are drawn
//! afterwards, forward-lit and back to front, over the HDR result, testing
//! against the G-buffer depth without writing it.

use super::geometry::GBuffer;
use super::{DEPTH_FORMAT, HDR_FORMAT, RenderTarget, ShaderPipeline, color_attachment, pipeline_layout};
use crate::core::ShaderHandle;
use crate::errors::Result;
use crate::renderer::bind_groups::{FrameBindings, MaterialBindings};
use crate::renderer::gpu_resources::GpuMeshBuffer;
use crate::renderer::gpu_timer::{GpuStage, StageTiming};
use crate::renderer::queue::RenderQueue;
use crate::renderer::shader_cache::ShaderCache;
use crate::resources::MeshVertex;

struct Layouts {
    gbuffer: wgpu::BindGroupLayout,
    shadow: wgpu::BindGroupLayout,
    lighting: wgpu::PipelineLayout,
    forward: wgpu::PipelineLayout,
}

pub struct LightingPass {
    hdr: RenderTarget,
    layouts: Layouts,
    gbuffer_group: wgpu::BindGroup,
    shadow_group: wgpu::BindGroup,
    lighting_pipeline: ShaderPipeline,
    forward_pipeline: ShaderPipeline,
}

impl LightingPass {
    pub fn new(
        device: &wgpu::Device,
        frame: &FrameBindings,
        materials: &MaterialBindings,
        shaders: &ShaderCache,
        lighting_shader: ShaderHandle,
        forward_shader: ShaderHandle,
        gbuffer: &GBuffer,
        shadow_map: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture_entry = |binding: u32, sample_type| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let unfiltered = wgpu::TextureSampleType::Float { filterable: false };

        let gbuffer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GBuffer Read Layout"),
            entries: &[
                texture_entry(0, unfiltered),
                texture_entry(1, unfiltered),
                texture_entry(2, unfiltered),
                texture_entry(3, wgpu::TextureSampleType::Depth),
            ],
        });
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Map Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureSampleType::Depth),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let layouts = Layouts {
            lighting: pipeline_layout(
                device,
                "Lighting Pipeline Layout",
                &[frame.layout(), &gbuffer_layout, &shadow_layout],
            ),
            forward: pipeline_layout(
                device,
                "Forward Pipeline Layout",
                &[frame.layout(), materials.layout(), &shadow_layout],
            ),
            gbuffer: gbuffer_layout,
            shadow: shadow_layout,
        };

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let lighting_pipeline = ShaderPipeline::new(device, shaders, lighting_shader, |module| {
            super::fullscreen_pipeline(device, "Lighting Pipeline", &layouts.lighting, module, HDR_FORMAT)
        })?;
        let forward_pipeline = ShaderPipeline::new(device, shaders, forward_shader, |module| {
            Self::build_forward(device, &layouts.forward, module)
        })?;

        let gbuffer_group = Self::gbuffer_group(device, &layouts.gbuffer, gbuffer);
        let shadow_group = Self::shadow_group(device, &layouts.shadow, shadow_map, &shadow_sampler);

        Ok(Self {
            hdr: RenderTarget::new(device, "HDR Color", width, height, HDR_FORMAT),
            layouts,
            gbuffer_group,
            shadow_group,
            lighting_pipeline,
            forward_pipeline,
        })
    }

    fn build_forward(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        module: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forward Transparent Pipeline"),
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
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
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
                depth_write_enabled: Some(false),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn gbuffer_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, gbuffer: &GBuffer) -> wgpu::BindGroup {
        let views = [
            &gbuffer.normal.view,
            &gbuffer.albedo.view,
            &gbuffer.material.view,
            &gbuffer.depth.view,
        ];
        let entries: Vec<_> = views
            .iter()
            .enumerate()
            .map(|(i, view)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBuffer Read Bind Group"),
            layout,
            entries: &entries,
        })
    }

    fn shadow_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        shadow_map: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Map Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(shadow_map),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn refresh(&mut self, device: &wgpu::Device, shaders: &ShaderCache) {
        let layouts = &self.layouts;
        self.lighting_pipeline.refresh(device, shaders, |module| {
            super::fullscreen_pipeline(device, "Lighting Pipeline", &layouts.lighting, module, HDR_FORMAT)
        });
        self.forward_pipeline
            .refresh(device, shaders, |module| Self::build_forward(device, &layouts.forward, module));
    }

    /// Recreates the HDR target and rebinds the (already resized) G-buffer.
    pub fn on_resize(&mut self, device: &wgpu::Device, gbuffer: &GBuffer, width: u32, height: u32) {
        self.hdr = RenderTarget::new(device, "HDR Color", width, height, HDR_FORMAT);
        self.gbuffer_group = Self::gbuffer_group(device, &self.layouts.gbuffer, gbuffer);
    }

    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameBindings,
        materials: &MaterialBindings,
        meshes: &GpuMeshBuffer,
        gbuffer: &GBuffer,
        queue: &RenderQueue,
        clear_color: wgpu::Color,
        timing: Option<StageTiming<'_>>,
    ) {
        let has_transparents = !queue.transparent_commands().is_empty();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lighting Pass"),
                color_attachments: &[color_attachment(&self.hdr.view, wgpu::LoadOp::Clear(clear_color))],
                depth_stencil_attachment: None,
                timestamp_writes: timing.map(|t| t.span(GpuStage::Lighting, true, !has_transparents)),
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(self.lighting_pipeline.get());
            pass.set_bind_group(0, frame.bind_group(), &frame.offsets(0));
            pass.set_bind_group(1, &self.gbuffer_group, &[]);
            pass.set_bind_group(2, &self.shadow_group, &[]);
            pass.draw(0..3, 0..1);
        }

        if !has_transparents {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Transparent Pass"),
            color_attachments: &[color_attachment(&self.hdr.view, wgpu::LoadOp::Load)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gbuffer.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: timing.map(|t| t.span(GpuStage::Lighting, false, true)),
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(self.forward_pipeline.get());
        pass.set_bind_group(2, &self.shadow_group, &[]);
        meshes.bind(&mut pass);

        for (i, cmd) in queue.transparent_commands().iter().enumerate() {
            let Some(material) = materials.get(&cmd.texture_key()) else {
                continue;
            };
            pass.set_bind_group(0, frame.bind_group(), &frame.offsets(queue.transparent_slot(i)));
            pass.set_bind_group(1, material, &[]);
            pass.draw_indexed(cmd.index_range(), cmd.base_vertex, 0..1);
        }
    }

    #[must_use]
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        &self.hdr.view
    }
}
