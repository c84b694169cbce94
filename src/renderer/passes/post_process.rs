//! Bloom, tone mapping and FXAA.
//!
//! ```text
//! HDR ─threshold─► bloom A ─kawase─► bloom B ─kawase─► bloom A ...   (half res)
//!  │                                                      │
//!  └──────────────────────── tonemap ◄────────────────────┘
//!                              │ (LDR)
//!                              ▼
//!                            FXAA ─► output (`output_format`)
//! ```
//!
//! Every stage shares one bind group layout (`source`, `bloom`, sampler,
//! params). Stage parameters live in a dynamic uniform array, one slot per
//! draw, so the whole chain needs a single upload per frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::{HDR_FORMAT, RenderTarget, ShaderPipeline, color_attachment, fullscreen_pipeline, pipeline_layout};
use crate::core::ShaderHandle;
use crate::errors::Result;
use crate::renderer::dynamic_buffer::DynamicBuffer;
use crate::renderer::gpu_timer::{GpuStage, StageTiming};
use crate::renderer::settings::PostProcessSettings;
use crate::renderer::shader_cache::ShaderCache;

const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Mirrors `PostParams` in `chunks/post.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PostParams {
    pub texel_size: Vec2,
    pub threshold: f32,
    pub strength: f32,
    pub exposure: f32,
    pub iteration: u32,
    pub fxaa_enabled: u32,
    pub encode_srgb: u32,
}

const _: () = assert!(std::mem::size_of::<PostParams>() == 32);

/// Which bloom target holds the result after `iterations` ping-pong passes
/// starting from A: `false` for A, `true` for B.
#[inline]
#[must_use]
pub fn bloom_result_in_b(iterations: u32) -> bool {
    iterations % 2 == 1
}

/// Half of `full`, never below one texel.
#[inline]
#[must_use]
pub fn half_extent(full: u32) -> u32 {
    (full / 2).max(1)
}

/// Parameter slots for one frame: threshold, each blur iteration, tone map, FXAA.
#[must_use]
pub fn build_params(
    settings: &PostProcessSettings,
    width: u32,
    height: u32,
    encode_srgb: bool,
) -> Vec<PostParams> {
    let half = Vec2::new(half_extent(width) as f32, half_extent(height) as f32);
    let full = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    let base = PostParams {
        threshold: settings.bloom_threshold,
        strength: settings.bloom_strength,
        exposure: settings.exposure,
        fxaa_enabled: u32::from(settings.fxaa),
        encode_srgb: u32::from(encode_srgb),
        ..PostParams::default()
    };

    let mut params = Vec::with_capacity(settings.bloom_iterations as usize + 3);
    params.push(PostParams {
        texel_size: full.recip(),
        ..base
    });
    params.extend((0..settings.bloom_iterations).map(|iteration| PostParams {
        texel_size: half.recip(),
        iteration,
        ..base
    }));
    params.push(PostParams {
        texel_size: full.recip(),
        ..base
    });
    params.push(PostParams {
        texel_size: full.recip(),
        ..base
    });
    params
}

struct Targets {
    bloom_a: RenderTarget,
    bloom_b: RenderTarget,
    ldr: RenderTarget,
    output: RenderTarget,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32, output_format: wgpu::TextureFormat) -> Self {
        let (hw, hh) = (half_extent(width), half_extent(height));
        Self {
            bloom_a: RenderTarget::new(device, "Bloom A", hw, hh, HDR_FORMAT),
            bloom_b: RenderTarget::new(device, "Bloom B", hw, hh, HDR_FORMAT),
            ldr: RenderTarget::new(device, "Tonemapped", width, height, LDR_FORMAT),
            output: RenderTarget::new(device, "Post Output", width, height, output_format),
        }
    }
}

struct BindGroups {
    threshold: wgpu::BindGroup,
    a_to_b: wgpu::BindGroup,
    b_to_a: wgpu::BindGroup,
    tonemap_from_a: wgpu::BindGroup,
    tonemap_from_b: wgpu::BindGroup,
    fxaa: wgpu::BindGroup,
    params_generation: u64,
}

struct Pipelines {
    threshold: ShaderPipeline,
    kawase: ShaderPipeline,
    tonemap: ShaderPipeline,
    fxaa: ShaderPipeline,
}

/// Shader handles of the post chain, in execution order.
#[derive(Debug, Clone, Copy)]
pub struct PostShaders {
    pub threshold: ShaderHandle,
    pub kawase: ShaderHandle,
    pub tonemap: ShaderHandle,
    pub fxaa: ShaderHandle,
}

pub struct PostProcessPass {
    settings: PostProcessSettings,
    output_format: wgpu::TextureFormat,
    width: u32,
    height: u32,

    bind_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    params: DynamicBuffer<PostParams>,
    targets: Targets,
    groups: BindGroups,
    pipelines: Pipelines,
}

impl PostProcessPass {
    pub fn new(
        device: &wgpu::Device,
        shaders: &ShaderCache,
        handles: PostShaders,
        settings: PostProcessSettings,
        output_format: wgpu::TextureFormat,
        hdr: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Process Layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<PostParams>() as u64),
                    },
                    count: None,
                },
            ],
        });
        let pipeline_layout = pipeline_layout(device, "Post Process Pipeline Layout", &[&bind_layout]);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Process Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let build = |label: &'static str, format| {
            let layout = &pipeline_layout;
            move |module: &wgpu::ShaderModule| fullscreen_pipeline(device, label, layout, module, format)
        };
        let pipelines = Pipelines {
            threshold: ShaderPipeline::new(device, shaders, handles.threshold, build("Bloom Threshold Pipeline", HDR_FORMAT))?,
            kawase: ShaderPipeline::new(device, shaders, handles.kawase, build("Kawase Blur Pipeline", HDR_FORMAT))?,
            tonemap: ShaderPipeline::new(device, shaders, handles.tonemap, build("Tonemap Pipeline", LDR_FORMAT))?,
            fxaa: ShaderPipeline::new(device, shaders, handles.fxaa, build("FXAA Pipeline", output_format))?,
        };

        let params = DynamicBuffer::new(device, "Post Process Params");
        let targets = Targets::new(device, width, height, output_format);
        let groups = Self::create_groups(device, &bind_layout, &sampler, &params, &targets, hdr);

        Ok(Self {
            settings,
            output_format,
            width,
            height,
            bind_layout,
            pipeline_layout,
            sampler,
            params,
            targets,
            groups,
            pipelines,
        })
    }

    fn create_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        params: &DynamicBuffer<PostParams>,
        targets: &Targets,
        hdr: &wgpu::TextureView,
    ) -> BindGroups {
        let group = |label: &str, source: &wgpu::TextureView, bloom: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(bloom),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: params.binding(),
                    },
                ],
            })
        };

        let (a, b) = (&targets.bloom_a.view, &targets.bloom_b.view);
        BindGroups {
            threshold: group("Bloom Threshold Bind Group", hdr, hdr),
            a_to_b: group("Kawase A->B Bind Group", a, a),
            b_to_a: group("Kawase B->A Bind Group", b, b),
            tonemap_from_a: group("Tonemap Bind Group (A)", hdr, a),
            tonemap_from_b: group("Tonemap Bind Group (B)", hdr, b),
            fxaa: group("FXAA Bind Group", &targets.ldr.view, &targets.ldr.view),
            params_generation: params.generation(),
        }
    }

    pub fn refresh(&mut self, device: &wgpu::Device, shaders: &ShaderCache) {
        let layout = &self.pipeline_layout;
        let output_format = self.output_format;
        let p = &mut self.pipelines;
        p.threshold.refresh(device, shaders, |m| {
            fullscreen_pipeline(device, "Bloom Threshold Pipeline", layout, m, HDR_FORMAT)
        });
        p.kawase
            .refresh(device, shaders, |m| fullscreen_pipeline(device, "Kawase Blur Pipeline", layout, m, HDR_FORMAT));
        p.tonemap
            .refresh(device, shaders, |m| fullscreen_pipeline(device, "Tonemap Pipeline", layout, m, LDR_FORMAT));
        p.fxaa
            .refresh(device, shaders, |m| fullscreen_pipeline(device, "FXAA Pipeline", layout, m, output_format));
    }

    /// Recreates every target at the new size; `hdr` is the (resized) input.
    pub fn on_resize(&mut self, device: &wgpu::Device, hdr: &wgpu::TextureView, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.targets = Targets::new(device, width, height, self.output_format);
        self.groups = Self::create_groups(device, &self.bind_layout, &self.sampler, &self.params, &self.targets, hdr);
    }

    /// Uploads this frame's parameters, rebinding if the parameter buffer grew.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, hdr: &wgpu::TextureView) {
        let encode_srgb = !self.output_format.is_srgb();
        let params = build_params(&self.settings, self.width, self.height, encode_srgb);
        self.params.write(device, queue, &params);

        if self.params.generation() != self.groups.params_generation {
            self.groups = Self::create_groups(device, &self.bind_layout, &self.sampler, &self.params, &self.targets, hdr);
        }
    }

    fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &ShaderPipeline,
        group: &wgpu::BindGroup,
        target: &RenderTarget,
        slot: u32,
        timestamp_writes: Option<wgpu::RenderPassTimestampWrites<'_>>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[color_attachment(&target.view, wgpu::LoadOp::Clear(wgpu::Color::BLACK))],
            depth_stencil_attachment: None,
            timestamp_writes,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(pipeline.get());
        pass.set_bind_group(0, group, &[self.params.offset(slot)]);
        pass.draw(0..3, 0..1);
    }

    pub fn execute(&self, encoder: &mut wgpu::CommandEncoder, timing: Option<StageTiming<'_>>) {
        let iterations = self.settings.bloom_iterations;
        let (p, g, t) = (&self.pipelines, &self.groups, &self.targets);

        self.draw(
            encoder,
            "Bloom Threshold",
            &p.threshold,
            &g.threshold,
            &t.bloom_a,
            0,
            timing.map(|s| s.span(GpuStage::PostFx, true, false)),
        );

        for i in 0..iterations {
            let (group, target) = if i % 2 == 0 { (&g.a_to_b, &t.bloom_b) } else { (&g.b_to_a, &t.bloom_a) };
            self.draw(encoder, "Kawase Blur", &p.kawase, group, target, 1 + i, None);
        }

        let tonemap_group = if bloom_result_in_b(iterations) {
            &g.tonemap_from_b
        } else {
            &g.tonemap_from_a
        };
        self.draw(encoder, "Tonemap", &p.tonemap, tonemap_group, &t.ldr, iterations + 1, None);

        self.draw(
            encoder,
            "FXAA",
            &p.fxaa,
            &g.fxaa,
            &t.output,
            iterations + 2,
            timing.map(|s| s.span(GpuStage::PostFx, false, true)),
        );
    }

    #[must_use]
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.targets.output.view
    }

    #[must_use]
    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.targets.output.texture
    }

    #[must_use]
    pub fn settings(&self) -> &PostProcessSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PostProcessSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_result_alternates() {
        assert!(!bloom_result_in_b(0));
        assert!(bloom_result_in_b(1));
        assert!(!bloom_result_in_b(4));
        assert!(bloom_result_in_b(5));
    }

    #[test]
    fn params_cover_every_stage() {
        let settings = PostProcessSettings::default();
        let params = build_params(&settings, 800, 600, false);
        assert_eq!(params.len(), settings.bloom_iterations as usize + 3);

        let blur = &params[1..=settings.bloom_iterations as usize];
        for (i, p) in blur.iter().enumerate() {
            assert_eq!(p.iteration, i as u32);
            assert!((p.texel_size.x - 1.0 / 400.0).abs() < 1e-7);
        }
        let fxaa = params.last().unwrap();
        assert_eq!(fxaa.fxaa_enabled, 1);
        assert!((fxaa.texel_size.y - 1.0 / 600.0).abs() < 1e-7);
    }

    #[test]
    fn half_extent_never_reaches_zero() {
        assert_eq!(half_extent(1), 1);
        assert_eq!(half_extent(0), 1);
        assert_eq!(half_extent(1920), 960);
    }
}
