//! Renderer Module
//!
//! GPU side of the engine. The [`Renderer`] owns every GPU resource and
//! drives the fixed per-frame pipeline:
//!
//! ```text
//! registry sync ─► sort ─► uniforms ─► Shadow ─► Geometry ─► Lighting ─► Post ─► submit
//! ```
//!
//! - [`command`] / [`queue`]: per-draw descriptors and their ordering
//! - [`uniforms`]: host mirrors of the WGSL uniform blocks
//! - [`passes`]: the four frame stages
//! - [`gpu_timer`]: per-stage GPU timestamps
//! - [`shader_cache`]: compiled modules and the hot-reload compiler seam
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut renderer = Renderer::new(&device, &queue, &mut registry, RendererSettings::default(), w, h)?;
//! renderer.register_shaders_for_reload(&mut registry);
//!
//! loop {
//!     renderer.poll_shader_reload(&mut registry);
//!     let Some(view) = scene.update(time, dt, viewport) else { continue };
//!     RenderSystem::gather_commands(&scene.world, &registry, renderer.queue_mut(), view.camera_position, &view.frustum);
//!     let image = renderer.render_frame(&mut registry, &FrameContext::new(&view, scene.light()));
//! }
//! ```

pub mod bind_groups;
pub mod command;
pub mod context;
pub mod device;
pub mod dynamic_buffer;
pub mod gpu_resources;
pub mod gpu_timer;
pub mod passes;
pub mod queue;
pub mod settings;
pub mod shader_cache;
pub mod uniforms;

pub use command::RenderCommand;
pub use context::FrameContext;
pub use device::request_headless_device;
pub use gpu_timer::{GpuStage, GpuTimer, GpuTimings};
pub use passes::{DEPTH_FORMAT, HDR_FORMAT};
pub use queue::RenderQueue;
pub use settings::{PostProcessSettings, RendererSettings, ShadowSettings};
pub use shader_cache::ShaderCache;
pub use uniforms::{MaterialData, PerFrameData, PerObjectData, ShadowData};

use rustc_hash::FxHashMap;

use self::bind_groups::{FrameBindings, MaterialBindings};
use self::gpu_resources::{GpuMeshBuffer, GpuTextureCache};
use self::passes::post_process::PostShaders;
use self::passes::{GeometryPass, LightingPass, PostProcessPass, ShadowPass};
use crate::core::ShaderHandle;
use crate::errors::{DuskError, Result};
use crate::resources::{ResourceRegistry, ShaderCompiler};

/// Shader handles of every pass.
#[derive(Debug, Clone, Copy)]
struct PassShaders {
    shadow: ShaderHandle,
    gbuffer: ShaderHandle,
    lighting: ShaderHandle,
    forward: ShaderHandle,
    post: PostShaders,
}

impl PassShaders {
    fn all(&self) -> [ShaderHandle; 8] {
        [
            self.shadow,
            self.gbuffer,
            self.lighting,
            self.forward,
            self.post.threshold,
            self.post.kawase,
            self.post.tonemap,
            self.post.fxaa,
        ]
    }
}

const REQUIRED_COLOR_ATTACHMENTS: u32 = 3;
const REQUIRED_BIND_GROUPS: u32 = 3;

fn check_capabilities(device: &wgpu::Device) -> Result<()> {
    let limits = device.limits();
    if limits.max_color_attachments < REQUIRED_COLOR_ATTACHMENTS {
        return Err(DuskError::MissingCapability(format!(
            "{REQUIRED_COLOR_ATTACHMENTS} color attachments required for the G-buffer, device allows {}",
            limits.max_color_attachments
        )));
    }
    if limits.max_bind_groups < REQUIRED_BIND_GROUPS {
        return Err(DuskError::MissingCapability(format!(
            "{REQUIRED_BIND_GROUPS} bind groups required, device allows {}",
            limits.max_bind_groups
        )));
    }
    Ok(())
}

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    settings: RendererSettings,
    width: u32,
    height: u32,

    // === Shared GPU state ===
    shaders: ShaderCache,
    pass_shaders: PassShaders,
    mesh_buffer: GpuMeshBuffer,
    textures: GpuTextureCache,
    frame_bindings: FrameBindings,
    material_bindings: MaterialBindings,

    // === Passes ===
    shadow_pass: ShadowPass,
    geometry_pass: GeometryPass,
    lighting_pass: LightingPass,
    post_pass: PostProcessPass,

    // === Per-frame ===
    render_queue: RenderQueue,
    timer: Option<GpuTimer>,
    gpu_times: GpuTimings,
    frame_count: u64,
}

impl Renderer {
    /// Loads and compiles every pass shader and allocates all GPU resources.
    ///
    /// Any shader failing to load or compile here is an error; later
    /// failures during hot reload are not.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        registry: &mut ResourceRegistry,
        settings: RendererSettings,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        check_capabilities(device)?;
        let (width, height) = (width.max(1), height.max(1));

        let mut shaders = ShaderCache::new(device);
        let mut load = |label: &str, file: &str| -> Result<ShaderHandle> {
            let handle = registry.load_shader(label, settings.shader_dir.join("passes").join(file))?;
            shaders.compile(handle, registry.shader(handle))?;
            Ok(handle)
        };
        let pass_shaders = PassShaders {
            shadow: load("shadow", "shadow.wgsl")?,
            gbuffer: load("gbuffer", "gbuffer.wgsl")?,
            lighting: load("lighting", "lighting.wgsl")?,
            forward: load("forward", "forward.wgsl")?,
            post: PostShaders {
                threshold: load("bloom_threshold", "bloom_threshold.wgsl")?,
                kawase: load("kawase", "kawase.wgsl")?,
                tonemap: load("tonemap", "tonemap.wgsl")?,
                fxaa: load("fxaa", "fxaa.wgsl")?,
            },
        };

        let frame_bindings = FrameBindings::new(device);
        let material_bindings = MaterialBindings::new(device);

        let shadow_pass = ShadowPass::new(device, &frame_bindings, &shaders, pass_shaders.shadow, settings.shadow)?;
        let geometry_pass = GeometryPass::new(
            device,
            &frame_bindings,
            &material_bindings,
            &shaders,
            pass_shaders.gbuffer,
            width,
            height,
        )?;
        let lighting_pass = LightingPass::new(
            device,
            &frame_bindings,
            &material_bindings,
            &shaders,
            pass_shaders.lighting,
            pass_shaders.forward,
            geometry_pass.gbuffer(),
            shadow_pass.view(),
            width,
            height,
        )?;
        let post_pass = PostProcessPass::new(
            device,
            &shaders,
            pass_shaders.post,
            settings.post,
            settings.output_format,
            lighting_pass.hdr_view(),
            width,
            height,
        )?;

        let timer = if settings.gpu_timing {
            GpuTimer::new(device, queue)
        } else {
            None
        };

        log::info!("Renderer initialized at {width}x{height}");

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            settings,
            width,
            height,
            shaders,
            pass_shaders,
            mesh_buffer: GpuMeshBuffer::new(device),
            textures: GpuTextureCache::new(),
            frame_bindings,
            material_bindings,
            shadow_pass,
            geometry_pass,
            lighting_pass,
            post_pass,
            render_queue: RenderQueue::new(),
            timer,
            gpu_times: GpuTimings::default(),
            frame_count: 0,
        })
    }

    /// Recreates every size-dependent attachment. Zero sizes are clamped to one.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;

        self.shadow_pass.on_resize(width, height);
        self.geometry_pass.on_resize(&self.device, width, height);
        self.lighting_pass
            .on_resize(&self.device, self.geometry_pass.gbuffer(), width, height);
        self.post_pass
            .on_resize(&self.device, self.lighting_pass.hdr_view(), width, height);

        log::debug!("Renderer resized to {width}x{height}");
    }

    /// The queue scene code submits this frame's commands into.
    pub fn queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.render_queue
    }

    #[must_use]
    pub fn render_queue(&self) -> &RenderQueue {
        &self.render_queue
    }

    pub fn submit(&mut self, command: RenderCommand) {
        self.render_queue.submit(command);
    }

    /// Renders one frame and returns the final image.
    ///
    /// Runs Shadow, Geometry, Lighting and Post-process in that order, submits
    /// the work and clears the render queue. GPU timings read here belong to
    /// an earlier frame.
    pub fn render_frame(&mut self, registry: &mut ResourceRegistry, ctx: &FrameContext) -> &wgpu::TextureView {
        if let Some(timer) = self.timer.as_mut() {
            let fresh = timer.collect(&self.device);
            self.gpu_times.fold(&fresh, self.settings.timing_smoothing);
        }

        self.refresh_pipelines();

        // === Registry -> GPU ===
        self.mesh_buffer.sync(&self.queue, registry.mesh_buffer_mut());
        for (_, cmd) in self.render_queue.object_slots() {
            for texture in cmd.texture_key() {
                self.textures.ensure(&self.device, &self.queue, registry, texture);
            }
        }

        self.render_queue.sort();

        // === Uniforms ===
        let mut shadow = ctx.shadow_data();
        shadow.light_space = self.shadow_pass.light_space(shadow.light_direction);
        self.frame_bindings
            .upload(&self.device, &self.queue, &ctx.frame, &shadow, &self.render_queue);
        self.material_bindings
            .prepare(&self.device, &self.textures, &self.render_queue);
        self.post_pass
            .prepare(&self.device, &self.queue, self.lighting_pass.hdr_view());

        // === Passes ===
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        let timed = self.timer.as_mut().and_then(GpuTimer::begin_frame);
        let timing = self.timer.as_ref().zip(timed).map(|(t, f)| t.stage_timing(f));

        self.shadow_pass
            .execute(&mut encoder, &self.frame_bindings, &self.mesh_buffer, &self.render_queue, timing);
        self.geometry_pass.execute(
            &mut encoder,
            &self.frame_bindings,
            &self.material_bindings,
            &self.mesh_buffer,
            &self.render_queue,
            timing,
        );
        self.lighting_pass.execute(
            &mut encoder,
            &self.frame_bindings,
            &self.material_bindings,
            &self.mesh_buffer,
            self.geometry_pass.gbuffer(),
            &self.render_queue,
            self.settings.clear_color,
            timing,
        );
        self.post_pass.execute(&mut encoder, timing);

        if let (Some(timer), Some(frame)) = (self.timer.as_ref(), timed) {
            timer.resolve(&mut encoder, frame);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        if let (Some(timer), Some(frame)) = (self.timer.as_ref(), timed) {
            timer.after_submit(frame);
        }

        self.render_queue.clear();
        self.frame_count += 1;

        self.post_pass.output_view()
    }

    fn refresh_pipelines(&mut self) {
        let device = &self.device;
        self.shadow_pass.refresh(device, &self.shaders);
        self.geometry_pass.refresh(device, &self.shaders);
        self.lighting_pass.refresh(device, &self.shaders);
        self.post_pass.refresh(device, &self.shaders);
    }

    // === Shader hot reload ===

    /// Starts tracking every pass shader's files for modification.
    pub fn register_shaders_for_reload(&self, registry: &mut ResourceRegistry) {
        for handle in self.pass_shaders.all() {
            registry.track_shader_for_reload(handle);
        }
    }

    /// Recompiles tracked shaders whose files changed. Pipelines pick up the
    /// new modules on the next frame; failed edits keep the previous ones.
    pub fn poll_shader_reload(&mut self, registry: &mut ResourceRegistry) -> Vec<ShaderHandle> {
        let reloaded = registry.poll_shader_reload(&mut self.shaders);
        for &handle in &reloaded {
            log::info!("Shader '{}' reloaded", registry.shader(handle).label);
        }
        reloaded
    }

    // === Accessors ===

    /// Smoothed per-stage GPU milliseconds keyed by stage label.
    #[must_use]
    pub fn last_gpu_times(&self) -> &FxHashMap<&'static str, f32> {
        self.gpu_times.as_map()
    }

    #[must_use]
    pub fn gpu_timing_enabled(&self) -> bool {
        self.timer.is_some()
    }

    pub fn post_settings_mut(&mut self) -> &mut PostProcessSettings {
        self.post_pass.settings_mut()
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Final image of the last frame.
    #[must_use]
    pub fn output_texture(&self) -> &wgpu::Texture {
        self.post_pass.output_texture()
    }

    // === Debug views ===

    #[must_use]
    pub fn gbuffer_normal_view(&self) -> &wgpu::TextureView {
        &self.geometry_pass.gbuffer().normal.view
    }

    #[must_use]
    pub fn gbuffer_albedo_view(&self) -> &wgpu::TextureView {
        &self.geometry_pass.gbuffer().albedo.view
    }

    #[must_use]
    pub fn gbuffer_material_view(&self) -> &wgpu::TextureView {
        &self.geometry_pass.gbuffer().material.view
    }

    #[must_use]
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.geometry_pass.gbuffer().depth.view
    }

    #[must_use]
    pub fn hdr_view(&self) -> &wgpu::TextureView {
        self.lighting_pass.hdr_view()
    }

    #[must_use]
    pub fn shadow_map_view(&self) -> &wgpu::TextureView {
        self.shadow_pass.view()
    }
}
