//! Renderer Settings
//!
//! Configuration consumed once by [`Renderer::new`](super::Renderer::new).
//! Post-processing parameters stay adjustable at runtime through
//! [`Renderer::post_settings_mut`](super::Renderer::post_settings_mut).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dusk::renderer::{RendererSettings, ShadowSettings};
//!
//! let settings = RendererSettings {
//!     shadow: ShadowSettings { map_size: 4096, ..Default::default() },
//!     gpu_timing: false,
//!     ..Default::default()
//! };
//! ```

use std::path::PathBuf;

/// Directional shadow map parameters.
///
/// The light frustum is a fixed box around the world origin, not fitted to
/// the scene:
///
/// | Field    | Default | Meaning                                  |
/// |----------|---------|------------------------------------------|
/// | map_size | 2048    | Shadow map resolution (square)           |
/// | extent   | 8.0     | Half width/height of the ortho volume    |
/// | depth    | 20.0    | Far plane; the light sits at `depth / 2` |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub extent: f32,
    pub depth: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            extent: 8.0,
            depth: 20.0,
        }
    }
}

/// Bloom, tone mapping and anti-aliasing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessSettings {
    /// Luminance above which pixels feed the bloom.
    pub bloom_threshold: f32,
    /// Weight of the blurred bloom in the composite.
    pub bloom_strength: f32,
    /// Kawase ping-pong iterations at half resolution.
    pub bloom_iterations: u32,
    /// Linear exposure applied before the ACES curve.
    pub exposure: f32,
    /// When disabled the tone-mapped image is copied through unchanged.
    pub fxaa: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            bloom_threshold: 1.0,
            bloom_strength: 0.08,
            bloom_iterations: 4,
            exposure: 1.0,
            fxaa: true,
        }
    }
}

/// Global renderer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// Root directory of the WGSL sources.
    pub shader_dir: PathBuf,
    /// Format of the final image returned by `render_frame`.
    pub output_format: wgpu::TextureFormat,
    /// Clear colour of the HDR target (visible where nothing was drawn).
    pub clear_color: wgpu::Color,
    pub shadow: ShadowSettings,
    pub post: PostProcessSettings,
    /// Record per-pass GPU timestamps when the device supports them.
    pub gpu_timing: bool,
    /// Weight of the newest sample in the GPU time moving average.
    pub timing_smoothing: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/renderer/shaders")),
            output_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            clear_color: wgpu::Color::BLACK,
            shadow: ShadowSettings::default(),
            post: PostProcessSettings::default(),
            gpu_timing: true,
            timing_smoothing: 0.15,
        }
    }
}
