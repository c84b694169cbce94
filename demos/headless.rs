//! Headless orbit-box demo.
//!
//! Renders the built-in demo scene offscreen for a few hundred frames while
//! the camera orbits, logging culling statistics and per-pass GPU times.
//! Edit any file under `src/renderer/shaders` while it runs to see the hot
//! reload path pick it up.
//!
//! ```text
//! RUST_LOG=info cargo run --example headless
//! ```

use std::time::{Duration, Instant};

use glam::UVec2;

use dusk::renderer::{FrameContext, Renderer, RendererSettings, request_headless_device};
use dusk::scene::{RenderSystem, Scene};
use dusk::ResourceRegistry;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const FRAMES: u32 = 600;
const DELTA: f32 = 1.0 / 60.0;

fn main() -> dusk::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = RendererSettings::default();
    let (device, queue) = request_headless_device(wgpu::PowerPreference::HighPerformance, settings.gpu_timing)?;

    let mut registry = ResourceRegistry::new();
    let mut scene = Scene::new();
    scene.setup_orbit_box_demo(&mut registry);

    let mut renderer = Renderer::new(&device, &queue, &mut registry, settings, WIDTH, HEIGHT)?;
    renderer.register_shaders_for_reload(&mut registry);
    if !renderer.gpu_timing_enabled() {
        log::warn!("TIMESTAMP_QUERY unavailable, GPU timings disabled");
    }

    let viewport = UVec2::new(WIDTH, HEIGHT);
    let started = Instant::now();
    let mut last_report = Instant::now();

    for frame in 0..FRAMES {
        renderer.poll_shader_reload(&mut registry);

        if let Some(orbit) = scene.orbit.as_mut() {
            orbit.rotate(0.5, 0.0);
        }

        let time = frame as f32 * DELTA;
        let Some(view) = scene.update(time, DELTA, viewport) else {
            log::warn!("No primary camera, skipping frame {frame}");
            continue;
        };

        let stats = RenderSystem::gather_commands(
            &scene.world,
            &registry,
            renderer.queue_mut(),
            view.camera_position,
            &view.frustum,
        );
        renderer.render_frame(&mut registry, &FrameContext::new(&view, scene.light()));

        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();

            let mut times: Vec<_> = renderer.last_gpu_times().iter().collect();
            times.sort_by_key(|(label, _)| **label);
            let gpu = times
                .iter()
                .map(|(label, ms)| format!("{label} {ms:.3}ms"))
                .collect::<Vec<_>>()
                .join(", ");

            log::info!(
                "frame {frame}: {} drawn, {}/{} culled | GPU: {}",
                stats.visible,
                stats.culled,
                stats.total,
                if gpu.is_empty() { "n/a" } else { gpu.as_str() }
            );
        }
    }

    log::info!(
        "Rendered {} frames in {:.2}s",
        renderer.frame_count(),
        started.elapsed().as_secs_f32()
    );
    Ok(())
}
