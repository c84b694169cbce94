//! Headless device creation.
//!
//! The renderer never owns a surface; callers that do not already have a
//! device (tools, tests, the headless demo) can get one here.

use crate::errors::{DuskError, Result};

/// Blocks on adapter and device creation.
///
/// `TIMESTAMP_QUERY` is requested when `gpu_timing` is set and the adapter
/// supports it; otherwise the renderer silently runs without GPU timings.
pub fn request_headless_device(
    power_preference: wgpu::PowerPreference,
    gpu_timing: bool,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|e| DuskError::AdapterRequestFailed(e.to_string()))?;

    let info = adapter.get_info();
    log::info!("Using adapter '{}' ({:?}, {:?})", info.name, info.device_type, info.backend);

    let mut required_features = wgpu::Features::empty();
    if gpu_timing && adapter.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
        required_features |= wgpu::Features::TIMESTAMP_QUERY;
    }

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Dusk Device"),
        required_features,
        required_limits: adapter.limits(),
        memory_hints: wgpu::MemoryHints::Performance,
        ..Default::default()
    }))?;

    Ok((device, queue))
}
