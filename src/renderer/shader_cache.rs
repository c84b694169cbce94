//! Compiled shader modules keyed by [`ShaderHandle`].
//!
//! Source is parsed and validated with naga before a `wgpu::ShaderModule` is
//! created, so a broken edit surfaces as a [`DuskError::ShaderCompile`] whose
//! diagnostic points at the original file and line, while the previously
//! compiled module stays installed.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use wgpu::naga;

use crate::core::ShaderHandle;
use crate::errors::{DuskError, Result};
use crate::resources::{Shader, ShaderCompiler};

pub struct CompiledShader {
    pub module: wgpu::ShaderModule,
    pub label: String,
    /// [`Shader::revision`] this module was built from.
    pub revision: u64,
}

pub struct ShaderCache {
    device: wgpu::Device,
    modules: FxHashMap<ShaderHandle, CompiledShader>,
}

impl ShaderCache {
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            device: device.clone(),
            modules: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn get(&self, handle: ShaderHandle) -> Option<&CompiledShader> {
        self.modules.get(&handle)
    }

    #[must_use]
    pub fn revision(&self, handle: ShaderHandle) -> Option<u64> {
        self.modules.get(&handle).map(|c| c.revision)
    }
}

/// Parses and validates WGSL, mapping diagnostics back through the line map.
pub fn validate_wgsl(shader: &Shader) -> Result<()> {
    let source = shader.source();
    let fail = |message: String| DuskError::ShaderCompile {
        label: shader.label.clone(),
        message: shader.processed.remap_diagnostic(&message),
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::default())
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source)))?;

    Ok(())
}

impl ShaderCompiler for ShaderCache {
    fn compile(&mut self, handle: ShaderHandle, shader: &Shader) -> Result<()> {
        validate_wgsl(shader)?;

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&shader.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader.source())),
        });

        log::debug!("Compiled shader '{}' (revision {})", shader.label, shader.revision);

        self.modules.insert(
            handle,
            CompiledShader {
                module,
                label: shader.label.clone(),
                revision: shader.revision,
            },
        );
        Ok(())
    }
}
