//! Shader programs as seen by the registry: a root source file, its flattened
//! text and the files it depends on.

use std::path::{Path, PathBuf};

use xxhash_rust::xxh3::xxh3_128;

use super::shader_preprocessor::{ProcessedShader, ShaderPreprocessor};
use crate::core::ShaderHandle;
use crate::errors::Result;

#[derive(Debug, Clone)]
pub struct Shader {
    pub label: String,
    /// Root source file as given by the caller.
    pub path: PathBuf,
    pub processed: ProcessedShader,
    /// xxh3 of `processed.source`.
    pub hash: u128,
    /// Incremented on every committed reload.
    pub revision: u64,
}

impl Shader {
    pub fn load(label: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let processed = ShaderPreprocessor::new().process(&path)?;
        Ok(Self {
            label: label.into(),
            hash: xxh3_128(processed.source.as_bytes()),
            path,
            processed,
            revision: 0,
        })
    }

    /// Runs the preprocessor again without touching `self`.
    pub fn reprocess(&self) -> Result<ProcessedShader> {
        ShaderPreprocessor::new().process(&self.path)
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.processed.source
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[PathBuf] {
        &self.processed.dependencies
    }

    /// Installs freshly processed source and bumps the revision.
    pub fn commit(&mut self, processed: ProcessedShader) {
        self.hash = xxh3_128(processed.source.as_bytes());
        self.processed = processed;
        self.revision += 1;
    }

    /// Root file name, used for reload reporting.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Turns shader source into a GPU program.
///
/// Implemented by the renderer's shader cache. A failed compile must leave the
/// previously compiled program for `handle` in place.
pub trait ShaderCompiler {
    fn compile(&mut self, handle: ShaderHandle, shader: &Shader) -> Result<()>;
}
