//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`DuskError`] covers every *recoverable* failure mode:
//! - File I/O and asset decoding errors
//! - Shader include resolution errors
//! - GPU shader / pipeline validation errors
//! - Missing GPU capabilities at startup
//!
//! Programmer errors (stale handle dereference, mega-buffer overflow) are not
//! represented here. They panic with a diagnostic at the call site.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, DuskError>`.
//!
//! ```rust,ignore
//! use dusk::errors::Result;
//!
//! fn load(registry: &mut ResourceRegistry) -> Result<()> {
//!     let mesh = registry.load_mesh("assets/box.obj")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the Dusk engine.
#[derive(Error, Debug)]
pub enum DuskError {
    // ========================================================================
    // I/O & Asset Errors
    // ========================================================================
    /// A file could not be read.
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        /// The offending path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested asset does not exist (canonicalisation failed).
    #[error("Asset not found: {}", .0.display())]
    AssetNotFound(PathBuf),

    /// The mesh importer produced no usable geometry.
    #[error("Failed to load mesh '{}': {reason}", .path.display())]
    MeshLoad { path: PathBuf, reason: String },

    /// The image decoder rejected a file.
    #[error("Failed to decode image '{}': {source}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// A quoted `#include` directive could not be parsed or resolved.
    #[error("Malformed #include at line {line} in '{}': {reason}", .path.display())]
    ShaderInclude {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A file includes itself, directly or transitively.
    #[error("Include cycle at line {line} in '{}': {chain}", .path.display())]
    ShaderIncludeCycle {
        path: PathBuf,
        line: usize,
        /// `a.wgsl -> b.wgsl -> a.wgsl`
        chain: String,
    },

    /// The GPU rejected a shader module or pipeline.
    #[error("Shader '{label}' failed to compile:\n{message}")]
    ShaderCompile { label: String, message: String },

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// A required device capability is not available.
    #[error("Missing GPU capability: {0}")]
    MissingCapability(String),
}

impl DuskError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Alias for `Result<T, DuskError>`.
pub type Result<T> = std::result::Result<T, DuskError>;
