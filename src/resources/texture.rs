//! Texture resources held by the registry.

use std::path::PathBuf;

use super::image::Image;

/// CPU texture: decoded pixels plus where they came from.
///
/// The GPU copy is created lazily by the renderer the first time a draw
/// command references this texture.
#[derive(Debug, Clone)]
pub struct Texture {
    pub label: String,
    /// `None` for procedural and default textures.
    pub source: Option<PathBuf>,
    pub image: Image,
}

impl Texture {
    #[must_use]
    pub fn new(label: impl Into<String>, image: Image) -> Self {
        Self {
            label: label.into(),
            source: None,
            image,
        }
    }
}
