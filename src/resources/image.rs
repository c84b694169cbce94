//! CPU images: decoded RGBA8 pixels plus an optional mip chain.

use std::path::Path;

use image::{RgbaImage, imageops::FilterType};

use crate::errors::{DuskError, Result};

/// RGBA8 pixel data ready for upload. `mips[0]` is the full-resolution level.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// Sample as sRGB (albedo) or linear (normal / ORM data).
    pub srgb: bool,
    pub mips: Vec<Vec<u8>>,
}

impl Image {
    /// A 1×1 image of a single colour.
    #[must_use]
    pub fn solid(rgba: [u8; 4], srgb: bool) -> Self {
        Self {
            width: 1,
            height: 1,
            srgb,
            mips: vec![rgba.to_vec()],
        }
    }

    /// Decodes `path`, converting any channel layout to RGBA8.
    pub fn load(path: &Path, srgb: bool, generate_mipmaps: bool) -> Result<Self> {
        let decoded = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(io) => DuskError::io(path, io),
            source => DuskError::ImageDecode {
                path: path.to_path_buf(),
                source,
            },
        })?;

        log::debug!(
            "Decoded '{}' ({}x{}, {:?})",
            path.display(),
            decoded.width(),
            decoded.height(),
            decoded.color()
        );

        Ok(Self::from_rgba(decoded.to_rgba8(), srgb, generate_mipmaps))
    }

    #[must_use]
    pub fn from_rgba(base: RgbaImage, srgb: bool, generate_mipmaps: bool) -> Self {
        let (width, height) = base.dimensions();
        let mut mips = Vec::new();

        if generate_mipmaps {
            let mut level = base;
            loop {
                let (w, h) = level.dimensions();
                let next = (w > 1 || h > 1)
                    .then(|| image::imageops::resize(&level, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle));
                mips.push(level.into_raw());
                match next {
                    Some(n) => level = n,
                    None => break,
                }
            }
        } else {
            mips.push(base.into_raw());
        }

        Self {
            width,
            height,
            srgb,
            mips,
        }
    }

    #[inline]
    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.mips.len() as u32
    }

    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }
}

/// Number of mip levels in a full chain for a `width × height` image.
#[must_use]
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_reaches_one_pixel() {
        let img = Image::from_rgba(RgbaImage::new(8, 4), true, true);
        assert_eq!(img.mip_level_count(), full_mip_count(8, 4));
        assert_eq!(img.mips.last().map(Vec::len), Some(4));
        assert_eq!(img.mips[1].len(), 4 * 2 * 4);
    }

    #[test]
    fn full_mip_count_matches_log2() {
        assert_eq!(full_mip_count(1, 1), 1);
        assert_eq!(full_mip_count(256, 1), 9);
        assert_eq!(full_mip_count(300, 200), 9);
    }
}
