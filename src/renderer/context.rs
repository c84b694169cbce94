//! Per-frame inputs to the renderer.

use super::uniforms::{PerFrameData, ShadowData};
use crate::scene::{DirectionalLight, FrameView};

/// Camera data and the directional light for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    pub frame: PerFrameData,
    pub light: DirectionalLight,
}

impl FrameContext {
    #[must_use]
    pub fn new(view: &FrameView, light: DirectionalLight) -> Self {
        Self {
            frame: view.frame,
            light,
        }
    }

    /// Shadow block without the light-space matrix, which the shadow pass fills in.
    #[must_use]
    pub fn shadow_data(&self) -> ShadowData {
        ShadowData {
            light_direction: self.light.direction.normalize_or(glam::Vec3::NEG_Y),
            light_color: self.light.color,
            light_intensity: self.light.intensity,
            ..ShadowData::default()
        }
    }
}
