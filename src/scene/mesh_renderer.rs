use crate::core::{MaterialHandle, MeshHandle};

/// Makes an entity drawable.
///
/// Stores full generation-checked handles, so a component that outlives its
/// mesh is caught at lookup instead of silently drawing whatever reused the slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
    /// `None` draws with the default material.
    pub material: Option<MaterialHandle>,
    pub casts_shadow: bool,
    pub visible: bool,
}

impl MeshRenderer {
    #[must_use]
    pub fn new(mesh: MeshHandle) -> Self {
        Self {
            mesh,
            material: None,
            casts_shadow: true,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: MaterialHandle) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_shadows(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }
}
