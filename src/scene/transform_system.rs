//! Transform System
//!
//! Rebuilds the world matrix of every dirty [`Transform`]. Entities have no
//! parent hierarchy, so local and world space coincide.

use super::transform::Transform;
use super::world::World;

pub struct TransformSystem;

impl TransformSystem {
    /// Returns the number of matrices recomputed.
    pub fn update(world: &mut World) -> usize {
        let mut updated = 0;
        for (_, transform) in world.iter_mut::<Transform>() {
            if !transform.dirty {
                continue;
            }
            transform.world_matrix = transform.compute_matrix();
            transform.dirty = false;
            updated += 1;
        }
        updated
    }
}
