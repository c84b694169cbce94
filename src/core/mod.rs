//! Core math and bookkeeping shared by every other module.
//!
//! - [`geometry`]: axis-aligned bounding boxes
//! - [`frustum`]: frustum plane extraction and culling tests
//! - [`handle`]: generation-checked handles and the [`HandlePool`] allocator

pub mod frustum;
pub mod geometry;
pub mod handle;

pub use frustum::Frustum;
pub use geometry::Aabb;
pub use handle::{
    Handle, HandlePool, MaterialHandle, MaterialTag, MeshHandle, MeshTag, ShaderHandle, ShaderTag,
    TextureHandle, TextureTag,
};

/// Rounds `value` up to the next multiple of `alignment` (a power of two).
#[inline]
#[must_use]
pub const fn align_to(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}
