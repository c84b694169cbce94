//! Mega-Buffer Allocator
//!
//! All static geometry lives in one vertex buffer and one index buffer of
//! fixed capacity. Meshes are bump-allocated from two monotonically
//! increasing cursors and addressed with base-vertex / base-index offsets, so
//! every draw call binds the same pair of buffers.
//!
//! There is no deallocation path and no growth: the buffers live as long as
//! the registry, and running out of space is a configuration error that
//! panics.
//!
//! # GPU Synchronisation
//!
//! `MeshBuffer` is the CPU-side bookkeeping. Each [`MeshBuffer::upload`]
//! queues a [`PendingUpload`] describing the byte ranges just written; the
//! renderer drains them with [`MeshBuffer::take_pending`] and writes them into
//! its pre-allocated GPU buffers before the next frame is recorded.

use std::mem::size_of;

use super::mesh::MeshVertex;

/// Vertex capacity of the shared buffer.
pub const MAX_VERTICES: u32 = 524_288;
/// Index capacity of the shared buffer.
pub const MAX_INDICES: u32 = 1_572_864;

/// Size in bytes of the GPU vertex buffer.
pub const VERTEX_BUFFER_SIZE: u64 = MAX_VERTICES as u64 * size_of::<MeshVertex>() as u64;
/// Size in bytes of the GPU index buffer.
pub const INDEX_BUFFER_SIZE: u64 = MAX_INDICES as u64 * size_of::<u32>() as u64;

/// Base offsets of one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshAllocation {
    pub base_vertex: u32,
    pub base_index: u32,
}

/// Byte ranges waiting to be written into the GPU buffers.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub vertex_offset: u64,
    pub vertex_bytes: Vec<u8>,
    pub index_offset: u64,
    pub index_bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MeshBuffer {
    vertex_cursor: u32,
    index_cursor: u32,
    upload_count: usize,
    pending: Vec<PendingUpload>,
}

impl MeshBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mesh and returns its base offsets.
    ///
    /// # Panics
    ///
    /// Panics when either buffer would exceed its capacity.
    #[track_caller]
    pub fn upload(&mut self, vertices: &[MeshVertex], indices: &[u32]) -> MeshAllocation {
        let vertex_count = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
        let index_count = u32::try_from(indices.len()).unwrap_or(u32::MAX);

        assert!(
            self.vertex_cursor
                .checked_add(vertex_count)
                .is_some_and(|end| end <= MAX_VERTICES),
            "MeshBuffer vertex overflow: {} used + {vertex_count} requested > {MAX_VERTICES}",
            self.vertex_cursor,
        );
        assert!(
            self.index_cursor
                .checked_add(index_count)
                .is_some_and(|end| end <= MAX_INDICES),
            "MeshBuffer index overflow: {} used + {index_count} requested > {MAX_INDICES}",
            self.index_cursor,
        );

        let allocation = MeshAllocation {
            base_vertex: self.vertex_cursor,
            base_index: self.index_cursor,
        };

        self.pending.push(PendingUpload {
            vertex_offset: u64::from(allocation.base_vertex) * size_of::<MeshVertex>() as u64,
            vertex_bytes: bytemuck::cast_slice(vertices).to_vec(),
            index_offset: u64::from(allocation.base_index) * size_of::<u32>() as u64,
            index_bytes: bytemuck::cast_slice(indices).to_vec(),
        });

        self.vertex_cursor += vertex_count;
        self.index_cursor += index_count;
        self.upload_count += 1;

        log::debug!(
            "MeshBuffer: +{vertex_count} vertices @ {}, +{index_count} indices @ {} ({}/{MAX_VERTICES} vertices used)",
            allocation.base_vertex,
            allocation.base_index,
            self.vertex_cursor,
        );

        allocation
    }

    /// Vertices allocated so far.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_cursor
    }

    /// Indices allocated so far.
    #[inline]
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_cursor
    }

    /// Number of successful [`MeshBuffer::upload`] calls.
    #[inline]
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.upload_count
    }

    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains the uploads not yet written to the GPU, in allocation order.
    pub fn take_pending(&mut self) -> Vec<PendingUpload> {
        std::mem::take(&mut self.pending)
    }
}
