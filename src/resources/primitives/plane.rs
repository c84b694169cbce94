use glam::{Vec2, Vec3};

use crate::resources::mesh::{MeshVertex, RawMesh};

/// Horizontal quad in the XZ plane facing +Y, `segments × segments` cells.
#[must_use]
pub fn create_plane(half_extent: f32, segments: u32) -> RawMesh {
    let segments = segments.max(1);
    let row = segments + 1;
    let step = 2.0 * half_extent / segments as f32;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for iz in 0..row {
        for ix in 0..row {
            let x = -half_extent + ix as f32 * step;
            let z = -half_extent + iz as f32 * step;
            let uv = Vec2::new(ix as f32, iz as f32) / segments as f32;
            vertices.push(MeshVertex::new(Vec3::new(x, 0.0, z), Vec3::Y, uv, Vec3::X));
        }
    }

    let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
    for iz in 0..segments {
        for ix in 0..segments {
            let a = ix + row * iz;
            let b = ix + row * (iz + 1);
            let c = b + 1;
            let d = a + 1;
            // Counter-clockwise seen from +Y.
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    RawMesh::new(vertices, indices)
}
