//! Mesh data: the interleaved vertex format, CPU-side meshes and their slices
//! of the shared mega-buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::core::Aabb;

/// Interleaved vertex shared by all static geometry.
///
/// | Location | Attribute | Format      | Offset |
/// |----------|-----------|-------------|--------|
/// | 0        | position  | `Float32x3` | 0      |
/// | 1        | normal    | `Float32x3` | 12     |
/// | 2        | uv        | `Float32x2` | 24     |
/// | 3        | tangent   | `Float32x3` | 32     |
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
}

const _: () = assert!(std::mem::size_of::<MeshVertex>() == 44);

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
    ];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };

    #[must_use]
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2, tangent: Vec3) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent,
        }
    }
}

/// CPU-side triangle list, as produced by the importer or a primitive builder.
#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub local_bounds: Aabb,
}

impl RawMesh {
    /// Wraps vertex/index data and computes the local bounds.
    #[must_use]
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let local_bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
        Self {
            vertices,
            indices,
            local_bounds,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Replaces every normal with the area-weighted average of its adjacent face normals.
    pub fn compute_smooth_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (pa, pb, pc) = (
                self.vertices[a].position,
                self.vertices[b].position,
                self.vertices[c].position,
            );
            // Unnormalised cross product weights by triangle area.
            let n = (pb - pa).cross(pc - pa);
            accum[a] += n;
            accum[b] += n;
            accum[c] += n;
        }
        for (v, n) in self.vertices.iter_mut().zip(accum) {
            v.normal = n.normalize_or(Vec3::Y);
        }
    }

    /// Per-vertex tangents from UV gradients, Gram-Schmidt orthogonalised
    /// against the vertex normal.
    pub fn compute_tangents(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (va, vb, vc) = (self.vertices[a], self.vertices[b], self.vertices[c]);

            let e1 = vb.position - va.position;
            let e2 = vc.position - va.position;
            let d1 = vb.uv - va.uv;
            let d2 = vc.uv - va.uv;

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let t = (e1 * d2.y - e2 * d1.y) / det;
            accum[a] += t;
            accum[b] += t;
            accum[c] += t;
        }

        for (v, t) in self.vertices.iter_mut().zip(accum) {
            let ortho = t - v.normal * v.normal.dot(t);
            v.tangent = ortho.try_normalize().unwrap_or_else(|| v.normal.any_orthonormal_vector());
        }
    }
}

/// A mesh resident in the shared mega-buffer.
///
/// Immutable once created. Draw it with `draw_indexed(base_index..base_index +
/// index_count, base_vertex, ..)` against the shared vertex/index buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuMesh {
    pub base_vertex: i32,
    pub base_index: u32,
    pub index_count: u32,
    pub local_bounds: Aabb,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> RawMesh {
        let v = |p: Vec3, uv: Vec2| MeshVertex::new(p, Vec3::Z, uv, Vec3::ZERO);
        RawMesh::new(
            vec![
                v(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 0.0)),
                v(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 0.0)),
                v(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 1.0)),
            ],
            vec![0, 1, 2],
        )
    }

    #[test]
    fn tangents_follow_u_direction() {
        let mut mesh = triangle();
        mesh.compute_tangents();
        for v in &mesh.vertices {
            assert!((v.tangent - Vec3::X).length() < 1e-5, "{:?}", v.tangent);
        }
    }

    #[test]
    fn smooth_normals_of_ccw_triangle_face_plus_z() {
        let mut mesh = triangle();
        for v in &mut mesh.vertices {
            v.normal = Vec3::ZERO;
        }
        mesh.compute_smooth_normals();
        for v in &mesh.vertices {
            assert!((v.normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = triangle();
        assert_eq!(mesh.local_bounds.min, Vec3::ZERO);
        assert_eq!(mesh.local_bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
