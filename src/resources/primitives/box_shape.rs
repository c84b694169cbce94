use glam::{Vec2, Vec3};

use crate::resources::mesh::{MeshVertex, RawMesh};

/// Face table: (normal, tangent/u-axis, v-axis) with `u × v = normal`.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
];

/// Axis-aligned cube centred on the origin: 24 vertices (4 per face, so
/// normals stay flat) and 36 indices, counter-clockwise.
#[must_use]
pub fn create_box(half_extent: f32) -> RawMesh {
    let h = half_extent;
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    // (u sign, v sign, uv); V points down in texture space.
    let quad = [
        (-1.0, -1.0, Vec2::new(0.0, 1.0)),
        (1.0, -1.0, Vec2::new(1.0, 1.0)),
        (1.0, 1.0, Vec2::new(1.0, 0.0)),
        (-1.0, 1.0, Vec2::new(0.0, 0.0)),
    ];

    for (face, (normal, u, v)) in FACES.iter().enumerate() {
        for &(su, sv, uv) in &quad {
            let position = (*normal + *u * su + *v * sv) * h;
            vertices.push(MeshVertex::new(position, *normal, uv, *u));
        }
        let base = face as u32 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    RawMesh::new(vertices, indices)
}
