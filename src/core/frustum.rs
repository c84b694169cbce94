//! View-frustum extraction and containment tests.

use glam::{Mat4, Vec3, Vec4};

use super::geometry::Aabb;

/// Six world-space planes `(n.xyz, d)`: a point `p` is inside a plane when
/// `dot(n, p) + d >= 0`.
///
/// Plane order: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes of `view_projection` (Gribb-Hartmann).
    ///
    /// The near plane is taken as `row3 + row2`. With a `[0, 1]` depth range
    /// (wgpu, `Mat4::perspective_rh`) this plane lies at or behind the true
    /// near plane, which keeps every test conservative.
    #[must_use]
    pub fn from_view_projection(view_projection: Mat4) -> Self {
        let m = view_projection;
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));

        let mut planes = [
            r3 + r0, // Left
            r3 - r0, // Right
            r3 + r1, // Bottom
            r3 - r1, // Top
            r3 + r2, // Near
            r3 - r2, // Far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 1e-6 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Conservative box test.
    ///
    /// The 8 local-space corners are moved to world space by `model`; the box is
    /// rejected only when all 8 lie strictly on the negative side of a single
    /// plane. Boxes straddling a frustum corner may pass, visible boxes never fail.
    #[must_use]
    pub fn contains_aabb(&self, aabb: &Aabb, model: &Mat4) -> bool {
        let corners = aabb.corners().map(|c| model.transform_point3(c));

        for plane in &self.planes {
            let n = plane.truncate();
            let all_outside = corners.iter().all(|c| n.dot(*c) + plane.w < 0.0);
            if all_outside {
                return false;
            }
        }
        true
    }

    /// Sphere test against the normalised planes.
    #[must_use]
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}
