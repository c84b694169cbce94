//! Axis-aligned bounding boxes.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
///
/// An *empty* box is encoded as `min > max` on every axis, so expanding it by
/// any point yields exactly that point. All `expand_*` operations are
/// monotonic: a box never shrinks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(-f32::MAX),
    };

    #[inline]
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Builds the tightest box around a set of points. Empty input yields [`Aabb::EMPTY`].
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.expand_point(p);
        }
        aabb
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Invalid, or zero extent on every axis (a single point).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.is_valid() || self.size().cmple(Vec3::ZERO).all()
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half size.
    #[inline]
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    #[inline]
    pub fn expand_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grows this box to contain `other`. Expanding by an empty box is a no-op.
    pub fn expand_aabb(&mut self, other: &Aabb) {
        if other.is_valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// The 8 corners, bit `i&1` selects x, `i&2` selects y, `i&4` selects z.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Bounds of this box after transforming all 8 corners by `matrix`.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if !self.is_valid() {
            return Self::EMPTY;
        }
        Self::from_points(self.corners().into_iter().map(|c| matrix.transform_point3(c)))
    }
}
