//! Axis-aligned bounding boxes in world space.
//!
//! A null box (`min > max` on any axis) represents "no geometry" and is the
//! identity for [`Aabb::merge`]. Highlight boxes are only ever built from
//! finite, non-null bounds.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::NULL
    }
}

impl Aabb {
    /// The empty box. Merging anything into it yields that thing.
    pub const NULL: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from two corners, sorting components so `min <= max`.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from a center and half extents.
    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Whether the box contains no geometry.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.min.x > self.max.x
            || self.min.y > self.max.y
            || self.min.z > self.max.z
    }

    /// Whether both corners are finite numbers.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Non-null and finite: safe to turn into highlight geometry.
    #[inline]
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        !self.is_null() && self.is_finite()
    }

    /// Grow this box to enclose `other`. Null or non-finite boxes are
    /// ignored.
    pub fn merge(&mut self, other: &Self) {
        if !other.is_drawable() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Merge a sequence of boxes. Returns [`Aabb::NULL`] when none of them
    /// is drawable.
    #[must_use]
    pub fn merged<'a>(boxes: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut out = Self::NULL;
        for aabb in boxes {
            out.merge(aabb);
        }
        out
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half widths along each axis.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether a point lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// The axis-aligned box enclosing this box after `transform`.
    ///
    /// Transforms all eight corners, so rotated boxes grow to stay
    /// axis-aligned.
    #[must_use]
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        if self.is_null() {
            return Self::NULL;
        }
        let mut out = Self::NULL;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = transform.transform_point3(corner);
            out.min = out.min.min(p);
            out.max = out.max.max(p);
        }
        out
    }

    /// Approximate equality for tests and change detection.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        self.min.abs_diff_eq(other.min, max_abs_diff)
            && self.max.abs_diff_eq(other.max, max_abs_diff)
    }
}
