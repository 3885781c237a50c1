//! Culling Math
//!
//! Geometric primitives used by scene queries and cascade computation:
//!
//! - [`Extents3D`]: axis-aligned min/max box, transformable into world space
//! - [`Plane3D`]: normalized plane with signed distance tests
//! - [`Frustum`]: six inward-facing planes built from a camera basis
//! - [`distance_to_line`]: perpendicular distance from a point to an infinite line

use glam::{Mat4, Vec3};

// ============================================================================
// Extents
// ============================================================================

/// Axis-aligned bounding box stored as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extents3D {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents3D {
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Symmetric box of the given half size around the origin.
    #[must_use]
    pub fn from_half_size(half: Vec3) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min).abs() * 0.5
    }

    #[must_use]
    pub fn union(&self, other: &Extents3D) -> Extents3D {
        Extents3D {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms all eight corners and returns the enclosing box.
    #[must_use]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut new_min = Vec3::splat(f32::INFINITY);
        let mut new_max = Vec3::splat(f32::NEG_INFINITY);

        for point in corners {
            let transformed = matrix.transform_point3(point);
            new_min = new_min.min(transformed);
            new_max = new_max.max(transformed);
        }

        Self {
            min: new_min,
            max: new_max,
        }
    }
}

// ============================================================================
// Plane
// ============================================================================

/// A plane in Hessian normal form: `dot(normal, p) = distance`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane3D {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane3D {
    /// Builds a plane through `point`. The normal is normalized.
    #[must_use]
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Positive on the side the normal points to.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    #[inline]
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.signed_distance(center) > -radius
    }

    /// Box given as center + half extents.
    #[inline]
    #[must_use]
    pub fn intersects_aabb(&self, center: Vec3, half_extents: Vec3) -> bool {
        let r = half_extents.dot(self.normal.abs());
        -r <= self.signed_distance(center)
    }
}

// ============================================================================
// Frustum
// ============================================================================

/// View frustum made of six inward-facing planes.
///
/// Plane order: near, far, right, left, bottom, top.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frustum {
    pub planes: [Plane3D; 6],
}

impl Frustum {
    /// Builds a perspective frustum from a camera basis.
    ///
    /// `fov` is the vertical field of view in radians.
    #[must_use]
    pub fn new(
        position: Vec3,
        forward: Vec3,
        right: Vec3,
        up: Vec3,
        aspect: f32,
        fov: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let half_v = far * (fov * 0.5).tan();
        let half_h = half_v * aspect;
        let forward_far = forward * far;
        let right_half_h = right * half_h;
        let up_half_v = up * half_v;

        Self {
            planes: [
                Plane3D::from_point_normal(position + forward * near, forward),
                Plane3D::from_point_normal(position + forward_far, -forward),
                Plane3D::from_point_normal(position, up.cross(forward_far + right_half_h)),
                Plane3D::from_point_normal(position, (forward_far - right_half_h).cross(up)),
                Plane3D::from_point_normal(position, right.cross(forward_far - up_half_v)),
                Plane3D::from_point_normal(position, (forward_far + up_half_v).cross(right)),
            ],
        }
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.intersects_sphere(center, radius))
    }

    #[must_use]
    pub fn intersects_aabb(&self, center: Vec3, half_extents: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.intersects_aabb(center, half_extents))
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(point, 0.0)
    }
}

// ============================================================================
// Line Distance
// ============================================================================

/// Perpendicular distance from `point` to the infinite line through
/// `line_start` along `line_direction`.
///
/// A zero direction degenerates to the distance between the two points.
#[must_use]
pub fn distance_to_line(point: Vec3, line_start: Vec3, line_direction: Vec3) -> f32 {
    let len = line_direction.length();
    if len <= f32::EPSILON {
        return point.distance(line_start);
    }
    (point - line_start).cross(line_direction).length() / len
}
