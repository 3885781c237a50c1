//! Camera
//!
//! A free camera defined by position and orientation. Projection lives on the
//! [`Viewport`](crate::viewport::Viewport); the camera only provides the view
//! transform and its basis vectors.

use glam::{EulerRot, Mat4, Quat, Vec3};
use kiln_core::Frustum;

use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    rotation: Quat,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Camera {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Camera at `position` looking at `target`. Looks down -Z when the two
    /// coincide.
    #[must_use]
    pub fn looking_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return Self::new(position, Quat::IDENTITY);
        }
        // Same degenerate-up fallback the shadow camera uses.
        let up = if forward.cross(up).length_squared() < 1e-6 {
            Vec3::X
        } else {
            up
        };
        let view = Mat4::look_at_rh(position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        Self::new(position, rotation.normalize())
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    /// Yaw about world Y, then pitch about the local X axis (radians).
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// World-to-view transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Culling frustum for this camera seen through `viewport`.
    #[must_use]
    pub fn frustum(&self, viewport: &Viewport) -> Frustum {
        Frustum::new(
            self.position,
            self.forward(),
            self.right(),
            self.up(),
            viewport.aspect(),
            viewport.fov(),
            viewport.near_clip(),
            viewport.far_clip(),
        )
    }
}
