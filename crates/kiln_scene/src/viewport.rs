//! Viewport
//!
//! A screen rectangle plus the projection used to render into it.

use glam::{Mat4, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionType {
    #[default]
    Perspective,
    /// Pixel-space orthographic projection over the viewport rect.
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// x, y, width, height in pixels.
    rect: Vec4,
    /// Vertical field of view, radians.
    fov: f32,
    near_clip: f32,
    far_clip: f32,
    projection_type: ProjectionType,
    projection: Mat4,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::perspective(1.0, 1.0, 45f32.to_radians(), 0.1, 1000.0)
    }
}

impl Viewport {
    #[must_use]
    pub fn new(
        rect: Vec4,
        fov: f32,
        near_clip: f32,
        far_clip: f32,
        projection_type: ProjectionType,
    ) -> Self {
        let mut viewport = Self {
            rect,
            fov,
            near_clip,
            far_clip,
            projection_type,
            projection: Mat4::IDENTITY,
        };
        viewport.regenerate_projection();
        viewport
    }

    /// Perspective viewport covering `width` x `height` from the origin.
    #[must_use]
    pub fn perspective(width: f32, height: f32, fov: f32, near_clip: f32, far_clip: f32) -> Self {
        Self::new(
            Vec4::new(0.0, 0.0, width, height),
            fov,
            near_clip,
            far_clip,
            ProjectionType::Perspective,
        )
    }

    /// Updates the rectangle and rebuilds the projection.
    pub fn resize(&mut self, rect: Vec4) {
        self.rect = rect;
        self.regenerate_projection();
    }

    pub fn set_clip_planes(&mut self, near_clip: f32, far_clip: f32) {
        self.near_clip = near_clip;
        self.far_clip = far_clip;
        self.regenerate_projection();
    }

    fn regenerate_projection(&mut self) {
        self.projection = match self.projection_type {
            ProjectionType::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect(), self.near_clip, self.far_clip)
            }
            ProjectionType::Orthographic => Mat4::orthographic_rh(
                self.rect.x,
                self.rect.x + self.rect.z,
                self.rect.y + self.rect.w,
                self.rect.y,
                self.near_clip,
                self.far_clip,
            ),
        };
    }

    #[inline]
    #[must_use]
    pub fn rect(&self) -> Vec4 {
        self.rect
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.rect.z
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rect.w
    }

    /// Width over height; 1.0 for a degenerate rect.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.rect.w > 0.0 {
            self.rect.z / self.rect.w
        } else {
            1.0
        }
    }

    #[inline]
    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    #[must_use]
    pub fn near_clip(&self) -> f32 {
        self.near_clip
    }

    #[inline]
    #[must_use]
    pub fn far_clip(&self) -> f32 {
        self.far_clip
    }

    #[inline]
    #[must_use]
    pub fn projection_type(&self) -> ProjectionType {
        self.projection_type
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}
