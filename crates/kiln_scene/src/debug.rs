//! Debug Shapes
//!
//! Line geometry drawn on top of the scene: the ground grid, light gizmos and
//! the selection box. Shapes carry a flat colour instead of a material.

use glam::{Mat4, Quat, Vec3, Vec4};
use kiln_core::Extents3D;

use crate::geometry::{Geometry, GeometryRenderData};

/// Colour of the selection box.
pub const SELECTION_BOX_COLOUR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
/// Colour of the ground grid.
pub const GRID_COLOUR: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugShapeKind {
    Grid,
    Line,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugShape {
    pub kind: DebugShapeKind,
    pub geometry: Geometry,
    pub transform: Mat4,
    pub colour: Vec4,
    pub unique_id: u32,
}

impl DebugShape {
    #[must_use]
    pub fn new(kind: DebugShapeKind, geometry: Geometry) -> Self {
        Self {
            kind,
            geometry,
            transform: Mat4::IDENTITY,
            colour: Vec4::ONE,
            unique_id: 0,
        }
    }

    #[must_use]
    pub fn with_colour(mut self, colour: Vec4) -> Self {
        self.colour = colour;
        self
    }

    /// Rotates a -Z line gizmo to point along `direction`.
    pub fn point_along(&mut self, direction: Vec3) {
        let dir = direction.normalize_or_zero();
        if dir != Vec3::ZERO {
            self.transform = Mat4::from_quat(Quat::from_rotation_arc(Vec3::NEG_Z, dir));
        }
    }

    pub fn place_at(&mut self, position: Vec3) {
        self.transform = Mat4::from_translation(position);
    }

    /// Fits a unit box gizmo (extents -0.5..0.5) around `extents` in the
    /// space of `model`.
    pub fn fit_box(&mut self, model: Mat4, extents: &Extents3D) {
        self.transform = model
            * Mat4::from_translation(extents.center())
            * Mat4::from_scale(extents.size().max(Vec3::splat(1e-4)));
    }

    #[must_use]
    pub fn render_data(&self) -> GeometryRenderData {
        GeometryRenderData::from_geometry(&self.geometry, self.transform, self.unique_id)
            .with_colour(self.colour)
    }
}
