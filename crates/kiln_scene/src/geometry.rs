//! Geometry Descriptors and Draw Records
//!
//! [`Geometry`] describes a range of vertex/index data already uploaded by the
//! backend. [`GeometryRenderData`] is the per-frame draw record the scene
//! queries emit: one per visible geometry, allocated in the frame arena.

use glam::{Mat4, Vec3, Vec4};
use kiln_core::{Extents3D, MaterialRef};

/// A contiguous range of backend vertex/index data plus its local bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Backend id of the uploaded buffers.
    pub id: u32,
    /// `None` until the backend has uploaded the data.
    pub generation: Option<u32>,

    pub vertex_count: u32,
    pub vertex_buffer_offset: u64,
    pub index_count: u32,
    pub index_buffer_offset: u64,

    /// Local-space bounding box.
    pub extents: Extents3D,
    /// Local-space center used for distance sorting.
    pub center: Vec3,

    pub material: MaterialRef,
}

impl Geometry {
    /// Uploaded geometry with the given local bounds.
    #[must_use]
    pub fn new(id: u32, extents: Extents3D, material: MaterialRef) -> Self {
        Self {
            id,
            generation: Some(0),
            vertex_count: 0,
            vertex_buffer_offset: 0,
            index_count: 0,
            index_buffer_offset: 0,
            extents,
            center: extents.center(),
            material,
        }
    }

    #[must_use]
    pub fn with_vertices(mut self, count: u32, offset: u64) -> Self {
        self.vertex_count = count;
        self.vertex_buffer_offset = offset;
        self
    }

    #[must_use]
    pub fn with_indices(mut self, count: u32, offset: u64) -> Self {
        self.index_count = count;
        self.index_buffer_offset = offset;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        self.generation.is_some()
    }
}

/// Draw record for one geometry in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryRenderData {
    pub model: Mat4,
    pub material: MaterialRef,

    pub vertex_count: u32,
    pub vertex_buffer_offset: u64,
    pub index_count: u32,
    pub index_buffer_offset: u64,

    /// Model matrix flips handedness; the backend swaps front-face winding.
    pub winding_inverted: bool,
    /// Id of the owning scene object, stable across frames.
    pub unique_id: u32,
    /// Flat colour used by debug shapes.
    pub diffuse_colour: Vec4,
}

impl Default for GeometryRenderData {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            material: MaterialRef::default(),
            vertex_count: 0,
            vertex_buffer_offset: 0,
            index_count: 0,
            index_buffer_offset: 0,
            winding_inverted: false,
            unique_id: 0,
            diffuse_colour: Vec4::ONE,
        }
    }
}

impl GeometryRenderData {
    #[must_use]
    pub fn from_geometry(geometry: &Geometry, model: Mat4, unique_id: u32) -> Self {
        Self {
            model,
            material: geometry.material,
            vertex_count: geometry.vertex_count,
            vertex_buffer_offset: geometry.vertex_buffer_offset,
            index_count: geometry.index_count,
            index_buffer_offset: geometry.index_buffer_offset,
            winding_inverted: model.determinant() < 0.0,
            unique_id,
            diffuse_colour: Vec4::ONE,
        }
    }

    #[must_use]
    pub fn with_colour(mut self, colour: Vec4) -> Self {
        self.diffuse_colour = colour;
        self
    }
}
