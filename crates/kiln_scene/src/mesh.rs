//! Meshes

use kiln_core::Extents3D;
use smallvec::SmallVec;

use crate::geometry::Geometry;
use crate::object::{ResourceState, impl_scene_object};
use crate::transform::Transform;

/// A transformed group of geometries.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub state: ResourceState,
    pub generation: Option<u32>,
    /// Assigned by the scene when the mesh is added.
    pub unique_id: u32,
    pub transform: Transform,
    pub geometries: SmallVec<[Geometry; 4]>,
}

impl_scene_object!(Mesh);

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            state: ResourceState::Created,
            generation: None,
            unique_id: 0,
            transform,
            geometries: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    /// Local bounds of all geometries; `None` when the mesh is empty.
    #[must_use]
    pub fn local_extents(&self) -> Option<Extents3D> {
        self.geometries
            .iter()
            .map(|g| g.extents)
            .reduce(|acc, e| acc.union(&e))
    }
}
