//! Terrain
//!
//! A terrain is a grid of chunks. Each chunk owns one vertex range and a set
//! of index ranges, one per level of detail (0 = full detail).

use glam::Vec3;
use smallvec::SmallVec;

use crate::geometry::Geometry;
use crate::object::{ResourceState, impl_scene_object};
use crate::transform::Transform;

/// Index range drawn for one level of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkLod {
    pub index_count: u32,
    pub index_buffer_offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainChunk {
    /// Vertex range, local bounds and material of the chunk.
    pub geometry: Geometry,
    pub lods: SmallVec<[ChunkLod; 4]>,
    pub current_lod: usize,
}

impl TerrainChunk {
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            lods: SmallVec::new(),
            current_lod: 0,
        }
    }

    #[must_use]
    pub fn with_lod(mut self, lod: ChunkLod) -> Self {
        self.lods.push(lod);
        self
    }

    /// Geometry with the active LOD's index range applied. Falls back to the
    /// chunk geometry's own range when no LODs are defined.
    #[must_use]
    pub fn lod_geometry(&self) -> Geometry {
        let mut geometry = self.geometry;
        if let Some(lod) = self
            .lods
            .get(self.current_lod.min(self.lods.len().saturating_sub(1)))
        {
            geometry.index_count = lod.index_count;
            geometry.index_buffer_offset = lod.index_buffer_offset;
        }
        geometry
    }
}

#[derive(Debug, Clone)]
pub struct Terrain {
    pub name: String,
    pub state: ResourceState,
    pub generation: Option<u32>,
    pub unique_id: u32,
    pub transform: Transform,
    pub chunks: Vec<TerrainChunk>,
}

impl_scene_object!(Terrain);

impl Terrain {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            state: ResourceState::Created,
            generation: None,
            unique_id: 0,
            transform,
            chunks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_chunk(mut self, chunk: TerrainChunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Selects each chunk's LOD by distance from `view_position`.
    ///
    /// `lod_distances` are ascending band thresholds: a chunk closer than
    /// `lod_distances[0]` uses LOD 0, between `[0]` and `[1]` LOD 1, and so
    /// on, clamped to the chunk's coarsest LOD.
    pub fn update_lods(&mut self, view_position: Vec3, lod_distances: &[f32]) {
        let model = self.transform.world_matrix();
        for chunk in &mut self.chunks {
            let center = model.transform_point3(chunk.geometry.center);
            let distance = center.distance(view_position);
            let band = lod_distances.iter().take_while(|&&d| distance >= d).count();
            chunk.current_lod = band.min(chunk.lods.len().saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{Extents3D, MaterialRef};

    fn chunk_at(x: f32) -> TerrainChunk {
        let extents = Extents3D::new(Vec3::new(x - 1.0, 0.0, -1.0), Vec3::new(x + 1.0, 0.0, 1.0));
        TerrainChunk::new(Geometry::new(0, extents, MaterialRef::opaque(1)))
            .with_lod(ChunkLod { index_count: 600, index_buffer_offset: 0 })
            .with_lod(ChunkLod { index_count: 150, index_buffer_offset: 2400 })
            .with_lod(ChunkLod { index_count: 36, index_buffer_offset: 3000 })
    }

    #[test]
    fn lod_banding_by_distance() {
        let mut terrain = Terrain::new("t", Transform::IDENTITY)
            .with_chunk(chunk_at(5.0))
            .with_chunk(chunk_at(60.0))
            .with_chunk(chunk_at(500.0));
        terrain.update_lods(Vec3::ZERO, &[50.0, 120.0]);
        let lods: Vec<_> = terrain.chunks.iter().map(|c| c.current_lod).collect();
        assert_eq!(lods, vec![0, 1, 2]);
        assert_eq!(terrain.chunks[1].lod_geometry().index_count, 150);
    }
}
