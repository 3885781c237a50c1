//! Render-data Queries
//!
//! Turn scene contents into per-frame draw records, allocated in the frame
//! arena:
//!
//! - frustum queries (camera view; no frustum = everything drawable)
//! - line queries (shadow casting: distance from the light ray)
//! - debug-shape queries (two-phase count/fill, or one exactly-sized slice)
//!
//! # Ordering
//!
//! Opaque records come first, grouped by material id. Transparent records
//! (`MaterialFlags::HAS_TRANSPARENCY`) follow, nearest to the reference point
//! first.

use glam::{Mat4, Vec3};
use kiln_core::{BumpVec, FrameArena, FrameData, Frustum, KilnError, Result, distance_to_line};

use crate::debug::DebugShape;
use crate::geometry::{Geometry, GeometryRenderData};
use crate::object::SceneObject;
use crate::scene::Scene;

/// Inclusion test applied to each geometry's world-space bounds.
#[derive(Clone, Copy)]
enum Cull<'a> {
    All,
    Frustum(&'a Frustum),
    Line {
        direction: Vec3,
        origin: Vec3,
        radius: f32,
    },
}

impl Cull<'_> {
    fn accepts(&self, geometry: &Geometry, model: &Mat4) -> bool {
        match *self {
            Cull::All => true,
            Cull::Frustum(frustum) => {
                let world = geometry.extents.transform(model);
                frustum.intersects_aabb(world.center(), world.half_extents())
            }
            Cull::Line {
                direction,
                origin,
                radius,
            } => {
                let center = model.transform_point3(geometry.center);
                let bounding_radius = geometry.extents.transform(model).half_extents().length();
                distance_to_line(center, origin, direction) - bounding_radius <= radius
            }
        }
    }
}

#[derive(Clone, Copy)]
struct TransparentEntry {
    distance: f32,
    record: GeometryRenderData,
}

/// Splits records into opaque and transparent buckets, then merges them in
/// draw order.
struct RenderDataCollector<'f> {
    reference: Vec3,
    opaque: BumpVec<'f, GeometryRenderData>,
    transparent: BumpVec<'f, TransparentEntry>,
}

impl<'f> RenderDataCollector<'f> {
    fn new(arena: &'f FrameArena, reference: Vec3) -> Self {
        Self {
            reference,
            opaque: arena.vec(),
            transparent: arena.vec(),
        }
    }

    fn push(&mut self, geometry: &Geometry, model: Mat4, unique_id: u32) {
        let record = GeometryRenderData::from_geometry(geometry, model, unique_id);
        if geometry.material.is_transparent() {
            let center = model.transform_point3(geometry.center);
            self.transparent.push(TransparentEntry {
                distance: center.distance(self.reference),
                record,
            });
        } else {
            self.opaque.push(record);
        }
    }

    fn finish(mut self) -> &'f [GeometryRenderData] {
        self.opaque.sort_unstable_by_key(|r| r.material.id);
        self.transparent.sort_unstable_by(|a, b| a.distance.total_cmp(&b.distance));
        self.opaque.reserve(self.transparent.len());
        self.opaque.extend(self.transparent.iter().map(|entry| entry.record));
        self.opaque.into_bump_slice()
    }
}

impl Scene {
    fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(KilnError::SceneNotLoaded(self.name().to_owned()))
        }
    }

    fn collect_meshes<'f>(
        &self,
        cull: Cull<'_>,
        reference: Vec3,
        arena: &'f FrameArena,
    ) -> &'f [GeometryRenderData] {
        let mut collector = RenderDataCollector::new(arena, reference);
        for mesh in self.meshes.values().filter(|m| m.is_drawable()) {
            let model = mesh.transform.world_matrix();
            for geometry in mesh.geometries.iter().filter(|g| g.is_uploaded()) {
                if cull.accepts(geometry, &model) {
                    collector.push(geometry, model, mesh.unique_id);
                }
            }
        }
        collector.finish()
    }

    fn collect_terrains<'f>(
        &self,
        cull: Cull<'_>,
        reference: Vec3,
        arena: &'f FrameArena,
    ) -> &'f [GeometryRenderData] {
        let mut collector = RenderDataCollector::new(arena, reference);
        for terrain in self.terrains.values().filter(|t| t.is_drawable()) {
            let model = terrain.transform.world_matrix();
            for chunk in terrain.chunks.iter().filter(|c| c.geometry.is_uploaded()) {
                let geometry = chunk.lod_geometry();
                if cull.accepts(&geometry, &model) {
                    collector.push(&geometry, model, terrain.unique_id);
                }
            }
        }
        collector.finish()
    }

    // ========================================================================
    // Frustum Queries
    // ========================================================================

    /// Mesh geometries inside `frustum` (all drawable ones when `None`).
    /// Transparent records are ordered by distance to `view_position`.
    pub fn mesh_render_data_query<'f>(
        &self,
        frustum: Option<&Frustum>,
        view_position: Vec3,
        frame: &FrameData<'f>,
    ) -> Result<&'f [GeometryRenderData]> {
        self.ensure_loaded()?;
        let cull = frustum.map_or(Cull::All, Cull::Frustum);
        Ok(self.collect_meshes(cull, view_position, frame.arena))
    }

    /// Terrain chunks inside `frustum`, drawn at their current LOD.
    pub fn terrain_render_data_query<'f>(
        &self,
        frustum: Option<&Frustum>,
        view_position: Vec3,
        frame: &FrameData<'f>,
    ) -> Result<&'f [GeometryRenderData]> {
        self.ensure_loaded()?;
        let cull = frustum.map_or(Cull::All, Cull::Frustum);
        Ok(self.collect_terrains(cull, view_position, frame.arena))
    }

    // ========================================================================
    // Line Queries
    // ========================================================================

    /// Mesh geometries whose bounding sphere comes within `radius` of the
    /// infinite line through `center` along `direction`.
    pub fn mesh_render_data_query_from_line<'f>(
        &self,
        direction: Vec3,
        center: Vec3,
        radius: f32,
        frame: &FrameData<'f>,
    ) -> Result<&'f [GeometryRenderData]> {
        self.ensure_loaded()?;
        let cull = Cull::Line {
            direction,
            origin: center,
            radius,
        };
        Ok(self.collect_meshes(cull, center, frame.arena))
    }

    pub fn terrain_render_data_query_from_line<'f>(
        &self,
        direction: Vec3,
        center: Vec3,
        radius: f32,
        frame: &FrameData<'f>,
    ) -> Result<&'f [GeometryRenderData]> {
        self.ensure_loaded()?;
        let cull = Cull::Line {
            direction,
            origin: center,
            radius,
        };
        Ok(self.collect_terrains(cull, center, frame.arena))
    }

    // ========================================================================
    // Debug Queries
    // ========================================================================

    fn debug_shapes(&self) -> impl Iterator<Item = &DebugShape> {
        let grid = self.grid.as_ref().filter(|_| self.config().debug_grid);
        let directional = self
            .directional_gizmos
            .iter()
            .filter(move |(key, _)| {
                self.directional_lights
                    .get(*key)
                    .is_some_and(|l| l.is_drawable())
            })
            .map(|(_, shape)| shape);
        let point = self
            .point_gizmos
            .iter()
            .filter(move |(key, _)| {
                self.point_lights
                    .get(*key)
                    .is_some_and(|l| l.is_drawable())
            })
            .map(|(_, shape)| shape);
        let selection = self.selection_box.as_ref().filter(|_| {
            self.selected
                .and_then(|key| self.meshes.get(key))
                .is_some_and(|m| m.is_drawable() && m.local_extents().is_some())
        });

        grid.into_iter()
            .chain(directional)
            .chain(point)
            .chain(selection)
    }

    /// Number of debug records [`Self::debug_render_data_fill`] will write.
    #[must_use]
    pub fn debug_render_data_count(&self) -> usize {
        if !self.is_loaded() {
            return 0;
        }
        self.debug_shapes().count()
    }

    /// Writes debug records into `out`. Returns how many were written.
    pub fn debug_render_data_fill(&self, out: &mut [GeometryRenderData]) -> Result<usize> {
        self.ensure_loaded()?;
        let required = self.debug_render_data_count();
        if out.len() < required {
            return Err(KilnError::DebugBufferTooSmall {
                required,
                provided: out.len(),
            });
        }
        for (slot, shape) in out.iter_mut().zip(self.debug_shapes()) {
            *slot = shape.render_data();
        }
        Ok(required)
    }

    /// Debug records in an exactly-sized arena slice.
    pub fn debug_render_data<'f>(&self, arena: &'f FrameArena) -> Result<&'f [GeometryRenderData]> {
        self.ensure_loaded()?;
        let mut records = arena.vec_with_capacity(self.debug_render_data_count());
        records.extend(self.debug_shapes().map(DebugShape::render_data));
        Ok(records.into_bump_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::DebugShapeKind;
    use crate::mesh::Mesh;
    use crate::transform::Transform;
    use kiln_core::{Extents3D, MaterialRef};

    fn unit_geometry(material: MaterialRef) -> Geometry {
        Geometry::new(0, Extents3D::from_half_size(Vec3::splat(0.5)), material)
            .with_indices(36, 0)
    }

    fn loaded_scene() -> Scene {
        let mut scene = Scene::default();
        scene.initialize().unwrap();
        scene.load().unwrap();
        scene
    }

    #[test]
    fn query_on_unloaded_scene_fails() {
        let arena = FrameArena::with_capacity(1024);
        let frame = FrameData::new(&arena, 0, 0.016, 0.0);
        let scene = Scene::default();
        assert!(matches!(
            scene.mesh_render_data_query(None, Vec3::ZERO, &frame),
            Err(KilnError::SceneNotLoaded(_))
        ));
    }

    #[test]
    fn line_query_uses_bounding_radius() {
        let arena = FrameArena::with_capacity(4096);
        let frame = FrameData::new(&arena, 0, 0.016, 0.0);
        let mut scene = loaded_scene();
        for x in [0.0, 3.0, 10.0] {
            scene.add_mesh(
                Mesh::new("m", Transform::from_position(Vec3::new(x, 0.0, 0.0)))
                    .with_geometry(unit_geometry(MaterialRef::opaque(1))),
            );
        }
        // Half-diagonal of a unit cube is ~0.866, so x = 3 is reachable with radius 2.5.
        let hits = scene
            .mesh_render_data_query_from_line(Vec3::NEG_Y, Vec3::new(0.0, 20.0, 0.0), 2.5, &frame)
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn two_phase_debug_query_matches_single_call() {
        let arena = FrameArena::with_capacity(4096);
        let mut scene = loaded_scene();
        scene.set_debug_grid(Some(DebugShape::new(
            DebugShapeKind::Grid,
            unit_geometry(MaterialRef::default()),
        )));

        let count = scene.debug_render_data_count();
        assert_eq!(count, 1);

        let mut too_small: [GeometryRenderData; 0] = [];
        assert!(matches!(
            scene.debug_render_data_fill(&mut too_small),
            Err(KilnError::DebugBufferTooSmall { required: 1, provided: 0 })
        ));

        let mut buffer = vec![GeometryRenderData::default(); count];
        let written = scene.debug_render_data_fill(&mut buffer).unwrap();
        assert_eq!(written, count);
        assert_eq!(scene.debug_render_data(&arena).unwrap(), buffer.as_slice());
    }
}
