//! Scene
//!
//! Owns every drawable object plus the debug shapes that visualize them, and
//! drives their lifecycle:
//!
//! ```text
//! Uninitialized -> Initialized -> Loading -> Loaded -> Unloading -> Unloaded
//! ```
//!
//! Objects added after the scene has been initialized or loaded are brought
//! to the same state immediately. Render-data queries live in
//! [`query`](crate::query).

use glam::Vec3;
use kiln_core::{FrameData, KilnError, Result};
use slotmap::{SecondaryMap, SlotMap};

use crate::config::SceneConfig;
use crate::debug::{DebugShape, SELECTION_BOX_COLOUR};
use crate::light::{DirectionalLight, DirectionalLightData, PointLight, PointLightData};
use crate::mesh::Mesh;
use crate::object::SceneObject;
use crate::skybox::Skybox;
use crate::terrain::Terrain;
use crate::{DirectionalLightKey, MeshKey, PointLightKey, SkyboxKey, TerrainKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    #[default]
    Uninitialized,
    Initialized,
    Loading,
    Loaded,
    Unloading,
    Unloaded,
}

impl SceneState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initialized => "Initialized",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Unloading => "Unloading",
            Self::Unloaded => "Unloaded",
        }
    }
}

pub struct Scene {
    config: SceneConfig,
    state: SceneState,
    next_unique_id: u32,

    pub(crate) meshes: SlotMap<MeshKey, Mesh>,
    pub(crate) terrains: SlotMap<TerrainKey, Terrain>,
    pub(crate) directional_lights: SlotMap<DirectionalLightKey, DirectionalLight>,
    pub(crate) point_lights: SlotMap<PointLightKey, PointLight>,
    pub(crate) skyboxes: SlotMap<SkyboxKey, Skybox>,

    // Insertion order; slot order changes when freed slots are reused.
    directional_order: Vec<DirectionalLightKey>,
    point_order: Vec<PointLightKey>,
    skybox_order: Vec<SkyboxKey>,

    // Debug shapes
    pub(crate) grid: Option<DebugShape>,
    pub(crate) directional_gizmos: SecondaryMap<DirectionalLightKey, DebugShape>,
    pub(crate) point_gizmos: SecondaryMap<PointLightKey, DebugShape>,
    pub(crate) selection_box: Option<DebugShape>,
    pub(crate) selected: Option<MeshKey>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    #[must_use]
    pub fn new(config: SceneConfig) -> Self {
        log::debug!("Scene '{}' created", config.name);
        Self {
            config,
            state: SceneState::Uninitialized,
            next_unique_id: 1,
            meshes: SlotMap::with_key(),
            terrains: SlotMap::with_key(),
            directional_lights: SlotMap::with_key(),
            point_lights: SlotMap::with_key(),
            skyboxes: SlotMap::with_key(),
            directional_order: Vec::new(),
            point_order: Vec::new(),
            skybox_order: Vec::new(),
            grid: None,
            directional_gizmos: SecondaryMap::new(),
            point_gizmos: SecondaryMap::new(),
            selection_box: None,
            selected: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SceneState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state == SceneState::Loaded
    }

    fn invalid_state(&self, operation: &'static str) -> KilnError {
        KilnError::InvalidSceneState {
            scene: self.config.name.clone(),
            operation,
            actual: self.state.as_str(),
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_unique_id;
        self.next_unique_id = self.next_unique_id.wrapping_add(1).max(1);
        id
    }

    /// Brings a freshly added object up to the scene's current state.
    fn adopt(&self, object: &mut impl SceneObject) {
        match self.state {
            SceneState::Initialized => object.initialize(),
            SceneState::Loading | SceneState::Loaded => object.load(),
            _ => {}
        }
    }

    fn for_each_object(&mut self, mut f: impl FnMut(&mut dyn SceneObject)) {
        self.meshes.values_mut().for_each(|o| f(o));
        self.terrains.values_mut().for_each(|o| f(o));
        self.directional_lights.values_mut().for_each(|o| f(o));
        self.point_lights.values_mut().for_each(|o| f(o));
        self.skyboxes.values_mut().for_each(|o| f(o));
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn initialize(&mut self) -> Result<()> {
        if self.state != SceneState::Uninitialized {
            return Err(self.invalid_state("initialize"));
        }
        self.for_each_object(|o| o.initialize());
        self.state = SceneState::Initialized;
        Ok(())
    }

    pub fn load(&mut self) -> Result<()> {
        if self.state != SceneState::Initialized {
            return Err(self.invalid_state("load"));
        }
        self.state = SceneState::Loading;
        self.for_each_object(|o| o.load());
        self.state = SceneState::Loaded;
        log::info!(
            "Scene '{}' loaded: {} meshes, {} terrains, {} directional / {} point lights, \
             {} skyboxes",
            self.config.name,
            self.meshes.len(),
            self.terrains.len(),
            self.directional_lights.len(),
            self.point_lights.len(),
            self.skyboxes.len()
        );
        Ok(())
    }

    /// Per-frame simulation step. Selects terrain chunk LODs for the viewer.
    pub fn update(&mut self, frame: &FrameData<'_>, view_position: Vec3) {
        if self.state != SceneState::Loaded {
            return;
        }
        let distances = &self.config.terrain_lod_distances;
        for terrain in self.terrains.values_mut().filter(|t| t.is_drawable()) {
            terrain.update_lods(view_position, distances);
        }
        log::trace!("Scene '{}' updated for frame {}", self.config.name, frame.frame_number);
    }

    /// Syncs debug shapes with the objects they visualize.
    pub fn render_frame_prepare(&mut self, frame: &FrameData<'_>) {
        if self.state != SceneState::Loaded {
            return;
        }

        for (key, gizmo) in &mut self.directional_gizmos {
            if let Some(light) = self.directional_lights.get(key) {
                gizmo.point_along(light.data.direction);
                gizmo.colour = light.data.colour;
            }
        }
        for (key, gizmo) in &mut self.point_gizmos {
            if let Some(light) = self.point_lights.get(key) {
                gizmo.place_at(light.data.position);
                gizmo.colour = light.data.colour;
            }
        }

        if let Some(key) = self.selected {
            match self.meshes.get(key) {
                Some(mesh) => {
                    if let (Some(shape), Some(extents)) =
                        (self.selection_box.as_mut(), mesh.local_extents())
                    {
                        shape.fit_box(mesh.transform.world_matrix(), &extents);
                        shape.colour = SELECTION_BOX_COLOUR;
                    }
                }
                None => self.selected = None,
            }
        }

        log::trace!("Scene '{}' prepared frame {}", self.config.name, frame.frame_number);
    }

    pub fn unload(&mut self) -> Result<()> {
        if !matches!(self.state, SceneState::Loaded | SceneState::Loading) {
            return Err(self.invalid_state("unload"));
        }
        self.state = SceneState::Unloading;
        self.for_each_object(|o| o.unload());

        self.meshes.clear();
        self.terrains.clear();
        self.directional_lights.clear();
        self.point_lights.clear();
        self.skyboxes.clear();
        self.directional_order.clear();
        self.point_order.clear();
        self.skybox_order.clear();
        self.directional_gizmos.clear();
        self.point_gizmos.clear();
        self.grid = None;
        self.selection_box = None;
        self.selected = None;

        self.state = SceneState::Unloaded;
        log::info!("Scene '{}' unloaded", self.config.name);
        Ok(())
    }

    // ========================================================================
    // Meshes & Terrains
    // ========================================================================

    pub fn add_mesh(&mut self, mut mesh: Mesh) -> MeshKey {
        mesh.unique_id = self.next_id();
        self.adopt(&mut mesh);
        self.meshes.insert(mesh)
    }

    pub fn remove_mesh(&mut self, key: MeshKey) -> Result<Mesh> {
        if self.selected == Some(key) {
            self.selected = None;
        }
        let mut mesh = self
            .meshes
            .remove(key)
            .ok_or_else(|| KilnError::InvalidHandle(format!("mesh {key:?}")))?;
        mesh.unload();
        Ok(mesh)
    }

    #[must_use]
    pub fn mesh(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    pub fn mesh_mut(&mut self, key: MeshKey) -> Option<&mut Mesh> {
        self.meshes.get_mut(key)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (MeshKey, &Mesh)> {
        self.meshes.iter()
    }

    pub fn add_terrain(&mut self, mut terrain: Terrain) -> TerrainKey {
        terrain.unique_id = self.next_id();
        self.adopt(&mut terrain);
        self.terrains.insert(terrain)
    }

    pub fn remove_terrain(&mut self, key: TerrainKey) -> Result<Terrain> {
        let mut terrain = self
            .terrains
            .remove(key)
            .ok_or_else(|| KilnError::InvalidHandle(format!("terrain {key:?}")))?;
        terrain.unload();
        Ok(terrain)
    }

    #[must_use]
    pub fn terrain(&self, key: TerrainKey) -> Option<&Terrain> {
        self.terrains.get(key)
    }

    pub fn terrain_mut(&mut self, key: TerrainKey) -> Option<&mut Terrain> {
        self.terrains.get_mut(key)
    }

    // ========================================================================
    // Lights & Skyboxes
    // ========================================================================

    /// Adds a directional light, optionally visualized by a line gizmo.
    pub fn add_directional_light(
        &mut self,
        mut light: DirectionalLight,
        gizmo: Option<DebugShape>,
    ) -> DirectionalLightKey {
        self.adopt(&mut light);
        let key = self.directional_lights.insert(light);
        self.directional_order.push(key);
        if let Some(mut gizmo) = gizmo {
            gizmo.unique_id = self.next_id();
            self.directional_gizmos.insert(key, gizmo);
        }
        key
    }

    pub fn remove_directional_light(
        &mut self,
        key: DirectionalLightKey,
    ) -> Result<DirectionalLight> {
        self.directional_gizmos.remove(key);
        let mut light = self
            .directional_lights
            .remove(key)
            .ok_or_else(|| KilnError::InvalidHandle(format!("directional light {key:?}")))?;
        self.directional_order.retain(|k| *k != key);
        light.unload();
        Ok(light)
    }

    pub fn directional_light_mut(
        &mut self,
        key: DirectionalLightKey,
    ) -> Option<&mut DirectionalLight> {
        self.directional_lights.get_mut(key)
    }

    /// The light that casts shadows: the earliest added directional light
    /// that is loaded. Removing it promotes the next one in add order.
    #[must_use]
    pub fn directional_light(&self) -> Option<&DirectionalLightData> {
        self.directional_order
            .iter()
            .filter_map(|key| self.directional_lights.get(*key))
            .find(|l| l.is_drawable())
            .map(|l| &l.data)
    }

    pub fn add_point_light(
        &mut self,
        mut light: PointLight,
        gizmo: Option<DebugShape>,
    ) -> PointLightKey {
        self.adopt(&mut light);
        let key = self.point_lights.insert(light);
        self.point_order.push(key);
        if let Some(mut gizmo) = gizmo {
            gizmo.unique_id = self.next_id();
            self.point_gizmos.insert(key, gizmo);
        }
        key
    }

    pub fn remove_point_light(&mut self, key: PointLightKey) -> Result<PointLight> {
        self.point_gizmos.remove(key);
        let mut light = self
            .point_lights
            .remove(key)
            .ok_or_else(|| KilnError::InvalidHandle(format!("point light {key:?}")))?;
        self.point_order.retain(|k| *k != key);
        light.unload();
        Ok(light)
    }

    pub fn point_light_mut(&mut self, key: PointLightKey) -> Option<&mut PointLight> {
        self.point_lights.get_mut(key)
    }

    /// Loaded point lights, in add order.
    pub fn point_lights(&self) -> impl Iterator<Item = &PointLightData> {
        self.point_order
            .iter()
            .filter_map(|key| self.point_lights.get(*key))
            .filter(|l| l.is_drawable())
            .map(|l| &l.data)
    }

    pub fn add_skybox(&mut self, mut skybox: Skybox) -> SkyboxKey {
        self.adopt(&mut skybox);
        let key = self.skyboxes.insert(skybox);
        self.skybox_order.push(key);
        key
    }

    pub fn remove_skybox(&mut self, key: SkyboxKey) -> Result<Skybox> {
        let mut skybox = self
            .skyboxes
            .remove(key)
            .ok_or_else(|| KilnError::InvalidHandle(format!("skybox {key:?}")))?;
        self.skybox_order.retain(|k| *k != key);
        skybox.unload();
        Ok(skybox)
    }

    /// The earliest added skybox that is loaded.
    #[must_use]
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox_order
            .iter()
            .filter_map(|key| self.skyboxes.get(*key))
            .find(|s| s.is_drawable())
    }

    // ========================================================================
    // Debug Shapes & Selection
    // ========================================================================

    pub fn set_debug_grid(&mut self, grid: Option<DebugShape>) {
        self.grid = match grid {
            Some(mut shape) => {
                shape.unique_id = self.next_id();
                Some(shape)
            }
            None => None,
        };
    }

    /// Shape used to outline the selected mesh.
    pub fn set_selection_box(&mut self, mut shape: DebugShape) {
        shape.unique_id = self.next_id();
        self.selection_box = Some(shape);
    }

    pub fn set_selected(&mut self, key: Option<MeshKey>) -> Result<()> {
        if let Some(key) = key
            && !self.meshes.contains_key(key)
        {
            return Err(KilnError::InvalidHandle(format!("mesh {key:?}")));
        }
        self.selected = key;
        Ok(())
    }

    #[must_use]
    pub fn selected(&self) -> Option<MeshKey> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::transform::Transform;
    use crate::object::ResourceState;
    use kiln_core::{Extents3D, MaterialRef};

    fn cube_mesh() -> Mesh {
        Mesh::new("cube", Transform::IDENTITY).with_geometry(Geometry::new(
            1,
            Extents3D::from_half_size(Vec3::ONE),
            MaterialRef::opaque(1),
        ))
    }

    #[test]
    fn lifecycle_transitions() {
        let mut scene = Scene::default();
        let key = scene.add_mesh(cube_mesh());
        assert_eq!(scene.mesh(key).unwrap().state, ResourceState::Created);

        scene.initialize().unwrap();
        assert_eq!(scene.mesh(key).unwrap().state, ResourceState::Initialized);

        scene.load().unwrap();
        let mesh = scene.mesh(key).unwrap();
        assert_eq!(mesh.state, ResourceState::Loaded);
        assert_eq!(mesh.generation, Some(0));

        scene.unload().unwrap();
        assert_eq!(scene.state(), SceneState::Unloaded);
        assert!(scene.mesh(key).is_none());
    }

    #[test]
    fn load_before_initialize_fails() {
        let mut scene = Scene::default();
        assert!(matches!(scene.load(), Err(KilnError::InvalidSceneState { .. })));
    }

    #[test]
    fn objects_added_to_loaded_scene_are_loaded() {
        let mut scene = Scene::default();
        scene.initialize().unwrap();
        scene.load().unwrap();
        let key = scene.add_mesh(cube_mesh());
        assert!(scene.mesh(key).unwrap().is_drawable());
    }

    #[test]
    fn removing_selected_mesh_clears_selection() {
        let mut scene = Scene::default();
        let key = scene.add_mesh(cube_mesh());
        scene.set_selected(Some(key)).unwrap();
        scene.remove_mesh(key).unwrap();
        assert_eq!(scene.selected(), None);
        assert!(scene.set_selected(Some(key)).is_err());
    }
}
