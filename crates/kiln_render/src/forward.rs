//! Forward Rendergraph
//!
//! A [`RenderGraph`] pre-wired with the three built-in passes:
//!
//! ```text
//! globals:   colourbuffer (Colour), depthbuffer (DepthStencil)
//! skybox:    colourbuffer <- global colourbuffer     => colourbuffer (Other)
//! shadowmap:                                         => depthbuffer  (SelfOwned)
//! scene:     colourbuffer <- skybox.colourbuffer     => colourbuffer (Other)
//!            depthbuffer  <- global depthbuffer      => depthbuffer  (Global)
//!            shadowmap    <- shadowmap.depthbuffer
//! ```
//!
//! [`ForwardRenderGraph::frame_prepare`] runs the scene queries once per
//! frame and fills every pass's frame data; [`ForwardRenderGraph::execute_frame`]
//! then submits the passes that are flagged executable.

use glam::Vec4;
use kiln_core::{FrameData, Result, TextureHandle};
use kiln_scene::{Camera, GeometryRenderData, Scene, Viewport};
use serde::{Deserialize, Serialize};

use crate::backend::RenderBackend;
use crate::graph::{FramePassData, PassExtData, PassId, RenderGraph, ResourceKind, SourceOrigin};
use crate::passes::{
    RenderMode, SHADOW_MAP_SOURCE, ScenePass, ScenePassData, ShadowMapCascadeData, ShadowMapPass,
    ShadowMapPassConfig, ShadowMapPassData, SkyboxPass, SkyboxPassConfig, SkyboxPassData,
};
use crate::shadow::{CascadeParams, CascadeSet, compute_cascade_split_fractions, compute_cascades};

pub const SKYBOX_PASS: &str = "skybox";
pub const SHADOW_MAP_PASS: &str = "shadowmap";
pub const SCENE_PASS: &str = "scene";

const COLOUR_BUFFER: &str = "colourbuffer";
const DEPTH_BUFFER: &str = "depthbuffer";

/// Forward rendergraph settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardRenderGraphConfig {
    pub name: String,
    /// Width and height of every shadow cascade layer.
    pub shadow_map_resolution: u32,
    /// Cascade split blend used when the scene has no directional light.
    pub default_split_multiplier: f32,
    /// Light-space depth stretch of each cascade.
    pub cascade_z_multiplier: f32,
    /// Texture id used for irradiance when the scene has no skybox.
    pub default_irradiance_cubemap: u32,
    /// RGBA the skybox pass clears the frame to.
    pub clear_colour: [f32; 4],
}

impl Default for ForwardRenderGraphConfig {
    fn default() -> Self {
        Self {
            name: "forward".to_owned(),
            shadow_map_resolution: 2048,
            default_split_multiplier: 0.95,
            cascade_z_multiplier: 10.0,
            default_irradiance_cubemap: TextureHandle::DEFAULT_CUBEMAP.id(),
            clear_colour: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl ForwardRenderGraphConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct ForwardRenderGraph {
    graph: RenderGraph,
    config: ForwardRenderGraphConfig,
    skybox: PassId,
    shadow_map: PassId,
    scene: PassId,
}

impl ForwardRenderGraph {
    /// Builds and finalizes the graph. No backend resources are touched.
    pub fn create(config: ForwardRenderGraphConfig) -> Result<Self> {
        let mut graph = RenderGraph::new(config.name.clone());

        graph.global_source_add(COLOUR_BUFFER, ResourceKind::Colour)?;
        graph.global_source_add(DEPTH_BUFFER, ResourceKind::DepthStencil)?;

        // Skybox
        let skybox = graph.pass_create(
            SKYBOX_PASS,
            SkyboxPass::create,
            SkyboxPassConfig {
                clear_colour: Vec4::from_array(config.clear_colour),
            },
        )?;
        graph.pass_sink_add(SKYBOX_PASS, COLOUR_BUFFER)?;
        graph.pass_source_add(
            SKYBOX_PASS,
            COLOUR_BUFFER,
            ResourceKind::Colour,
            SourceOrigin::Other,
        )?;
        graph.pass_set_sink_linkage(SKYBOX_PASS, COLOUR_BUFFER, None, COLOUR_BUFFER)?;

        // Shadow map
        let shadow_map = graph.pass_create(
            SHADOW_MAP_PASS,
            ShadowMapPass::create,
            ShadowMapPassConfig {
                resolution: config.shadow_map_resolution,
            },
        )?;
        graph.pass_source_add(
            SHADOW_MAP_PASS,
            SHADOW_MAP_SOURCE,
            ResourceKind::DepthStencil,
            SourceOrigin::SelfOwned,
        )?;

        // Scene
        let scene = graph.pass_create(SCENE_PASS, ScenePass::create, ())?;
        graph.pass_sink_add(SCENE_PASS, COLOUR_BUFFER)?;
        graph.pass_sink_add(SCENE_PASS, DEPTH_BUFFER)?;
        graph.pass_sink_add(SCENE_PASS, SHADOW_MAP_PASS)?;
        graph.pass_source_add(
            SCENE_PASS,
            COLOUR_BUFFER,
            ResourceKind::Colour,
            SourceOrigin::Other,
        )?;
        graph.pass_source_add(
            SCENE_PASS,
            DEPTH_BUFFER,
            ResourceKind::DepthStencil,
            SourceOrigin::Global,
        )?;
        graph.pass_set_sink_linkage(SCENE_PASS, COLOUR_BUFFER, Some(SKYBOX_PASS), COLOUR_BUFFER)?;
        graph.pass_set_sink_linkage(SCENE_PASS, DEPTH_BUFFER, None, DEPTH_BUFFER)?;
        graph.pass_set_sink_linkage(
            SCENE_PASS,
            SHADOW_MAP_PASS,
            Some(SHADOW_MAP_PASS),
            SHADOW_MAP_SOURCE,
        )?;

        graph.finalize()?;

        Ok(Self {
            graph,
            config,
            skybox,
            shadow_map,
            scene,
        })
    }

    /// Initializes every pass and loads all attachments.
    pub fn initialize(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        self.graph.initialize(backend)?;
        self.graph.load_resources(backend)
    }

    #[must_use]
    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    #[must_use]
    pub fn config(&self) -> &ForwardRenderGraphConfig {
        &self.config
    }

    #[must_use]
    pub fn skybox_pass(&self) -> PassId {
        self.skybox
    }

    #[must_use]
    pub fn shadow_map_pass(&self) -> PassId {
        self.shadow_map
    }

    #[must_use]
    pub fn scene_pass(&self) -> PassId {
        self.scene
    }

    /// Fills the frame data of every pass.
    ///
    /// The skybox always executes since it clears the frame. The shadow and
    /// scene passes only execute once the scene is loaded, and the shadow
    /// pass additionally needs a directional light. Query failures are
    /// logged and returned; the caller should drop the frame.
    pub fn frame_prepare<'f>(
        &self,
        frame: &mut FrameData<'f>,
        camera: &Camera,
        viewport: &Viewport,
        scene: &mut Scene,
        render_mode: RenderMode,
    ) -> Result<FramePassData<'f>> {
        let arena = frame.arena;
        let mut data = self.graph.begin_frame(arena);
        frame.reset_stats();

        // Skybox
        {
            let skybox = &mut data[self.skybox];
            skybox.set_view(camera, viewport);
            skybox.do_execute = true;
            skybox.ext = PassExtData::Skybox(SkyboxPassData {
                cubemap: scene.skybox().map(|s| s.cubemap),
            });
        }

        if !scene.is_loaded() {
            data[self.shadow_map].do_execute = false;
            data[self.scene].do_execute = false;
            return Ok(data);
        }

        scene.render_frame_prepare(frame);

        // Shadow cascades
        let light = scene.directional_light().copied();
        let near = viewport.near_clip();
        let far = light.map_or(0.0, |l| l.shadow_far());
        let split_mult =
            light.map_or(self.config.default_split_multiplier, |l| l.shadow_split_mult);
        let fractions = compute_cascade_split_fractions(near, far, split_mult);

        let view = camera.view_matrix();
        let mut cascades = CascadeSet::default();
        let mut shadow_data = ShadowMapPassData::default();

        if let Some(light) = light {
            cascades = compute_cascades(
                &CascadeParams {
                    camera_view: view,
                    fov: viewport.fov(),
                    aspect: viewport.aspect(),
                    near,
                    far,
                    light_direction: light.direction,
                    z_multiplier: self.config.cascade_z_multiplier,
                },
                &fractions,
            );

            let geometries = scene
                .mesh_render_data_query_from_line(
                    light.direction,
                    cascades.culling_center,
                    cascades.culling_radius,
                    frame,
                )
                .inspect_err(|e| log::error!("Shadow mesh query failed: {e}"))?;
            let terrain_geometries = scene
                .terrain_render_data_query_from_line(
                    light.direction,
                    cascades.culling_center,
                    cascades.culling_radius,
                    frame,
                )
                .inspect_err(|e| log::error!("Shadow terrain query failed: {e}"))?;
            frame.drawn_shadow_mesh_count = (geometries.len() + terrain_geometries.len()) as u32;

            shadow_data.light = Some(light);
            for (slot, cascade) in shadow_data.cascades.iter_mut().zip(&cascades.cascades) {
                *slot = ShadowMapCascadeData {
                    view: cascade.view,
                    projection: cascade.projection,
                    split_depth: cascade.split_depth,
                    cascade_index: slot.cascade_index,
                    geometries,
                    terrain_geometries,
                };
            }
        }

        {
            let shadow = &mut data[self.shadow_map];
            shadow.set_view(camera, viewport);
            shadow.do_execute = light.is_some();
            shadow.ext = PassExtData::ShadowMap(shadow_data);
        }

        // Scene
        let position = camera.position();
        let frustum = camera.frustum(viewport);
        let geometries = scene
            .mesh_render_data_query(Some(&frustum), position, frame)
            .inspect_err(|e| log::error!("Scene mesh query failed: {e}"))?;
        let terrain_geometries = scene
            .terrain_render_data_query(Some(&frustum), position, frame)
            .inspect_err(|e| log::error!("Scene terrain query failed: {e}"))?;
        frame.drawn_mesh_count = (geometries.len() + terrain_geometries.len()) as u32;

        let debug_geometries: &'f [GeometryRenderData] = scene
            .debug_render_data(arena)
            .inspect_err(|e| log::error!("Debug geometry query failed: {e}"))?;

        let mut point_lights = arena.vec();
        point_lights.extend(scene.point_lights().copied());

        let irradiance_cubemap = scene.skybox().map_or(
            TextureHandle(self.config.default_irradiance_cubemap),
            |s| s.cubemap,
        );

        let scene_data = ScenePassData {
            render_mode,
            directional_light: light,
            point_lights: point_lights.into_bump_slice(),
            cascade_views: cascades.cascades.map(|c| c.view),
            cascade_projections: cascades.cascades.map(|c| c.projection),
            cascade_splits: cascades.cascades.map(|c| c.split_depth),
            irradiance_cubemap,
            geometries,
            terrain_geometries,
            debug_geometries,
        };

        let scene_pass = &mut data[self.scene];
        scene_pass.set_view(camera, viewport);
        scene_pass.do_execute = true;
        scene_pass.ext = PassExtData::Scene(scene_data);

        log::trace!(
            "Frame {} prepared: {} scene / {} shadow draws, camera at {position}",
            frame.frame_number,
            frame.drawn_mesh_count,
            frame.drawn_shadow_mesh_count
        );
        Ok(data)
    }

    pub fn execute_frame<'f>(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameData<'f>,
        pass_data: &FramePassData<'f>,
    ) -> Result<()> {
        self.graph.execute_frame(backend, frame, pass_data)
    }

    pub fn on_resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.graph.on_resize(backend, width, height)
    }

    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        self.graph.destroy(backend);
    }
}
