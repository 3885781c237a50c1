//! Scene Pass
//!
//! Forward-lit draw of terrain, meshes and debug shapes on top of the
//! skybox, sampling the cascaded shadow map. Keeps the skybox colour and
//! clears depth.
//!
//! Up to [`MAX_POINT_LIGHTS`] point lights are uploaded with the pass
//! uniforms; the rest are dropped for the frame.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use kiln_core::{KilnError, Result, TextureHandle};
use kiln_scene::{DirectionalLightData, GeometryRenderData, PointLightData};

use crate::backend::{DEPTH_CLEAR_VALUE, PassAttachment};
use crate::graph::{PassContext, PassExtData, PassKind, RenderPass};
use crate::shadow::MAX_CASCADE_COUNT;

/// Point lights the scene uniforms have room for.
pub const MAX_POINT_LIGHTS: usize = 16;

/// Shading debug views.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Default = 0,
    /// Lighting only, no albedo.
    Lighting = 1,
    Normals = 2,
    /// Tints fragments by the cascade they sample.
    Cascades = 3,
    Wireframe = 4,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePassData<'f> {
    pub render_mode: RenderMode,
    pub directional_light: Option<DirectionalLightData>,
    pub point_lights: &'f [PointLightData],
    pub cascade_views: [Mat4; MAX_CASCADE_COUNT],
    pub cascade_projections: [Mat4; MAX_CASCADE_COUNT],
    /// Far plane of each cascade as a positive view-space distance.
    pub cascade_splits: [f32; MAX_CASCADE_COUNT],
    pub irradiance_cubemap: TextureHandle,
    pub geometries: &'f [GeometryRenderData],
    pub terrain_geometries: &'f [GeometryRenderData],
    pub debug_geometries: &'f [GeometryRenderData],
}

impl Default for ScenePassData<'_> {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Default,
            directional_light: None,
            point_lights: &[],
            cascade_views: [Mat4::IDENTITY; MAX_CASCADE_COUNT],
            cascade_projections: [Mat4::IDENTITY; MAX_CASCADE_COUNT],
            cascade_splits: [0.0; MAX_CASCADE_COUNT],
            irradiance_cubemap: TextureHandle::DEFAULT_CUBEMAP,
            geometries: &[],
            terrain_geometries: &[],
            debug_geometries: &[],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
struct PointLightUniform {
    position: [f32; 4],
    colour: [f32; 4],
    /// constant, linear, quadratic, unused
    attenuation: [f32; 4],
}

impl From<&PointLightData> for PointLightUniform {
    fn from(light: &PointLightData) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            colour: light.colour.to_array(),
            attenuation: [light.constant_f, light.linear, light.quadratic, 0.0],
        }
    }
}

/// Packs the first [`MAX_POINT_LIGHTS`] lights and returns how many were kept.
fn pack_point_lights(lights: &[PointLightData]) -> ([PointLightUniform; MAX_POINT_LIGHTS], u32) {
    if lights.len() > MAX_POINT_LIGHTS {
        log::debug!(
            "Scene pass: {} point lights, uploading the first {MAX_POINT_LIGHTS}",
            lights.len()
        );
    }
    let mut packed = [PointLightUniform::default(); MAX_POINT_LIGHTS];
    for (slot, light) in packed.iter_mut().zip(lights) {
        *slot = light.into();
    }
    (packed, lights.len().min(MAX_POINT_LIGHTS) as u32)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SceneUniforms {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    light_space: [[[f32; 4]; 4]; MAX_CASCADE_COUNT],
    cascade_splits: [f32; MAX_CASCADE_COUNT],
    view_position: [f32; 4],
    light_colour: [f32; 4],
    light_direction: [f32; 4],
    render_mode: u32,
    point_light_count: u32,
    irradiance_cubemap: u32,
    _padding: u32,
    point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

#[derive(Debug, Default)]
pub struct ScenePass {
    last_draw_count: usize,
}

impl ScenePass {
    pub fn create(_config: ()) -> Result<Self> {
        Ok(Self::default())
    }

    /// Records submitted during the most recent execution.
    #[must_use]
    pub fn last_draw_count(&self) -> usize {
        self.last_draw_count
    }
}

impl RenderPass for ScenePass {
    fn kind(&self) -> PassKind {
        PassKind::Scene
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()> {
        let pass_data = ctx.data;
        let PassExtData::Scene(data) = &pass_data.ext else {
            return Err(KilnError::ResourceLoad {
                pass: ctx.name().to_owned(),
                reason: "frame data is not scene data".to_owned(),
            });
        };

        let colour = ctx.sink_binding("colourbuffer")?;
        let depth = ctx.sink_binding("depthbuffer")?;
        let shadow_map = ctx.sink_binding("shadowmap")?;
        log::trace!(
            "Scene pass frame {}: sampling shadow map {shadow_map:?}, {} draws",
            ctx.frame.frame_number,
            data.geometries.len() + data.terrain_geometries.len()
        );

        let attachments = [
            PassAttachment::load(colour),
            PassAttachment::clear_depth(depth, DEPTH_CLEAR_VALUE),
        ];
        ctx.backend
            .begin_pass("scene", &attachments, pass_data.viewport.rect())?;

        let mut light_space = [[[0.0; 4]; 4]; MAX_CASCADE_COUNT];
        for (c, slot) in light_space.iter_mut().enumerate() {
            *slot = (data.cascade_projections[c] * data.cascade_views[c]).to_cols_array_2d();
        }
        let (point_lights, point_light_count) = pack_point_lights(data.point_lights);
        let light = data.directional_light.unwrap_or_default();
        let uniforms = SceneUniforms {
            projection: pass_data.projection.to_cols_array_2d(),
            view: pass_data.view.to_cols_array_2d(),
            light_space,
            cascade_splits: data.cascade_splits,
            view_position: pass_data.view_position.extend(1.0).to_array(),
            light_colour: light.colour.to_array(),
            light_direction: light.direction.extend(0.0).to_array(),
            render_mode: data.render_mode as u32,
            point_light_count,
            irradiance_cubemap: data.irradiance_cubemap.id(),
            _padding: 0,
            point_lights,
        };
        ctx.backend.upload_uniforms(bytemuck::bytes_of(&uniforms))?;

        let mut draws = 0;
        for record in data
            .terrain_geometries
            .iter()
            .chain(data.geometries)
            .chain(data.debug_geometries)
        {
            ctx.backend.draw(record)?;
            draws += 1;
        }
        self.last_draw_count = draws;

        ctx.backend.end_pass()
    }
}
