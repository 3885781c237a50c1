//! Shadow Map Pass
//!
//! Renders shadow casters into a layered depth target, one layer per
//! cascade. The target is owned by the pass and has a fixed resolution, so
//! window resizes leave it alone.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use kiln_core::{KilnError, Result};
use kiln_scene::{DirectionalLightData, GeometryRenderData};

use crate::backend::{
    DEPTH_CLEAR_VALUE, PassAttachment, RenderBackend, RenderTargetDesc, RenderTargetHandle,
};
use crate::graph::{PassContext, PassExtData, PassKind, PassResources, RenderPass, ResourceKind};
use crate::shadow::{CascadeIndex, MAX_CASCADE_COUNT};

/// Name of the depth source exposed to later passes.
pub const SHADOW_MAP_SOURCE: &str = "depthbuffer";

const CASCADE_LABELS: [&str; MAX_CASCADE_COUNT] = [
    "shadowmap_cascade_0",
    "shadowmap_cascade_1",
    "shadowmap_cascade_2",
    "shadowmap_cascade_3",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapPassConfig {
    /// Width and height of every cascade layer.
    pub resolution: u32,
}

impl Default for ShadowMapPassConfig {
    fn default() -> Self {
        Self { resolution: 2048 }
    }
}

/// Frame data of one cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapCascadeData<'f> {
    pub view: Mat4,
    pub projection: Mat4,
    pub split_depth: f32,
    pub cascade_index: CascadeIndex,
    /// Caster lists, shared by all cascades of the frame.
    pub geometries: &'f [GeometryRenderData],
    pub terrain_geometries: &'f [GeometryRenderData],
}

impl Default for ShadowMapCascadeData<'_> {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            split_depth: 0.0,
            cascade_index: CascadeIndex::default(),
            geometries: &[],
            terrain_geometries: &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapPassData<'f> {
    pub light: Option<DirectionalLightData>,
    pub cascades: [ShadowMapCascadeData<'f>; MAX_CASCADE_COUNT],
}

impl Default for ShadowMapPassData<'_> {
    fn default() -> Self {
        let mut cascades = [ShadowMapCascadeData::default(); MAX_CASCADE_COUNT];
        for index in CascadeIndex::all() {
            cascades[index.get()].cascade_index = index;
        }
        Self {
            light: None,
            cascades,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CascadeUniforms {
    light_space: [[f32; 4]; 4],
    cascade_index: u32,
    _padding: [u32; 3],
}

#[derive(Debug)]
pub struct ShadowMapPass {
    config: ShadowMapPassConfig,
    target: Option<RenderTargetHandle>,
}

impl ShadowMapPass {
    pub fn create(config: ShadowMapPassConfig) -> Result<Self> {
        if config.resolution == 0 {
            return Err(KilnError::Backend(
                "shadow map resolution must be non-zero".to_owned(),
            ));
        }
        Ok(Self {
            config,
            target: None,
        })
    }

    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.config.resolution
    }

    #[must_use]
    pub fn target(&self) -> Option<RenderTargetHandle> {
        self.target
    }
}

impl RenderPass for ShadowMapPass {
    fn kind(&self) -> PassKind {
        PassKind::ShadowMap
    }

    fn load_resources(
        &mut self,
        resources: &mut PassResources<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        if let Some(old) = self.target.take() {
            backend.destroy_render_target(old);
        }
        let handle = backend.create_render_target(&RenderTargetDesc {
            label: format!("{}_depth", resources.name()),
            kind: ResourceKind::DepthStencil,
            width: self.config.resolution,
            height: self.config.resolution,
            layers: MAX_CASCADE_COUNT as u32,
        })?;
        resources.bind_source(SHADOW_MAP_SOURCE, handle)?;
        self.target = Some(handle);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()> {
        let PassExtData::ShadowMap(data) = &ctx.data.ext else {
            return Err(KilnError::ResourceLoad {
                pass: ctx.name().to_owned(),
                reason: "frame data is not shadow map data".to_owned(),
            });
        };
        let depth = ctx.source_binding(SHADOW_MAP_SOURCE)?;
        let size = self.config.resolution as f32;
        let viewport = Vec4::new(0.0, 0.0, size, size);
        let attachments = [PassAttachment::clear_depth(depth, DEPTH_CLEAR_VALUE)];

        for cascade in &data.cascades {
            let c = cascade.cascade_index.get();
            ctx.backend
                .begin_pass(CASCADE_LABELS[c], &attachments, viewport)?;

            let uniforms = CascadeUniforms {
                light_space: (cascade.projection * cascade.view).to_cols_array_2d(),
                cascade_index: c as u32,
                _padding: [0; 3],
            };
            ctx.backend.upload_uniforms(bytemuck::bytes_of(&uniforms))?;

            for record in cascade.terrain_geometries.iter().chain(cascade.geometries) {
                ctx.backend.draw(record)?;
            }
            ctx.backend.end_pass()?;
        }
        Ok(())
    }

    fn on_resize(
        &mut self,
        _backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<()> {
        log::trace!(
            "Shadow map keeps {0}x{0} on window resize to {width}x{height}",
            self.config.resolution
        );
        Ok(())
    }

    fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(handle) = self.target.take() {
            backend.destroy_render_target(handle);
        }
    }
}
