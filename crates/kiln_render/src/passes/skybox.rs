//! Skybox Pass
//!
//! Runs every frame: clears the colour attachment, then draws the scene's
//! cubemap behind everything else when there is one. The colour attachment
//! arrives on the `colourbuffer` sink and is forwarded to the next pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use kiln_core::{MaterialRef, Result, TextureHandle};
use kiln_scene::GeometryRenderData;

use crate::backend::PassAttachment;
use crate::graph::{PassContext, PassExtData, PassKind, RenderPass};

/// Index count of the unit cube the skybox is drawn with.
const SKYBOX_CUBE_INDEX_COUNT: u32 = 36;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyboxPassConfig {
    /// Colour the frame is cleared to.
    pub clear_colour: Vec4,
}

impl Default for SkyboxPassConfig {
    fn default() -> Self {
        Self {
            clear_colour: Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyboxPassData {
    /// `None` when the scene has no loaded skybox.
    pub cubemap: Option<TextureHandle>,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SkyboxUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

#[derive(Debug, Default)]
pub struct SkyboxPass {
    config: SkyboxPassConfig,
    frames_drawn: u64,
}

impl SkyboxPass {
    pub fn create(config: SkyboxPassConfig) -> Result<Self> {
        Ok(Self {
            config,
            frames_drawn: 0,
        })
    }

    #[must_use]
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }
}

impl RenderPass for SkyboxPass {
    fn kind(&self) -> PassKind {
        PassKind::Skybox
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()> {
        let colour = ctx.sink_binding("colourbuffer")?;
        let data = ctx.data;
        let attachments = [PassAttachment::clear_colour(colour, self.config.clear_colour)];
        ctx.backend
            .begin_pass("skybox", &attachments, data.viewport.rect())?;

        if let PassExtData::Skybox(SkyboxPassData {
            cubemap: Some(cubemap),
        }) = &data.ext
        {
            // Rotation only, so the box stays centered on the viewer.
            let mut view = data.view;
            view.w_axis = Vec4::W;
            let uniforms = SkyboxUniforms {
                view: view.to_cols_array_2d(),
                projection: data.projection.to_cols_array_2d(),
            };
            ctx.backend.upload_uniforms(bytemuck::bytes_of(&uniforms))?;

            let cube = GeometryRenderData {
                model: Mat4::IDENTITY,
                material: MaterialRef::opaque(cubemap.id()),
                index_count: SKYBOX_CUBE_INDEX_COUNT,
                ..GeometryRenderData::default()
            };
            ctx.backend.draw(&cube)?;
            self.frames_drawn += 1;
        }

        ctx.backend.end_pass()
    }
}
