//! Built-in Passes
//!
//! The three passes the forward rendergraph wires together:
//!
//! | Pass | Kind | Writes |
//! |------|------|--------|
//! | [`SkyboxPass`] | `Skybox` | colour (cleared) |
//! | [`ShadowMapPass`] | `ShadowMap` | its own layered depth target (cleared per cascade) |
//! | [`ScenePass`] | `Scene` | colour + depth (depth cleared) |

pub mod scene;
pub mod shadow_map;
pub mod skybox;

pub use scene::{MAX_POINT_LIGHTS, RenderMode, ScenePass, ScenePassData};
pub use shadow_map::{
    SHADOW_MAP_SOURCE, ShadowMapCascadeData, ShadowMapPass, ShadowMapPassConfig, ShadowMapPassData,
};
pub use skybox::{SkyboxPass, SkyboxPassConfig, SkyboxPassData};
