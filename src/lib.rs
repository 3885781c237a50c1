//! Kiln
//!
//! Rendergraph and forward frame orchestration for a real-time 3D engine.
//!
//! This crate re-exports the workspace crates and adds [`Engine`], a small
//! per-window frame driver:
//!
//! - [`core`]: errors, culling math, frame arena, handles
//! - [`scene`]: scene containers, camera, viewport and render-data queries
//! - [`render`]: rendergraph, backend seam, shadow cascades, forward pipeline

pub mod engine;

pub use glam;
pub use kiln_core as core;
pub use kiln_render as render;
pub use kiln_scene as scene;

pub use engine::{Engine, FrameStats};
pub use kiln_core::{FrameArena, FrameData, KilnError, Result};
pub use kiln_render::{
    ForwardRenderGraph, ForwardRenderGraphConfig, HeadlessBackend, RenderBackend, RenderGraph,
    RenderMode,
};
pub use kiln_scene::{Camera, Scene, SceneConfig, Viewport};
