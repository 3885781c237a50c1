//! Kiln Render
//!
//! The rendergraph and the forward frame pipeline built on it.
//!
//! - [`graph`]: pass container, source/sink wiring, per-frame pass data
//! - [`backend`]: the graphics API seam plus a recording headless backend
//! - [`shadow`]: cascade split and light matrix math
//! - [`passes`]: skybox, shadow map and scene passes
//! - [`forward`]: the pre-wired forward rendergraph and frame preparation

pub mod backend;
pub mod forward;
pub mod graph;
pub mod passes;
pub mod shadow;

pub use backend::{
    BackendCall, HeadlessBackend, LoadOp, PassAttachment, RenderBackend, RenderTargetDesc,
    RenderTargetHandle,
};
pub use forward::{ForwardRenderGraph, ForwardRenderGraphConfig};
pub use graph::{
    FramePassData, GraphState, PassData, PassExtData, PassId, PassKind, RenderGraph, RenderPass,
    ResourceKind, SourceOrigin,
};
pub use passes::RenderMode;
pub use shadow::{CascadeIndex, MAX_CASCADE_COUNT};
