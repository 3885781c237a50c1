//! Rendergraph
//!
//! - [`resource`]: source/sink declarations and their bindings
//! - [`pass`]: pass nodes, the [`RenderPass`] trait and per-frame pass data
//! - [`graph`]: the [`RenderGraph`] container and its lifecycle

#[allow(clippy::module_inception)]
pub mod graph;
pub mod pass;
pub mod resource;

pub use graph::{GraphState, RenderGraph};
pub use pass::{
    FramePassData, Pass, PassContext, PassData, PassExtData, PassId, PassKind, PassResources,
    RenderPass,
};
pub use resource::{ResourceKind, Sink, Source, SourceOrigin, SourceRef};
