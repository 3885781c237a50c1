//! Rendergraph Tests
//!
//! Tests for:
//! - Graph construction errors (duplicates, unknown names, link ordering)
//! - Finalize validation and the state gates it controls
//! - Resource binding through sinks, pass-through and self-owned sources
//! - Per-frame execution skipping and failure recovery
//! - Resize rebinding and destruction

use glam::Vec4;

use kiln::core::{FrameArena, FrameData, KilnError, Result};
use kiln::render::backend::{BackendCall, HeadlessBackend, RenderBackend, RenderTargetDesc};
use kiln::render::graph::{
    GraphState, PassContext, PassKind, PassResources, RenderGraph, RenderPass, ResourceKind,
    SourceOrigin,
};

// ============================================================================
// Test Passes
// ============================================================================

/// Opens and closes an empty backend pass; optionally owns a depth target.
struct EmptyPass {
    label: &'static str,
    owns_target: bool,
}

impl RenderPass for EmptyPass {
    fn kind(&self) -> PassKind {
        PassKind::Custom
    }

    fn load_resources(
        &mut self,
        resources: &mut PassResources<'_>,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        if self.owns_target {
            let handle = backend.create_render_target(&RenderTargetDesc {
                label: format!("{}_depth", self.label),
                kind: ResourceKind::DepthStencil,
                width: 256,
                height: 256,
                layers: 1,
            })?;
            resources.bind_source("depthbuffer", handle)?;
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()> {
        ctx.backend.begin_pass(self.label, &[], Vec4::ZERO)?;
        ctx.backend.end_pass()
    }
}

/// Opens a backend pass and fails before closing it, on its first frame only.
struct FailOncePass {
    failed: bool,
}

impl RenderPass for FailOncePass {
    fn kind(&self) -> PassKind {
        PassKind::Custom
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()> {
        ctx.backend.begin_pass("flaky", &[], Vec4::ZERO)?;
        if !self.failed {
            self.failed = true;
            return Err(KilnError::Backend("lost draw buffer".into()));
        }
        ctx.backend.end_pass()
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empty(label: &'static str) -> Result<EmptyPass> {
    Ok(EmptyPass {
        label,
        owns_target: false,
    })
}

fn owner(label: &'static str) -> Result<EmptyPass> {
    Ok(EmptyPass {
        label,
        owns_target: true,
    })
}

/// `a` forwards the global colour buffer; `b` reads it and owns a depth
/// target.
fn chain_graph() -> RenderGraph {
    let mut graph = RenderGraph::new("chain");
    graph
        .global_source_add("colourbuffer", ResourceKind::Colour)
        .unwrap();

    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_sink_add("a", "colourbuffer").unwrap();
    graph
        .pass_source_add("a", "colourbuffer", ResourceKind::Colour, SourceOrigin::Other)
        .unwrap();
    graph
        .pass_set_sink_linkage("a", "colourbuffer", None, "colourbuffer")
        .unwrap();

    graph.pass_create("b", owner, "b").unwrap();
    graph.pass_sink_add("b", "colourbuffer").unwrap();
    graph
        .pass_source_add(
            "b",
            "depthbuffer",
            ResourceKind::DepthStencil,
            SourceOrigin::SelfOwned,
        )
        .unwrap();
    graph
        .pass_set_sink_linkage("b", "colourbuffer", Some("a"), "colourbuffer")
        .unwrap();
    graph
}

fn loaded_chain(backend: &mut HeadlessBackend) -> RenderGraph {
    let mut graph = chain_graph();
    graph.finalize().unwrap();
    graph.initialize(backend).unwrap();
    graph.load_resources(backend).unwrap();
    graph
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn duplicate_pass_name_rejected() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    let err = graph.pass_create("a", empty, "a").unwrap_err();
    assert!(matches!(err, KilnError::DuplicatePass { .. }), "got {err}");
}

#[test]
fn duplicate_global_source_rejected() {
    let mut graph = RenderGraph::new("g");
    graph.global_source_add("colourbuffer", ResourceKind::Colour).unwrap();
    assert!(matches!(
        graph.global_source_add("colourbuffer", ResourceKind::Colour),
        Err(KilnError::DuplicateGlobalSource { .. })
    ));
}

#[test]
fn duplicate_sink_and_source_rejected() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_sink_add("a", "x").unwrap();
    assert!(matches!(
        graph.pass_sink_add("a", "x"),
        Err(KilnError::DuplicateSink { .. })
    ));
    graph
        .pass_source_add("a", "y", ResourceKind::Colour, SourceOrigin::SelfOwned)
        .unwrap();
    assert!(matches!(
        graph.pass_source_add("a", "y", ResourceKind::Colour, SourceOrigin::SelfOwned),
        Err(KilnError::DuplicateSource { .. })
    ));
}

#[test]
fn unknown_pass_rejected() {
    let mut graph = RenderGraph::new("g");
    assert!(matches!(
        graph.pass_sink_add("missing", "x"),
        Err(KilnError::PassNotFound { .. })
    ));
}

#[test]
fn failing_create_callback_reports_pass_create_failed() {
    let mut graph = RenderGraph::new("g");
    let err = graph
        .pass_create(
            "broken",
            |_: ()| -> Result<EmptyPass> { Err(KilnError::Backend("no device".into())) },
            (),
        )
        .unwrap_err();
    match err {
        KilnError::PassCreateFailed { pass, reason } => {
            assert_eq!(pass, "broken");
            assert!(reason.contains("no device"));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(graph.pass_by_name("broken").is_none());
}

#[test]
fn sink_linked_to_later_pass_fails() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_create("b", empty, "b").unwrap();
    graph.pass_sink_add("a", "colourbuffer").unwrap();
    graph
        .pass_source_add("b", "colourbuffer", ResourceKind::Colour, SourceOrigin::SelfOwned)
        .unwrap();

    let err = graph
        .pass_set_sink_linkage("a", "colourbuffer", Some("b"), "colourbuffer")
        .unwrap_err();
    assert!(matches!(err, KilnError::ProducerNotDeclared { .. }), "got {err}");
}

#[test]
fn sink_linked_to_itself_fails() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_sink_add("a", "x").unwrap();
    graph
        .pass_source_add("a", "x", ResourceKind::Colour, SourceOrigin::Other)
        .unwrap();
    assert!(matches!(
        graph.pass_set_sink_linkage("a", "x", Some("a"), "x"),
        Err(KilnError::ProducerNotDeclared { .. })
    ));
}

#[test]
fn link_to_unknown_sources_fails() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_create("b", empty, "b").unwrap();
    graph.pass_sink_add("b", "x").unwrap();

    assert!(matches!(
        graph.pass_set_sink_linkage("b", "x", None, "nope"),
        Err(KilnError::GlobalSourceNotFound { .. })
    ));
    assert!(matches!(
        graph.pass_set_sink_linkage("b", "x", Some("a"), "nope"),
        Err(KilnError::SourceNotFound { .. })
    ));
    assert!(matches!(
        graph.pass_set_sink_linkage("b", "nope", None, "x"),
        Err(KilnError::SinkNotFound { .. })
    ));
}

// ============================================================================
// Finalize
// ============================================================================

#[test]
fn all_sinks_resolved_finalizes() {
    let mut graph = chain_graph();
    graph.finalize().unwrap();
    assert_eq!(graph.state(), GraphState::Finalized);
}

#[test]
fn unresolved_sink_blocks_finalize_and_everything_after() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph.pass_sink_add("a", "colourbuffer").unwrap();

    assert!(matches!(
        graph.finalize(),
        Err(KilnError::UnresolvedSink { .. })
    ));
    assert_eq!(graph.state(), GraphState::Building);

    let mut backend = HeadlessBackend::new(64, 64);
    assert!(matches!(
        graph.initialize(&mut backend),
        Err(KilnError::InvalidGraphState { .. })
    ));
    assert!(matches!(
        graph.load_resources(&mut backend),
        Err(KilnError::InvalidGraphState { .. })
    ));

    let arena = FrameArena::with_capacity(4096);
    let frame = FrameData::new(&arena, 0, 0.016, 0.0);
    let data = graph.begin_frame(&arena);
    assert!(matches!(
        graph.execute_frame(&mut backend, &frame, &data),
        Err(KilnError::InvalidGraphState { .. })
    ));
    assert!(backend.calls().is_empty());
}

#[test]
fn passthrough_source_without_sink_fails_finalize() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph
        .pass_source_add("a", "colourbuffer", ResourceKind::Colour, SourceOrigin::Other)
        .unwrap();
    assert!(matches!(
        graph.finalize(),
        Err(KilnError::PassthroughSinkMissing { .. })
    ));
}

#[test]
fn global_origin_source_needs_registered_global() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("a", empty, "a").unwrap();
    graph
        .pass_source_add("a", "depthbuffer", ResourceKind::DepthStencil, SourceOrigin::Global)
        .unwrap();
    assert!(matches!(
        graph.finalize(),
        Err(KilnError::GlobalSourceNotFound { .. })
    ));
}

#[test]
fn structure_is_frozen_after_finalize() {
    let mut graph = chain_graph();
    graph.finalize().unwrap();
    assert!(matches!(
        graph.pass_create("c", empty, "c"),
        Err(KilnError::GraphFinalized(_))
    ));
    assert!(matches!(
        graph.pass_sink_add("a", "extra"),
        Err(KilnError::GraphFinalized(_))
    ));
    assert!(matches!(graph.finalize(), Err(KilnError::GraphFinalized(_))));
}

// ============================================================================
// Resource Binding
// ============================================================================

#[test]
fn load_binds_sinks_to_upstream_sources() {
    let mut backend = HeadlessBackend::new(640, 480);
    let graph = loaded_chain(&mut backend);
    assert_eq!(graph.state(), GraphState::Loaded);

    let global = graph.global_binding("colourbuffer").unwrap();
    assert_eq!(graph.sink_binding("a", "colourbuffer"), Some(global));
    assert_eq!(graph.source_binding("a", "colourbuffer"), Some(global));
    assert_eq!(graph.sink_binding("b", "colourbuffer"), Some(global));

    let own = graph.source_binding("b", "depthbuffer").unwrap();
    assert_ne!(own, global);
    assert_eq!(backend.target(own).unwrap().width, 256);
}

#[test]
fn self_owned_source_left_unbound_fails_load() {
    let mut graph = RenderGraph::new("g");
    graph.pass_create("lazy", empty, "lazy").unwrap();
    graph
        .pass_source_add("lazy", "depthbuffer", ResourceKind::DepthStencil, SourceOrigin::SelfOwned)
        .unwrap();
    graph.finalize().unwrap();

    let mut backend = HeadlessBackend::new(64, 64);
    graph.initialize(&mut backend).unwrap();
    assert!(matches!(
        graph.load_resources(&mut backend),
        Err(KilnError::ResourceLoad { .. })
    ));
    assert_ne!(graph.state(), GraphState::Loaded);
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn passes_execute_in_declared_order() {
    let mut backend = HeadlessBackend::new(64, 64);
    let mut graph = loaded_chain(&mut backend);
    backend.clear_calls();

    let arena = FrameArena::with_capacity(4096);
    let frame = FrameData::new(&arena, 0, 0.016, 0.0);
    let mut data = graph.begin_frame(&arena);
    for pass in ["a", "b"] {
        let id = graph.pass_id(pass).unwrap();
        data[id].do_execute = true;
    }
    graph.execute_frame(&mut backend, &frame, &data).unwrap();
    assert_eq!(backend.pass_labels(), vec!["a", "b"]);
}

#[test]
fn skipped_passes_issue_no_backend_calls() {
    let mut backend = HeadlessBackend::new(64, 64);
    let mut graph = loaded_chain(&mut backend);
    backend.clear_calls();

    let arena = FrameArena::with_capacity(4096);
    let frame = FrameData::new(&arena, 0, 0.016, 0.0);
    let mut data = graph.begin_frame(&arena);
    data[graph.pass_id("b").unwrap()].do_execute = true;

    graph.execute_frame(&mut backend, &frame, &data).unwrap();
    assert_eq!(backend.pass_labels(), vec!["b"]);

    backend.clear_calls();
    let idle = graph.begin_frame(&arena);
    graph.execute_frame(&mut backend, &frame, &idle).unwrap();
    assert!(backend.calls().is_empty());
}

#[test]
fn failed_pass_is_aborted_and_next_frame_runs() {
    init_logging();
    let mut backend = HeadlessBackend::new(64, 64);
    let mut graph = RenderGraph::new("flaky");
    graph
        .pass_create("flaky", |()| Ok(FailOncePass { failed: false }), ())
        .unwrap();
    graph.pass_create("after", empty, "after").unwrap();
    graph.finalize().unwrap();
    graph.initialize(&mut backend).unwrap();
    graph.load_resources(&mut backend).unwrap();

    let arena = FrameArena::with_capacity(4096);
    let frame = FrameData::new(&arena, 0, 0.016, 0.0);
    let mut data = graph.begin_frame(&arena);
    for pass in ["flaky", "after"] {
        let id = graph.pass_id(pass).unwrap();
        data[id].do_execute = true;
    }

    let err = graph.execute_frame(&mut backend, &frame, &data).unwrap_err();
    assert!(matches!(err, KilnError::Backend(_)), "got {err}");
    assert_eq!(
        backend.calls().last(),
        Some(&BackendCall::AbortPass("flaky".to_owned()))
    );
    assert_eq!(backend.pass_labels(), vec!["flaky"]);

    backend.clear_calls();
    graph.execute_frame(&mut backend, &frame, &data).unwrap();
    assert_eq!(backend.pass_labels(), vec!["flaky", "after"]);
}

#[test]
fn begin_frame_defaults_to_not_executable() {
    let graph = chain_graph();
    let arena = FrameArena::with_capacity(4096);
    let data = graph.begin_frame(&arena);
    assert_eq!(data.len(), 2);
    for pass in graph.passes() {
        let id = graph.pass_id(pass.name()).unwrap();
        assert!(!data[id].do_execute);
    }
}

// ============================================================================
// Resize & Destroy
// ============================================================================

#[test]
fn resize_rebinds_globals_and_keeps_self_owned() {
    let mut backend = HeadlessBackend::new(640, 480);
    let mut graph = loaded_chain(&mut backend);
    let old_global = graph.global_binding("colourbuffer").unwrap();
    let own = graph.source_binding("b", "depthbuffer").unwrap();

    backend.resize_window(1280, 720);
    graph.on_resize(&mut backend, 1280, 720).unwrap();

    let new_global = graph.global_binding("colourbuffer").unwrap();
    assert_ne!(old_global, new_global);
    assert_eq!(graph.sink_binding("b", "colourbuffer"), Some(new_global));
    assert_eq!(graph.source_binding("a", "colourbuffer"), Some(new_global));
    assert_eq!(graph.source_binding("b", "depthbuffer"), Some(own));
}

#[test]
fn resize_before_load_is_ignored() {
    let mut graph = chain_graph();
    graph.finalize().unwrap();
    let mut backend = HeadlessBackend::new(64, 64);
    graph.on_resize(&mut backend, 128, 128).unwrap();
    assert!(backend.calls().is_empty());
    assert_eq!(graph.state(), GraphState::Finalized);
}

#[test]
fn destroy_clears_bindings() {
    let mut backend = HeadlessBackend::new(64, 64);
    let mut graph = loaded_chain(&mut backend);
    graph.destroy(&mut backend);

    assert_eq!(graph.state(), GraphState::Destroyed);
    assert_eq!(graph.sink_binding("b", "colourbuffer"), None);
    assert_eq!(graph.global_binding("colourbuffer"), None);
}
