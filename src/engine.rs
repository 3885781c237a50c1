//! Engine Frame Driver
//!
//! [`Engine`] ties the pieces together for one window: a render backend, the
//! forward rendergraph and the frame arena. It owns no scene; the caller
//! passes scene, camera and viewport to every frame.
//!
//! # Lifecycle
//!
//! 1. Create with [`Engine::new`] (builds, initializes and loads the graph)
//! 2. Call [`Engine::render_frame`] once per frame
//! 3. Forward window size changes to [`Engine::resize`]
//! 4. Release backend resources with [`Engine::shutdown`]

use kiln_core::{FrameArena, FrameData, Result};
use kiln_render::{ForwardRenderGraph, ForwardRenderGraphConfig, RenderBackend, RenderMode};
use kiln_scene::{Camera, Scene, Viewport};

/// Statistics of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frame_number: u64,
    pub drawn_mesh_count: u32,
    pub drawn_shadow_mesh_count: u32,
    /// Arena bytes used while preparing the frame.
    pub arena_bytes: usize,
}

pub struct Engine<B: RenderBackend> {
    backend: B,
    graph: ForwardRenderGraph,
    arena: FrameArena,
    render_mode: RenderMode,
    total_time: f64,
    frame_count: u64,
}

impl<B: RenderBackend> Engine<B> {
    pub fn new(mut backend: B, config: ForwardRenderGraphConfig) -> Result<Self> {
        let mut graph = ForwardRenderGraph::create(config)?;
        graph.initialize(&mut backend)?;
        Ok(Self {
            backend,
            graph,
            arena: FrameArena::new(),
            render_mode: RenderMode::Default,
            total_time: 0.0,
            frame_count: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &ForwardRenderGraph {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    /// Updates the scene, prepares every pass and submits the frame.
    ///
    /// On error the frame is dropped; the engine stays usable.
    pub fn render_frame(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        viewport: &Viewport,
        delta_time: f32,
    ) -> Result<FrameStats> {
        self.arena.reset();
        self.total_time += f64::from(delta_time);
        let frame_number = self.frame_count;
        self.frame_count += 1;

        let Self {
            backend,
            graph,
            arena,
            render_mode,
            total_time,
            ..
        } = self;

        let mut frame = FrameData::new(arena, frame_number, delta_time, *total_time);
        scene.update(&frame, camera.position());

        let pass_data = graph.frame_prepare(&mut frame, camera, viewport, scene, *render_mode)?;
        graph.execute_frame(backend, &frame, &pass_data)?;

        Ok(FrameStats {
            frame_number,
            drawn_mesh_count: frame.drawn_mesh_count,
            drawn_shadow_mesh_count: frame.drawn_shadow_mesh_count,
            arena_bytes: arena.allocated_bytes(),
        })
    }

    /// Rebinds window-sized attachments after the platform resized the
    /// surface.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        log::debug!("Engine resize to {width}x{height}");
        self.graph.on_resize(&mut self.backend, width, height)
    }

    pub fn shutdown(&mut self) {
        log::info!("Engine shutting down after {} frames", self.frame_count);
        self.graph.destroy(&mut self.backend);
    }
}
