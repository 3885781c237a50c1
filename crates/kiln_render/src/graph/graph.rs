//! Rendergraph Container
//!
//! `RenderGraph` owns the ordered pass list and the global sources. Passes
//! execute in declaration order; a sink may only read from a pass declared
//! before its consumer, so the declared order is already a valid topological
//! order and no sorting happens.
//!
//! # States
//!
//! ```text
//! Building -> Finalized -> Initialized -> Loaded -> Destroyed
//! ```
//!
//! Structure (passes, sinks, sources, links) can only change while Building.

use kiln_core::{FrameArena, FrameData, KilnError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::backend::{RenderBackend, RenderTargetHandle};
use crate::graph::pass::{FramePassData, Pass, PassContext, PassId, PassResources, RenderPass};
use crate::graph::resource::{ResourceKind, Sink, Source, SourceOrigin, SourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Building,
    Finalized,
    Initialized,
    Loaded,
    Destroyed,
}

impl GraphState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "Building",
            Self::Finalized => "Finalized",
            Self::Initialized => "Initialized",
            Self::Loaded => "Loaded",
            Self::Destroyed => "Destroyed",
        }
    }
}

pub struct RenderGraph {
    name: String,
    state: GraphState,
    passes: Vec<Pass>,
    pass_lookup: FxHashMap<String, PassId>,
    globals: SmallVec<[Source; 4]>,
}

impl RenderGraph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: GraphState::Building,
            passes: Vec::new(),
            pass_lookup: FxHashMap::default(),
            globals: SmallVec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> GraphState {
        self.state
    }

    #[must_use]
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    #[must_use]
    pub fn pass(&self, id: PassId) -> Option<&Pass> {
        self.passes.get(id.0)
    }

    #[must_use]
    pub fn pass_id(&self, name: &str) -> Option<PassId> {
        self.pass_lookup.get(name).copied()
    }

    #[must_use]
    pub fn pass_by_name(&self, name: &str) -> Option<&Pass> {
        self.pass_id(name).and_then(|id| self.pass(id))
    }

    #[must_use]
    pub fn global_source(&self, name: &str) -> Option<&Source> {
        self.globals.iter().find(|s| s.name == name)
    }

    fn require_state(&self, operation: &'static str, expected: GraphState) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(KilnError::InvalidGraphState {
            graph: self.name.clone(),
            operation,
            expected: expected.as_str(),
            actual: self.state.as_str(),
        })
    }

    fn require_building(&self) -> Result<()> {
        if self.state == GraphState::Building {
            Ok(())
        } else {
            Err(KilnError::GraphFinalized(self.name.clone()))
        }
    }

    fn lookup(&self, pass: &str) -> Result<PassId> {
        self.pass_id(pass).ok_or_else(|| KilnError::PassNotFound {
            graph: self.name.clone(),
            pass: pass.to_owned(),
        })
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Registers a graph-provided target. Bound to a window attachment at
    /// load time.
    pub fn global_source_add(&mut self, name: &str, kind: ResourceKind) -> Result<()> {
        self.require_building()?;
        if self.global_source(name).is_some() {
            return Err(KilnError::DuplicateGlobalSource {
                graph: self.name.clone(),
                source_name: name.to_owned(),
            });
        }
        self.globals.push(Source::new(name, kind, SourceOrigin::Global));
        Ok(())
    }

    /// Creates a pass through `create_fn(config)` and appends it.
    pub fn pass_create<C, P, F>(&mut self, name: &str, create_fn: F, config: C) -> Result<PassId>
    where
        P: RenderPass + 'static,
        F: FnOnce(C) -> Result<P>,
    {
        self.require_building()?;
        if self.pass_lookup.contains_key(name) {
            return Err(KilnError::DuplicatePass {
                graph: self.name.clone(),
                pass: name.to_owned(),
            });
        }

        let imp = create_fn(config).map_err(|e| KilnError::PassCreateFailed {
            pass: name.to_owned(),
            reason: e.to_string(),
        })?;

        let id = PassId(self.passes.len());
        self.passes.push(Pass {
            name: name.to_owned(),
            kind: imp.kind(),
            sinks: SmallVec::new(),
            sources: SmallVec::new(),
            imp: Box::new(imp),
        });
        self.pass_lookup.insert(name.to_owned(), id);
        log::debug!("Rendergraph '{}': created pass '{name}' ({id:?})", self.name);
        Ok(id)
    }

    pub fn pass_sink_add(&mut self, pass: &str, sink: &str) -> Result<()> {
        self.require_building()?;
        let id = self.lookup(pass)?;
        let node = &mut self.passes[id.0];
        if node.sink(sink).is_some() {
            return Err(KilnError::DuplicateSink {
                pass: pass.to_owned(),
                sink: sink.to_owned(),
            });
        }
        node.sinks.push(Sink::new(sink));
        Ok(())
    }

    pub fn pass_source_add(
        &mut self,
        pass: &str,
        source: &str,
        kind: ResourceKind,
        origin: SourceOrigin,
    ) -> Result<()> {
        self.require_building()?;
        let id = self.lookup(pass)?;
        let node = &mut self.passes[id.0];
        if node.source(source).is_some() {
            return Err(KilnError::DuplicateSource {
                pass: pass.to_owned(),
                source_name: source.to_owned(),
            });
        }
        node.sources.push(Source::new(source, kind, origin));
        Ok(())
    }

    /// Links `sink` of `pass` to `source` of `producer`, or to the global
    /// source `source` when `producer` is `None`.
    pub fn pass_set_sink_linkage(
        &mut self,
        pass: &str,
        sink: &str,
        producer: Option<&str>,
        source: &str,
    ) -> Result<()> {
        self.require_building()?;
        let consumer = self.lookup(pass)?;
        if self.passes[consumer.0].sink(sink).is_none() {
            return Err(KilnError::SinkNotFound {
                pass: pass.to_owned(),
                sink: sink.to_owned(),
            });
        }

        let link = match producer {
            None => {
                if self.global_source(source).is_none() {
                    return Err(KilnError::GlobalSourceNotFound {
                        graph: self.name.clone(),
                        source_name: source.to_owned(),
                    });
                }
                SourceRef::Global(source.to_owned())
            }
            Some(producer_name) => {
                let producer_id = self
                    .pass_id(producer_name)
                    .filter(|id| *id < consumer)
                    .ok_or_else(|| KilnError::ProducerNotDeclared {
                        consumer: pass.to_owned(),
                        producer: producer_name.to_owned(),
                    })?;
                if self.passes[producer_id.0].source(source).is_none() {
                    return Err(KilnError::SourceNotFound {
                        pass: producer_name.to_owned(),
                        source_name: source.to_owned(),
                    });
                }
                SourceRef::Pass {
                    pass: producer_id,
                    source: source.to_owned(),
                }
            }
        };

        if let Some(slot) = self.passes[consumer.0]
            .sinks
            .iter_mut()
            .find(|s| s.name == sink)
        {
            slot.link = Some(link);
        }
        Ok(())
    }

    /// Validates the wiring and freezes the structure.
    pub fn finalize(&mut self) -> Result<()> {
        self.require_building()?;

        for pass in &self.passes {
            if let Some(sink) = pass.sinks.iter().find(|s| s.link.is_none()) {
                return Err(KilnError::UnresolvedSink {
                    pass: pass.name.clone(),
                    sink: sink.name.clone(),
                });
            }
            for source in &pass.sources {
                match source.origin {
                    SourceOrigin::Other if pass.sink(&source.name).is_none() => {
                        return Err(KilnError::PassthroughSinkMissing {
                            pass: pass.name.clone(),
                            source_name: source.name.clone(),
                        });
                    }
                    SourceOrigin::Global if self.global_source(&source.name).is_none() => {
                        return Err(KilnError::GlobalSourceNotFound {
                            graph: self.name.clone(),
                            source_name: source.name.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }

        self.state = GraphState::Finalized;
        log::info!(
            "Rendergraph '{}' finalized with {} passes",
            self.name,
            self.passes.len()
        );
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn initialize(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        self.require_state("initialize", GraphState::Finalized)?;
        for pass in &mut self.passes {
            pass.imp.initialize(backend)?;
        }
        self.state = GraphState::Initialized;
        Ok(())
    }

    /// Acquires global targets, binds every sink and source in declared
    /// order, and lets each pass create its self-owned targets.
    pub fn load_resources(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        self.require_state("load_resources", GraphState::Initialized)?;
        self.acquire_globals(backend)?;
        self.bind_attachments(backend, true)?;
        self.state = GraphState::Loaded;
        let (width, height) = backend.window_size();
        log::info!("Rendergraph '{}' resources loaded ({width}x{height})", self.name);
        Ok(())
    }

    fn acquire_globals(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        for global in &mut self.globals {
            global.binding = Some(backend.window_attachment(global.kind)?);
        }
        Ok(())
    }

    fn bind_attachments(&mut self, backend: &mut dyn RenderBackend, load: bool) -> Result<()> {
        for index in 0..self.passes.len() {
            let (upstream, rest) = self.passes.split_at_mut(index);
            let pass = &mut rest[0];

            for sink in &mut pass.sinks {
                sink.binding = match &sink.link {
                    Some(SourceRef::Global(name)) => self
                        .globals
                        .iter()
                        .find(|g| &g.name == name)
                        .and_then(Source::binding),
                    Some(SourceRef::Pass { pass: id, source }) => upstream
                        .get(id.0)
                        .and_then(|p| p.source(source))
                        .and_then(Source::binding),
                    None => None,
                };
            }

            for source in &mut pass.sources {
                match source.origin {
                    SourceOrigin::Global => {
                        source.binding = self
                            .globals
                            .iter()
                            .find(|g| g.name == source.name)
                            .and_then(Source::binding);
                    }
                    SourceOrigin::Other => {
                        source.binding = pass
                            .sinks
                            .iter()
                            .find(|s| s.name == source.name)
                            .and_then(Sink::binding);
                    }
                    SourceOrigin::SelfOwned => {}
                }
            }

            if load {
                let mut resources = PassResources {
                    name: &pass.name,
                    sinks: &pass.sinks,
                    sources: &mut pass.sources,
                };
                pass.imp.load_resources(&mut resources, backend)?;
            }

            if let Some(unbound) = pass.sources.iter().find(|s| s.binding.is_none()) {
                return Err(KilnError::ResourceLoad {
                    pass: pass.name.clone(),
                    reason: format!("source '{}' has no backing target", unbound.name),
                });
            }
            if let Some(unbound) = pass.sinks.iter().find(|s| s.binding.is_none()) {
                return Err(KilnError::ResourceLoad {
                    pass: pass.name.clone(),
                    reason: format!("sink '{}' resolved to an unbound source", unbound.name),
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Per Frame
    // ========================================================================

    /// Fresh pass data for every pass: not executable, extended data matching
    /// the pass kind.
    #[must_use]
    pub fn begin_frame<'f>(&self, arena: &'f FrameArena) -> FramePassData<'f> {
        FramePassData::new(arena, self.passes.iter().map(|p| p.kind))
    }

    /// Executes every pass flagged `do_execute`, in declared order.
    ///
    /// The first failing pass ends the frame. Its open backend pass is
    /// aborted so the next frame starts from a closed pass.
    pub fn execute_frame<'f>(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameData<'f>,
        pass_data: &FramePassData<'f>,
    ) -> Result<()> {
        self.require_state("execute_frame", GraphState::Loaded)?;

        for (index, pass) in self.passes.iter_mut().enumerate() {
            let Some(data) = pass_data.get(PassId(index)) else {
                log::warn!("Rendergraph '{}': no frame data for pass '{}'", self.name, pass.name);
                continue;
            };
            if !data.do_execute {
                log::trace!("Pass '{}' skipped", pass.name);
                continue;
            }

            let mut ctx = PassContext {
                backend: &mut *backend,
                frame,
                data,
                name: &pass.name,
                sinks: &pass.sinks,
                sources: &pass.sources,
            };
            if let Err(e) = pass.imp.execute(&mut ctx) {
                log::error!("Pass '{}' failed, frame dropped: {e}", pass.name);
                backend.abort_pass();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Rebinds window-sized targets and notifies every pass. No-op until
    /// resources are loaded.
    pub fn on_resize(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if self.state != GraphState::Loaded {
            log::debug!(
                "Rendergraph '{}': resize ignored while {}",
                self.name,
                self.state.as_str()
            );
            return Ok(());
        }

        self.acquire_globals(backend)?;
        self.bind_attachments(backend, false)?;
        for pass in &mut self.passes {
            pass.imp.on_resize(backend, width, height)?;
        }
        log::debug!("Rendergraph '{}' resized to {width}x{height}", self.name);
        Ok(())
    }

    /// Destroys every pass and clears all bindings.
    pub fn destroy(&mut self, backend: &mut dyn RenderBackend) {
        if self.state == GraphState::Destroyed {
            return;
        }
        for pass in &mut self.passes {
            pass.imp.destroy(backend);
            pass.sinks.iter_mut().for_each(|s| s.binding = None);
            pass.sources.iter_mut().for_each(|s| s.binding = None);
        }
        self.globals.iter_mut().for_each(|g| g.binding = None);
        self.state = GraphState::Destroyed;
        log::info!("Rendergraph '{}' destroyed", self.name);
    }

    /// Resolves a sink's bound target, for inspection.
    #[must_use]
    pub fn sink_binding(&self, pass: &str, sink: &str) -> Option<RenderTargetHandle> {
        self.pass_by_name(pass)?.sink(sink)?.binding()
    }

    #[must_use]
    pub fn source_binding(&self, pass: &str, source: &str) -> Option<RenderTargetHandle> {
        self.pass_by_name(pass)?.source(source)?.binding()
    }

    #[must_use]
    pub fn global_binding(&self, name: &str) -> Option<RenderTargetHandle> {
        self.global_source(name)?.binding()
    }
}

impl std::fmt::Debug for RenderGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraph")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("passes", &self.passes)
            .field("globals", &self.globals)
            .finish()
    }
}
