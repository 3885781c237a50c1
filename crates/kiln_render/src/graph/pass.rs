//! Rendergraph Passes
//!
//! A [`Pass`] is a named graph node: its declared sinks and sources plus a
//! boxed [`RenderPass`] implementation supplying the lifecycle callbacks.
//!
//! # Lifecycle
//!
//! ```text
//! create -> initialize -> load_resources -> [ per frame: populate PassData -> execute ] -> destroy
//!                              ^
//!                         on_resize (rebind)
//! ```
//!
//! Per-frame data does not live on the pass. Frame preparation fills a
//! [`FramePassData`] table borrowed from the frame arena, and execution reads
//! it back by [`PassId`].

use std::ops::{Index, IndexMut};

use glam::{Mat4, Vec3};
use kiln_core::{BumpVec, FrameArena, FrameData, KilnError, Result};
use kiln_scene::{Camera, Viewport};
use smallvec::SmallVec;

use crate::backend::{RenderBackend, RenderTargetHandle};
use crate::graph::resource::{Sink, Source};
use crate::passes::{ScenePassData, ShadowMapPassData, SkyboxPassData};

/// Index of a pass in its graph's declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PassId(pub(crate) usize);

/// Selects the [`PassExtData`] variant a pass expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Skybox,
    ShadowMap,
    Scene,
    Custom,
}

// ============================================================================
// Per-frame Pass Data
// ============================================================================

/// Pass-specific frame data.
#[derive(Debug, Clone, Default)]
pub enum PassExtData<'f> {
    #[default]
    None,
    Skybox(SkyboxPassData),
    ShadowMap(ShadowMapPassData<'f>),
    Scene(ScenePassData<'f>),
}

impl PassExtData<'_> {
    #[must_use]
    pub fn for_kind(kind: PassKind) -> Self {
        match kind {
            PassKind::Skybox => Self::Skybox(SkyboxPassData::default()),
            PassKind::ShadowMap => Self::ShadowMap(ShadowMapPassData::default()),
            PassKind::Scene => Self::Scene(ScenePassData::default()),
            PassKind::Custom => Self::None,
        }
    }
}

/// What a pass needs to know about the current frame.
#[derive(Debug, Clone)]
pub struct PassData<'f> {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_position: Vec3,
    pub viewport: Viewport,
    /// Passes with this unset are skipped for the frame.
    pub do_execute: bool,
    pub ext: PassExtData<'f>,
}

impl PassData<'_> {
    #[must_use]
    pub fn for_kind(kind: PassKind) -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_position: Vec3::ZERO,
            viewport: Viewport::default(),
            do_execute: false,
            ext: PassExtData::for_kind(kind),
        }
    }

    /// Copies the camera transform and the viewport's projection.
    pub fn set_view(&mut self, camera: &Camera, viewport: &Viewport) {
        self.view = camera.view_matrix();
        self.projection = viewport.projection();
        self.view_position = camera.position();
        self.viewport = *viewport;
    }
}

/// Pass data of every pass in a graph for one frame, indexed by [`PassId`].
pub struct FramePassData<'f> {
    entries: BumpVec<'f, PassData<'f>>,
}

impl<'f> FramePassData<'f> {
    pub(crate) fn new(
        arena: &'f FrameArena,
        kinds: impl ExactSizeIterator<Item = PassKind>,
    ) -> Self {
        let mut entries = arena.vec_with_capacity(kinds.len());
        entries.extend(kinds.map(PassData::for_kind));
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, id: PassId) -> Option<&PassData<'f>> {
        self.entries.get(id.0)
    }

    pub fn get_mut(&mut self, id: PassId) -> Option<&mut PassData<'f>> {
        self.entries.get_mut(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'f> Index<PassId> for FramePassData<'f> {
    type Output = PassData<'f>;

    fn index(&self, id: PassId) -> &Self::Output {
        &self.entries[id.0]
    }
}

impl IndexMut<PassId> for FramePassData<'_> {
    fn index_mut(&mut self, id: PassId) -> &mut Self::Output {
        &mut self.entries[id.0]
    }
}

// ============================================================================
// Callback Contexts
// ============================================================================

/// View of a pass's declarations during `load_resources`.
pub struct PassResources<'a> {
    pub(crate) name: &'a str,
    pub(crate) sinks: &'a [Sink],
    pub(crate) sources: &'a mut [Source],
}

impl PassResources<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    #[must_use]
    pub fn sink_binding(&self, sink: &str) -> Option<RenderTargetHandle> {
        self.sinks
            .iter()
            .find(|s| s.name == sink)
            .and_then(Sink::binding)
    }

    /// Binds a backing target to one of this pass's sources.
    pub fn bind_source(&mut self, source: &str, handle: RenderTargetHandle) -> Result<()> {
        let slot = self
            .sources
            .iter_mut()
            .find(|s| s.name == source)
            .ok_or_else(|| KilnError::SourceNotFound {
                pass: self.name.to_owned(),
                source_name: source.to_owned(),
            })?;
        slot.bind(handle);
        Ok(())
    }
}

/// Everything a pass sees while executing.
pub struct PassContext<'a, 'f> {
    pub backend: &'a mut dyn RenderBackend,
    pub frame: &'a FrameData<'f>,
    pub data: &'a PassData<'f>,
    pub(crate) name: &'a str,
    pub(crate) sinks: &'a [Sink],
    pub(crate) sources: &'a [Source],
}

impl PassContext<'_, '_> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn sink_binding(&self, sink: &str) -> Result<RenderTargetHandle> {
        let slot = self
            .sinks
            .iter()
            .find(|s| s.name == sink)
            .ok_or_else(|| KilnError::SinkNotFound {
                pass: self.name.to_owned(),
                sink: sink.to_owned(),
            })?;
        slot.binding.ok_or_else(|| self.unbound(sink))
    }

    pub fn source_binding(&self, source: &str) -> Result<RenderTargetHandle> {
        let slot = self
            .sources
            .iter()
            .find(|s| s.name == source)
            .ok_or_else(|| KilnError::SourceNotFound {
                pass: self.name.to_owned(),
                source_name: source.to_owned(),
            })?;
        slot.binding.ok_or_else(|| self.unbound(source))
    }

    fn unbound(&self, slot: &str) -> KilnError {
        KilnError::ResourceLoad {
            pass: self.name.to_owned(),
            reason: format!("'{slot}' has no backing target"),
        }
    }
}

// ============================================================================
// RenderPass Trait
// ============================================================================

/// Lifecycle callbacks of a pass. Everything except `execute` defaults to a
/// no-op.
pub trait RenderPass {
    fn kind(&self) -> PassKind;

    fn initialize(&mut self, _backend: &mut dyn RenderBackend) -> Result<()> {
        Ok(())
    }

    /// Creates and binds `SelfOwned` sources. Sinks are already bound.
    fn load_resources(
        &mut self,
        _resources: &mut PassResources<'_>,
        _backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, ctx: &mut PassContext<'_, '_>) -> Result<()>;

    fn on_resize(
        &mut self,
        _backend: &mut dyn RenderBackend,
        _width: u32,
        _height: u32,
    ) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self, _backend: &mut dyn RenderBackend) {}
}

/// A graph node.
pub struct Pass {
    pub(crate) name: String,
    pub(crate) kind: PassKind,
    pub(crate) sinks: SmallVec<[Sink; 4]>,
    pub(crate) sources: SmallVec<[Source; 4]>,
    pub(crate) imp: Box<dyn RenderPass>,
}

impl Pass {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> PassKind {
        self.kind
    }

    #[must_use]
    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    #[must_use]
    pub fn sink(&self, name: &str) -> Option<&Sink> {
        self.sinks.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sinks", &self.sinks)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}
