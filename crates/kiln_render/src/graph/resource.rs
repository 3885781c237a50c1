//! Pass Resources
//!
//! Passes declare what they produce ([`Source`]) and what they consume
//! ([`Sink`]). A sink is linked to exactly one upstream source, either a
//! graph-global one or a source of an earlier pass. Backing render targets
//! are bound during `load_resources` and rebound on resize.

use crate::backend::RenderTargetHandle;
use crate::graph::PassId;

/// What a render target holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Colour,
    DepthStencil,
    /// Pass-to-pass data that is not an attachment.
    Other,
}

/// Who provides the target behind a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// A graph-level target shared by every pass (window attachments).
    Global,
    /// Created by the owning pass in `load_resources`.
    SelfOwned,
    /// Forwards whatever arrives on the pass's sink of the same name.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,
    pub kind: ResourceKind,
    pub origin: SourceOrigin,
    pub(crate) binding: Option<RenderTargetHandle>,
}

impl Source {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind, origin: SourceOrigin) -> Self {
        Self {
            name: name.into(),
            kind,
            origin,
            binding: None,
        }
    }

    /// Backing target; `None` before resources are loaded.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> Option<RenderTargetHandle> {
        self.binding
    }

    pub fn bind(&mut self, handle: RenderTargetHandle) {
        self.binding = Some(handle);
    }
}

/// Where a sink reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    Global(String),
    Pass { pass: PassId, source: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sink {
    pub name: String,
    pub(crate) link: Option<SourceRef>,
    pub(crate) binding: Option<RenderTargetHandle>,
}

impl Sink {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: None,
            binding: None,
        }
    }

    /// Upstream source; `None` until linked.
    #[inline]
    #[must_use]
    pub fn link(&self) -> Option<&SourceRef> {
        self.link.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn binding(&self) -> Option<RenderTargetHandle> {
        self.binding
    }
}
