//! Render Backend Interface
//!
//! The rendergraph talks to the graphics API through [`RenderBackend`]:
//! render target management plus a begin/upload/draw/end pass protocol.
//!
//! [`HeadlessBackend`] implements the interface without a GPU. It validates
//! the protocol, tracks live targets and records every call, which makes it
//! the backend of choice for tests and the headless demo.

use glam::Vec4;
use kiln_core::{KilnError, Result};
use kiln_scene::GeometryRenderData;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::graph::ResourceKind;

/// Opaque id of a backend render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u32);

/// Far-plane depth of the 0..1 depth range the projections use.
pub const DEPTH_CLEAR_VALUE: f32 = 1.0;

/// What happens to an attachment's contents when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOp {
    /// Keep what earlier passes wrote.
    Load,
    ClearColour(Vec4),
    ClearDepth(f32),
}

/// A render target bound to a pass, with its load operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassAttachment {
    pub target: RenderTargetHandle,
    pub load: LoadOp,
}

impl PassAttachment {
    #[must_use]
    pub const fn load(target: RenderTargetHandle) -> Self {
        Self {
            target,
            load: LoadOp::Load,
        }
    }

    #[must_use]
    pub const fn clear_colour(target: RenderTargetHandle, colour: Vec4) -> Self {
        Self {
            target,
            load: LoadOp::ClearColour(colour),
        }
    }

    #[must_use]
    pub const fn clear_depth(target: RenderTargetHandle, depth: f32) -> Self {
        Self {
            target,
            load: LoadOp::ClearDepth(depth),
        }
    }
}

/// Parameters for [`RenderBackend::create_render_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub kind: ResourceKind,
    pub width: u32,
    pub height: u32,
    /// Array layers (one per shadow cascade for the shadow map).
    pub layers: u32,
}

pub trait RenderBackend {
    /// Current size of the window surface.
    fn window_size(&self) -> (u32, u32);

    /// The window's attachment of the given kind at the current size.
    /// Re-requesting after a resize returns a fresh handle.
    fn window_attachment(&mut self, kind: ResourceKind) -> Result<RenderTargetHandle>;

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle>;

    fn destroy_render_target(&mut self, handle: RenderTargetHandle);

    /// Opens a pass writing to `attachments`. `viewport` is x, y, w, h.
    fn begin_pass(
        &mut self,
        label: &str,
        attachments: &[PassAttachment],
        viewport: Vec4,
    ) -> Result<()>;

    /// Uploads the pass-level uniform block for the open pass.
    fn upload_uniforms(&mut self, bytes: &[u8]) -> Result<()>;

    fn draw(&mut self, record: &GeometryRenderData) -> Result<()>;

    fn end_pass(&mut self) -> Result<()>;

    /// Discards the open pass, if any, after a pass failed mid-recording.
    fn abort_pass(&mut self);
}

// ============================================================================
// Headless Backend
// ============================================================================

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    WindowAttachment {
        kind: ResourceKind,
        handle: RenderTargetHandle,
    },
    CreateTarget {
        label: String,
        handle: RenderTargetHandle,
    },
    DestroyTarget(RenderTargetHandle),
    BeginPass {
        label: String,
        attachments: SmallVec<[PassAttachment; 4]>,
        viewport: Vec4,
    },
    Uniforms {
        size: usize,
    },
    Draw {
        unique_id: u32,
        material_id: u32,
        winding_inverted: bool,
    },
    EndPass,
    AbortPass(String),
}

/// GPU-less backend recording every call.
#[derive(Debug)]
pub struct HeadlessBackend {
    width: u32,
    height: u32,
    next_handle: u32,
    targets: FxHashMap<RenderTargetHandle, RenderTargetDesc>,
    window_colour: Option<RenderTargetHandle>,
    window_depth: Option<RenderTargetHandle>,
    open_pass: Option<String>,
    calls: Vec<BackendCall>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_handle: 1,
            targets: FxHashMap::default(),
            window_colour: None,
            window_depth: None,
            open_pass: None,
            calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        "Headless Backend"
    }

    /// Simulates the platform resizing the window surface.
    pub fn resize_window(&mut self, width: u32, height: u32) {
        log::debug!("HeadlessBackend: window resized to {width}x{height}");
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Labels of every pass begun since the last [`Self::clear_calls`].
    #[must_use]
    pub fn pass_labels(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::BeginPass { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Attachments of the most recent pass begun under `label`.
    #[must_use]
    pub fn pass_attachments(&self, label: &str) -> Option<&[PassAttachment]> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::BeginPass {
                label: begun,
                attachments,
                ..
            } if begun == label => Some(attachments.as_slice()),
            _ => None,
        })
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Draw { .. }))
            .count()
    }

    #[must_use]
    pub fn target(&self, handle: RenderTargetHandle) -> Option<&RenderTargetDesc> {
        self.targets.get(&handle)
    }

    #[must_use]
    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    fn allocate(&mut self, desc: RenderTargetDesc) -> RenderTargetHandle {
        let handle = RenderTargetHandle(self.next_handle);
        self.next_handle += 1;
        self.targets.insert(handle, desc);
        handle
    }

    fn require_open_pass(&self, operation: &str) -> Result<()> {
        if self.open_pass.is_none() {
            return Err(KilnError::Backend(format!("{operation} outside of a pass")));
        }
        Ok(())
    }
}

impl RenderBackend for HeadlessBackend {
    fn window_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn window_attachment(&mut self, kind: ResourceKind) -> Result<RenderTargetHandle> {
        let (width, height) = (self.width, self.height);
        let slot = match kind {
            ResourceKind::Colour => &mut self.window_colour,
            ResourceKind::DepthStencil => &mut self.window_depth,
            ResourceKind::Other => {
                return Err(KilnError::Backend(
                    "the window has no attachment of kind Other".to_owned(),
                ));
            }
        };

        if let Some(handle) = *slot {
            match self.targets.get(&handle) {
                Some(desc) if desc.width == width && desc.height == height => return Ok(handle),
                _ => {
                    self.targets.remove(&handle);
                }
            }
        }

        let handle = self.allocate(RenderTargetDesc {
            label: format!("window_{kind:?}").to_lowercase(),
            kind,
            width,
            height,
            layers: 1,
        });
        if kind == ResourceKind::Colour {
            self.window_colour = Some(handle);
        } else {
            self.window_depth = Some(handle);
        }
        log::trace!("HeadlessBackend: window {kind:?} attachment {handle:?} ({width}x{height})");
        self.calls.push(BackendCall::WindowAttachment { kind, handle });
        Ok(handle)
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            return Err(KilnError::Backend(format!(
                "render target '{}' has a zero dimension",
                desc.label
            )));
        }
        let handle = self.allocate(desc.clone());
        log::trace!(
            "HeadlessBackend: creating target {:?} {handle:?} ({}x{}x{})",
            desc.label,
            desc.width,
            desc.height,
            desc.layers
        );
        self.calls.push(BackendCall::CreateTarget {
            label: desc.label.clone(),
            handle,
        });
        Ok(handle)
    }

    fn destroy_render_target(&mut self, handle: RenderTargetHandle) {
        if self.targets.remove(&handle).is_none() {
            log::warn!("HeadlessBackend: destroying unknown target {handle:?}");
        }
        self.calls.push(BackendCall::DestroyTarget(handle));
    }

    fn begin_pass(
        &mut self,
        label: &str,
        attachments: &[PassAttachment],
        viewport: Vec4,
    ) -> Result<()> {
        if let Some(open) = &self.open_pass {
            return Err(KilnError::Backend(format!(
                "cannot begin '{label}' while '{open}' is open"
            )));
        }
        for attachment in attachments {
            let Some(desc) = self.targets.get(&attachment.target) else {
                return Err(KilnError::Backend(format!(
                    "pass '{label}' uses dead target {:?}",
                    attachment.target
                )));
            };
            let clear_matches = match attachment.load {
                LoadOp::Load => true,
                LoadOp::ClearColour(_) => desc.kind == ResourceKind::Colour,
                LoadOp::ClearDepth(_) => desc.kind == ResourceKind::DepthStencil,
            };
            if !clear_matches {
                return Err(KilnError::Backend(format!(
                    "pass '{label}': {:?} does not fit {:?} target '{}'",
                    attachment.load, desc.kind, desc.label
                )));
            }
        }
        self.open_pass = Some(label.to_owned());
        self.calls.push(BackendCall::BeginPass {
            label: label.to_owned(),
            attachments: SmallVec::from_slice(attachments),
            viewport,
        });
        Ok(())
    }

    fn upload_uniforms(&mut self, bytes: &[u8]) -> Result<()> {
        self.require_open_pass("uniform upload")?;
        self.calls.push(BackendCall::Uniforms { size: bytes.len() });
        Ok(())
    }

    fn draw(&mut self, record: &GeometryRenderData) -> Result<()> {
        self.require_open_pass("draw")?;
        self.calls.push(BackendCall::Draw {
            unique_id: record.unique_id,
            material_id: record.material.id,
            winding_inverted: record.winding_inverted,
        });
        Ok(())
    }

    fn end_pass(&mut self) -> Result<()> {
        if self.open_pass.take().is_none() {
            return Err(KilnError::Backend("end_pass without begin_pass".to_owned()));
        }
        self.calls.push(BackendCall::EndPass);
        Ok(())
    }

    fn abort_pass(&mut self) {
        if let Some(label) = self.open_pass.take() {
            log::warn!("HeadlessBackend: aborting pass '{label}'");
            self.calls.push(BackendCall::AbortPass(label));
        }
    }
}
