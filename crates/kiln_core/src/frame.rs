//! Per-frame Data
//!
//! [`FrameData`] travels through frame preparation and pass execution. It
//! carries the frame arena and the statistics gathered while building draw
//! lists.

use crate::arena::FrameArena;

/// Data shared by every stage of a single frame.
pub struct FrameData<'f> {
    /// Arena for all transient per-frame allocations.
    pub arena: &'f FrameArena,
    /// Monotonic frame counter.
    pub frame_number: u64,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    /// Seconds since startup.
    pub total_time: f64,
    /// Meshes and terrain chunks submitted by the scene pass.
    pub drawn_mesh_count: u32,
    /// Meshes and terrain chunks submitted by the shadow pass.
    pub drawn_shadow_mesh_count: u32,
}

impl<'f> FrameData<'f> {
    #[must_use]
    pub fn new(arena: &'f FrameArena, frame_number: u64, delta_time: f32, total_time: f64) -> Self {
        Self {
            arena,
            frame_number,
            delta_time,
            total_time,
            drawn_mesh_count: 0,
            drawn_shadow_mesh_count: 0,
        }
    }

    pub fn reset_stats(&mut self) {
        self.drawn_mesh_count = 0;
        self.drawn_shadow_mesh_count = 0;
    }
}
