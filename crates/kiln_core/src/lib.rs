//! Kiln Core
//!
//! Foundational types shared by the Kiln crates: the error type, culling math,
//! the per-frame arena, per-frame data and backend resource handles.

pub mod arena;
pub mod errors;
pub mod frame;
pub mod handles;
pub mod math;

pub use arena::{BumpVec, FrameArena};
pub use errors::{KilnError, Result};
pub use frame::FrameData;
pub use handles::{MaterialFlags, MaterialRef, TextureHandle};
pub use math::{Extents3D, Frustum, Plane3D, distance_to_line};
