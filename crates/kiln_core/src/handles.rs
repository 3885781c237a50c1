//! Resource Handles
//!
//! Lightweight references to backend-owned materials and textures. The core
//! never dereferences them; they travel inside draw records and pass data
//! until the backend resolves them.

use bitflags::bitflags;

bitflags! {
    /// Material properties that influence draw ordering and pipeline choice.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// Drawn after opaque geometry, sorted by distance.
        const HAS_TRANSPARENCY = 1 << 0;
    }
}

/// Reference to a material instance owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialRef {
    pub id: u32,
    pub flags: MaterialFlags,
}

impl MaterialRef {
    #[must_use]
    pub const fn new(id: u32, flags: MaterialFlags) -> Self {
        Self { id, flags }
    }

    #[must_use]
    pub const fn opaque(id: u32) -> Self {
        Self {
            id,
            flags: MaterialFlags::empty(),
        }
    }

    #[must_use]
    pub const fn transparent(id: u32) -> Self {
        Self {
            id,
            flags: MaterialFlags::HAS_TRANSPARENCY,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::HAS_TRANSPARENCY)
    }
}

/// Reference to a texture owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// Engine fallback cubemap, always resident.
    pub const DEFAULT_CUBEMAP: Self = Self(0);

    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl Default for TextureHandle {
    fn default() -> Self {
        Self::DEFAULT_CUBEMAP
    }
}
