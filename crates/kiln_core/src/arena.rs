//! Per-frame Arena
//!
//! A bump allocator reset once per frame. Draw lists and sort scratch buffers
//! produced while preparing a frame are allocated here and never freed
//! individually.
//!
//! Everything handed out borrows the arena, so the borrow checker rejects any
//! attempt to keep frame data alive across [`FrameArena::reset`].

use bumpalo::Bump;

/// Growable vector whose storage lives in a [`FrameArena`].
pub type BumpVec<'a, T> = bumpalo::collections::Vec<'a, T>;

/// Default initial capacity (bytes) of a frame arena.
pub const DEFAULT_FRAME_ARENA_CAPACITY: usize = 1024 * 1024;

/// Frame-scoped bump allocator.
pub struct FrameArena {
    bump: Bump,
    frames: u64,
}

impl Default for FrameArena {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_FRAME_ARENA_CAPACITY)
    }
}

impl FrameArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
            frames: 0,
        }
    }

    /// Empty vector allocated in this arena.
    #[inline]
    #[must_use]
    pub fn vec<T>(&self) -> BumpVec<'_, T> {
        BumpVec::new_in(&self.bump)
    }

    #[inline]
    #[must_use]
    pub fn vec_with_capacity<T>(&self, capacity: usize) -> BumpVec<'_, T> {
        BumpVec::with_capacity_in(capacity, &self.bump)
    }

    /// Copies `src` into the arena.
    #[inline]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(src)
    }

    /// Bytes currently handed out by the arena.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Number of completed resets.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Releases every allocation at once. Retains the largest chunk.
    pub fn reset(&mut self) {
        log::trace!(
            "Frame arena reset after frame {} ({} bytes)",
            self.frames,
            self.bump.allocated_bytes()
        );
        self.bump.reset();
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_lives_in_arena() {
        let arena = FrameArena::with_capacity(256);
        let mut v = arena.vec_with_capacity::<u32>(4);
        v.extend([1, 2, 3, 4]);
        assert_eq!(v.as_slice(), &[1, 2, 3, 4]);
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn reset_counts_frames() {
        let mut arena = FrameArena::with_capacity(64);
        let _ = arena.alloc_slice_copy(&[1u8; 32]);
        arena.reset();
        arena.reset();
        assert_eq!(arena.frames(), 2);
    }
}
