//! Generation-checked block handles
//!
//! A handle names a slot in the block directory arena together with the
//! generation the slot had when the block was handed out. Freeing a block or
//! merging it into a neighbour bumps the slot's generation, so every handle
//! issued before that point stops resolving.
//!
//! Generations are 32-bit and wrap. A stale handle can resolve again once its
//! slot has been retired 2^32 times; holding a handle across that many frees
//! of the same slot is not detected.

use core::fmt;

/// Opaque identifier of an allocated block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle {
    index: u32,
    generation: u32,
}

impl BlockHandle {
    /// Sentinel packed value that never decodes into a live handle
    ///
    /// Same bit pattern as `BlockHandle::new(u32::MAX, u32::MAX).pack()`, so
    /// that handle reads back as `None`. The pool would need `u32::MAX` directory
    /// slots to issue it.
    pub const NONE_PACKED: u64 = u64::MAX;

    /// Creates a handle from its raw parts
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the block was allocated
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Encodes the handle into a single `u64`, index in the upper half
    #[inline]
    pub const fn pack(self) -> u64 {
        ((self.index as u64) << 32) | self.generation as u64
    }

    /// Decodes a handle produced by [`pack`](Self::pack)
    ///
    /// Returns `None` for [`NONE_PACKED`](Self::NONE_PACKED).
    #[inline]
    pub const fn unpack(packed: u64) -> Option<Self> {
        if packed == Self::NONE_PACKED {
            return None;
        }
        Some(Self {
            index: (packed >> 32) as u32,
            generation: packed as u32,
        })
    }

    /// Packs an optional handle, mapping `None` to the sentinel
    #[inline]
    pub const fn pack_optional(handle: Option<Self>) -> u64 {
        match handle {
            Some(handle) => handle.pack(),
            None => Self::NONE_PACKED,
        }
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}
