//! Node layout inside a pool block
//!
//! A node occupies one [`NODE_SIZE`]-byte block:
//!
//! | bytes   | field                                  |
//! |---------|----------------------------------------|
//! | `0..2`  | value, little-endian `u16`             |
//! | `2..8`  | unused                                 |
//! | `8..16` | next handle, packed little-endian `u64` |

use core::fmt;

use mempool::BlockHandle;

/// Bytes requested from the pool for every node
pub const NODE_SIZE: usize = 16;

const VALUE: core::ops::Range<usize> = 0..2;
const NEXT: core::ops::Range<usize> = 8..16;

/// Reference to a list node
///
/// Stays valid until the node is deleted or the list is cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(BlockHandle);

impl NodeRef {
    /// Pool block holding the node
    #[inline]
    pub const fn handle(self) -> BlockHandle {
        self.0
    }
}

impl From<BlockHandle> for NodeRef {
    fn from(handle: BlockHandle) -> Self {
        Self(handle)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

/// Decoded node contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) value: u16,
    pub(crate) next: Option<NodeRef>,
}

impl Node {
    pub(crate) fn encode(self) -> [u8; NODE_SIZE] {
        let mut bytes = [0u8; NODE_SIZE];
        bytes[VALUE].copy_from_slice(&self.value.to_le_bytes());
        let next = BlockHandle::pack_optional(self.next.map(NodeRef::handle));
        bytes[NEXT].copy_from_slice(&next.to_le_bytes());
        bytes
    }

    /// Decodes a node, or `None` when `bytes` is shorter than a node
    pub(crate) fn decode(bytes: &[u8]) -> Option<Self> {
        let value = u16::from_le_bytes(bytes.get(VALUE)?.try_into().ok()?);
        let next = u64::from_le_bytes(bytes.get(NEXT)?.try_into().ok()?);
        Some(Self {
            value,
            next: BlockHandle::unpack(next).map(NodeRef),
        })
    }
}
