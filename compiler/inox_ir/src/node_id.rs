//! Node identifiers for the flat syntax tree.

use std::fmt;

/// Index into an [`Ast`](crate::Ast) node arena.
///
/// # Design
/// Nodes reference their children by `NodeId` instead of `Box`, which keeps
/// the tree shareable across lthreads (`Arc<Ast>`) and gives every node a
/// stable identity usable as a table key by the checker and the evaluator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "NodeId({})", self.0)
        } else {
            write!(f, "NodeId::INVALID")
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Identifier of a source file registered in an [`Ast`](crate::Ast).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SourceId(pub(crate) u16);

impl SourceId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
