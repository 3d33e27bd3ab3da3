//! Flat syntax tree stored in an arena.
//!
//! # Module Structure
//!
//! - `node`: [`Node`] and the [`NodeKind`] enum with child enumeration
//! - `operators`: binary, unary and assignment operators
//!
//! One [`Ast`] holds every node of a module, including the chunks pulled in
//! by inclusion imports and the embedded modules of spawn expressions, so a
//! `NodeId` is unique across everything the evaluator of a module can reach.

mod node;
mod operators;

use std::sync::Arc;

use crate::source::{SourceFile, SourcePosition};
use crate::{NodeId, SourceId, Span};

pub use node::{Children, Node, NodeKind};
pub use operators::{AssignmentOp, BinaryOp, PatternQuantifier, UnaryOp};

/// Shared handle on an immutable tree.
///
/// Function values, spawned lthreads and included chunks all keep the tree
/// alive through this handle.
pub type SharedAst = Arc<Ast>;

/// Node arena plus the source files the nodes were parsed from.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    sources: Vec<SourceFile>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file; nodes allocated afterwards reference it by id.
    pub fn add_source(&mut self, source: SourceFile) -> SourceId {
        let id = u16::try_from(self.sources.len()).unwrap_or(u16::MAX);
        self.sources.push(source);
        SourceId(id)
    }

    /// Append a node and return its id.
    pub fn alloc(&mut self, kind: NodeKind, span: Span, source: SourceId) -> NodeId {
        let id = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX - 1);
        self.nodes.push(Node { kind, span, source });
        NodeId::new(id)
    }

    /// Replace the kind of an already allocated node.
    ///
    /// Used by builders that need a node id before its children exist.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.kind = kind;
        }
    }

    /// Get a node.
    ///
    /// # Panics
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self, id: SourceId) -> Option<&SourceFile> {
        self.sources.get(id.index())
    }

    /// `file:line:col` position of a node.
    pub fn position(&self, id: NodeId) -> SourcePosition {
        let node = self.node(id);
        match self.source(node.source) {
            Some(source) => source.position(node.span),
            None => SourcePosition::unknown(node.span),
        }
    }

    /// Text of a node as written in its source file, if available.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.node(id);
        self.source(node.source)?.text().get(node.span.to_range())
    }

    /// Name carried by an identifier-like node.
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        self.kind(id).identifier_name()
    }
}

#[cfg(test)]
mod tests;
