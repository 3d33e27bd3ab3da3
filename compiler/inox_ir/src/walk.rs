//! Depth-first traversal with an ancestor chain.
//!
//! # Design
//!
//! The checker needs, for every node, its parent, the chain of ancestors and
//! the innermost scope container (chunk, embedded module or function
//! expression). [`walk`] maintains these while visiting the tree in pre-order
//! and calls [`NodeVisitor::post`] once all descendants of a node have been
//! visited.
//!
//! Returning [`TraversalAction::Prune`] from `pre` skips the node's children
//! and its `post` call; [`TraversalAction::Stop`] ends the whole walk.

use inox_stack::ensure_sufficient_stack;

use crate::{Ast, NodeId};

/// What the walker does after a callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraversalAction {
    Continue,
    Prune,
    Stop,
}

/// Information about the node being visited.
#[derive(Debug)]
pub struct Visit<'a> {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    /// Innermost scope container strictly above `node`.
    pub scope_node: Option<NodeId>,
    /// Ancestors from the root down to the parent.
    pub ancestors: &'a [NodeId],
}

/// Callbacks invoked by [`walk`].
pub trait NodeVisitor {
    fn pre(&mut self, ast: &Ast, visit: &Visit<'_>) -> TraversalAction;

    fn post(&mut self, _ast: &Ast, _visit: &Visit<'_>) -> TraversalAction {
        TraversalAction::Continue
    }
}

/// Walk the subtree rooted at `root`. Returns `false` if a callback stopped
/// the traversal.
pub fn walk(ast: &Ast, root: NodeId, visitor: &mut dyn NodeVisitor) -> bool {
    let mut ancestors = Vec::new();
    walk_node(ast, root, &mut ancestors, visitor) != TraversalAction::Stop
}

/// Pre-order walk driven by a closure.
pub fn walk_fn(
    ast: &Ast,
    root: NodeId,
    f: impl FnMut(&Ast, &Visit<'_>) -> TraversalAction,
) -> bool {
    struct FnVisitor<F>(F);

    impl<F: FnMut(&Ast, &Visit<'_>) -> TraversalAction> NodeVisitor for FnVisitor<F> {
        fn pre(&mut self, ast: &Ast, visit: &Visit<'_>) -> TraversalAction {
            (self.0)(ast, visit)
        }
    }

    walk(ast, root, &mut FnVisitor(f))
}

fn walk_node(
    ast: &Ast,
    node: NodeId,
    ancestors: &mut Vec<NodeId>,
    visitor: &mut dyn NodeVisitor,
) -> TraversalAction {
    ensure_sufficient_stack(|| {
        let scope_node = ancestors
            .iter()
            .rev()
            .find(|a| ast.kind(**a).is_scope_container())
            .copied();

        let visit = Visit {
            node,
            parent: ancestors.last().copied(),
            scope_node,
            ancestors,
        };

        match visitor.pre(ast, &visit) {
            TraversalAction::Stop => return TraversalAction::Stop,
            TraversalAction::Prune => return TraversalAction::Continue,
            TraversalAction::Continue => {}
        }

        ancestors.push(node);
        for child in ast.kind(node).children() {
            if walk_node(ast, child, ancestors, visitor) == TraversalAction::Stop {
                ancestors.pop();
                return TraversalAction::Stop;
            }
        }
        ancestors.pop();

        let visit = Visit {
            node,
            parent: ancestors.last().copied(),
            scope_node,
            ancestors,
        };
        match visitor.post(ast, &visit) {
            TraversalAction::Stop => TraversalAction::Stop,
            _ => TraversalAction::Continue,
        }
    })
}

/// Find the closest ancestor matching `predicate`, returning its index in
/// `ancestors` along with its id.
pub fn find_closest(
    ast: &Ast,
    ancestors: &[NodeId],
    predicate: impl Fn(&crate::NodeKind) -> bool,
) -> Option<(usize, NodeId)> {
    ancestors
        .iter()
        .enumerate()
        .rev()
        .find(|(_, id)| predicate(ast.kind(**id)))
        .map(|(i, id)| (i, *id))
}

#[cfg(test)]
mod tests;
