use pretty_assertions::assert_eq;

use super::*;
use crate::{AstBuilder, NodeKind};

#[test]
fn visits_in_pre_order_and_post_order() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let two = b.int(2);
    let sum = b.binary(crate::BinaryOp::Add, one, two);
    let chunk = b.chunk(vec![sum]);
    let ast = b.finish();

    struct Recorder {
        pre: Vec<NodeId>,
        post: Vec<NodeId>,
    }
    impl NodeVisitor for Recorder {
        fn pre(&mut self, _: &Ast, visit: &Visit<'_>) -> TraversalAction {
            self.pre.push(visit.node);
            TraversalAction::Continue
        }
        fn post(&mut self, _: &Ast, visit: &Visit<'_>) -> TraversalAction {
            self.post.push(visit.node);
            TraversalAction::Continue
        }
    }

    let mut recorder = Recorder {
        pre: vec![],
        post: vec![],
    };
    assert!(walk(&ast, chunk, &mut recorder));
    assert_eq!(recorder.pre, vec![chunk, sum, one, two]);
    assert_eq!(recorder.post, vec![one, two, sum, chunk]);
}

#[test]
fn prune_skips_children() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let block = b.block(vec![one]);
    let chunk = b.chunk(vec![block]);
    let ast = b.finish();

    let mut seen = vec![];
    walk_fn(&ast, chunk, |ast, visit| {
        seen.push(visit.node);
        if matches!(ast.kind(visit.node), NodeKind::Block { .. }) {
            TraversalAction::Prune
        } else {
            TraversalAction::Continue
        }
    });
    assert_eq!(seen, vec![chunk, block]);
}

#[test]
fn stop_ends_the_walk() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let two = b.int(2);
    let chunk = b.chunk(vec![one, two]);
    let ast = b.finish();

    let mut seen = vec![];
    let completed = walk_fn(&ast, chunk, |_, visit| {
        seen.push(visit.node);
        if visit.node == one {
            TraversalAction::Stop
        } else {
            TraversalAction::Continue
        }
    });
    assert!(!completed);
    assert_eq!(seen, vec![chunk, one]);
}

#[test]
fn scope_node_is_innermost_container() {
    let mut b = AstBuilder::new("main.ix", "");
    let x = b.ident("x");
    let body = b.block(vec![x]);
    let function = b.function(vec![], body);
    let chunk = b.chunk(vec![function]);
    let ast = b.finish();

    let mut scopes = vec![];
    walk_fn(&ast, chunk, |_, visit| {
        scopes.push((visit.node, visit.scope_node));
        TraversalAction::Continue
    });
    assert_eq!(
        scopes,
        vec![
            (chunk, None),
            (function, Some(chunk)),
            (body, Some(function)),
            (x, Some(function)),
        ]
    );
}
