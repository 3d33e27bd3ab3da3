//! Lthreads started by `spawn` expressions.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use inox_core::value::LThreadGroup;
use inox_core::{Context, EvalErrorKind, Heap, Value};
use inox_eval::{eval_module, prepare_context, EvalConfig, GlobalState};
use inox_ir::{AstBuilder, BinaryOp, Module, NodeId, NodeKind};

fn ret(b: &mut AstBuilder, expr: NodeId) -> NodeId {
    b.node(NodeKind::ReturnStatement { expr: Some(expr) })
}

fn spawn(b: &mut AstBuilder, meta: Option<NodeId>, statements: Vec<NodeId>) -> NodeId {
    let module = b.embedded_module(statements);
    b.node(NodeKind::SpawnExpression { meta, module })
}

fn run(b: AstBuilder, root: NodeId, globals: GlobalState) -> (Context, Value) {
    let module = Module::new(b.finish_shared(), root).with_name("main.ix");
    let ctx = prepare_context(&module, None).unwrap();
    let value = eval_module(Arc::new(module), &ctx, globals, EvalConfig::default()).unwrap();
    (ctx, value)
}

fn lthread(value: Value) -> Heap<inox_core::value::LThread> {
    match value {
        Value::LThread(lthread) => lthread,
        other => panic!("expected an lthread, got {}", other.type_name()),
    }
}

#[test]
fn spawned_module_sees_the_globals_it_is_given() {
    let mut b = AstBuilder::new("main.ix", "");
    let twenty_one = b.int(21);
    let constants = b.constants(&[("a", twenty_one)]);
    let a = b.ident("a");
    let two = b.int(2);
    let double = b.binary(BinaryOp::Mul, a, two);
    let body = ret(&mut b, double);
    let globals = b.key_list(&["a"]);
    let meta = b.object(&[("globals", globals)]);
    let spawned = spawn(&mut b, Some(meta), vec![body]);
    let ret = ret(&mut b, spawned);
    let root = b.chunk_with_constants(constants, vec![ret]);

    let (ctx, value) = run(b, root, GlobalState::new());
    let lthread = lthread(value);
    assert_eq!(lthread.wait_result(&ctx).unwrap().as_int(), Some(42));
    lthread.join();
    ctx.shutdown();
}

#[test]
fn lthreads_cannot_spawn_by_default() {
    let mut b = AstBuilder::new("main.ix", "");
    let nil = b.nil();
    let nested = spawn(&mut b, None, vec![nil]);
    let inner = ret(&mut b, nested);
    let outer = spawn(&mut b, None, vec![inner]);
    let ret = ret(&mut b, outer);
    let root = b.chunk(vec![ret]);

    let (ctx, value) = run(b, root, GlobalState::new());
    let err = lthread(value).wait_result(&ctx).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::PermissionDenied { .. }));
    ctx.shutdown();
}

#[test]
fn group_collects_the_results_in_spawn_order() {
    let mut b = AstBuilder::new("main.ix", "");
    let mut statements = Vec::new();
    for n in 1..=3 {
        let group = b.global("g");
        let meta = b.object(&[("group", group)]);
        let value = b.int(n);
        let body = ret(&mut b, value);
        statements.push(spawn(&mut b, Some(meta), vec![body]));
    }
    let root = b.chunk(statements);

    let Value::LThreadGroup(group) = Value::lthread_group(LThreadGroup::new()) else {
        panic!("expected an lthread group");
    };
    let globals = GlobalState::new();
    globals.define("g", Value::LThreadGroup(group.clone()));
    let (ctx, _) = run(b, root, globals);

    assert_eq!(group.len(), 3);
    let results: Vec<i64> = group
        .wait_all_results(&ctx)
        .unwrap()
        .iter()
        .map(|v| v.as_int().unwrap())
        .collect();
    assert_eq!(results, vec![1, 2, 3]);
    ctx.shutdown();
}

#[test]
fn failing_lthread_reports_its_error() {
    let mut b = AstBuilder::new("main.ix", "");
    let f = b.bool(false);
    let assertion = b.assert(f);
    let spawned = spawn(&mut b, None, vec![assertion]);
    let ret = ret(&mut b, spawned);
    let root = b.chunk(vec![ret]);

    let (ctx, value) = run(b, root, GlobalState::new());
    let lthread = lthread(value);
    let err = lthread.wait_result(&ctx).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::AssertionFailed { .. }));
    assert!(!err.is_test_assertion);
    assert!(lthread.is_done());
    ctx.shutdown();
}

#[test]
fn waiting_stops_when_the_waiter_is_done() {
    let mut b = AstBuilder::new("main.ix", "");
    let nil = b.nil();
    let spawned = spawn(&mut b, None, vec![nil]);
    let ret = ret(&mut b, spawned);
    let root = b.chunk(vec![ret]);

    let (ctx, value) = run(b, root, GlobalState::new());
    let lthread = lthread(value);
    let waiter = Context::new_root(Default::default());
    waiter.shutdown();
    let outcome = lthread.wait_result(&waiter);
    // The lthread may finish before the waiter is checked.
    if let Err(err) = outcome {
        assert!(matches!(err.kind, EvalErrorKind::Cancelled));
    }
    ctx.shutdown();
}
