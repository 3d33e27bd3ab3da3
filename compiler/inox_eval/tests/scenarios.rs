//! Whole-module runs through the public entry points.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use inox_core::value::HostFunction;
use inox_core::{EvalErrorKind, Permission, PermissionKind, Value};
use inox_eval::{
    default_permissions, eval_module, eval_standalone, prepare_context, EvalConfig, GlobalState,
    OutputHandler,
};
use inox_ir::{AstBuilder, BinaryOp, Module, NodeId, NodeKind};

fn module(b: AstBuilder, root: NodeId) -> Module {
    Module::new(b.finish_shared(), root).with_name("main.ix")
}

fn ret(b: &mut AstBuilder, expr: NodeId) -> NodeId {
    b.node(NodeKind::ReturnStatement { expr: Some(expr) })
}

fn chunk_with_manifest(b: &mut AstBuilder, manifest: NodeId, statements: Vec<NodeId>) -> NodeId {
    let manifest = b.node(NodeKind::Manifest { object: manifest });
    b.node(NodeKind::Chunk {
        global_constants: None,
        manifest: Some(manifest),
        statements,
    })
}

#[test]
fn checked_module_returns_its_value() {
    let mut b = AstBuilder::new("main.ix", "");
    let two = b.int(2);
    let constants = b.constants(&[("base", two)]);
    let base = b.ident("base");
    let forty = b.int(40);
    let sum = b.binary(BinaryOp::Add, base, forty);
    let ret = ret(&mut b, sum);
    let root = b.chunk_with_constants(constants, vec![ret]);
    let module = module(b, root);

    let ctx = prepare_context(&module, None).unwrap();
    let result = eval_module(Arc::new(module), &ctx, GlobalState::new(), EvalConfig::default());
    assert_eq!(result.unwrap().as_int(), Some(42));
    ctx.shutdown();
}

#[test]
fn static_check_failures_stop_evaluation() {
    let mut b = AstBuilder::new("main.ix", "");
    let undeclared = b.ident("nope");
    let ret = ret(&mut b, undeclared);
    let root = b.chunk(vec![ret]);
    let module = module(b, root);

    let ctx = prepare_context(&module, None).unwrap();
    let err = eval_module(Arc::new(module), &ctx, GlobalState::new(), EvalConfig::default())
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::StaticCheck { .. }));
}

#[test]
fn host_globals_are_visible_to_the_checker() {
    let mut b = AstBuilder::new("main.ix", "");
    let g = b.global("limit");
    let ret = ret(&mut b, g);
    let root = b.chunk(vec![ret]);
    let module = module(b, root);

    let globals = GlobalState::new();
    globals.define("limit", Value::int(7));
    let ctx = prepare_context(&module, None).unwrap();
    let result = eval_module(Arc::new(module), &ctx, globals, EvalConfig::default());
    assert_eq!(result.unwrap().as_int(), Some(7));
}

#[test]
fn manifest_permissions_bound_the_module() {
    let mut b = AstBuilder::new("main.ix", "");
    let manifest = b.object(&[]);
    let g = b.global("limit");
    let read = b.local_decl("seen", g);
    let one = b.int(1);
    let body = ret(&mut b, one);
    let embedded = b.embedded_module(vec![body]);
    let spawn = b.node(NodeKind::SpawnExpression {
        meta: None,
        module: embedded,
    });
    let root = chunk_with_manifest(&mut b, manifest, vec![read, spawn]);
    let module = module(b, root);

    let ctx = prepare_context(&module, None).unwrap();
    assert!(ctx.has_permission(&Permission::global_var(PermissionKind::READ, "limit")));
    assert!(!ctx.has_permission(&Permission::lthread_create()));

    let globals = GlobalState::new();
    globals.define("limit", Value::int(0));
    let err = eval_module(Arc::new(module), &ctx, globals, EvalConfig::default()).unwrap_err();
    let EvalErrorKind::PermissionDenied { permission } = &err.kind else {
        panic!("expected a denied permission, got {err}");
    };
    assert!(permission.contains("threads"), "{permission}");
}

#[test]
fn child_context_requires_the_parent_permissions() {
    let mut b = AstBuilder::new("main.ix", "");
    let manifest = b.object(&[]);
    let root = chunk_with_manifest(&mut b, manifest, vec![]);
    let restricted = module(b, root);
    let parent = prepare_context(&restricted, None).unwrap();

    let mut b = AstBuilder::new("child.ix", "");
    let root = b.chunk(vec![]);
    let unrestricted = module(b, root);
    let err = prepare_context(&unrestricted, Some(&parent)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::PermissionDenied { .. }));

    let child = prepare_context(&restricted, Some(&parent)).unwrap();
    assert!(!child.has_permission(&Permission::lthread_create()));
}

#[test]
fn host_calls_inox_functions_through_the_dispatcher() {
    let mut b = AstBuilder::new("main.ix", "");
    let x = b.ident("x");
    let one = b.int(1);
    let body = b.binary(BinaryOp::Add, x, one);
    let function = b.function(vec!["x"], body);
    let ret = ret(&mut b, function);
    let root = b.chunk(vec![ret]);
    let module = module(b, root);

    let ctx = prepare_context(&module, None).unwrap();
    let globals = GlobalState::new();
    let function = eval_module(Arc::new(module), &ctx, globals.clone(), EvalConfig::default())
        .unwrap();

    let dispatcher = ctx.dispatcher().unwrap();
    let result = dispatcher.call(&ctx, &function, vec![Value::int(41)]).unwrap();
    assert_eq!(result.as_int(), Some(42));

    drop(globals);
    let err = dispatcher.call(&ctx, &function, vec![Value::int(41)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Cancelled));
}

#[test]
fn standalone_modules_skip_the_check() {
    let mut b = AstBuilder::new("main.ix", "");
    let f = b.bool(false);
    let undeclared = b.ident("nope");
    let or = b.binary(BinaryOp::Or, f, undeclared);
    let t = b.bool(true);
    let and = b.binary(BinaryOp::And, t, or);
    let ret = ret(&mut b, and);
    let root = b.chunk(vec![ret]);
    let err = eval_standalone(module(b, root)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Undeclared { .. }));
}

#[test]
fn test_suites_print_their_cases() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let one_again = b.int(1);
    let eq = b.binary(BinaryOp::Equal, one, one_again);
    let assertion = b.assert(eq);
    let case_module = b.embedded_module(vec![assertion]);
    let case_name = b.string("one is one");
    let case = b.node(NodeKind::TestCaseExpression {
        meta: Some(case_name),
        module: case_module,
    });
    let suite_module = b.embedded_module(vec![case]);
    let suite_name = b.string("arithmetic");
    let name_entry = b.object(&[("name", suite_name)]);
    let suite = b.node(NodeKind::TestSuiteExpression {
        meta: Some(name_entry),
        module: suite_module,
    });
    let root = b.chunk(vec![suite]);
    let module = module(b, root);

    let output = OutputHandler::buffer();
    let config = EvalConfig::default().with_output(Arc::clone(&output));
    let ctx = prepare_context(&module, None).unwrap();
    eval_module(Arc::new(module), &ctx, GlobalState::new(), config).unwrap();
    assert_eq!(output.get_output(), "[ok] one is one\n[ok] arithmetic\n");
}

#[test]
fn default_permissions_allow_updates_and_lthreads() {
    let permissions = default_permissions();
    assert!(permissions.contains(&Permission::global_var(PermissionKind::UPDATE, "*")));
    assert!(permissions.contains(&Permission::lthread_create()));
}

#[test]
fn failed_test_case_assertion_is_located_and_flagged() {
    let text = "testcase { assert 1 == 2 }";
    let mut b = AstBuilder::new("main.ix", text);
    let one = b.at(18, 19).int(1);
    let two = b.at(23, 24).int(2);
    let eq = b.at(18, 24).binary(BinaryOp::Equal, one, two);
    let assertion = b.at(11, 24).assert(eq);
    let case_module = b.at(9, 26).embedded_module(vec![assertion]);
    let case = b.at(0, 26).node(NodeKind::TestCaseExpression {
        meta: None,
        module: case_module,
    });
    let root = b.at(0, 26).chunk(vec![case]);
    let module = module(b, root);

    let config = EvalConfig::default().with_output(OutputHandler::silent());
    let ctx = prepare_context(&module, None).unwrap();
    let err = eval_module(Arc::new(module), &ctx, GlobalState::new(), config).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::AssertionFailed { .. }));
    assert!(err.is_test_assertion);
    let rendered = err.to_string();
    assert!(rendered.starts_with("main.ix:1:"), "{rendered}");
    assert!(rendered.ends_with("expected 1 to be equal to 2"), "{rendered}");
}

#[test]
fn spawned_module_only_sees_the_listed_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let a = b.global("A");
    let read_a = b.local_decl("a", a);
    let read_b = b.global("B");
    let body = ret(&mut b, read_b);
    let globals = b.key_list(&["A"]);
    let meta = b.object(&[("globals", globals)]);
    let embedded = b.embedded_module(vec![read_a, body]);
    let spawn = b.node(NodeKind::SpawnExpression {
        meta: Some(meta),
        module: embedded,
    });
    let ret = ret(&mut b, spawn);
    let root = b.chunk(vec![ret]);
    let module = module(b, root);

    let globals = GlobalState::with_start_constants([("A".to_string(), Value::int(1))]);
    globals.define("B", Value::int(2));
    let ctx = prepare_context(&module, None).unwrap();
    let config = EvalConfig::default().without_static_check();
    let Value::LThread(lthread) = eval_module(Arc::new(module), &ctx, globals, config).unwrap()
    else {
        panic!("expected an lthread");
    };
    let err = lthread.wait_result(&ctx).unwrap_err();
    let EvalErrorKind::Undeclared { name, .. } = &err.kind else {
        panic!("expected an undeclared variable, got {err}");
    };
    assert_eq!(name, "B");
    ctx.shutdown();
}

#[test]
fn cancelled_context_stops_before_the_next_statement() {
    let mut b = AstBuilder::new("main.ix", "");
    let callee = b.global("stop");
    let call = b.call(callee, vec![]);
    let f = b.bool(false);
    let never = b.assert(f);
    let root = b.chunk(vec![call, never]);
    let module = module(b, root);

    let stop = HostFunction::new(
        "stop",
        Arc::new(|ctx: &inox_core::Context, _: &[Value]| {
            ctx.cancel();
            Ok(Value::Nil)
        }),
    );
    let globals = GlobalState::new();
    globals.define("stop", Value::host_function(stop));
    let ctx = prepare_context(&module, None).unwrap();
    let err = eval_module(Arc::new(module), &ctx, globals, EvalConfig::default()).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Cancelled));
}

#[test]
fn minof_fails_on_the_first_incomparable_pair() {
    let mut b = AstBuilder::new("main.ix", "");
    let callee = b.global("minof");
    let two = b.int(2);
    let one = b.int(1);
    let s_b = b.string("b");
    let s_a = b.string("a");
    let call = b.call(callee, vec![two, one, s_b, s_a]);
    let ret = ret(&mut b, call);
    let root = b.chunk(vec![ret]);
    let module = module(b, root);

    let minof = HostFunction::new(
        "minof",
        Arc::new(|_: &inox_core::Context, args: &[Value]| Value::min_of(args)),
    );
    let globals = GlobalState::new();
    globals.define("minof", Value::host_function(minof));
    let ctx = prepare_context(&module, None).unwrap();
    let err = eval_module(Arc::new(module), &ctx, globals, EvalConfig::default()).unwrap_err();
    let EvalErrorKind::NotComparable { left, right } = &err.kind else {
        panic!("expected a comparison failure, got {err}");
    };
    assert_eq!((left.as_str(), right.as_str()), ("integer", "string"));
}
