use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

fn read_global(name: &str) -> Permission {
    Permission::global_var(PermissionKind::READ, name)
}

#[test]
fn permission_is_granted_unless_forbidden() {
    let ctx = Context::new_root(ContextConfig {
        permissions: vec![read_global("*")],
        forbidden_permissions: vec![read_global("secret")],
        ..ContextConfig::default()
    });
    ctx.check_has_permission(&read_global("x")).unwrap();
    let err = ctx.check_has_permission(&read_global("secret")).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::PermissionDenied { .. }));
    assert!(ctx
        .check_has_permission(&Permission::global_var(PermissionKind::UPDATE, "x"))
        .is_err());
}

#[test]
fn child_permissions_must_be_held_by_the_parent() {
    let parent = Context::new_root(ContextConfig::with_permissions(vec![read_global("a")]));
    assert!(parent
        .new_child(ContextConfig::with_permissions(vec![read_global("a")]))
        .is_ok());
    let err = parent
        .new_child(ContextConfig::with_permissions(vec![read_global("b")]))
        .unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::PermissionDenied { .. }));
}

#[test]
fn children_inherit_forbidden_permissions() {
    let parent = Context::new_root(ContextConfig {
        permissions: vec![read_global("*")],
        forbidden_permissions: vec![read_global("x")],
        ..ContextConfig::default()
    });
    let child = parent
        .new_child(ContextConfig::with_permissions(vec![read_global("y")]))
        .unwrap();
    assert_eq!(child.forbidden_permissions(), vec![read_global("x")]);
}

#[test]
fn dropping_permissions_does_not_affect_existing_children() {
    let parent = Context::new_root(ContextConfig::with_permissions(vec![read_global("*")]));
    let child = parent
        .new_child(ContextConfig::with_permissions(vec![read_global("*")]))
        .unwrap();
    parent.drop_permissions(&[read_global("*")]);

    assert!(parent.check_has_permission(&read_global("a")).is_err());
    assert!(parent.granted_permissions().is_empty());
    child.check_has_permission(&read_global("a")).unwrap();
}

#[test]
fn cancellation_reaches_descendants() {
    let root = Context::new_root(ContextConfig::default());
    let child = root.new_child(ContextConfig::default()).unwrap();
    let grandchild = child.new_child(ContextConfig::default()).unwrap();

    child.cancel();
    assert!(!root.is_done());
    assert!(child.is_done());
    assert!(grandchild.is_done());
    assert!(grandchild.check_not_done().unwrap_err().is_cancellation());
    assert!(child.new_child(ContextConfig::default()).is_err());
}

#[test]
fn done_context_fails_permission_checks_with_cancelled() {
    let ctx = Context::new_root(ContextConfig::with_permissions(vec![read_global("*")]));
    ctx.cancel();
    let err = ctx.check_has_permission(&read_global("a")).unwrap_err();
    assert!(err.is_cancellation());
}

#[test]
fn named_patterns_resolve_through_ancestors() {
    let root = Context::new_root(ContextConfig::default());
    let child = root.new_child(ContextConfig::default()).unwrap();

    assert!(child.resolve_named_pattern("int").is_some());
    let pattern = Heap::new(Pattern::exact(Value::int(1)));
    child.add_named_pattern("one", pattern.clone()).unwrap();
    assert!(child.resolve_named_pattern("one").is_some());
    assert!(root.resolve_named_pattern("one").is_none());
    assert!(child.add_named_pattern("one", pattern).is_err());
}

#[test]
fn default_patterns_can_be_skipped() {
    let ctx = Context::new_root(ContextConfig {
        no_default_patterns: true,
        ..ContextConfig::default()
    });
    assert!(ctx.resolve_named_pattern("int").is_none());
    assert!(ctx.named_pattern_names().is_empty());
}

#[test]
fn limits_are_shared_with_children() {
    let root = Context::new_root(ContextConfig {
        limits: vec![Limit::new("objects", LimitKind::Total, 2)],
        ..ContextConfig::default()
    });
    let child = root.new_child(ContextConfig::default()).unwrap();
    child.take("objects", 2).unwrap();
    let err = root.take("objects", 1).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::LimitReached { .. }));
    assert!(root.take("unknown", 1).is_err());
}

#[test]
fn one_transaction_at_a_time() {
    let ctx = Context::new_root(ContextConfig::default());
    let tx = ctx.start_transaction().unwrap();
    assert!(ctx.start_transaction().is_err());
    tx.commit(&ctx).unwrap();
    assert!(ctx.current_transaction().is_none());
    assert!(ctx.start_transaction().is_ok());
}

#[test]
fn locked_values_are_released_on_shutdown() {
    let ctx = Context::new_root(ContextConfig::default());
    let object = Value::object(vec![]);
    let list = Value::list(vec![]);
    ctx.lock_value(&object).unwrap();
    ctx.lock_value(&list).unwrap();
    assert_eq!(ctx.locked_value_count(), 2);
    assert!(object.is_shared());
    assert!(object.smart_lock().unwrap().is_held_by(&ctx));

    ctx.unlock_last_value();
    assert!(!list.smart_lock().unwrap().is_locked());

    ctx.shutdown();
    assert!(!object.smart_lock().unwrap().is_locked());
    assert!(ctx.is_done());
}

#[test]
fn missing_dispatcher_is_an_error() {
    let ctx = Context::new_root(ContextConfig::default());
    assert!(ctx.dispatcher().is_err());
}
