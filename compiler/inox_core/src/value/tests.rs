use std::cmp::Ordering;
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::context::ContextConfig;
use crate::errors::EvalErrorKind;

fn ctx() -> Context {
    Context::new_root(ContextConfig::default())
}

fn immutable_samples() -> Vec<Value> {
    vec![
        Value::Nil,
        Value::Bool(true),
        Value::int(42),
        Value::Float(1.5),
        Value::Rune('x'),
        Value::Byte(7),
        Value::str("text"),
        Value::path("/tmp/"),
        Value::url("https://example.com/"),
        Value::host("https://example.com"),
        Value::identifier("ident"),
        Value::ByteCount(10),
        Value::Duration(Duration::from_secs(3)),
        Value::Year(2024),
        Value::record(vec![("a".into(), Value::int(1))]),
        Value::tuple(vec![Value::int(1), Value::str("a")]),
        Value::key_list(vec!["a".into()]),
        Value::IntRange(IntRange::new(1, 3)),
        Value::RuneRange(RuneRange::new('a', 'z')),
        Value::option("verbose", Value::Bool(true)),
    ]
}

#[test]
fn immutable_values_equal_themselves() {
    for value in immutable_samples() {
        assert!(!value.is_mutable(), "{value:?} should be immutable");
        assert!(value.equals(&value), "{value:?} should equal itself");
        assert!(value.is_identical(&value.clone()));
    }
}

#[test]
fn mutable_kinds() {
    let ctx = ctx();
    let mutable = [
        Value::object(vec![]),
        Value::list(vec![]),
        Value::dictionary(vec![]),
        Value::rune_slice(vec!['a']),
        Value::byte_slice(vec![1]),
        Value::lthread_group(LThreadGroup::new()),
        Value::stream(Stream::new()),
        Value::lthread(LThread::new(ctx.clone(), "t")),
    ];
    for value in &mutable {
        assert!(value.is_mutable(), "{} should be mutable", value.type_name());
    }
}

#[test]
fn identity_of_mutable_values_is_the_allocation() {
    let a = Value::list(vec![Value::int(1)]);
    let b = Value::list(vec![Value::int(1)]);
    assert!(a.equals(&b));
    assert!(!a.is_identical(&b));
    assert!(a.is_identical(&a.clone()));
}

#[test]
fn cyclic_equality_terminates() {
    let ctx = ctx();
    let a = Value::object(vec![]);
    let b = Value::object(vec![]);
    if let (Value::Object(oa), Value::Object(ob)) = (&a, &b) {
        oa.set_prop(&ctx, "next", b.clone()).unwrap();
        ob.set_prop(&ctx, "next", a.clone()).unwrap();
    }
    assert!(a.equals(&b));
}

#[test]
fn comparison_within_a_variant() {
    assert_eq!(Value::int(1).compare(&Value::int(2)).unwrap(), Ordering::Less);
    assert_eq!(
        Value::str("file10").compare(&Value::str("file9")).unwrap(),
        Ordering::Greater
    );
    assert_eq!(
        Value::ByteCount(3).compare(&Value::ByteCount(3)).unwrap(),
        Ordering::Equal
    );

    let err = Value::int(1).compare(&Value::str("b")).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NotComparable { .. }));
    let err = Value::Float(f64::NAN).compare(&Value::Float(1.0)).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::FloatSpecialOperand);
    let err = Value::object(vec![]).compare(&Value::object(vec![])).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NotComparable { .. }));
}

#[test]
fn sharing_switches_containers_to_the_shared_state() {
    let ctx = ctx();
    let inner = Value::list(vec![]);
    let outer = Value::object(vec![("inner".into(), inner.clone())]);
    assert!(!outer.is_shared());
    outer.share(&ctx).unwrap();
    assert!(outer.is_shared());
    assert!(inner.is_shared());
    assert!(outer.smart_lock().is_some());
}

#[test]
fn iterators_are_not_sharable() {
    let ctx = ctx();
    let iterator = Value::value_iterator(ValueIterator::new(vec![], IteratorConfig::default()));
    assert!(iterator.share(&ctx).is_err());
}

#[test]
fn failed_share_leaves_everything_unshared() {
    let ctx = ctx();
    let list = Value::list(vec![]);
    let iterator = Value::value_iterator(ValueIterator::new(vec![], IteratorConfig::default()));
    let object = Value::object(vec![("a".into(), list.clone()), ("b".into(), iterator)]);
    assert!(object.share(&ctx).is_err());
    assert!(!object.is_shared());
    assert!(!list.is_shared());
}

#[test]
fn sharing_a_cycle_terminates() {
    let ctx = ctx();
    let a = Value::object(vec![]);
    let b = Value::list(vec![a.clone()]);
    if let Value::Object(oa) = &a {
        oa.set_prop(&ctx, "b", b.clone()).unwrap();
    }
    a.share(&ctx).unwrap();
    assert!(a.is_shared() && b.is_shared());
}

#[test]
fn min_of_folds_pairwise() {
    let values = [Value::int(2), Value::int(1), Value::str("b"), Value::str("a")];
    assert_eq!(Value::min_of(&values[..2]).unwrap().as_int(), Some(1));
    let err = Value::min_of(&values).unwrap_err();
    let EvalErrorKind::NotComparable { left, right } = &err.kind else {
        panic!("expected a comparison failure, got {err}");
    };
    assert_eq!((left.as_str(), right.as_str()), ("integer", "string"));
    assert_eq!(
        Value::min_of(&[Value::str("file10"), Value::str("file9")])
            .unwrap()
            .as_str(),
        Some("file9")
    );
}

#[test]
fn serializability() {
    let ctx = ctx();
    assert!(Value::list(vec![Value::int(1), Value::str("a")]).is_serializable());
    let with_thread = Value::list(vec![Value::lthread(LThread::new(ctx.clone(), "t"))]);
    assert!(!with_thread.is_serializable());
    assert!(!Value::secret(Secret::new("s", None)).is_serializable());
}

#[test]
fn to_text() {
    assert_eq!(Value::str("a").to_text(), "a");
    assert_eq!(Value::Rune('r').to_text(), "r");
    assert_eq!(Value::int(3).to_text(), "3");
    assert_eq!(Value::Float(3.0).to_text(), "3.0");
    assert_eq!(Value::path("/a").to_text(), "/a");
    assert_eq!(Value::ByteCount(2).to_text(), "2B");
}

proptest! {
    #[test]
    fn int_equality_and_order_agree(a in any::<i64>(), b in any::<i64>()) {
        let (va, vb) = (Value::int(a), Value::int(b));
        prop_assert_eq!(va.equals(&vb), a == b);
        prop_assert_eq!(va.compare(&vb).unwrap(), a.cmp(&b));
    }

    #[test]
    fn compact_text_of_strings_is_quoted(s in "[a-z0-9 ]{0,12}") {
        let text = crate::pretty_print::to_compact_string(&Value::str(s.as_str()));
        prop_assert_eq!(text, format!("\"{s}\""));
    }
}
