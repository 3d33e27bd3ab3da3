use pretty_assertions::assert_eq;

use super::*;
use crate::context::ContextConfig;
use crate::errors::EvalErrorKind;
use crate::value::{IntRange, RuneRange, IMPLICIT_PROP_NAME};

fn ctx() -> Context {
    Context::new_root(ContextConfig::default())
}

#[test]
fn object_properties() {
    let ctx = ctx();
    let object = Value::object(vec![("a".into(), Value::int(1))]);
    assert_eq!(object.prop(&ctx, "a").unwrap().as_int(), Some(1));

    object.set_prop(&ctx, "b", Value::int(2)).unwrap();
    assert_eq!(object.property_names().unwrap(), vec!["a", "b"]);

    let err = object.prop(&ctx, "c").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::PropertyNotFound { .. }));
}

#[test]
fn records_are_read_only() {
    let ctx = ctx();
    let record = Value::record(vec![("a".into(), Value::int(1))]);
    assert_eq!(record.prop(&ctx, "a").unwrap().as_int(), Some(1));
    let err = record.set_prop(&ctx, "a", Value::int(2)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::CannotSetProp { .. }));
}

#[test]
fn values_without_properties_are_rejected() {
    let err = Value::int(1).prop(&ctx(), "a").unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
}

#[test]
fn url_and_path_properties() {
    let ctx = ctx();
    let url = Value::url("https://example.com:8080/a/b?x=1");
    assert_eq!(
        url.prop(&ctx, "host").unwrap().as_str(),
        Some("https://example.com:8080")
    );
    assert_eq!(url.prop(&ctx, "path").unwrap().as_str(), Some("/a/b"));
    assert_eq!(url.prop(&ctx, "raw-query").unwrap().as_str(), Some("x=1"));

    let path = Value::path("/dir/file.txt");
    assert_eq!(path.prop(&ctx, "name").unwrap().as_str(), Some("file.txt"));
    assert_eq!(path.prop(&ctx, "dir").unwrap().as_str(), Some("/dir/"));
    assert_eq!(path.prop(&ctx, "ext").unwrap().as_str(), Some(".txt"));
}

#[test]
fn indexing_checks_bounds() {
    let list = Value::list(vec![Value::int(1), Value::int(2)]);
    assert_eq!(list.at(1).unwrap().as_int(), Some(2));
    assert!(matches!(
        list.at(2).unwrap_err().kind,
        EvalErrorKind::IndexOutOfBounds { index: 2, len: 2 }
    ));
    assert!(list.at(-1).is_err());

    let range = Value::IntRange(IntRange::new(5, 7));
    assert_eq!(range.len().unwrap(), 3);
    assert_eq!(range.at(2).unwrap().as_int(), Some(7));

    let runes = Value::RuneRange(RuneRange::new('a', 'c'));
    assert!(matches!(runes.at(1).unwrap(), Value::Rune('b')));
}

#[test]
fn slicing_clamps_the_end() {
    let list = Value::list((0..5).map(Value::int).collect());
    let slice = list.slice(1, Some(10)).unwrap();
    let items: Vec<i64> = slice
        .sequence_elements()
        .unwrap()
        .iter()
        .filter_map(Value::as_int)
        .collect();
    assert_eq!(items, vec![1, 2, 3, 4]);
    assert!(list.slice(3, Some(1)).is_err());

    assert_eq!(Value::str("hello").slice(1, Some(3)).unwrap().as_str(), Some("el"));
}

#[test]
fn set_at_and_set_slice() {
    let ctx = ctx();
    let list = Value::list(vec![Value::int(1), Value::int(2), Value::int(3)]);
    list.set_at(&ctx, 0, Value::int(10)).unwrap();
    list.set_slice(&ctx, 1, 3, &Value::list(vec![Value::int(20), Value::int(30)]))
        .unwrap();
    let items: Vec<i64> = list
        .sequence_elements()
        .unwrap()
        .iter()
        .filter_map(Value::as_int)
        .collect();
    assert_eq!(items, vec![10, 20, 30]);
    assert!(Value::tuple(vec![Value::int(1)])
        .set_at(&ctx, 0, Value::int(2))
        .is_err());
}

#[test]
fn containment() {
    let list = Value::list(vec![Value::int(1), Value::str("a")]);
    assert!(list.contains(&Value::str("a")).unwrap());
    assert!(!list.contains(&Value::int(2)).unwrap());
    assert!(Value::IntRange(IntRange::new(0, 3))
        .contains(&Value::int(3))
        .unwrap());
    assert!(Value::str("hello").contains(&Value::str("ell")).unwrap());
    assert!(Value::int(1).contains(&Value::int(1)).is_err());
}

#[test]
fn object_iteration_skips_implicit_elements() {
    let ctx = ctx();
    let object = Value::object(vec![
        ("b".into(), Value::int(2)),
        ("a".into(), Value::int(1)),
        (IMPLICIT_PROP_NAME.into(), Value::list(vec![Value::int(0)])),
    ]);
    let iterator = object.iterator(&ctx, IteratorConfig::default()).unwrap();
    let keys: Vec<String> = std::iter::from_fn(|| iterator.next(&ctx))
        .filter_map(|(k, _)| k.as_str().map(str::to_string))
        .collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn iteration_works_on_a_snapshot() {
    let ctx = ctx();
    let list = Value::list(vec![Value::int(1), Value::int(2)]);
    let iterator = list.iterator(&ctx, IteratorConfig::default()).unwrap();
    let Value::List(inner) = &list else {
        unreachable!()
    };
    inner.append(&ctx, vec![Value::int(3)]).unwrap();
    let count = std::iter::from_fn(|| iterator.next(&ctx)).count();
    assert_eq!(count, 2);
}

#[test]
fn stepped_range_iteration() {
    let ctx = ctx();
    let mut range = IntRange::new(0, 6);
    range.step = 3;
    let iterator = Value::IntRange(range)
        .iterator(&ctx, IteratorConfig::default())
        .unwrap();
    let values: Vec<i64> = std::iter::from_fn(|| iterator.next(&ctx))
        .filter_map(|(_, v)| v.as_int())
        .collect();
    assert_eq!(values, vec![0, 3, 6]);
}

#[test]
fn huge_range_iteration_does_not_materialize() {
    let ctx = ctx();
    let iterator = Value::IntRange(IntRange::new(0, i64::MAX - 1))
        .iterator(&ctx, IteratorConfig::default())
        .unwrap();
    let (key, value) = iterator.next(&ctx).unwrap();
    assert_eq!((key.as_int(), value.as_int()), (Some(0), Some(0)));
    assert!(iterator.has_next());
}

#[test]
fn watching_requires_a_watchable_value() {
    let callback: MutationCallbackFn = Arc::new(|_, _| true);
    let list = Value::list(vec![]);
    let handle = list.on_mutation(callback.clone()).unwrap();
    assert!(list.remove_mutation_callback(handle));
    assert!(Value::int(1).on_mutation(callback).is_err());
}
