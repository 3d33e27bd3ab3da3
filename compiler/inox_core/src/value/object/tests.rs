use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::context::{Context, ContextConfig};
use crate::mutation::MutationKind;
use crate::value::{Object, Record, Value};

fn root() -> Context {
    Context::new_root(ContextConfig::default())
}

#[test]
fn keys_are_sorted_whatever_the_insertion_order() {
    let object = Object::new(vec![
        ("b".to_string(), Value::int(2)),
        ("a".to_string(), Value::int(1)),
    ]);
    assert_eq!(object.keys(), vec!["a".to_string(), "b".to_string()]);

    let ctx = root();
    object.set_prop(&ctx, "aa", Value::int(3)).unwrap();
    assert_eq!(
        object.keys(),
        vec!["a".to_string(), "aa".to_string(), "b".to_string()]
    );
}

#[test]
fn set_prop_reports_add_then_update() {
    let ctx = root();
    let object = Object::new(vec![]);
    let kinds = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = Arc::clone(&kinds);
    object.on_mutation(Arc::new(move |_, mutation| {
        seen.lock().push(mutation.kind);
        true
    }));

    object.set_prop(&ctx, "a", Value::int(1)).unwrap();
    object.set_prop(&ctx, "a", Value::int(2)).unwrap();

    assert_eq!(
        *kinds.lock(),
        vec![MutationKind::AddProp, MutationKind::UpdateProp]
    );
    assert!(object.prop("a").unwrap().equals(&Value::int(2)));
}

#[test]
fn implicit_key_is_not_a_property_name() {
    let object = Object::new(vec![
        ("".to_string(), Value::list(vec![Value::int(1)])),
        ("x".to_string(), Value::Nil),
    ]);
    assert_eq!(object.property_names(), vec!["x".to_string()]);
    assert_eq!(object.implicit_elements().len(), 1);
}

#[test]
fn shared_object_mutation_takes_the_lock() {
    let ctx = root();
    let locked_during_callback = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&locked_during_callback);

    let value = Value::object(vec![]);
    let Value::Object(heap) = &value else { unreachable!() };
    let watched = heap.clone();
    let check = heap.clone();
    watched.share(&ctx);
    watched.on_mutation(Arc::new(move |ctx, _| {
        if check.smart_lock().is_held_by(ctx) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        true
    }));

    watched.set_prop(&ctx, "a", Value::int(1)).unwrap();
    assert_eq!(locked_during_callback.load(Ordering::SeqCst), 1);
    assert!(!watched.smart_lock().is_locked());
}

#[test]
fn sharing_propagates_to_nested_containers() {
    let ctx = root();
    let inner = Value::list(vec![]);
    let outer = Object::new(vec![("inner".to_string(), inner.clone())]);
    outer.share(&ctx);
    assert!(inner.is_shared());
}

#[test]
fn record_lookup() {
    let record = Record::new(vec![
        ("z".to_string(), Value::int(26)),
        ("a".to_string(), Value::int(1)),
    ]);
    assert_eq!(record.keys(), &["a".to_string(), "z".to_string()]);
    assert!(record.prop("z").unwrap().equals(&Value::int(26)));
    assert!(record.prop("y").is_none());
}
