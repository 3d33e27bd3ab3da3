use pretty_assertions::assert_eq;

use super::*;

#[test]
fn constants_cannot_be_assigned() {
    let globals = GlobalState::new();
    globals.define_constant("A", Value::int(1));
    assert!(globals.set("A", Value::int(2)).is_err());
    assert_eq!(globals.get("A").and_then(|v| v.as_int()), Some(1));
}

#[test]
fn assigning_an_unknown_global_declares_it() {
    let globals = GlobalState::new();
    globals.set("x", Value::int(3)).unwrap();
    assert!(globals.contains("x"));
    assert!(!globals.is_constant("x"));
}

#[test]
fn start_constants_are_reported_in_name_order() {
    let globals = GlobalState::new();
    globals.define_start_constant("B", Value::int(2));
    globals.define_start_constant("A", Value::int(1));
    globals.define("c", Value::int(3));
    let names: Vec<String> = globals.start_constants().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(
        globals.input_globals(),
        vec![
            InputGlobal {
                name: "A".into(),
                is_start_constant: true
            },
            InputGlobal {
                name: "B".into(),
                is_start_constant: true
            },
            InputGlobal {
                name: "c".into(),
                is_start_constant: false
            },
        ]
    );
}

#[test]
fn snapshots_are_independent() {
    let globals = GlobalState::new();
    globals.define("x", Value::int(1));
    let copy = globals.snapshot();
    copy.set("x", Value::int(2)).unwrap();
    assert_eq!(globals.get("x").and_then(|v| v.as_int()), Some(1));
}

#[test]
fn weak_handles_do_not_keep_the_state_alive() {
    let globals = GlobalState::new();
    let weak = globals.downgrade();
    assert!(weak.upgrade().is_some());
    drop(globals);
    assert!(weak.upgrade().is_none());
}

#[test]
fn only_the_top_frame_is_visible() {
    let mut locals = LocalScopes::new();
    locals.set("x", Value::int(1));
    locals.push_scope();
    assert!(locals.get("x").is_none());
    locals.set("x", Value::int(2));
    assert_eq!(locals.get("x").and_then(|v| v.as_int()), Some(2));
    locals.pop_scope();
    assert_eq!(locals.get("x").and_then(|v| v.as_int()), Some(1));
    assert_eq!(locals.depth(), 1);
}
