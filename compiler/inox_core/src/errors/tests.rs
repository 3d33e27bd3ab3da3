use inox_ir::{SourcePosition, Span};
use pretty_assertions::assert_eq;

use super::*;

fn position(name: &str, line: u32, column: u32) -> SourcePosition {
    SourcePosition {
        source_name: name.to_string(),
        line,
        column,
        span: Span::DUMMY,
    }
}

#[test]
fn factory_message_matches_kind_display() {
    let err = division_by_zero();
    assert_eq!(err.message, err.kind.to_string());
    assert_eq!(err.to_string(), "integer division by zero");
}

#[test]
fn permission_denied_message() {
    let err = permission_denied(&"[use global(s) 'a']");
    assert_eq!(
        err.to_string(),
        "not allowed, missing permission: [use global(s) 'a']"
    );
}

#[test]
fn positions_prefix_the_message() {
    let err = assertion_failed("expected 1 to be equal to 2")
        .with_positions(SourcePositionStack::new(vec![position("main.ix", 3, 1)]));
    assert_eq!(
        err.to_string(),
        "main.ix:3:1: assertion is false: expected 1 to be equal to 2"
    );
}

#[test]
fn inclusion_chain_renders_one_position_per_line() {
    let mut stack = SourcePositionStack::new(vec![position("/lib.ix", 4, 2)]);
    stack.push_outer(position("/main.ix", 1, 1));
    let err = undeclared_variable("x").with_positions(stack);
    assert_eq!(
        err.to_string(),
        "/main.ix:1:1:\n/lib.ix:4:2: variable 'x' is not declared"
    );
}

#[test]
fn first_position_stack_wins() {
    let inner = SourcePositionStack::new(vec![position("a.ix", 1, 1)]);
    let outer = SourcePositionStack::new(vec![position("b.ix", 2, 2)]);
    let err = cancelled().with_positions(inner.clone()).with_positions(outer);
    assert_eq!(err.positions, inner);
    assert!(err.is_cancellation());
}

#[test]
fn static_check_lists_every_error() {
    let err = static_check_failed(vec!["a.ix:1:1: first".into(), "a.ix:2:1: second".into()]);
    assert_eq!(
        err.to_string(),
        "static check failed:\na.ix:1:1: first\na.ix:2:1: second"
    );
}
