use pretty_assertions::assert_eq;
use proptest::prelude::*;

use inox_core::errors::EvalErrorKind;
use inox_core::ContextConfig;

use super::*;

fn ctx() -> Context {
    Context::new_root(ContextConfig::default())
}

fn binary(op: BinaryOp, left: Value, right: Value) -> EvalResult {
    evaluate_binary(&ctx(), op, &left, &right)
}

#[test]
fn integer_arithmetic() {
    let sum = binary(BinaryOp::Add, Value::int(2), Value::int(3)).unwrap();
    assert_eq!(sum.as_int(), Some(5));
    let quotient = binary(BinaryOp::Div, Value::int(7), Value::int(2)).unwrap();
    assert_eq!(quotient.as_int(), Some(3));
}

#[test]
fn integer_overflow_is_an_error() {
    let err = binary(BinaryOp::Add, Value::int(i64::MAX), Value::int(1)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArithmeticOverflow { .. }));
    let err = evaluate_unary(UnaryOp::NumberNegate, &Value::int(i64::MIN)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArithmeticOverflow { .. }));
}

#[test]
fn integer_division_by_zero() {
    let err = binary(BinaryOp::Div, Value::int(1), Value::int(0)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::DivisionByZero));
}

#[test]
fn float_special_values_are_rejected() {
    let err = binary(BinaryOp::Add, Value::Float(f64::NAN), Value::Float(1.0)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::FloatSpecialOperand));
    let err = binary(BinaryOp::Div, Value::Float(1.0), Value::Float(0.0)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::FloatSpecialResult));
    let err = binary(BinaryOp::Mul, Value::Float(f64::MAX), Value::Float(2.0)).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::FloatSpecialResult));
}

#[test]
fn mixed_numbers_do_not_combine() {
    assert!(binary(BinaryOp::Add, Value::int(1), Value::Float(1.0)).is_err());
}

#[test]
fn comparisons() {
    let less = binary(BinaryOp::LessThan, Value::int(1), Value::int(2)).unwrap();
    assert_eq!(less.as_bool(), Some(true));
    let ge = binary(BinaryOp::GreaterOrEqual, Value::int(2), Value::int(2)).unwrap();
    assert_eq!(ge.as_bool(), Some(true));
    assert!(binary(BinaryOp::LessThan, Value::int(1), Value::str("a")).is_err());
}

#[test]
fn exclusive_end_ranges_drop_the_last_integer() {
    let Value::IntRange(range) = binary(BinaryOp::ExclEndRange, Value::int(0), Value::int(3)).unwrap()
    else {
        panic!("expected an integer range");
    };
    assert_eq!((range.start, range.end), (0, 2));
}

#[test]
fn membership_and_keys() {
    let list = Value::list(vec![Value::int(1), Value::int(2)]);
    let found = binary(BinaryOp::In, Value::int(2), list.clone()).unwrap();
    assert_eq!(found.as_bool(), Some(true));
    let missing = binary(BinaryOp::NotIn, Value::int(3), list).unwrap();
    assert_eq!(missing.as_bool(), Some(true));

    let object = Value::object(vec![("a".into(), Value::int(1))]);
    let key = binary(BinaryOp::Keyof, Value::str("a"), object).unwrap();
    assert_eq!(key.as_bool(), Some(true));
}

#[test]
fn substrings() {
    let yes = binary(BinaryOp::Substrof, Value::str("ell"), Value::str("hello")).unwrap();
    assert_eq!(yes.as_bool(), Some(true));
    let bytes = binary(
        BinaryOp::Substrof,
        Value::byte_slice(vec![2, 3]),
        Value::byte_slice(vec![1, 2, 3]),
    )
    .unwrap();
    assert_eq!(bytes.as_bool(), Some(true));
}

#[test]
fn nil_coalescing_keeps_non_nil_left() {
    let kept = binary(BinaryOp::NilCoalescing, Value::int(1), Value::int(2)).unwrap();
    assert_eq!(kept.as_int(), Some(1));
    let fallback = binary(BinaryOp::NilCoalescing, Value::Nil, Value::int(2)).unwrap();
    assert_eq!(fallback.as_int(), Some(2));
}

#[test]
fn match_tests_the_pattern_built_from_the_right_operand() {
    let matched = binary(BinaryOp::Match, Value::int(1), Value::int(1)).unwrap();
    assert_eq!(matched.as_bool(), Some(true));
    let not_matched = binary(BinaryOp::NotMatch, Value::int(1), Value::int(2)).unwrap();
    assert_eq!(not_matched.as_bool(), Some(true));
}

#[test]
fn logical_operands_must_be_booleans() {
    assert!(binary(BinaryOp::And, Value::int(1), Value::Bool(true)).is_err());
    let or = binary(BinaryOp::Or, Value::Bool(false), Value::Bool(true)).unwrap();
    assert_eq!(or.as_bool(), Some(true));
    let not = evaluate_unary(UnaryOp::BoolNegate, &Value::Bool(true)).unwrap();
    assert_eq!(not.as_bool(), Some(false));
}

proptest! {
    #[test]
    fn checked_addition_agrees_with_i64(a in any::<i64>(), b in any::<i64>()) {
        let result = binary(BinaryOp::Add, Value::int(a), Value::int(b));
        match a.checked_add(b) {
            Some(sum) => prop_assert_eq!(result.unwrap().as_int(), Some(sum)),
            None => {
                let overflowed = matches!(
                    result.unwrap_err().kind,
                    EvalErrorKind::ArithmeticOverflow { .. }
                );
                prop_assert!(overflowed);
            }
        }
    }

    #[test]
    fn finite_float_results_are_returned(a in -1e100f64..1e100, b in -1e100f64..1e100) {
        let result = binary(BinaryOp::Sub, Value::Float(a), Value::Float(b)).unwrap();
        prop_assert_eq!(result.as_float(), Some(a - b));
    }

    #[test]
    fn comparison_is_antisymmetric(a in any::<i64>(), b in any::<i64>()) {
        let lt = binary(BinaryOp::LessThan, Value::int(a), Value::int(b)).unwrap();
        let gt = binary(BinaryOp::GreaterThan, Value::int(b), Value::int(a)).unwrap();
        prop_assert_eq!(lt.as_bool(), gt.as_bool());
    }
}
