//! Binary and unary operators.
//!
//! Direct enum-based dispatch over the closed value set. `and`, `or` and
//! `??` are short-circuited by the interpreter; the eager versions here are
//! used when both operands are already known.

use std::cmp::Ordering;

use inox_core::errors;
use inox_core::pattern::Pattern;
use inox_core::quantity;
use inox_core::value::{FloatRange, IntRange, QuantityRange, ScalarInt};
use inox_core::{Context, EvalError, EvalResult, Value};
use inox_ir::{BinaryOp, UnaryOp};

/// Checked integer arithmetic with overflow and zero-divisor errors.
fn int_arithmetic(op: BinaryOp, a: ScalarInt, b: ScalarInt) -> EvalResult {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(errors::division_by_zero());
            }
            a.checked_div(b)
        }
        _ => return Err(errors::invalid_argument(format!("{} is not arithmetic", op.as_symbol()))),
    };
    result
        .map(Value::Int)
        .ok_or_else(|| errors::arithmetic_overflow(op.as_symbol()))
}

/// Float arithmetic on finite operands; a non-finite result is an error.
fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    if !a.is_finite() || !b.is_finite() {
        return Err(errors::float_special_operand());
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => return Err(errors::invalid_argument(format!("{} is not arithmetic", op.as_symbol()))),
    };
    if result.is_finite() {
        Ok(Value::Float(result))
    } else {
        Err(errors::float_special_result())
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        (Value::Float(a), Value::Float(b)) => float_arithmetic(op, *a, *b),
        _ => {
            if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
                if let Some(result) = quantity::add(left, right, op == BinaryOp::Sub) {
                    return result;
                }
            }
            Err(errors::type_mismatch(
                "two integers, two floats or two quantities of the same kind",
                &format!("{} and {}", left.type_name(), right.type_name()),
            ))
        }
    }
}

fn comparison(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let ordering = left.compare(right)?;
    Ok(Value::Bool(match op {
        BinaryOp::LessThan => ordering == Ordering::Less,
        BinaryOp::LessOrEqual => ordering != Ordering::Greater,
        BinaryOp::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}

/// `..` and `..<`.
fn range(exclusive_end: bool, left: &Value, right: &Value) -> EvalResult {
    match (left, right) {
        (Value::Int(start), Value::Int(end)) => {
            let end = if exclusive_end {
                end.raw()
                    .checked_sub(1)
                    .ok_or_else(|| errors::arithmetic_overflow("..<"))?
            } else {
                end.raw()
            };
            Ok(Value::IntRange(IntRange::new(start.raw(), end)))
        }
        (Value::Float(start), Value::Float(end)) => {
            if !start.is_finite() || !end.is_finite() {
                return Err(errors::float_special_operand());
            }
            Ok(Value::FloatRange(FloatRange::new(*start, *end, !exclusive_end)))
        }
        _ if quantity::is_quantity(left)
            && std::mem::discriminant(left) == std::mem::discriminant(right) =>
        {
            Ok(Value::quantity_range(QuantityRange::new(
                left.clone(),
                Some(right.clone()),
                !exclusive_end,
            )))
        }
        _ => Err(errors::type_mismatch(
            "two integers, two floats or two quantities of the same kind",
            &format!("{} and {}", left.type_name(), right.type_name()),
        )),
    }
}

fn is_key_of(ctx: &Context, key: &Value, container: &Value) -> EvalResult {
    let Some(key) = key.as_str() else {
        return Err(errors::type_mismatch("string", key.type_name()));
    };
    match container {
        Value::Object(object) => Ok(Value::Bool(object.has_prop(key))),
        Value::Record(record) => Ok(Value::Bool(record.prop(key).is_some())),
        Value::Dynamic(dynamic) => is_key_of(ctx, &Value::str(key), &dynamic.resolve(ctx)?),
        other => Err(errors::type_mismatch("object", other.type_name())),
    }
}

fn is_url_of(ctx: &Context, url: &Value, holder: &Value) -> EvalResult {
    if !matches!(url, Value::Url(_)) {
        return Err(errors::type_mismatch("url", url.type_name()));
    }
    let has_url = holder
        .property_names()
        .is_ok_and(|names| names.iter().any(|name| name == "url"));
    if !has_url {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(holder.prop(ctx, "url")?.equals(url)))
}

fn is_substring_of(part: &Value, whole: &Value) -> EvalResult {
    match (part, whole) {
        (Value::ByteSlice(part), Value::ByteSlice(whole)) => {
            let part = part.to_vec();
            let whole = whole.to_vec();
            Ok(Value::Bool(
                part.is_empty() || whole.windows(part.len()).any(|window| window == part.as_slice()),
            ))
        }
        _ => match (part.as_str(), whole.as_str()) {
            (Some(part), Some(whole)) => Ok(Value::Bool(whole.contains(part))),
            _ => Err(errors::type_mismatch(
                "two string-like values or two byte slices",
                &format!("{} and {}", part.type_name(), whole.type_name()),
            )),
        },
    }
}

fn expect_bool(value: &Value) -> Result<bool, EvalError> {
    value
        .as_bool()
        .ok_or_else(|| errors::type_mismatch("boolean", value.type_name()))
}

/// Evaluate a binary operation on already evaluated operands.
pub fn evaluate_binary(ctx: &Context, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arithmetic(op, left, right),
        BinaryOp::LessThan
        | BinaryOp::LessOrEqual
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterOrEqual => comparison(op, left, right),
        BinaryOp::Equal => Ok(Value::Bool(left.equals(right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.equals(right))),
        BinaryOp::Is => Ok(Value::Bool(left.is_identical(right))),
        BinaryOp::IsNot => Ok(Value::Bool(!left.is_identical(right))),
        BinaryOp::In => Ok(Value::Bool(right.contains(left)?)),
        BinaryOp::NotIn => Ok(Value::Bool(!right.contains(left)?)),
        BinaryOp::Keyof => is_key_of(ctx, left, right),
        BinaryOp::Urlof => is_url_of(ctx, left, right),
        BinaryOp::Substrof => is_substring_of(left, right),
        BinaryOp::Range => range(false, left, right),
        BinaryOp::ExclEndRange => range(true, left, right),
        BinaryOp::And => Ok(Value::Bool(expect_bool(left)? && expect_bool(right)?)),
        BinaryOp::Or => Ok(Value::Bool(expect_bool(left)? || expect_bool(right)?)),
        BinaryOp::Match => Ok(Value::Bool(Pattern::from_value(right).test(ctx, left))),
        BinaryOp::NotMatch => Ok(Value::Bool(!Pattern::from_value(right).test(ctx, left))),
        BinaryOp::SetDifference => {
            let Value::Pattern(base) = left else {
                return Err(errors::type_mismatch("pattern", left.type_name()));
            };
            Ok(Value::pattern(Pattern::difference(
                base.clone(),
                Pattern::from_value(right),
            )))
        }
        BinaryOp::NilCoalescing => Ok(if left.is_nil() {
            right.clone()
        } else {
            left.clone()
        }),
        BinaryOp::PairComma => Ok(Value::ordered_pair(left.clone(), right.clone())),
    }
}

/// Evaluate a unary operation.
pub fn evaluate_unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match (op, operand) {
        (UnaryOp::NumberNegate, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| errors::arithmetic_overflow("-")),
        (UnaryOp::NumberNegate, Value::Float(f)) => {
            if f.is_finite() {
                Ok(Value::Float(-f))
            } else {
                Err(errors::float_special_operand())
            }
        }
        (UnaryOp::NumberNegate, other) => Err(errors::type_mismatch("number", other.type_name())),
        (UnaryOp::BoolNegate, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::BoolNegate, other) => Err(errors::type_mismatch("boolean", other.type_name())),
    }
}

#[cfg(test)]
mod tests;
