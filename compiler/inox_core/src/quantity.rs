//! Quantity literals (`1.5kB`, `1h30mn`, `10%`) and quantity arithmetic.
//!
//! A literal is a list of `(value, unit)` parts. A unit may start with a
//! multiplier (`k`, `M`, `G`, `T`). Only durations may have several parts,
//! written from the largest unit to the smallest. Rates divide a byte count
//! or a plain count by a second: `1kB/s`, `10x/s`.

use std::time::Duration;

use chrono::TimeDelta;

use crate::errors::{self, EvalError};
use crate::value::Value;

pub const LINE_COUNT_UNIT: &str = "ln";
pub const RUNE_COUNT_UNIT: &str = "rn";
pub const BYTE_COUNT_UNIT: &str = "B";

/// Duration units, largest first.
const DURATION_UNITS: [(&str, f64); 6] = [
    ("h", 3_600e9),
    ("mn", 60e9),
    ("s", 1e9),
    ("ms", 1e6),
    ("us", 1e3),
    ("ns", 1.0),
];

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum QuantityError {
    #[error("{values} values but {units} units")]
    PartCountMismatch { values: usize, units: usize },
    #[error("negative quantities are not supported")]
    Negative,
    #[error("quantity is too large")]
    TooLarge,
    #[error("unterminated unit '{0}'")]
    UnterminatedUnit(String),
    #[error("unsupported unit '{0}'")]
    UnsupportedUnit(String),
    #[error("invalid multiplier '{0}' for %")]
    PercentMultiplier(char),
    #[error("only durations can have several parts")]
    MixedUnits,
    #[error("duration units should be written in descending order of magnitude")]
    DurationUnitOrder,
    #[error("invalid rate unit '{0}', only /s is supported")]
    RateUnit(String),
    #[error("a(n) {0} cannot be a rate")]
    RateQuantity(&'static str),
}

impl From<QuantityError> for EvalError {
    fn from(error: QuantityError) -> Self {
        match error {
            QuantityError::Negative => errors::neg_quantity_not_supported(),
            QuantityError::TooLarge => errors::quantity_too_large(),
            other => errors::invalid_quantity(other.to_string()),
        }
    }
}

fn split_multiplier(unit: &str) -> (f64, &str) {
    let multiplier = match unit.as_bytes().first() {
        Some(b'k') => 1e3,
        Some(b'M') => 1e6,
        Some(b'G') => 1e9,
        Some(b'T') => 1e12,
        _ => return (1.0, unit),
    };
    (multiplier, &unit[1..])
}

/// Value of a quantity literal.
pub fn evaluate(values: &[f64], units: &[String]) -> Result<Value, QuantityError> {
    if values.len() != units.len() || values.is_empty() {
        return Err(QuantityError::PartCountMismatch {
            values: values.len(),
            units: units.len(),
        });
    }

    let mut duration_nanos = 0f64;
    let mut last_duration_rank = None;
    let mut result = None;

    for (value, unit) in values.iter().zip(units) {
        if *value < 0.0 {
            return Err(QuantityError::Negative);
        }
        let (multiplier, base) = split_multiplier(unit);
        if multiplier != 1.0 && base.is_empty() {
            return Err(QuantityError::UnterminatedUnit(unit.clone()));
        }

        if let Some(rank) = DURATION_UNITS.iter().position(|(name, _)| *name == base) {
            if result.is_some() && last_duration_rank.is_none() {
                return Err(QuantityError::MixedUnits);
            }
            if last_duration_rank.is_some_and(|last| rank <= last) {
                return Err(QuantityError::DurationUnitOrder);
            }
            last_duration_rank = Some(rank);
            duration_nanos += value * multiplier * DURATION_UNITS[rank].1;
            if duration_nanos >= u64::MAX as f64 {
                return Err(QuantityError::TooLarge);
            }
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "the total is non-negative and checked against u64::MAX above"
            )]
            let nanos = duration_nanos as u64;
            result = Some(Value::Duration(Duration::from_nanos(nanos)));
            continue;
        }

        if result.is_some() {
            return Err(QuantityError::MixedUnits);
        }
        let scaled = value * multiplier;
        result = Some(match base {
            "x" => Value::Float(scaled),
            "%" => {
                if multiplier != 1.0 {
                    return Err(QuantityError::PercentMultiplier(unit.chars().next().unwrap_or('?')));
                }
                Value::Float(value / 100.0)
            }
            LINE_COUNT_UNIT => Value::LineCount(integral(scaled)?),
            RUNE_COUNT_UNIT => Value::RuneCount(integral(scaled)?),
            BYTE_COUNT_UNIT => Value::ByteCount(integral(scaled)?),
            _ => return Err(QuantityError::UnsupportedUnit(base.to_string())),
        });
    }

    result.ok_or(QuantityError::PartCountMismatch {
        values: values.len(),
        units: units.len(),
    })
}

fn integral(f: f64) -> Result<i64, QuantityError> {
    if f >= i64::MAX as f64 {
        return Err(QuantityError::TooLarge);
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "the value is below i64::MAX and fractional parts are dropped"
    )]
    Ok(f as i64)
}

/// Value of a rate literal: `quantity / unit`.
pub fn evaluate_rate(quantity: &Value, unit: &str) -> Result<Value, QuantityError> {
    if unit != "s" {
        return Err(QuantityError::RateUnit(unit.to_string()));
    }
    match quantity {
        Value::ByteCount(n) => Ok(Value::ByteRate(*n)),
        Value::Float(f) => Ok(Value::Frequency(*f)),
        Value::LineCount(n) | Value::RuneCount(n) => Ok(Value::SimpleRate(*n)),
        other => Err(QuantityError::RateQuantity(other.type_name())),
    }
}

/// Largest value of the quantity kind of `value`, used as the implicit end of
/// `1kB..` ranges.
pub fn kind_max(value: &Value) -> Option<Value> {
    Some(match value {
        Value::ByteCount(_) => Value::ByteCount(i64::MAX),
        Value::RuneCount(_) => Value::RuneCount(i64::MAX),
        Value::LineCount(_) => Value::LineCount(i64::MAX),
        Value::Duration(_) => Value::Duration(Duration::MAX),
        _ => return None,
    })
}

pub fn is_quantity(value: &Value) -> bool {
    matches!(
        value,
        Value::ByteCount(_)
            | Value::LineCount(_)
            | Value::RuneCount(_)
            | Value::ByteRate(_)
            | Value::SimpleRate(_)
            | Value::Frequency(_)
            | Value::Duration(_)
    )
}

/// `left + right` or `left - right` on quantities of one kind, and on a
/// datetime and a duration. `None` when the operands are not such a pair.
pub fn add(left: &Value, right: &Value, subtract: bool) -> Option<Result<Value, EvalError>> {
    let op = if subtract { "-" } else { "+" };
    let ints = |a: i64, b: i64| {
        let result = if subtract { a.checked_sub(b) } else { a.checked_add(b) };
        match result {
            Some(n) if n >= 0 => Ok(n),
            Some(_) => Err(errors::neg_quantity_not_supported()),
            None => Err(errors::arithmetic_overflow(op)),
        }
    };
    Some(match (left, right) {
        (Value::ByteCount(a), Value::ByteCount(b)) => ints(*a, *b).map(Value::ByteCount),
        (Value::LineCount(a), Value::LineCount(b)) => ints(*a, *b).map(Value::LineCount),
        (Value::RuneCount(a), Value::RuneCount(b)) => ints(*a, *b).map(Value::RuneCount),
        (Value::ByteRate(a), Value::ByteRate(b)) => ints(*a, *b).map(Value::ByteRate),
        (Value::SimpleRate(a), Value::SimpleRate(b)) => ints(*a, *b).map(Value::SimpleRate),
        (Value::Frequency(a), Value::Frequency(b)) => {
            if !a.is_finite() || !b.is_finite() {
                return Some(Err(errors::float_special_operand()));
            }
            let result = if subtract { a - b } else { a + b };
            if result.is_finite() {
                Ok(Value::Frequency(result))
            } else {
                Err(errors::float_special_result())
            }
        }
        (Value::Duration(a), Value::Duration(b)) => {
            let result = if subtract { a.checked_sub(*b) } else { a.checked_add(*b) };
            result
                .map(Value::Duration)
                .ok_or_else(|| errors::arithmetic_overflow(op))
        }
        (Value::DateTime(t), Value::Duration(d)) => shift(*t, *d, subtract, op),
        (Value::Duration(d), Value::DateTime(t)) if !subtract => shift(*t, *d, false, op),
        _ => return None,
    })
}

fn shift(
    time: chrono::DateTime<chrono::FixedOffset>,
    duration: Duration,
    subtract: bool,
    op: &str,
) -> Result<Value, EvalError> {
    let delta = TimeDelta::from_std(duration).map_err(|_| errors::arithmetic_overflow(op))?;
    let shifted = if subtract {
        time.checked_sub_signed(delta)
    } else {
        time.checked_add_signed(delta)
    };
    shifted
        .map(Value::DateTime)
        .ok_or_else(|| errors::arithmetic_overflow(op))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn units(units: &[&str]) -> Vec<String> {
        units.iter().map(|u| (*u).to_string()).collect()
    }

    #[test]
    fn simple_units() {
        assert!(matches!(evaluate(&[1.5], &units(&["kB"])), Ok(Value::ByteCount(1500))));
        assert!(matches!(evaluate(&[3.0], &units(&["ln"])), Ok(Value::LineCount(3))));
        assert!(matches!(evaluate(&[2.0], &units(&["rn"])), Ok(Value::RuneCount(2))));
        assert!(matches!(evaluate(&[50.0], &units(&["%"])), Ok(Value::Float(f)) if (f - 0.5).abs() < 1e-12));
        assert!(matches!(evaluate(&[2.0], &units(&["kx"])), Ok(Value::Float(f)) if (f - 2000.0).abs() < 1e-9));
    }

    #[test]
    fn durations_add_up() {
        let value = evaluate(&[1.0, 30.0], &units(&["h", "mn"])).unwrap();
        assert!(matches!(value, Value::Duration(d) if d == Duration::from_secs(5400)));
        assert!(matches!(evaluate(&[1.0], &units(&["ms"])), Ok(Value::Duration(d)) if d == Duration::from_millis(1)));
    }

    #[test]
    fn malformed_literals() {
        assert_eq!(evaluate(&[-1.0], &units(&["B"])).unwrap_err(), QuantityError::Negative);
        assert_eq!(
            evaluate(&[1.0], &units(&["k"])).unwrap_err(),
            QuantityError::UnterminatedUnit("k".into())
        );
        assert_eq!(
            evaluate(&[1.0], &units(&["kg"])).unwrap_err(),
            QuantityError::UnsupportedUnit("g".into())
        );
        assert_eq!(
            evaluate(&[1.0, 2.0], &units(&["s", "h"])).unwrap_err(),
            QuantityError::DurationUnitOrder
        );
        assert_eq!(
            evaluate(&[1.0, 2.0], &units(&["B", "ln"])).unwrap_err(),
            QuantityError::MixedUnits
        );
        assert_eq!(
            evaluate(&[1.0], &units(&["k%"])).unwrap_err(),
            QuantityError::PercentMultiplier('k')
        );
        assert_eq!(evaluate(&[1e30], &units(&["TB"])).unwrap_err(), QuantityError::TooLarge);
    }

    #[test]
    fn rates() {
        let bytes = evaluate(&[1.0], &units(&["kB"])).unwrap();
        assert!(matches!(evaluate_rate(&bytes, "s"), Ok(Value::ByteRate(1000))));
        assert!(matches!(evaluate_rate(&Value::Float(2.0), "s"), Ok(Value::Frequency(_))));
        assert_eq!(
            evaluate_rate(&bytes, "mn").unwrap_err(),
            QuantityError::RateUnit("mn".into())
        );
    }

    #[test]
    fn arithmetic() {
        let sum = add(&Value::ByteCount(1), &Value::ByteCount(2), false).unwrap().unwrap();
        assert!(matches!(sum, Value::ByteCount(3)));
        assert!(add(&Value::ByteCount(1), &Value::ByteCount(2), true).unwrap().is_err());
        assert!(add(&Value::ByteCount(i64::MAX), &Value::ByteCount(1), false).unwrap().is_err());
        assert!(add(&Value::ByteCount(1), &Value::LineCount(1), false).is_none());

        let now = chrono::Utc::now().fixed_offset();
        let later = add(&Value::DateTime(now), &Value::Duration(Duration::from_secs(60)), false)
            .unwrap()
            .unwrap();
        assert!(matches!(later, Value::DateTime(t) if (t - now).num_seconds() == 60));
        assert!(add(&Value::Duration(Duration::from_secs(1)), &Value::Duration(Duration::from_secs(2)), true)
            .unwrap()
            .is_err());
    }
}
