//! Ordering of comparable values.
//!
//! Values are ordered only against values of the same variant. Strings use a
//! natural (digit-aware) order, so `"file9" < "file10"`.

use std::cmp::Ordering;

use super::Value;
use crate::errors::{self, EvalError};

impl Value {
    /// Whether the value has an order at all.
    pub fn is_comparable(&self) -> bool {
        matches!(
            self,
            Value::Int(_)
                | Value::Float(_)
                | Value::Rune(_)
                | Value::Byte(_)
                | Value::Str(_)
                | Value::ByteCount(_)
                | Value::LineCount(_)
                | Value::RuneCount(_)
                | Value::ByteRate(_)
                | Value::SimpleRate(_)
                | Value::Frequency(_)
                | Value::Duration(_)
                | Value::Year(_)
                | Value::Date(_)
                | Value::DateTime(_)
                | Value::Ulid(_)
        )
    }

    /// Order `self` against `other`.
    ///
    /// Fails with `FloatSpecialOperand` when a float operand is NaN or
    /// infinite and with `NotComparable` for values of different variants or
    /// without an order.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) | (Value::Frequency(a), Value::Frequency(b)) => {
                if !a.is_finite() || !b.is_finite() {
                    return Err(errors::float_special_operand());
                }
                a.partial_cmp(b).ok_or_else(errors::float_special_operand)
            }
            (Value::Rune(a), Value::Rune(b)) => Ok(a.cmp(b)),
            (Value::Byte(a), Value::Byte(b)) => Ok(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(natural_cmp(a, b)),
            (Value::ByteCount(a), Value::ByteCount(b))
            | (Value::LineCount(a), Value::LineCount(b))
            | (Value::RuneCount(a), Value::RuneCount(b))
            | (Value::ByteRate(a), Value::ByteRate(b))
            | (Value::SimpleRate(a), Value::SimpleRate(b)) => Ok(a.cmp(b)),
            (Value::Duration(a), Value::Duration(b)) => Ok(a.cmp(b)),
            (Value::Year(a), Value::Year(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
            (Value::Ulid(a), Value::Ulid(b)) => Ok(a.cmp(b)),
            _ => Err(errors::not_comparable(self.type_name(), other.type_name())),
        }
    }

    /// Smallest of `values`, compared pair-wise from the left. The first
    /// pair that cannot be ordered stops the fold.
    pub fn min_of(values: &[Value]) -> Result<Value, EvalError> {
        let Some((first, rest)) = values.split_first() else {
            return Err(errors::missing_argument("values"));
        };
        let mut min = first;
        for value in rest {
            if min.compare(value)? == Ordering::Greater {
                min = value;
            }
        }
        Ok(min.clone())
    }
}

/// Digit-aware string order: runs of ASCII digits compare by numeric value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            let start_b = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let run_a = trim_leading_zeros(&a[start_a..i]);
            let run_b = trim_leading_zeros(&b[start_b..j]);
            let order = run_a
                .len()
                .cmp(&run_b.len())
                .then_with(|| run_a.cmp(run_b))
                // Equal numbers: fewer leading zeros first.
                .then_with(|| (i - start_a).cmp(&(j - start_b)));
            if order != Ordering::Equal {
                return order;
            }
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                order => return order,
            }
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let first_non_zero = digits.iter().position(|d| *d != b'0').unwrap_or(digits.len());
    &digits[first_non_zero..]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::EvalErrorKind;

    #[test]
    fn natural_order() {
        assert_eq!(natural_cmp("file9", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("a", "b"), Ordering::Less);
        assert_eq!(natural_cmp("a2b", "a2b"), Ordering::Equal);
        assert_eq!(natural_cmp("a02", "a2"), Ordering::Greater);
        assert_eq!(natural_cmp("ab", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("x100y", "x99z"), Ordering::Greater);
    }

    #[test]
    fn cross_variant_is_not_comparable() {
        let err = Value::int(1).compare(&Value::str("b")).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::NotComparable { .. }));
    }

    #[test]
    fn special_floats_are_rejected() {
        let err = Value::Float(f64::NAN)
            .compare(&Value::Float(1.0))
            .unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::FloatSpecialOperand));
        assert!(Value::Float(f64::INFINITY)
            .compare(&Value::Float(1.0))
            .is_err());
    }

    #[test]
    fn quantities_order_within_their_kind() {
        assert_eq!(
            Value::ByteCount(1).compare(&Value::ByteCount(2)).unwrap(),
            Ordering::Less
        );
        assert!(Value::ByteCount(1).compare(&Value::LineCount(2)).is_err());
    }
}
