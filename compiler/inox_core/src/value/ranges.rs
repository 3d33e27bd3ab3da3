//! Range values.

use super::Value;

/// Inclusive integer range.
///
/// `unknown_start` marks ranges written `..10`; such a range has no usable
/// lower bound and `start` holds `i64::MIN`. An `end` of `i64::MAX` stands
/// for +infinity in length ranges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub unknown_start: bool,
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl IntRange {
    pub const fn new(start: i64, end: i64) -> Self {
        IntRange {
            unknown_start: false,
            start,
            end,
            step: 1,
        }
    }

    /// `start..` up to +infinity.
    pub const fn from_start(start: i64) -> Self {
        Self::new(start, i64::MAX)
    }

    pub const fn with_unknown_start(end: i64) -> Self {
        IntRange {
            unknown_start: true,
            start: i64::MIN,
            end,
            step: 1,
        }
    }

    pub fn contains(&self, n: i64) -> bool {
        (self.unknown_start || n >= self.start) && n <= self.end
    }

    /// Whether the upper bound stands for +infinity.
    pub fn is_unbounded(&self) -> bool {
        self.end == i64::MAX
    }

    /// Number of integers in the range, `None` when it does not fit.
    pub fn len(&self) -> Option<usize> {
        if self.unknown_start {
            return None;
        }
        if self.end < self.start {
            return Some(0);
        }
        let span = i128::from(self.end) - i128::from(self.start) + 1;
        usize::try_from(span).ok()
    }

    pub fn is_empty(&self) -> bool {
        !self.unknown_start && self.end < self.start
    }

    /// Whether `other` lies inside `self`.
    pub fn includes(&self, other: &IntRange) -> bool {
        if other.unknown_start {
            return self.unknown_start && other.end <= self.end;
        }
        self.contains(other.start) && other.end <= self.end
    }

    /// Length range of `min..=max` repetitions of a value with this length
    /// range; `max == i64::MAX` repeats without bound.
    #[must_use]
    pub fn times(&self, min: i64, max: i64) -> IntRange {
        IntRange::new(
            saturating_len_mul(self.start, min),
            if max == i64::MAX && self.end != 0 {
                i64::MAX
            } else {
                saturating_len_mul(self.end, max)
            },
        )
    }

    /// Saturating addition of two length ranges.
    #[must_use]
    pub fn clamped_add(&self, other: &IntRange) -> IntRange {
        IntRange::new(
            saturating_len_add(self.start, other.start),
            saturating_len_add(self.end, other.end),
        )
    }
}

/// Addition where `i64::MAX` is +infinity.
pub(crate) fn saturating_len_add(a: i64, b: i64) -> i64 {
    if a == i64::MAX || b == i64::MAX {
        i64::MAX
    } else {
        a.saturating_add(b)
    }
}

/// Multiplication where `i64::MAX` is +infinity.
pub(crate) fn saturating_len_mul(a: i64, factor: i64) -> i64 {
    if a == i64::MAX && factor != 0 {
        i64::MAX
    } else {
        a.saturating_mul(factor)
    }
}

/// Float range; `inclusive_end` is false for `..<` ranges.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FloatRange {
    pub unknown_start: bool,
    pub start: f64,
    pub end: f64,
    pub inclusive_end: bool,
}

impl FloatRange {
    pub fn new(start: f64, end: f64, inclusive_end: bool) -> Self {
        FloatRange {
            unknown_start: false,
            start,
            end,
            inclusive_end,
        }
    }

    pub fn contains(&self, f: f64) -> bool {
        if !f.is_finite() {
            return false;
        }
        let above = self.unknown_start || f >= self.start;
        let below = if self.inclusive_end {
            f <= self.end
        } else {
            f < self.end
        };
        above && below
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuneRange {
    pub start: char,
    pub end: char,
}

impl RuneRange {
    pub fn new(start: char, end: char) -> Self {
        RuneRange { start, end }
    }

    pub fn contains(&self, r: char) -> bool {
        self.start <= r && r <= self.end
    }

    pub fn len(&self) -> usize {
        (u32::from(self.end).saturating_sub(u32::from(self.start)) + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Range of quantities of one kind (byte counts, durations, ...).
#[derive(Clone, Debug)]
pub struct QuantityRange {
    pub unknown_start: bool,
    pub inclusive_end: bool,
    pub start: Value,
    /// `None` for ranges without an upper bound.
    pub end: Option<Value>,
}

impl QuantityRange {
    pub fn new(start: Value, end: Option<Value>, inclusive_end: bool) -> Self {
        QuantityRange {
            unknown_start: false,
            inclusive_end,
            start,
            end,
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        use std::cmp::Ordering;

        if !self.unknown_start {
            match value.compare(&self.start) {
                Ok(Ordering::Less) | Err(_) => return false,
                _ => {}
            }
        }
        match &self.end {
            None => true,
            Some(end) => match value.compare(end) {
                Ok(Ordering::Less) => true,
                Ok(Ordering::Equal) => self.inclusive_end,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_range_inclusion() {
        let outer = IntRange::new(0, 10);
        assert!(outer.includes(&IntRange::new(2, 5)));
        assert!(!outer.includes(&IntRange::new(-1, 5)));
        assert!(!outer.includes(&IntRange::with_unknown_start(5)));
        assert!(IntRange::from_start(0).includes(&IntRange::new(3, i64::MAX)));
    }

    #[test]
    fn clamped_add_saturates_at_infinity() {
        let a = IntRange::new(1, i64::MAX);
        let b = IntRange::new(2, 3);
        assert_eq!(a.clamped_add(&b), IntRange::new(3, i64::MAX));
        assert_eq!(saturating_len_add(i64::MAX - 1, 5), i64::MAX);
    }

    #[test]
    fn times_scales_both_bounds() {
        assert_eq!(IntRange::new(1, 2).times(3, 3), IntRange::new(3, 6));
        assert_eq!(IntRange::new(1, 2).times(0, i64::MAX), IntRange::new(0, i64::MAX));
        assert_eq!(IntRange::new(0, 0).times(1, i64::MAX), IntRange::new(0, 0));
    }

    #[test]
    fn int_range_len() {
        assert_eq!(IntRange::new(1, 3).len(), Some(3));
        assert_eq!(IntRange::new(3, 1).len(), Some(0));
        assert_eq!(IntRange::new(i64::MIN, i64::MAX).len(), None);
    }

    #[test]
    fn exclusive_float_range() {
        let range = FloatRange::new(0.0, 1.0, false);
        assert!(range.contains(0.0));
        assert!(!range.contains(1.0));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn quantity_range_bounds() {
        let range = QuantityRange::new(Value::ByteCount(10), Some(Value::ByteCount(20)), true);
        assert!(range.contains(&Value::ByteCount(20)));
        assert!(!range.contains(&Value::ByteCount(21)));
        assert!(!range.contains(&Value::LineCount(15)));
    }
}
