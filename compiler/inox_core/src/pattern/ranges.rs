//! Integer and float range patterns.

use std::fmt;
use std::sync::OnceLock;

use super::{PatternError, StringPattern};
use crate::value::{FloatRange, Heap, IntRange};

/// `%int(0..10)`: integers in a range, optionally multiples of a number.
#[derive(Debug)]
pub struct IntRangePattern {
    range: IntRange,
    multiple_of: Option<i64>,
    string_pattern: OnceLock<Option<Heap<StringPattern>>>,
}

impl IntRangePattern {
    /// A `multiple_of` that is not positive is ignored.
    pub fn new(range: IntRange, multiple_of: Option<i64>) -> Result<Self, PatternError> {
        if !range.unknown_start && range.end < range.start {
            return Err(PatternError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(IntRangePattern {
            range,
            multiple_of: multiple_of.filter(|m| *m > 0),
            string_pattern: OnceLock::new(),
        })
    }

    pub fn range(&self) -> IntRange {
        self.range
    }

    pub fn multiple_of(&self) -> Option<i64> {
        self.multiple_of
    }

    pub fn contains(&self, n: i64) -> bool {
        self.range.contains(n) && self.multiple_of.map_or(true, |m| n % m == 0)
    }

    /// Only patterns without a `multiple_of` constraint have one.
    pub fn string_pattern(&self) -> Option<Heap<StringPattern>> {
        self.string_pattern
            .get_or_init(|| {
                if self.multiple_of.is_some() {
                    return None;
                }
                StringPattern::int_range(self.range).ok().map(Heap::new)
            })
            .clone()
    }
}

impl PartialEq for IntRangePattern {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range && self.multiple_of == other.multiple_of
    }
}

impl fmt::Display for IntRangePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.unknown_start {
            write!(f, "%int(..{})", self.range.end)
        } else {
            write!(f, "%int({}..{})", self.range.start, self.range.end)
        }
    }
}

/// `%float(0.0..1.0)`
#[derive(Debug)]
pub struct FloatRangePattern {
    range: FloatRange,
    multiple_of: Option<f64>,
    string_pattern: OnceLock<Option<Heap<StringPattern>>>,
}

impl FloatRangePattern {
    pub fn new(range: FloatRange, multiple_of: Option<f64>) -> Result<Self, PatternError> {
        if !range.unknown_start && range.end < range.start {
            return Err(PatternError::UnsupportedFloatRange);
        }
        Ok(FloatRangePattern {
            range,
            multiple_of: multiple_of.filter(|m| *m > 0.0),
            string_pattern: OnceLock::new(),
        })
    }

    pub fn range(&self) -> FloatRange {
        self.range
    }

    pub fn contains(&self, f: f64) -> bool {
        self.range.contains(f)
            && self
                .multiple_of
                .map_or(true, |m| (f / m).fract() == 0.0)
    }

    pub fn string_pattern(&self) -> Option<Heap<StringPattern>> {
        self.string_pattern
            .get_or_init(|| {
                if self.multiple_of.is_some() {
                    return None;
                }
                StringPattern::float_range(self.range).ok().map(Heap::new)
            })
            .clone()
    }
}

impl PartialEq for FloatRangePattern {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range && self.multiple_of == other.multiple_of
    }
}

impl fmt::Display for FloatRangePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = if self.range.inclusive_end { ".." } else { "..<" };
        if self.range.unknown_start {
            write!(f, "%float({end}{:?})", self.range.end)
        } else {
            write!(f, "%float({:?}{end}{:?})", self.range.start, self.range.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_of_filters_members() {
        let pattern = IntRangePattern::new(IntRange::new(0, 20), Some(5)).unwrap();
        assert!(pattern.contains(15));
        assert!(!pattern.contains(16));
        assert!(!pattern.contains(25));
        assert!(pattern.string_pattern().is_none());
    }

    #[test]
    fn non_positive_multiple_is_ignored() {
        let pattern = IntRangePattern::new(IntRange::new(0, 20), Some(0)).unwrap();
        assert!(pattern.contains(7));
        assert!(pattern.string_pattern().is_some());
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            IntRangePattern::new(IntRange::new(3, 1), None).unwrap_err(),
            PatternError::InvalidRange { start: 3, end: 1 }
        );
    }

    #[test]
    fn float_ranges_exclude_specials() {
        let pattern = FloatRangePattern::new(FloatRange::new(0.0, 1.0, false), None).unwrap();
        assert!(pattern.contains(0.5));
        assert!(!pattern.contains(1.0));
        assert!(!pattern.contains(f64::NAN));
        assert!(pattern.string_pattern().is_none());
        let full = FloatRangePattern::new(FloatRange::new(0.0, f64::MAX, true), None).unwrap();
        assert!(full.string_pattern().is_some());
    }
}
