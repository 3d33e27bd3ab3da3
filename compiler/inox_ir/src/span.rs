//! Byte spans into a source file.

use std::fmt;

/// Error when a byte range does not fit a [`Span`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// Start offset exceeds `u32::MAX`.
    StartTooLarge(usize),
    /// End offset exceeds `u32::MAX`.
    EndTooLarge(usize),
}

impl fmt::Display for SpanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanError::StartTooLarge(v) => write!(f, "span start {v} exceeds u32::MAX"),
            SpanError::EndTooLarge(v) => write!(f, "span end {v} exceeds u32::MAX"),
        }
    }
}

impl std::error::Error for SpanError {}

/// Half-open byte range `[start, end)` inside one source file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span of synthesized nodes.
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Fallible conversion from a `usize` range.
    #[inline]
    pub fn try_from_range(range: std::ops::Range<usize>) -> Result<Self, SpanError> {
        let start =
            u32::try_from(range.start).map_err(|_| SpanError::StartTooLarge(range.start))?;
        let end = u32::try_from(range.end).map_err(|_| SpanError::EndTooLarge(range.end))?;
        Ok(Span { start, end })
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if another span lies within this one.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Smallest span covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        let merged = Span::new(20, 30).merge(Span::new(10, 25));
        assert_eq!(merged, Span::new(10, 30));
    }

    #[test]
    fn contains_span_is_inclusive() {
        let outer = Span::new(10, 20);
        assert!(outer.contains_span(Span::new(10, 20)));
        assert!(outer.contains_span(Span::new(12, 15)));
        assert!(!outer.contains_span(Span::new(5, 15)));
    }

    #[test]
    fn try_from_range_rejects_large_offsets() {
        let large = u32::MAX as usize + 1;
        assert_eq!(
            Span::try_from_range(large..large + 1),
            Err(SpanError::StartTooLarge(large))
        );
        assert_eq!(Span::try_from_range(0..large), Err(SpanError::EndTooLarge(large)));
        assert_eq!(Span::try_from_range(3..9), Ok(Span::new(3, 9)));
    }

    #[test]
    fn dummy_is_default_and_empty() {
        assert_eq!(Span::default(), Span::DUMMY);
        assert!(Span::DUMMY.is_empty());
        assert_eq!(format!("{:?}", Span::new(1, 4)), "1..4");
    }
}
