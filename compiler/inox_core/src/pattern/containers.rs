//! Object, record, list and tuple patterns.

use std::fmt;

use super::{patterns_equal, Pattern};
use crate::context::Context;
use crate::value::{Heap, Value};

#[derive(Clone, Debug)]
pub struct ObjectPatternEntry {
    pub name: String,
    pub pattern: Heap<Pattern>,
    pub optional: bool,
}

/// Pattern over the entries of objects (and records).
///
/// An exact pattern rejects values with keys it does not list; an inexact
/// one (`%{a: int, ...}`) ignores them. Optional entries may be absent.
#[derive(Clone, Debug)]
pub struct ObjectPattern {
    entries: Vec<ObjectPatternEntry>,
    inexact: bool,
}

impl ObjectPattern {
    pub fn new(mut entries: Vec<ObjectPatternEntry>, inexact: bool) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        ObjectPattern { entries, inexact }
    }

    pub fn entries(&self) -> &[ObjectPatternEntry] {
        &self.entries
    }

    pub fn is_inexact(&self) -> bool {
        self.inexact
    }

    pub fn entry(&self, name: &str) -> Option<&ObjectPatternEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub(super) fn test_entries(&self, ctx: &Context, entries: &[(String, Value)]) -> bool {
        if !self.inexact {
            let has_optional = self.entries.iter().any(|e| e.optional);
            if !has_optional && entries.len() != self.entries.len() {
                return false;
            }
            if entries.iter().any(|(key, _)| self.entry(key).is_none()) {
                return false;
            }
        }
        self.entries.iter().all(|expected| {
            match entries.iter().find(|(key, _)| *key == expected.name) {
                Some((_, value)) => expected.pattern.test(ctx, value),
                None => expected.optional,
            }
        })
    }

    pub(super) fn equals(&self, other: &ObjectPattern) -> bool {
        self.inexact == other.inexact
            && self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|(a, b)| {
                a.name == b.name && a.optional == b.optional && patterns_equal(&a.pattern, &b.pattern)
            })
    }

    pub(super) fn fmt_with_prefix(&self, f: &mut fmt::Formatter<'_>, open: &str) -> fmt::Result {
        f.write_str(open)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let optional = if entry.optional { "?" } else { "" };
            write!(f, "{}{optional}: {}", entry.name, entry.pattern)?;
        }
        if self.inexact {
            f.write_str(if self.entries.is_empty() { "..." } else { ", ..." })?;
        }
        f.write_str("}")
    }
}

/// Element constraints shared by list and tuple patterns.
#[derive(Debug)]
enum ElementPatterns {
    /// One pattern per element; the length must match.
    Exact(Vec<Heap<Pattern>>),
    /// Every element matches `element`; the length lies in `min..=max`.
    General {
        element: Heap<Pattern>,
        min: usize,
        max: usize,
    },
}

impl ElementPatterns {
    fn test(&self, ctx: &Context, elements: &[Value]) -> bool {
        match self {
            ElementPatterns::Exact(patterns) => {
                patterns.len() == elements.len()
                    && patterns.iter().zip(elements).all(|(p, e)| p.test(ctx, e))
            }
            ElementPatterns::General { element, min, max } => {
                (*min..=*max).contains(&elements.len())
                    && elements.iter().all(|e| element.test(ctx, e))
            }
        }
    }

    fn equals(&self, other: &ElementPatterns) -> bool {
        match (self, other) {
            (ElementPatterns::Exact(a), ElementPatterns::Exact(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| patterns_equal(x, y))
            }
            (
                ElementPatterns::General {
                    element: a,
                    min: amin,
                    max: amax,
                },
                ElementPatterns::General {
                    element: b,
                    min: bmin,
                    max: bmax,
                },
            ) => amin == bmin && amax == bmax && patterns_equal(a, b),
            _ => false,
        }
    }

    fn fmt(&self, f: &mut fmt::Formatter<'_>, open: &str) -> fmt::Result {
        match self {
            ElementPatterns::Exact(patterns) => {
                f.write_str(open)?;
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str("]")
            }
            ElementPatterns::General { element, .. } => write!(f, "{open}]{element}"),
        }
    }
}

/// Largest element count accepted by default by a general list pattern.
const DEFAULT_MAX_ELEMENT_COUNT: usize = i32::MAX as usize;

#[derive(Debug)]
pub struct ListPattern(ElementPatterns);

impl ListPattern {
    pub fn exact(elements: Vec<Heap<Pattern>>) -> Self {
        ListPattern(ElementPatterns::Exact(elements))
    }

    pub fn of(element: Heap<Pattern>) -> Self {
        Self::with_counts(element, 0, DEFAULT_MAX_ELEMENT_COUNT)
    }

    pub fn with_counts(element: Heap<Pattern>, min: usize, max: usize) -> Self {
        ListPattern(ElementPatterns::General { element, min, max })
    }

    /// Pattern of the element at `index`, if the list pattern fixes it.
    pub fn element_pattern(&self, index: usize) -> Option<&Heap<Pattern>> {
        match &self.0 {
            ElementPatterns::Exact(patterns) => patterns.get(index),
            ElementPatterns::General { element, .. } => Some(element),
        }
    }

    /// General element pattern, `None` for exact list patterns.
    pub fn general_element(&self) -> Option<&Heap<Pattern>> {
        match &self.0 {
            ElementPatterns::General { element, .. } => Some(element),
            ElementPatterns::Exact(_) => None,
        }
    }

    pub(super) fn exact_elements(&self) -> Option<&[Heap<Pattern>]> {
        match &self.0 {
            ElementPatterns::Exact(patterns) => Some(patterns),
            ElementPatterns::General { .. } => None,
        }
    }

    pub(super) fn test_elements(&self, ctx: &Context, elements: &[Value]) -> bool {
        self.0.test(ctx, elements)
    }

    pub(super) fn equals(&self, other: &ListPattern) -> bool {
        self.0.equals(&other.0)
    }
}

impl fmt::Display for ListPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f, "%[")
    }
}

#[derive(Debug)]
pub struct TuplePattern(ElementPatterns);

impl TuplePattern {
    pub fn exact(elements: Vec<Heap<Pattern>>) -> Self {
        TuplePattern(ElementPatterns::Exact(elements))
    }

    pub fn of(element: Heap<Pattern>) -> Self {
        TuplePattern(ElementPatterns::General {
            element,
            min: 0,
            max: DEFAULT_MAX_ELEMENT_COUNT,
        })
    }

    pub fn general_element(&self) -> Option<&Heap<Pattern>> {
        match &self.0 {
            ElementPatterns::General { element, .. } => Some(element),
            ElementPatterns::Exact(_) => None,
        }
    }

    pub(super) fn exact_elements(&self) -> Option<&[Heap<Pattern>]> {
        match &self.0 {
            ElementPatterns::Exact(patterns) => Some(patterns),
            ElementPatterns::General { .. } => None,
        }
    }

    pub(super) fn test_elements(&self, ctx: &Context, elements: &[Value]) -> bool {
        self.0.test(ctx, elements)
    }

    pub(super) fn equals(&self, other: &TuplePattern) -> bool {
        self.0.equals(&other.0)
    }
}

impl fmt::Display for TuplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f, "#[")
    }
}
