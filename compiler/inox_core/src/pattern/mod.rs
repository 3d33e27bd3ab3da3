//! Patterns: composable matchers over values.
//!
//! # Design
//!
//! [`Pattern`] is a closed sum type. Every kind answers `test`; kinds that
//! describe strings expose a [`StringPattern`] through `string_pattern`, and
//! parameterised kinds (`%int(0..10)`, `%str(...)(1..5)`) answer `call`.
//!
//! Named builtin patterns (`%int`, `%str`, ...) are [`TypePattern`]s: a name
//! and a set of plain function pointers registered by
//! [`default_patterns`](crate::default_patterns).
//!
//! String patterns live in [`string`]; glob matching for path, host and URL
//! patterns lives in [`glob`].

mod containers;
pub mod glob;
mod named_segment;
mod random;
mod ranges;
pub mod string;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::MutationKind;
use crate::value::{Heap, IntRange, Value};

pub use containers::{ListPattern, ObjectPattern, ObjectPatternEntry, TuplePattern};
pub use named_segment::{NamedSegmentPathPattern, PathSegment};
pub use ranges::{FloatRangePattern, IntRangePattern};
pub use string::{
    FindConfig, StringParser, StringPattern, StringPatternKind, MAX_TESTED_STRING_BYTE_LENGTH,
};

/// Pattern construction and matching failures.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
    #[error("invalid range {start}..{end}: the end is smaller than the start")]
    InvalidRange { start: i64, end: i64 },
    #[error("the range should have a known start")]
    UnknownStart,
    #[error("only the ranges -MAX..MAX, -MAX..0 and 0..MAX have a string pattern")]
    UnsupportedFloatRange,
    #[error("{elements} elements but {names} group names")]
    GroupCountMismatch { elements: usize, names: usize },
    #[error("a union pattern needs at least one case")]
    EmptyUnion,
    #[error("at least one case of the union should not be recursive")]
    NoTerminalCase,
    #[error("{0} requires a pattern with a regex")]
    RegexRequired(&'static str),
    #[error("pattern %{0} is not defined")]
    Unresolved(String),
    #[error("the tested string is too large")]
    TestedStringTooLarge,
    #[error("invalid input")]
    InvalidInput,
    #[error("the parsed value is not in the range")]
    NotInRange,
    #[error("the pattern cannot parse strings")]
    CannotParse,
    #[error("the pattern is not callable")]
    NotCallable,
    #[error("the length range {provided:?} is not inside the original range {original:?}")]
    LengthRangeOutside {
        provided: IntRange,
        original: IntRange,
    },
    #[error("the pattern already matches nil")]
    AlreadyOptional,
    #[error("the pattern does not capture groups")]
    NotAGroupPattern,
    #[error("cannot generate a random value for {0}")]
    CannotGenerate(String),
}

impl From<PatternError> for EvalError {
    fn from(error: PatternError) -> Self {
        match error {
            PatternError::TestedStringTooLarge => errors::tested_string_too_large(),
            PatternError::InvalidInput | PatternError::NotInRange | PatternError::CannotParse => {
                errors::parse_failure(error.to_string())
            }
            PatternError::NotCallable => errors::not_callable("pattern"),
            PatternError::Unresolved(name) => errors::undeclared_pattern(&name),
            other => errors::invalid_argument(other.to_string()),
        }
    }
}

pub type TypeTestFn = fn(&Value) -> bool;
pub type TypeStringPatternFn = fn() -> Option<StringPattern>;
pub type TypeCallFn = fn(&Context, &[Value]) -> Result<Pattern, EvalError>;
pub type TypeRandomFn = fn(&Context) -> Result<Value, EvalError>;

/// Named builtin pattern matching a family of values.
pub struct TypePattern {
    name: String,
    test: TypeTestFn,
    string_pattern: Option<TypeStringPatternFn>,
    call: Option<TypeCallFn>,
    random: Option<TypeRandomFn>,
    cached_string_pattern: OnceLock<Option<Heap<StringPattern>>>,
}

impl TypePattern {
    pub fn new(name: impl Into<String>, test: TypeTestFn) -> Self {
        TypePattern {
            name: name.into(),
            test,
            string_pattern: None,
            call: None,
            random: None,
            cached_string_pattern: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_string_pattern(mut self, string_pattern: TypeStringPatternFn) -> Self {
        self.string_pattern = Some(string_pattern);
        self
    }

    #[must_use]
    pub fn with_call(mut self, call: TypeCallFn) -> Self {
        self.call = Some(call);
        self
    }

    #[must_use]
    pub fn with_random(mut self, random: TypeRandomFn) -> Self {
        self.random = Some(random);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_callable(&self) -> bool {
        self.call.is_some()
    }
}

/// Kind of string-like value matched by a glob pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GlobKind {
    Path,
    Host,
    Url,
}

pub enum Pattern {
    /// Matches values equal to the held value.
    Exact(Value),
    Type(TypePattern),
    /// A disjoint union matches values matched by exactly one case.
    Union {
        cases: Vec<Heap<Pattern>>,
        disjoint: bool,
    },
    Intersection(Vec<Heap<Pattern>>),
    Difference {
        base: Heap<Pattern>,
        removed: Heap<Pattern>,
    },
    /// Matches nil and the values of the inner pattern.
    Optional(Heap<Pattern>),
    Object(ObjectPattern),
    Record(ObjectPattern),
    List(ListPattern),
    Tuple(TuplePattern),
    Option {
        name: String,
        value: Heap<Pattern>,
    },
    IntRange(IntRangePattern),
    FloatRange(FloatRangePattern),
    Glob {
        kind: GlobKind,
        pattern: Arc<str>,
    },
    NamedSegmentPath(NamedSegmentPathPattern),
    String(Heap<StringPattern>),
    /// Events whose value matches the pattern, if any.
    Event(Option<Heap<Pattern>>),
    Mutation {
        kind: MutationKind,
        data0: Heap<Pattern>,
    },
    /// Secrets whose content matches the string pattern.
    Secret(Heap<StringPattern>),
}

// Construction

impl Pattern {
    pub fn exact(value: Value) -> Self {
        Pattern::Exact(value)
    }

    /// Patterns are used as is and path, host and URL patterns become globs;
    /// other values become exact-value patterns.
    pub fn from_value(value: &Value) -> Heap<Pattern> {
        let glob = |kind, pattern: &Heap<str>| {
            Heap::new(Pattern::Glob {
                kind,
                pattern: Arc::clone(Heap::arc(pattern)),
            })
        };
        match value {
            Value::Pattern(pattern) => pattern.clone(),
            Value::PathPattern(p) => glob(GlobKind::Path, p),
            Value::HostPattern(p) => glob(GlobKind::Host, p),
            Value::UrlPattern(p) => glob(GlobKind::Url, p),
            other => Heap::new(Pattern::Exact(other.clone())),
        }
    }

    pub fn union(cases: Vec<Heap<Pattern>>) -> Self {
        Pattern::Union {
            cases,
            disjoint: false,
        }
    }

    pub fn difference(base: Heap<Pattern>, removed: Heap<Pattern>) -> Self {
        Pattern::Difference { base, removed }
    }

    /// `%pattern?`; fails if the pattern already matches nil.
    pub fn optional(ctx: &Context, inner: Heap<Pattern>) -> Result<Self, PatternError> {
        if inner.test(ctx, &Value::Nil) {
            return Err(PatternError::AlreadyOptional);
        }
        Ok(Pattern::Optional(inner))
    }

    pub fn string(pattern: StringPattern) -> Self {
        Pattern::String(Heap::new(pattern))
    }

    /// Move the pattern to the heap.
    pub fn shared(self) -> Heap<Pattern> {
        Heap::new(self)
    }
}

// Matching

impl Pattern {
    /// Whether `value` is matched by the pattern.
    pub fn test(&self, ctx: &Context, value: &Value) -> bool {
        inox_stack::ensure_sufficient_stack(|| match self {
            Pattern::Exact(expected) => expected.equals(value),
            Pattern::Type(pattern) => (pattern.test)(value),
            Pattern::Union { cases, disjoint } => {
                if *disjoint {
                    cases.iter().filter(|c| c.test(ctx, value)).count() == 1
                } else {
                    cases.iter().any(|c| c.test(ctx, value))
                }
            }
            Pattern::Intersection(patterns) => patterns.iter().all(|p| p.test(ctx, value)),
            Pattern::Difference { base, removed } => {
                base.test(ctx, value) && !removed.test(ctx, value)
            }
            Pattern::Optional(inner) => value.is_nil() || inner.test(ctx, value),
            Pattern::Object(pattern) => match value {
                Value::Object(object) => pattern.test_entries(ctx, &object.entries()),
                _ => false,
            },
            Pattern::Record(pattern) => match value {
                Value::Record(record) => pattern.test_entries(ctx, &record.entries()),
                _ => false,
            },
            Pattern::List(pattern) => match value {
                Value::List(list) => pattern.test_elements(ctx, &list.snapshot()),
                _ => false,
            },
            Pattern::Tuple(pattern) => match value {
                Value::Tuple(tuple) => pattern.test_elements(ctx, tuple.items()),
                _ => false,
            },
            Pattern::Option { name, value: inner } => match value {
                Value::Option(option) => option.name == *name && inner.test(ctx, &option.value),
                _ => false,
            },
            Pattern::IntRange(pattern) => value.as_int().is_some_and(|n| pattern.contains(n)),
            Pattern::FloatRange(pattern) => value.as_float().is_some_and(|f| pattern.contains(f)),
            Pattern::Glob { kind, pattern } => match (kind, value) {
                (GlobKind::Path, Value::Path(path)) => glob::path_pattern_matches(pattern, path),
                (GlobKind::Host, Value::Host(host)) => glob::host_pattern_matches(pattern, host),
                (GlobKind::Url, Value::Url(url)) => glob::url_pattern_matches(pattern, url),
                _ => false,
            },
            Pattern::NamedSegmentPath(pattern) => match value {
                Value::Path(path) => pattern.match_path(path).is_some(),
                _ => false,
            },
            Pattern::String(pattern) => pattern.test(ctx, value),
            Pattern::Event(inner) => match value {
                Value::Event(event) => inner.as_ref().map_or(true, |p| p.test(ctx, &event.value)),
                _ => false,
            },
            Pattern::Mutation { kind, data0 } => match value {
                Value::Mutation(mutation) => {
                    mutation.kind == *kind
                        && data0.test(ctx, mutation.data.first().unwrap_or(&Value::Nil))
                }
                _ => false,
            },
            Pattern::Secret(pattern) => match value {
                Value::Secret(secret) => pattern.test_str(secret.reveal()),
                _ => false,
            },
        })
    }

    /// Whether `match_groups` is supported.
    pub fn is_group_pattern(&self) -> bool {
        match self {
            Pattern::NamedSegmentPath(_) => true,
            Pattern::String(pattern) => pattern.has_regex() || pattern.is_group_pattern(),
            _ => false,
        }
    }

    /// Groups captured when matching `value`, as an object with `"0"` mapped
    /// to the whole value; `None` when the value does not match.
    pub fn match_groups(&self, ctx: &Context, value: &Value) -> Result<Option<Value>, EvalError> {
        match self {
            Pattern::NamedSegmentPath(pattern) => Ok(match value {
                Value::Path(path) => pattern
                    .match_path(path)
                    .map(|groups| Value::object(pattern.group_entries(path, groups))),
                _ => None,
            }),
            Pattern::String(pattern) => Ok(pattern.match_groups(ctx, value)?.map(Value::object)),
            _ => Err(PatternError::NotAGroupPattern.into()),
        }
    }

    /// String pattern describing the textual form of the matched values.
    pub fn string_pattern(&self) -> Option<Heap<StringPattern>> {
        match self {
            Pattern::String(pattern) => Some(pattern.clone()),
            Pattern::Exact(Value::Str(s)) => Some(Heap::new(StringPattern::exact(&**s))),
            Pattern::Type(pattern) => pattern
                .cached_string_pattern
                .get_or_init(|| pattern.string_pattern.and_then(|f| f()).map(Heap::new))
                .clone(),
            Pattern::IntRange(pattern) => pattern.string_pattern(),
            Pattern::FloatRange(pattern) => pattern.string_pattern(),
            Pattern::Union { cases, .. } => {
                let cases = cases
                    .iter()
                    .map(|c| c.string_pattern())
                    .collect::<Option<Vec<_>>>()?;
                StringPattern::union(cases).ok().map(Heap::new)
            }
            _ => None,
        }
    }

    /// Pattern obtained by calling this one with `args` (`%int(0..10)`).
    pub fn call(&self, ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
        match self {
            Pattern::Type(TypePattern {
                call: Some(call), ..
            }) => call(ctx, args),
            Pattern::String(pattern) => Ok(Pattern::string(pattern.call(args)?)),
            _ => Err(PatternError::NotCallable.into()),
        }
    }

    /// Random value matched by the pattern.
    pub fn random(&self, ctx: &Context) -> Result<Value, EvalError> {
        random::random_value(self, ctx)
    }
}

// Equality

/// Structural equality of patterns.
pub fn patterns_equal(a: &Heap<Pattern>, b: &Heap<Pattern>) -> bool {
    Heap::ptr_eq(a, b) || pattern_eq(a, b)
}

fn all_equal(a: &[Heap<Pattern>], b: &[Heap<Pattern>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| patterns_equal(x, y))
}

fn pattern_eq(a: &Pattern, b: &Pattern) -> bool {
    inox_stack::ensure_sufficient_stack(|| match (a, b) {
        (Pattern::Exact(x), Pattern::Exact(y)) => x.equals(y),
        (Pattern::Type(x), Pattern::Type(y)) => x.name == y.name,
        (
            Pattern::Union {
                cases: xc,
                disjoint: xd,
            },
            Pattern::Union {
                cases: yc,
                disjoint: yd,
            },
        ) => xd == yd && all_equal(xc, yc),
        (Pattern::Intersection(x), Pattern::Intersection(y)) => all_equal(x, y),
        (
            Pattern::Difference {
                base: xb,
                removed: xr,
            },
            Pattern::Difference {
                base: yb,
                removed: yr,
            },
        ) => patterns_equal(xb, yb) && patterns_equal(xr, yr),
        (Pattern::Optional(x), Pattern::Optional(y)) => patterns_equal(x, y),
        (Pattern::Object(x), Pattern::Object(y)) | (Pattern::Record(x), Pattern::Record(y)) => {
            x.equals(y)
        }
        (Pattern::List(x), Pattern::List(y)) => x.equals(y),
        (Pattern::Tuple(x), Pattern::Tuple(y)) => x.equals(y),
        (
            Pattern::Option {
                name: xn,
                value: xv,
            },
            Pattern::Option {
                name: yn,
                value: yv,
            },
        ) => xn == yn && patterns_equal(xv, yv),
        (Pattern::IntRange(x), Pattern::IntRange(y)) => x == y,
        (Pattern::FloatRange(x), Pattern::FloatRange(y)) => x == y,
        (
            Pattern::Glob {
                kind: xk,
                pattern: xp,
            },
            Pattern::Glob {
                kind: yk,
                pattern: yp,
            },
        ) => xk == yk && xp == yp,
        (Pattern::NamedSegmentPath(x), Pattern::NamedSegmentPath(y)) => x == y,
        (Pattern::String(x), Pattern::String(y)) | (Pattern::Secret(x), Pattern::Secret(y)) => {
            Heap::ptr_eq(x, y) || string::string_patterns_equal(x, y)
        }
        (Pattern::Event(x), Pattern::Event(y)) => match (x, y) {
            (Some(x), Some(y)) => patterns_equal(x, y),
            (None, None) => true,
            _ => false,
        },
        (
            Pattern::Mutation {
                kind: xk,
                data0: xd,
            },
            Pattern::Mutation {
                kind: yk,
                data0: yd,
            },
        ) => xk == yk && patterns_equal(xd, yd),
        _ => false,
    })
}

// Rendering

fn fmt_joined(f: &mut fmt::Formatter<'_>, patterns: &[Heap<Pattern>], sep: &str) -> fmt::Result {
    for (i, p) in patterns.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{p}")?;
    }
    Ok(())
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(value) => write!(f, "%({value:?})"),
            Pattern::Type(pattern) => write!(f, "%{}", pattern.name),
            Pattern::Union { cases, .. } => {
                f.write_str("(%| ")?;
                fmt_joined(f, cases, " | ")?;
                f.write_str(")")
            }
            Pattern::Intersection(patterns) => {
                f.write_str("(%& ")?;
                fmt_joined(f, patterns, " & ")?;
                f.write_str(")")
            }
            Pattern::Difference { base, removed } => write!(f, "({base} \\ {removed})"),
            Pattern::Optional(inner) => write!(f, "{inner}?"),
            Pattern::Object(pattern) => pattern.fmt_with_prefix(f, "%{"),
            Pattern::Record(pattern) => pattern.fmt_with_prefix(f, "#{"),
            Pattern::List(pattern) => write!(f, "{pattern}"),
            Pattern::Tuple(pattern) => write!(f, "{pattern}"),
            Pattern::Option { name, value } => write!(f, "%--{name}={value}"),
            Pattern::IntRange(pattern) => write!(f, "{pattern}"),
            Pattern::FloatRange(pattern) => write!(f, "{pattern}"),
            Pattern::Glob { pattern, .. } => write!(f, "%{pattern}"),
            Pattern::NamedSegmentPath(pattern) => write!(f, "{pattern}"),
            Pattern::String(pattern) => write!(f, "{pattern}"),
            Pattern::Event(Some(inner)) => write!(f, "%event({inner})"),
            Pattern::Event(None) => f.write_str("%event"),
            Pattern::Mutation { kind, data0 } => {
                write!(f, "%mutation(#{}, {data0})", kind.as_str())
            }
            Pattern::Secret(pattern) => write!(f, "%secret({pattern})"),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Namespaces

/// `%name.` namespace of patterns.
#[derive(Debug)]
pub struct PatternNamespace {
    pub name: String,
    patterns: Vec<(String, Heap<Pattern>)>,
}

impl PatternNamespace {
    pub fn new(name: impl Into<String>, mut patterns: Vec<(String, Heap<Pattern>)>) -> Self {
        patterns.sort_by(|a, b| a.0.cmp(&b.0));
        PatternNamespace {
            name: name.into(),
            patterns,
        }
    }

    pub fn get(&self, member: &str) -> Option<&Heap<Pattern>> {
        self.patterns
            .binary_search_by(|(name, _)| name.as_str().cmp(member))
            .ok()
            .map(|index| &self.patterns[index].1)
    }

    pub fn members(&self) -> &[(String, Heap<Pattern>)] {
        &self.patterns
    }

    pub fn shared(self) -> Heap<PatternNamespace> {
        Heap::new(self)
    }
}
