//! String patterns.
//!
//! A [`StringPattern`] matches `Str` values. Most kinds compile to a regex;
//! the ones that do not (length checks, path checks, parser-based patterns,
//! recursive patterns) are matched by walking the structure with a cursor
//! (`validate`).
//!
//! # Design
//!
//! - **Regexes are assembled, not written.** Each kind renders an
//!   embeddable regex; parents demote the capturing groups of their
//!   children, so a compiled pattern only has the groups a sequence
//!   declares at its top level. The compiled form is cached on first use.
//! - **Late binding.** A dynamic element names a pattern of its context and
//!   is resolved on first use. Regex assembly through dynamic elements stops
//!   at [`MAX_RESOLUTION_DEPTH`]; past it, recursive patterns fall back to
//!   cursor matching.
//! - **Length ranges count runes.** The effective length range (narrowed by
//!   calling the pattern with an `IntRange`) is checked before any regex
//!   work.

mod random;
mod regex_build;

use std::fmt;
use std::sync::{Arc, OnceLock};

use inox_ir::PatternQuantifier;
use regex::Regex;

use super::{glob, PatternError};
use crate::context::{Context, WeakContext};
use crate::errors::{self, EvalError};
use crate::value::{FloatRange, Heap, IntRange, RuneRange, Value};

pub use regex_build::{demote_groups, int_range_regex};

/// Longest string tested against regex, sequence and parser-based patterns.
pub const MAX_TESTED_STRING_BYTE_LENGTH: usize = 10_000_000;

/// Nesting depth past which dynamic elements stop contributing to a regex.
pub const MAX_RESOLUTION_DEPTH: usize = 10;

/// Parser standing in for a regex (ULIDs, UUIDs, ...).
pub trait StringParser: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, s: &str) -> bool;

    fn parse(&self, s: &str) -> Result<Value, EvalError>;
}

/// Element of a sequence pattern resolved by name on first use.
#[derive(Clone)]
pub struct DynamicElement {
    name: String,
    ctx: WeakContext,
    resolved: OnceLock<Heap<StringPattern>>,
}

impl DynamicElement {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self) -> Option<&Heap<StringPattern>> {
        if let Some(resolved) = self.resolved.get() {
            return Some(resolved);
        }
        let ctx = self.ctx.upgrade()?;
        let pattern = ctx.resolve_named_pattern(&self.name)?.string_pattern()?;
        Some(self.resolved.get_or_init(|| pattern))
    }
}

#[derive(Clone)]
pub enum StringPatternKind {
    Exact(Arc<str>),
    /// Regex source with capturing groups already demoted.
    Regex(Arc<str>),
    LengthChecking(IntRange),
    Sequence {
        elements: Vec<Heap<StringPattern>>,
        group_names: Vec<Option<String>>,
    },
    Union(Vec<Heap<StringPattern>>),
    RuneRange(RuneRange),
    IntRange(IntRange),
    FloatRange(FloatRange),
    /// Path strings, optionally restricted by a path glob.
    Path(Option<Arc<str>>),
    Repeated {
        quantifier: PatternQuantifier,
        exact_count: usize,
        element: Heap<StringPattern>,
    },
    Dynamic(DynamicElement),
    ParserBased(Arc<dyn StringParser>),
}

#[derive(Clone)]
struct CompiledRegex {
    source: String,
    anchored: Regex,
    prefix: Regex,
    search: Regex,
}

/// Whether to stop at the first match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FindConfig {
    First,
    All,
}

#[derive(Clone)]
pub struct StringPattern {
    kind: StringPatternKind,
    effective_length_range: Option<IntRange>,
    compiled: OnceLock<Option<CompiledRegex>>,
}

// Construction

impl StringPattern {
    fn from_kind(kind: StringPatternKind) -> Self {
        StringPattern {
            kind,
            effective_length_range: None,
            compiled: OnceLock::new(),
        }
    }

    /// Matches every string.
    pub fn any_string() -> Self {
        Self::from_kind(StringPatternKind::Regex(Arc::from("(?s).*")))
    }

    pub fn exact(s: impl Into<Arc<str>>) -> Self {
        Self::from_kind(StringPatternKind::Exact(s.into()))
    }

    pub fn from_regex(source: &str) -> Result<Self, PatternError> {
        let demoted = demote_groups(source)?;
        Regex::new(&demoted).map_err(|e| PatternError::InvalidRegex(e.to_string()))?;
        Ok(Self::from_kind(StringPatternKind::Regex(demoted.into())))
    }

    pub fn length_checking(min: i64, max: i64) -> Result<Self, PatternError> {
        if min < 0 || max < min {
            return Err(PatternError::InvalidRange { start: min, end: max });
        }
        Ok(Self::from_kind(StringPatternKind::LengthChecking(
            IntRange::new(min, max),
        )))
    }

    /// Sequence of elements; `group_names` is empty or has one entry per
    /// element.
    pub fn sequence(
        elements: Vec<Heap<StringPattern>>,
        group_names: Vec<Option<String>>,
    ) -> Result<Self, PatternError> {
        let group_names = if group_names.is_empty() {
            vec![None; elements.len()]
        } else {
            group_names
        };
        if group_names.len() != elements.len() {
            return Err(PatternError::GroupCountMismatch {
                elements: elements.len(),
                names: group_names.len(),
            });
        }
        Ok(Self::from_kind(StringPatternKind::Sequence {
            elements,
            group_names,
        }))
    }

    pub fn union(cases: Vec<Heap<StringPattern>>) -> Result<Self, PatternError> {
        if cases.is_empty() {
            return Err(PatternError::EmptyUnion);
        }
        let all_resolved = cases.iter().all(|c| c.resolves(0));
        if all_resolved && cases.iter().all(|c| !c.has_regex()) {
            return Err(PatternError::NoTerminalCase);
        }
        Ok(Self::from_kind(StringPatternKind::Union(cases)))
    }

    pub fn rune_range(range: RuneRange) -> Self {
        Self::from_kind(StringPatternKind::RuneRange(range))
    }

    pub fn int_range(range: IntRange) -> Result<Self, PatternError> {
        if range.unknown_start {
            return Err(PatternError::UnknownStart);
        }
        if range.end < range.start {
            return Err(PatternError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(Self::from_kind(StringPatternKind::IntRange(range)))
    }

    /// Only the full range and the two half ranges split at zero have a
    /// string pattern.
    pub fn float_range(range: FloatRange) -> Result<Self, PatternError> {
        if float_range_regex(&range).is_none() {
            return Err(PatternError::UnsupportedFloatRange);
        }
        Ok(Self::from_kind(StringPatternKind::FloatRange(range)))
    }

    pub fn path(glob: Option<Arc<str>>) -> Self {
        Self::from_kind(StringPatternKind::Path(glob))
    }

    pub fn repeated(
        quantifier: PatternQuantifier,
        exact_count: usize,
        element: Heap<StringPattern>,
    ) -> Self {
        Self::from_kind(StringPatternKind::Repeated {
            quantifier,
            exact_count,
            element,
        })
    }

    pub fn dynamic(name: impl Into<String>, ctx: &Context) -> Self {
        Self::from_kind(StringPatternKind::Dynamic(DynamicElement {
            name: name.into(),
            ctx: ctx.downgrade(),
            resolved: OnceLock::new(),
        }))
    }

    pub fn parser_based(parser: Arc<dyn StringParser>) -> Self {
        Self::from_kind(StringPatternKind::ParserBased(parser))
    }

    /// Move the pattern to the heap, e.g. to use it as a sequence element.
    pub fn shared(self) -> Heap<StringPattern> {
        Heap::new(self)
    }

    pub fn kind(&self) -> &StringPatternKind {
        &self.kind
    }
}

// Resolution and regexes

fn float_range_regex(range: &FloatRange) -> Option<String> {
    use regex_build::{UNSIGNED_DECIMAL_FLOAT_REGEX as DECIMAL, UNSIGNED_ZERO_FLOAT_REGEX as ZERO};

    if range.unknown_start || !range.inclusive_end {
        return None;
    }
    #[allow(clippy::float_cmp, reason = "the supported bounds are exact constants")]
    let source = match (range.start, range.end) {
        (start, end) if start == -f64::MAX && end == f64::MAX => format!("-?{DECIMAL}"),
        (start, end) if start == -f64::MAX && end == 0.0 => format!("{ZERO}|-{DECIMAL}"),
        (start, end) if start == 0.0 && end == f64::MAX => DECIMAL.to_string(),
        _ => return None,
    };
    Some(format!("(?:{source})"))
}

fn quantifier_suffix(quantifier: PatternQuantifier, exact_count: usize) -> String {
    match quantifier {
        PatternQuantifier::ExactlyOne => String::new(),
        PatternQuantifier::AtLeastOne => "+".to_string(),
        PatternQuantifier::ZeroOrMore => "*".to_string(),
        PatternQuantifier::Optional => "?".to_string(),
        PatternQuantifier::ExactCount => format!("{{{exact_count}}}"),
    }
}

impl StringPattern {
    /// Whether every dynamic element reachable from the pattern resolves.
    fn resolves(&self, depth: usize) -> bool {
        if depth >= MAX_RESOLUTION_DEPTH {
            return true;
        }
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Sequence { elements, .. } | StringPatternKind::Union(elements) => {
                elements.iter().all(|e| e.resolves(depth + 1))
            }
            StringPatternKind::Repeated { element, .. } => element.resolves(depth + 1),
            StringPatternKind::Dynamic(dynamic) => dynamic
                .resolve()
                .is_some_and(|resolved| resolved.resolves(depth + 1)),
            _ => true,
        })
    }

    /// Embeddable regex; sequences keep their top-level groups.
    fn build_regex(&self, depth: usize) -> Option<String> {
        if depth >= MAX_RESOLUTION_DEPTH {
            return None;
        }
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Exact(s) => Some(regex::escape(s)),
            StringPatternKind::Regex(source) => Some(source.to_string()),
            StringPatternKind::LengthChecking(_)
            | StringPatternKind::Path(_)
            | StringPatternKind::ParserBased(_) => None,
            StringPatternKind::Sequence {
                elements,
                group_names,
            } => {
                let mut out = String::new();
                for (element, name) in elements.iter().zip(group_names) {
                    let child = demote_groups(&element.build_regex(depth + 1)?).ok()?;
                    out.push_str(if name.is_some() { "(" } else { "(?:" });
                    out.push_str(&child);
                    out.push(')');
                }
                Some(out)
            }
            StringPatternKind::Union(cases) => {
                let mut children = Vec::with_capacity(cases.len());
                for case in cases {
                    children.push(demote_groups(&case.build_regex(depth + 1)?).ok()?);
                }
                Some(format!("(?:{})", children.join("|")))
            }
            StringPatternKind::RuneRange(range) => Some(format!(
                "[{}-{}]",
                regex::escape(&range.start.to_string()),
                regex::escape(&range.end.to_string())
            )),
            StringPatternKind::IntRange(range) => {
                Some(int_range_regex(range.start, range.end, false))
            }
            StringPatternKind::FloatRange(range) => float_range_regex(range),
            StringPatternKind::Repeated {
                quantifier,
                exact_count,
                element,
            } => {
                let child = demote_groups(&element.build_regex(depth + 1)?).ok()?;
                Some(format!(
                    "(?:{child}){}",
                    quantifier_suffix(*quantifier, *exact_count)
                ))
            }
            StringPatternKind::Dynamic(dynamic) => dynamic.resolve()?.build_regex(depth + 1),
        })
    }

    fn compile(&self) -> Option<CompiledRegex> {
        let source = self.build_regex(0)?;
        let search = match &self.kind {
            StringPatternKind::IntRange(range) => int_range_regex(range.start, range.end, true),
            _ => source.clone(),
        };
        let compiled = CompiledRegex {
            anchored: Regex::new(&format!("^(?:{source})$")).ok()?,
            prefix: Regex::new(&format!("^(?:{source})")).ok()?,
            search: Regex::new(&search).ok()?,
            source,
        };
        tracing::trace!(regex = %compiled.source, "compiled string pattern");
        Some(compiled)
    }

    fn compiled(&self) -> Option<&CompiledRegex> {
        if let Some(compiled) = self.compiled.get() {
            return compiled.as_ref();
        }
        // Unresolved names may be defined later: do not cache the failure.
        if !self.resolves(0) {
            return None;
        }
        self.compiled.get_or_init(|| self.compile()).as_ref()
    }

    pub fn has_regex(&self) -> bool {
        self.compiled().is_some()
    }

    /// Regex source; capturing groups only appear at the top level of
    /// sequences.
    pub fn regex(&self) -> Option<&str> {
        self.compiled().map(|c| c.source.as_str())
    }

    /// Unanchored compiled regex used to find matches.
    pub fn compiled_regex(&self) -> Option<&Regex> {
        self.compiled().map(|c| &c.search)
    }

    /// Whether the pattern declares groups, resolving dynamic elements.
    pub fn is_group_pattern(&self) -> bool {
        match &self.kind {
            StringPatternKind::Sequence { group_names, .. } => {
                group_names.iter().any(Option::is_some)
            }
            StringPatternKind::Dynamic(dynamic) => {
                dynamic.resolve().is_some_and(|r| r.is_group_pattern())
            }
            _ => false,
        }
    }
}

// Length ranges

impl StringPattern {
    pub fn length_range(&self) -> IntRange {
        self.length_range_at(0, false)
    }

    /// Length range narrowed by a call, if any.
    pub fn effective_length_range(&self) -> IntRange {
        self.length_range_at(0, true)
    }

    fn length_range_at(&self, depth: usize, effective: bool) -> IntRange {
        if effective {
            if let Some(range) = self.effective_length_range {
                return range;
            }
        }
        if depth >= MAX_RESOLUTION_DEPTH {
            return IntRange::from_start(0);
        }
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Exact(s) => {
                let runes = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
                IntRange::new(runes, runes)
            }
            StringPatternKind::Regex(source) => regex_build::regex_length_range(source)
                .unwrap_or_else(|_| IntRange::from_start(0)),
            StringPatternKind::LengthChecking(range) => *range,
            StringPatternKind::Sequence { elements, .. } => {
                elements.iter().fold(IntRange::new(0, 0), |acc, e| {
                    acc.clamped_add(&e.length_range_at(depth + 1, effective))
                })
            }
            StringPatternKind::Union(cases) => {
                let ranges: Vec<IntRange> = cases
                    .iter()
                    .map(|c| c.length_range_at(depth + 1, effective))
                    .collect();
                IntRange::new(
                    ranges.iter().map(|r| r.start).min().unwrap_or(0),
                    ranges.iter().map(|r| r.end).max().unwrap_or(0),
                )
            }
            StringPatternKind::RuneRange(_) => IntRange::new(1, 1),
            StringPatternKind::IntRange(range) => {
                regex_build::int_range_length_range(range.start, range.end)
            }
            StringPatternKind::FloatRange(range) => {
                let sign = i64::from(range.start < 0.0);
                IntRange::new(1, sign + regex_build::MAX_FLOAT_CHAR_COUNT)
            }
            StringPatternKind::Path(_) => IntRange::from_start(1),
            StringPatternKind::ParserBased(_) => IntRange::from_start(0),
            StringPatternKind::Repeated {
                quantifier,
                exact_count,
                element,
            } => {
                let child = element.length_range_at(depth + 1, effective);
                repeated_length_range(child, *quantifier, *exact_count)
            }
            StringPatternKind::Dynamic(dynamic) => match dynamic.resolve() {
                Some(resolved) => resolved.length_range_at(depth + 1, effective),
                None => IntRange::from_start(0),
            },
        })
    }

    fn has_valid_length(&self, s: &str) -> bool {
        let range = self.effective_length_range();
        let runes = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
        runes >= range.start && runes <= range.end
    }
}

/// Length range of a repeated element whose child has the length range
/// `child`.
pub fn repeated_length_range(
    child: IntRange,
    quantifier: PatternQuantifier,
    exact_count: usize,
) -> IntRange {
    match quantifier {
        PatternQuantifier::ExactlyOne => child,
        PatternQuantifier::AtLeastOne => IntRange::from_start(child.start),
        PatternQuantifier::ZeroOrMore => IntRange::from_start(0),
        PatternQuantifier::Optional => IntRange::new(0, child.end),
        PatternQuantifier::ExactCount => {
            let count = i64::try_from(exact_count).unwrap_or(i64::MAX);
            child.times(count, count)
        }
    }
}

// Matching

/// `s` with the `./` prefix added when it is not already an absolute or
/// relative path.
fn with_path_prefix(s: &str) -> Option<String> {
    if s.is_empty() {
        return None;
    }
    if s.starts_with('/') || s.starts_with("./") || s.starts_with("../") {
        return Some(s.to_string());
    }
    Some(match s {
        "." => "./".to_string(),
        ".." => "./..".to_string(),
        _ => format!("./{s}"),
    })
}

impl StringPattern {
    /// Whether `value` is a `Str` matched by the pattern.
    pub fn test(&self, _ctx: &Context, value: &Value) -> bool {
        value.as_string().is_some_and(|s| self.test_str(s))
    }

    pub fn test_str(&self, s: &str) -> bool {
        if s.len() > MAX_TESTED_STRING_BYTE_LENGTH {
            tracing::debug!(len = s.len(), "tested string is too large");
            return false;
        }
        if !self.has_valid_length(s) {
            return false;
        }
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Exact(expected) => **expected == *s,
            StringPatternKind::LengthChecking(_) => true,
            StringPatternKind::ParserBased(parser) => parser.validate(s),
            StringPatternKind::Path(glob) => with_path_prefix(s).is_some_and(|path| match glob {
                Some(glob) => glob::path_pattern_matches(glob, &path),
                None => !path.contains('\0'),
            }),
            StringPatternKind::Dynamic(dynamic) => {
                dynamic.resolve().is_some_and(|resolved| resolved.test_str(s))
            }
            _ => {
                if let Some(compiled) = self.compiled() {
                    return compiled.anchored.is_match(s);
                }
                match &self.kind {
                    StringPatternKind::Union(cases) => cases.iter().any(|c| c.test_str(s)),
                    _ => {
                        let mut i = 0;
                        self.validate(s, &mut i) && i == s.len()
                    }
                }
            }
        })
    }

    /// Match a prefix of `s[*i..]`, advancing `i` past it on success.
    pub fn validate(&self, s: &str, i: &mut usize) -> bool {
        let Some(rest) = s.get(*i..) else {
            return false;
        };
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Exact(expected) => {
                let matched = rest.starts_with(&**expected);
                if matched {
                    *i += expected.len();
                }
                matched
            }
            StringPatternKind::RuneRange(range) => match rest.chars().next() {
                Some(r) if range.contains(r) => {
                    *i += r.len_utf8();
                    true
                }
                _ => false,
            },
            StringPatternKind::Dynamic(dynamic) => {
                dynamic.resolve().is_some_and(|resolved| resolved.validate(s, i))
            }
            StringPatternKind::LengthChecking(_)
            | StringPatternKind::Path(_)
            | StringPatternKind::ParserBased(_) => self.validate_longest(rest, i),
            _ => {
                if let Some(compiled) = self.compiled() {
                    return match compiled.prefix.find(rest) {
                        Some(m) => {
                            *i += m.end();
                            true
                        }
                        None => false,
                    };
                }
                self.validate_structurally(s, i)
            }
        })
    }

    /// Longest prefix of `rest` accepted by `test_str`.
    fn validate_longest(&self, rest: &str, i: &mut usize) -> bool {
        let ends = rest
            .char_indices()
            .map(|(index, _)| index)
            .skip(1)
            .chain(std::iter::once(rest.len()));
        let mut ends: Vec<usize> = ends.collect();
        ends.reverse();
        for end in ends {
            if self.test_str(&rest[..end]) {
                *i += end;
                return true;
            }
        }
        false
    }

    fn validate_structurally(&self, s: &str, i: &mut usize) -> bool {
        match &self.kind {
            StringPatternKind::Sequence { elements, .. } => {
                let mut j = *i;
                for element in elements {
                    if !element.validate(s, &mut j) {
                        return false;
                    }
                }
                *i = j;
                true
            }
            StringPatternKind::Union(cases) => cases.iter().any(|case| {
                let mut j = *i;
                let matched = case.validate(s, &mut j);
                if matched {
                    *i = j;
                }
                matched
            }),
            StringPatternKind::Repeated {
                quantifier,
                exact_count,
                element,
            } => {
                let max = match quantifier {
                    PatternQuantifier::ExactlyOne | PatternQuantifier::Optional => 1,
                    PatternQuantifier::ExactCount => *exact_count,
                    PatternQuantifier::AtLeastOne | PatternQuantifier::ZeroOrMore => usize::MAX,
                };
                let mut j = *i;
                let mut count = 0;
                while count < max {
                    let before = j;
                    if !element.validate(s, &mut j) {
                        break;
                    }
                    count += 1;
                    if j == before {
                        // empty matches repeat indefinitely
                        count = max;
                    }
                }
                let matched = match quantifier {
                    PatternQuantifier::ExactlyOne | PatternQuantifier::AtLeastOne => count >= 1,
                    PatternQuantifier::ZeroOrMore | PatternQuantifier::Optional => true,
                    PatternQuantifier::ExactCount => count == *exact_count,
                };
                if matched {
                    *i = j;
                }
                matched
            }
            _ => false,
        }
    }

    /// Parse `s` into the value the pattern describes: an integer for
    /// integer ranges, a rune for rune ranges, a path for path patterns and a
    /// string otherwise.
    pub fn parse(&self, ctx: &Context, s: &str) -> Result<Value, EvalError> {
        if s.len() > MAX_TESTED_STRING_BYTE_LENGTH {
            return Err(PatternError::TestedStringTooLarge.into());
        }
        match &self.kind {
            StringPatternKind::IntRange(range) => {
                if s == "-0" {
                    return Err(PatternError::InvalidInput.into());
                }
                let n: i64 = s
                    .parse()
                    .map_err(|e: std::num::ParseIntError| errors::parse_failure(e.to_string()))?;
                if !range.contains(n) {
                    return Err(PatternError::NotInRange.into());
                }
                Ok(Value::int(n))
            }
            StringPatternKind::FloatRange(range) => {
                let f: f64 = s
                    .parse()
                    .map_err(|e: std::num::ParseFloatError| errors::parse_failure(e.to_string()))?;
                if (range.start >= 0.0 && s.contains('-')) || !range.contains(f) {
                    return Err(PatternError::NotInRange.into());
                }
                Ok(Value::Float(f))
            }
            StringPatternKind::RuneRange(range) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(r), None) if range.contains(r) => Ok(Value::Rune(r)),
                    (Some(_), None) => Err(PatternError::NotInRange.into()),
                    _ => Err(PatternError::InvalidInput.into()),
                }
            }
            StringPatternKind::Path(_) => {
                let path = with_path_prefix(s).ok_or(PatternError::InvalidInput)?;
                if !self.test_str(s) {
                    return Err(PatternError::InvalidInput.into());
                }
                Ok(Value::path(path))
            }
            StringPatternKind::ParserBased(parser) => parser.parse(s),
            StringPatternKind::Dynamic(dynamic) => dynamic
                .resolve()
                .ok_or_else(|| PatternError::Unresolved(dynamic.name.clone()))?
                .parse(ctx, s),
            StringPatternKind::Repeated { .. } => Err(PatternError::CannotParse.into()),
            StringPatternKind::Union(cases) => {
                if !self.test_str(s) {
                    return Err(PatternError::InvalidInput.into());
                }
                cases
                    .iter()
                    .filter(|c| c.test_str(s))
                    .find_map(|c| c.parse(ctx, s).ok())
                    .ok_or_else(|| PatternError::CannotParse.into())
            }
            StringPatternKind::Exact(_)
            | StringPatternKind::Regex(_)
            | StringPatternKind::LengthChecking(_)
            | StringPatternKind::Sequence { .. } => {
                if !self.test_str(s) {
                    return Err(PatternError::InvalidInput.into());
                }
                Ok(Value::str(s))
            }
        }
    }

    /// Substrings of `value` matched by the pattern.
    pub fn find_matches(
        &self,
        _ctx: &Context,
        value: &Value,
        config: FindConfig,
    ) -> Result<Vec<Value>, EvalError> {
        let Some(s) = value.as_string() else {
            return Ok(Vec::new());
        };
        if s.len() > MAX_TESTED_STRING_BYTE_LENGTH {
            return Err(PatternError::TestedStringTooLarge.into());
        }
        let regex = self
            .compiled_regex()
            .ok_or(PatternError::RegexRequired("finding matches"))?;
        Ok(match config {
            FindConfig::First => regex
                .find(s)
                .map(|m| vec![Value::str(m.as_str())])
                .unwrap_or_default(),
            FindConfig::All => regex.find_iter(s).map(|m| Value::str(m.as_str())).collect(),
        })
    }

    /// Captured groups of `value`: `"0"` maps to the whole string and every
    /// declared group that took part in the match maps to its substring, or
    /// to an object when the group's pattern declares groups itself.
    pub fn match_groups(
        &self,
        ctx: &Context,
        value: &Value,
    ) -> Result<Option<Vec<(String, Value)>>, EvalError> {
        let Some(s) = value.as_string() else {
            return Ok(None);
        };
        self.match_groups_str(ctx, s)
    }

    fn match_groups_str(
        &self,
        ctx: &Context,
        s: &str,
    ) -> Result<Option<Vec<(String, Value)>>, EvalError> {
        if s.len() > MAX_TESTED_STRING_BYTE_LENGTH {
            return Err(PatternError::TestedStringTooLarge.into());
        }
        inox_stack::ensure_sufficient_stack(|| match &self.kind {
            StringPatternKind::Sequence {
                elements,
                group_names,
            } => {
                let compiled = self
                    .compiled()
                    .ok_or(PatternError::RegexRequired("group matching"))?;
                if !self.has_valid_length(s) {
                    return Ok(None);
                }
                let Some(captures) = compiled.anchored.captures(s) else {
                    return Ok(None);
                };
                let mut groups = vec![("0".to_string(), Value::str(s))];
                let named = elements
                    .iter()
                    .zip(group_names)
                    .filter_map(|(element, name)| name.as_ref().map(|name| (name, element)));
                for (index, (name, element)) in named.enumerate() {
                    let Some(matched) = captures.get(index + 1) else {
                        continue;
                    };
                    let group_value = if element.is_group_pattern() {
                        match element.match_groups_str(ctx, matched.as_str())? {
                            Some(sub_groups) => Value::object(sub_groups),
                            None => return Ok(None),
                        }
                    } else {
                        Value::str(matched.as_str())
                    };
                    groups.push((name.clone(), group_value));
                }
                Ok(Some(groups))
            }
            StringPatternKind::Union(cases) => {
                for case in cases {
                    if case.test_str(s) {
                        if case.is_group_pattern() {
                            if let Some(groups) = case.match_groups_str(ctx, s)? {
                                return Ok(Some(groups));
                            }
                        } else {
                            return Ok(Some(vec![("0".to_string(), Value::str(s))]));
                        }
                    }
                }
                Ok(None)
            }
            StringPatternKind::Dynamic(dynamic) => match dynamic.resolve() {
                Some(resolved) => resolved.match_groups_str(ctx, s),
                None => Err(PatternError::Unresolved(dynamic.name.clone()).into()),
            },
            _ => Ok(self
                .test_str(s)
                .then(|| vec![("0".to_string(), Value::str(s))])),
        })
    }

    /// Pattern with its effective length range narrowed to the `IntRange`
    /// argument, which must lie inside the pattern's length range.
    pub fn call(&self, args: &[Value]) -> Result<StringPattern, EvalError> {
        if !matches!(
            self.kind,
            StringPatternKind::Regex(_)
                | StringPatternKind::Sequence { .. }
                | StringPatternKind::Path(_)
                | StringPatternKind::LengthChecking(_)
        ) {
            return Err(PatternError::NotCallable.into());
        }
        let original = self.length_range();
        let mut provided = None;
        for arg in args {
            match arg {
                Value::IntRange(range) => {
                    if provided.is_some() {
                        return Err(errors::argument_given_twice("length range"));
                    }
                    provided = Some(*range);
                }
                other => {
                    return Err(errors::invalid_argument(format!(
                        "a(n) {} was provided, an integer range was expected",
                        other.type_name()
                    )))
                }
            }
        }
        let Some(range) = provided else {
            return Ok(self.clone());
        };
        if range.unknown_start {
            return Err(PatternError::UnknownStart.into());
        }
        if range.start < original.start || range.end > original.end {
            return Err(PatternError::LengthRangeOutside {
                provided: range,
                original,
            }
            .into());
        }
        let mut narrowed = self.clone();
        narrowed.effective_length_range = Some(range);
        Ok(narrowed)
    }

    pub fn random(&self, ctx: &Context) -> Result<Value, EvalError> {
        random::random_string(self, ctx).map(Value::str)
    }
}

// Rendering

fn fmt_length_range(range: &IntRange, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if range.is_unbounded() {
        write!(f, "{}..", range.start)
    } else {
        write!(f, "{}..{}", range.start, range.end)
    }
}

impl fmt::Display for StringPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StringPatternKind::Exact(s) => write!(f, "{s:?}"),
            StringPatternKind::Regex(source) => write!(f, "%`{source}`"),
            StringPatternKind::LengthChecking(range) => {
                f.write_str("%str(")?;
                fmt_length_range(range, f)?;
                f.write_str(")")
            }
            StringPatternKind::Sequence {
                elements,
                group_names,
            } => {
                f.write_str("%str(")?;
                for (index, (element, name)) in elements.iter().zip(group_names).enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    match name {
                        Some(name) => write!(f, "({name}:{element})")?,
                        None => write!(f, "{element}")?,
                    }
                }
                f.write_str(")")
            }
            StringPatternKind::Union(cases) => {
                f.write_str("(")?;
                for case in cases {
                    write!(f, "| {case} ")?;
                }
                f.write_str(")")
            }
            StringPatternKind::RuneRange(range) => write!(f, "{:?}..{:?}", range.start, range.end),
            StringPatternKind::IntRange(range) => write!(f, "%int({}..{})", range.start, range.end),
            StringPatternKind::FloatRange(range) => {
                write!(f, "%float({:?}..{:?})", range.start, range.end)
            }
            StringPatternKind::Path(Some(glob)) => write!(f, "%path-str({glob})"),
            StringPatternKind::Path(None) => f.write_str("%path-str"),
            StringPatternKind::Repeated {
                quantifier,
                exact_count,
                element,
            } => write!(f, "({element}){}", quantifier_suffix(*quantifier, *exact_count)),
            StringPatternKind::Dynamic(dynamic) => write!(f, "%{}", dynamic.name),
            StringPatternKind::ParserBased(parser) => write!(f, "%{}", parser.name()),
        }?;
        if let Some(range) = &self.effective_length_range {
            f.write_str("(")?;
            fmt_length_range(range, f)?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StringPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Structural equality; dynamic elements compare by name.
pub fn string_patterns_equal(a: &StringPattern, b: &StringPattern) -> bool {
    if a.effective_length_range != b.effective_length_range {
        return false;
    }
    let all_equal = |a: &[Heap<StringPattern>], b: &[Heap<StringPattern>]| {
        a.len() == b.len()
            && a.iter()
                .zip(b)
                .all(|(x, y)| Heap::ptr_eq(x, y) || string_patterns_equal(x, y))
    };
    inox_stack::ensure_sufficient_stack(|| match (&a.kind, &b.kind) {
        (StringPatternKind::Exact(x), StringPatternKind::Exact(y))
        | (StringPatternKind::Regex(x), StringPatternKind::Regex(y)) => x == y,
        (StringPatternKind::LengthChecking(x), StringPatternKind::LengthChecking(y))
        | (StringPatternKind::IntRange(x), StringPatternKind::IntRange(y)) => x == y,
        (
            StringPatternKind::Sequence {
                elements: xe,
                group_names: xn,
            },
            StringPatternKind::Sequence {
                elements: ye,
                group_names: yn,
            },
        ) => xn == yn && all_equal(xe, ye),
        (StringPatternKind::Union(x), StringPatternKind::Union(y)) => all_equal(x, y),
        (StringPatternKind::RuneRange(x), StringPatternKind::RuneRange(y)) => x == y,
        (StringPatternKind::FloatRange(x), StringPatternKind::FloatRange(y)) => x == y,
        (StringPatternKind::Path(x), StringPatternKind::Path(y)) => x == y,
        (
            StringPatternKind::Repeated {
                quantifier: xq,
                exact_count: xc,
                element: xe,
            },
            StringPatternKind::Repeated {
                quantifier: yq,
                exact_count: yc,
                element: ye,
            },
        ) => xq == yq && xc == yc && string_patterns_equal(xe, ye),
        (StringPatternKind::Dynamic(x), StringPatternKind::Dynamic(y)) => x.name == y.name,
        (StringPatternKind::ParserBased(x), StringPatternKind::ParserBased(y)) => {
            Arc::ptr_eq(x, y)
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests;
