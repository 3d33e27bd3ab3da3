//! Random values matched by a pattern.

use super::{GlobKind, PathSegment, Pattern, PatternError};
use crate::context::Context;
use crate::errors::EvalError;
use crate::value::Value;

/// Upper bound on generated collection sizes when the pattern has none.
const MAX_GENERATED_LEN: usize = 5;

/// Attempts made by rejection sampling (differences, intersections).
const MAX_ATTEMPTS: usize = 32;

fn cannot_generate(pattern: &Pattern) -> EvalError {
    PatternError::CannotGenerate(pattern.to_string()).into()
}

fn random_name() -> String {
    let len = fastrand::usize(1..=8);
    std::iter::repeat_with(fastrand::lowercase).take(len).collect()
}

pub(super) fn random_value(pattern: &Pattern, ctx: &Context) -> Result<Value, EvalError> {
    inox_stack::ensure_sufficient_stack(|| match pattern {
        Pattern::Exact(value) => Ok(value.clone()),
        Pattern::Type(type_pattern) => match type_pattern.random {
            Some(random) => random(ctx),
            None => Err(cannot_generate(pattern)),
        },
        Pattern::Union { cases, disjoint } => {
            if cases.is_empty() {
                return Err(cannot_generate(pattern));
            }
            for _ in 0..MAX_ATTEMPTS {
                let value = cases[fastrand::usize(..cases.len())].random(ctx)?;
                if !*disjoint || pattern.test(ctx, &value) {
                    return Ok(value);
                }
            }
            Err(cannot_generate(pattern))
        }
        Pattern::Intersection(patterns) => {
            let first = patterns.first().ok_or_else(|| cannot_generate(pattern))?;
            sample_until(ctx, pattern, || first.random(ctx))
        }
        Pattern::Difference { base, .. } => sample_until(ctx, pattern, || base.random(ctx)),
        Pattern::Optional(inner) => {
            if fastrand::bool() {
                Ok(Value::Nil)
            } else {
                inner.random(ctx)
            }
        }
        Pattern::Object(object) | Pattern::Record(object) => {
            let mut entries = Vec::with_capacity(object.entries().len());
            for entry in object.entries() {
                if entry.optional && fastrand::bool() {
                    continue;
                }
                entries.push((entry.name.clone(), entry.pattern.random(ctx)?));
            }
            Ok(if matches!(pattern, Pattern::Record(_)) {
                Value::record(entries)
            } else {
                Value::object(entries)
            })
        }
        Pattern::List(list) => {
            let elements = match list.exact_elements() {
                Some(patterns) => patterns
                    .iter()
                    .map(|p| p.random(ctx))
                    .collect::<Result<Vec<_>, _>>()?,
                None => match list.general_element() {
                    Some(element) => random_elements(ctx, element)?,
                    None => Vec::new(),
                },
            };
            Ok(Value::list(elements))
        }
        Pattern::Tuple(tuple) => {
            let elements = match tuple.exact_elements() {
                Some(patterns) => patterns
                    .iter()
                    .map(|p| p.random(ctx))
                    .collect::<Result<Vec<_>, _>>()?,
                None => match tuple.general_element() {
                    Some(element) => random_elements(ctx, element)?,
                    None => Vec::new(),
                },
            };
            Ok(Value::tuple(elements))
        }
        Pattern::Option { name, value } => Ok(Value::option(name.clone(), value.random(ctx)?)),
        Pattern::IntRange(range_pattern) => {
            let range = range_pattern.range();
            let start = if range.unknown_start { i64::MIN } else { range.start };
            match range_pattern.multiple_of() {
                None => Ok(Value::int(fastrand::i64(start..=range.end))),
                Some(m) => {
                    let lowest = start.div_euclid(m) + i64::from(start.rem_euclid(m) != 0);
                    let highest = range.end.div_euclid(m);
                    if lowest > highest {
                        return Err(cannot_generate(pattern));
                    }
                    Ok(Value::int(fastrand::i64(lowest..=highest).saturating_mul(m)))
                }
            }
        }
        Pattern::FloatRange(range_pattern) => {
            let range = range_pattern.range();
            let start = if range.unknown_start { -f64::MAX } else { range.start };
            sample_until(ctx, pattern, || {
                let half_width = range.end / 2.0 - start / 2.0;
                Ok(Value::Float(start + fastrand::f64() * half_width * 2.0))
            })
        }
        Pattern::Glob { kind, pattern: glob } => {
            let literal: String = glob
                .chars()
                .map(|c| match c {
                    '*' | '?' => 'a',
                    c => c,
                })
                .collect();
            let literal = literal.replace(['[', ']'], "");
            let value = match kind {
                GlobKind::Path => Value::path(literal),
                GlobKind::Host => Value::host(literal),
                GlobKind::Url => Value::url(literal),
            };
            if pattern.test(ctx, &value) {
                Ok(value)
            } else {
                Err(cannot_generate(pattern))
            }
        }
        Pattern::NamedSegmentPath(path_pattern) => {
            let mut path = String::new();
            for segment in path_pattern.segments() {
                match segment {
                    PathSegment::Static(text) => path.push_str(text),
                    PathSegment::Named(_) => path.push_str(&random_name()),
                }
            }
            Ok(Value::path(path))
        }
        Pattern::String(string_pattern) => string_pattern.random(ctx),
        Pattern::Event(_) | Pattern::Mutation { .. } | Pattern::Secret(_) => {
            Err(cannot_generate(pattern))
        }
    })
}

fn random_elements(
    ctx: &Context,
    element: &crate::value::Heap<Pattern>,
) -> Result<Vec<Value>, EvalError> {
    (0..fastrand::usize(0..=MAX_GENERATED_LEN))
        .map(|_| element.random(ctx))
        .collect()
}

/// Draw values from `generate` until one is matched by `pattern`.
fn sample_until(
    ctx: &Context,
    pattern: &Pattern,
    mut generate: impl FnMut() -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    for _ in 0..MAX_ATTEMPTS {
        let value = generate()?;
        if pattern.test(ctx, &value) {
            return Ok(value);
        }
    }
    Err(cannot_generate(pattern))
}
