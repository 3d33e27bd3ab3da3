//! Random strings matched by a string pattern.

use inox_ir::PatternQuantifier;
use regex_syntax::hir::{Class, Hir, HirKind};

use super::{StringPattern, StringPatternKind, MAX_RESOLUTION_DEPTH};
use crate::context::Context;
use crate::errors::EvalError;
use crate::pattern::PatternError;

/// Extra repetitions generated past the minimum of an unbounded repetition.
const MAX_EXTRA_REPETITIONS: u32 = 4;

pub(super) fn random_string(pattern: &StringPattern, ctx: &Context) -> Result<String, EvalError> {
    let mut out = String::new();
    generate(pattern, ctx, 0, &mut out)?;
    Ok(out)
}

fn cannot_generate(pattern: &StringPattern) -> EvalError {
    PatternError::CannotGenerate(pattern.to_string()).into()
}

fn generate(
    pattern: &StringPattern,
    ctx: &Context,
    depth: usize,
    out: &mut String,
) -> Result<(), EvalError> {
    if depth >= MAX_RESOLUTION_DEPTH {
        return Err(cannot_generate(pattern));
    }
    inox_stack::ensure_sufficient_stack(|| match pattern.kind() {
        StringPatternKind::Exact(s) => {
            out.push_str(s);
            Ok(())
        }
        StringPatternKind::Regex(source) => {
            let hir = regex_syntax::Parser::new()
                .parse(source)
                .map_err(|e| PatternError::InvalidRegex(e.to_string()))?;
            generate_from_hir(&hir, out);
            Ok(())
        }
        StringPatternKind::LengthChecking(range) => {
            let max = range.end.min(range.start.saturating_add(8));
            let len = fastrand::i64(range.start..=max);
            out.extend(std::iter::repeat_with(fastrand::alphanumeric).take(usize::try_from(len).unwrap_or(0)));
            Ok(())
        }
        StringPatternKind::Sequence { elements, .. } => elements
            .iter()
            .try_for_each(|e| generate(e, ctx, depth + 1, out)),
        StringPatternKind::Union(cases) => {
            // Later cases may recurse; prefer the first case near the depth limit.
            let index = if depth + 2 >= MAX_RESOLUTION_DEPTH {
                0
            } else {
                fastrand::usize(..cases.len())
            };
            generate(&cases[index], ctx, depth + 1, out)
        }
        StringPatternKind::RuneRange(range) => {
            out.push(fastrand::char(range.start..=range.end));
            Ok(())
        }
        StringPatternKind::IntRange(range) => {
            out.push_str(&fastrand::i64(range.start..=range.end).to_string());
            Ok(())
        }
        StringPatternKind::FloatRange(range) => {
            let magnitude = fastrand::f64() * 1000.0;
            let value = if range.start < 0.0 && (range.end <= 0.0 || fastrand::bool()) {
                -magnitude
            } else {
                magnitude
            };
            out.push_str(&format!("{value}"));
            Ok(())
        }
        StringPatternKind::Path(None) => {
            out.push_str("./");
            out.extend(std::iter::repeat_with(fastrand::lowercase).take(fastrand::usize(1..=8)));
            Ok(())
        }
        StringPatternKind::Repeated {
            quantifier,
            exact_count,
            element,
        } => {
            let count = match quantifier {
                PatternQuantifier::ExactlyOne => 1,
                PatternQuantifier::AtLeastOne => fastrand::usize(1..=3),
                PatternQuantifier::ZeroOrMore => fastrand::usize(0..=3),
                PatternQuantifier::Optional => fastrand::usize(0..=1),
                PatternQuantifier::ExactCount => *exact_count,
            };
            (0..count).try_for_each(|_| generate(element, ctx, depth + 1, out))
        }
        StringPatternKind::Dynamic(dynamic) => match dynamic.resolve() {
            Some(resolved) => generate(resolved, ctx, depth + 1, out),
            None => Err(PatternError::Unresolved(dynamic.name().to_string()).into()),
        },
        StringPatternKind::Path(Some(_)) | StringPatternKind::ParserBased(_) => {
            Err(cannot_generate(pattern))
        }
    })
}

fn generate_from_hir(hir: &Hir, out: &mut String) {
    inox_stack::ensure_sufficient_stack(|| match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(literal) => out.push_str(&String::from_utf8_lossy(&literal.0)),
        HirKind::Class(Class::Unicode(class)) => {
            let ranges = class.ranges();
            if !ranges.is_empty() {
                let range = &ranges[fastrand::usize(..ranges.len())];
                out.push(fastrand::char(range.start()..=range.end()));
            }
        }
        HirKind::Class(Class::Bytes(class)) => {
            let ranges: Vec<_> = class.ranges().iter().filter(|r| r.start().is_ascii()).collect();
            if let Some(range) = ranges.get(fastrand::usize(..ranges.len().max(1))) {
                let end = range.end().min(0x7f);
                out.push(char::from(fastrand::u8(range.start()..=end)));
            }
        }
        HirKind::Repetition(repetition) => {
            let max = repetition
                .max
                .unwrap_or(repetition.min.saturating_add(MAX_EXTRA_REPETITIONS));
            let count = fastrand::u32(repetition.min..=max.max(repetition.min));
            for _ in 0..count {
                generate_from_hir(&repetition.sub, out);
            }
        }
        HirKind::Capture(capture) => generate_from_hir(&capture.sub, out),
        HirKind::Concat(subs) => subs.iter().for_each(|sub| generate_from_hir(sub, out)),
        HirKind::Alternation(subs) => {
            if !subs.is_empty() {
                generate_from_hir(&subs[fastrand::usize(..subs.len())], out);
            }
        }
    })
}
