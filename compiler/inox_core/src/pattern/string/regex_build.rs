//! Regex assembly for string patterns.
//!
//! Child regexes are embedded in their parent's regex after a pass over the
//! `regex_syntax` AST that turns every capturing group into a non-capturing
//! one, so the only capturing groups of a compiled pattern are the ones a
//! sequence pattern declares at its top level.

use regex_syntax::ast::{self, Ast, GroupKind};
use regex_syntax::hir::{Hir, HirKind};

use super::PatternError;
use crate::value::IntRange;

pub const UNSIGNED_DECIMAL_FLOAT_REGEX: &str = r"[0-9]+(?:\.?[0-9]*)(?:[Ee][-+]?[0-9]*)?";
pub const UNSIGNED_ZERO_FLOAT_REGEX: &str = r"0+(?:\.?0*)?(?:[Ee][-+]?[0-9]*)?";

/// Longest decimal or scientific rendering of `f64::MAX`.
pub const MAX_FLOAT_CHAR_COUNT: i64 = 309;

/// Rewrite capturing groups of `source` as non-capturing groups.
pub fn demote_groups(source: &str) -> Result<String, PatternError> {
    let mut parsed = ast::parse::Parser::new()
        .parse(source)
        .map_err(|e| PatternError::InvalidRegex(e.to_string()))?;
    demote(&mut parsed);
    let mut out = String::with_capacity(source.len());
    ast::print::Printer::new()
        .print(&parsed, &mut out)
        .map_err(|e| PatternError::InvalidRegex(e.to_string()))?;
    Ok(out)
}

fn demote(node: &mut Ast) {
    inox_stack::ensure_sufficient_stack(|| match node {
        Ast::Group(group) => {
            if !matches!(group.kind, GroupKind::NonCapturing(_)) {
                group.kind = GroupKind::NonCapturing(ast::Flags {
                    span: group.span,
                    items: Vec::new(),
                });
            }
            demote(&mut group.ast);
        }
        Ast::Repetition(repetition) => demote(&mut repetition.ast),
        Ast::Alternation(alternation) => alternation.asts.iter_mut().for_each(demote),
        Ast::Concat(concat) => concat.asts.iter_mut().for_each(demote),
        _ => {}
    });
}

/// Range of rune counts of the strings matched by `source`.
pub fn regex_length_range(source: &str) -> Result<IntRange, PatternError> {
    let hir = regex_syntax::Parser::new()
        .parse(source)
        .map_err(|e| PatternError::InvalidRegex(e.to_string()))?;
    Ok(hir_length_range(&hir))
}

fn hir_length_range(hir: &Hir) -> IntRange {
    inox_stack::ensure_sufficient_stack(|| match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => IntRange::new(0, 0),
        HirKind::Literal(literal) => {
            let runes = i64::try_from(String::from_utf8_lossy(&literal.0).chars().count())
                .unwrap_or(i64::MAX);
            IntRange::new(runes, runes)
        }
        HirKind::Class(_) => IntRange::new(1, 1),
        HirKind::Repetition(repetition) => {
            let max = repetition.max.map_or(i64::MAX, i64::from);
            hir_length_range(&repetition.sub).times(i64::from(repetition.min), max)
        }
        HirKind::Capture(capture) => hir_length_range(&capture.sub),
        HirKind::Concat(subs) => subs
            .iter()
            .fold(IntRange::new(0, 0), |acc, sub| acc.clamped_add(&hir_length_range(sub))),
        HirKind::Alternation(subs) => {
            let ranges: Vec<IntRange> = subs.iter().map(hir_length_range).collect();
            let start = ranges.iter().map(|r| r.start).min().unwrap_or(0);
            let end = ranges.iter().map(|r| r.end).max().unwrap_or(0);
            IntRange::new(start, end)
        }
    })
}

// Integer ranges

/// Regex matching the decimal representation of every integer in
/// `lower..=upper` and nothing else: no leading zeros, no `-0`.
///
/// With `word_bounded`, positive alternatives are preceded by a word
/// boundary so that an unanchored search does not find `12` inside `a12`,
/// and a trailing boundary rejects `12a`. Regexes embedded in a sequence are
/// built without boundaries.
pub fn int_range_regex(lower: i64, upper: i64, word_bounded: bool) -> String {
    let mut alternatives = Vec::new();
    let boundary = if word_bounded { r"\b" } else { "" };

    if lower < 0 {
        let neg_min = if upper < 0 { upper.unsigned_abs() } else { 1 };
        let neg_max = lower.unsigned_abs();
        let negative = unsigned_range_patterns(u128::from(neg_min), u128::from(neg_max));
        alternatives.push(format!("-(?:{})", negative.join("|")));
    }
    if upper >= 0 {
        let pos_min = u128::try_from(lower.max(0)).unwrap_or(0);
        let pos_max = u128::try_from(upper).unwrap_or(0);
        let positive = unsigned_range_patterns(pos_min, pos_max);
        alternatives.push(format!("{boundary}(?:{})", positive.join("|")));
    }

    format!("(?:{}){boundary}", alternatives.join("|"))
}

/// Split `min..=max` into runs whose bounds have the same digit count and
/// render each run as a sequence of digit classes.
fn unsigned_range_patterns(min: u128, max: u128) -> Vec<String> {
    let mut stops = vec![max];

    let mut nines = 1;
    let mut stop = fill_nines(min, nines);
    while min <= stop && stop <= max {
        if !stops.contains(&stop) {
            stops.push(stop);
        }
        nines += 1;
        stop = fill_nines(min, nines);
    }

    let mut zeros = 1;
    let mut stop = clear_digits(max + 1, zeros).saturating_sub(1);
    while min < stop && stop <= max {
        if !stops.contains(&stop) {
            stops.push(stop);
        }
        zeros += 1;
        stop = clear_digits(max + 1, zeros).saturating_sub(1);
    }

    stops.sort_unstable();

    let mut start = min;
    let mut patterns = Vec::with_capacity(stops.len());
    for stop in stops {
        patterns.push(run_pattern(start, stop));
        start = stop + 1;
    }
    patterns
}

/// `n` with its last `count` digits replaced by nines.
fn fill_nines(n: u128, count: u32) -> u128 {
    let digits = n.to_string();
    let keep = digits.len().saturating_sub(count as usize);
    let mut filled = digits[..keep].to_string();
    filled.extend(std::iter::repeat('9').take(count as usize));
    filled.parse().unwrap_or(u128::MAX)
}

/// `n` with its last `count` digits replaced by zeros.
fn clear_digits(n: u128, count: u32) -> u128 {
    match 10u128.checked_pow(count) {
        Some(power) => n - n % power,
        None => 0,
    }
}

/// Pattern for `start..=stop`, both with the same number of digits.
fn run_pattern(start: u128, stop: u128) -> String {
    let start = start.to_string();
    let stop = stop.to_string();
    let mut pattern = String::new();
    let mut any_digits = 0;

    for (a, b) in start.chars().zip(stop.chars()) {
        if a == b {
            pattern.push(a);
        } else if a != '0' || b != '9' {
            pattern.push_str(&format!("[{a}-{b}]"));
        } else {
            any_digits += 1;
        }
    }

    match any_digits {
        0 => {}
        1 => pattern.push_str("[0-9]"),
        n => pattern.push_str(&format!("[0-9]{{{n}}}")),
    }
    pattern
}

fn digit_count(n: u64) -> i64 {
    i64::try_from(n.to_string().len()).unwrap_or(i64::MAX)
}

/// Rune-count range of the decimal representations of `lower..=upper`.
pub fn int_range_length_range(lower: i64, upper: i64) -> IntRange {
    if lower < 0 {
        let abs_lower = lower.unsigned_abs();
        if upper < 0 {
            let abs_upper = upper.unsigned_abs();
            let longest = digit_count(abs_lower.max(abs_upper));
            let shortest = digit_count(abs_lower.min(abs_upper));
            IntRange::new(1 + shortest, 1 + longest)
        } else {
            let negative_longest = 1 + digit_count(abs_lower);
            let positive_longest = digit_count(upper.unsigned_abs());
            // `0` is always in the range
            IntRange::new(1, negative_longest.max(positive_longest))
        }
    } else {
        IntRange::new(
            digit_count(lower.unsigned_abs()),
            digit_count(upper.unsigned_abs()),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;

    fn full(source: &str) -> Regex {
        Regex::new(&format!("^(?:{source})$")).unwrap()
    }

    #[test]
    fn groups_are_demoted() {
        assert_eq!(demote_groups("(a)(?P<x>b)(?:c)").unwrap(), "(?:a)(?:b)(?:c)");
        assert_eq!(full(&demote_groups("((a)|b)+").unwrap()).captures_len(), 1);
    }

    #[test]
    fn regex_length_ranges() {
        assert_eq!(regex_length_range("abc").unwrap(), IntRange::new(3, 3));
        assert_eq!(regex_length_range("a?b").unwrap(), IntRange::new(1, 2));
        assert_eq!(regex_length_range("[a-z]+").unwrap(), IntRange::new(1, i64::MAX));
        assert_eq!(regex_length_range("é{2,3}").unwrap(), IntRange::new(2, 3));
        assert_eq!(regex_length_range("ab|c").unwrap(), IntRange::new(1, 2));
    }

    #[test]
    fn small_ranges() {
        let re = full(&int_range_regex(-10, 10, false));
        for ok in ["-10", "-9", "-1", "0", "1", "9", "10"] {
            assert!(re.is_match(ok), "{ok}");
        }
        for ko in ["-11", "-0", "11", "99", "01", "", "-"] {
            assert!(!re.is_match(ko), "{ko}");
        }
    }

    #[test]
    fn ranges_cover_exactly_their_members() {
        for (lower, upper) in [(0, 0), (3, 17), (99, 1001), (-250, -7), (-3, 120)] {
            let re = full(&int_range_regex(lower, upper, false));
            for n in (lower - 30)..=(upper + 30) {
                assert_eq!(
                    re.is_match(&n.to_string()),
                    (lower..=upper).contains(&n),
                    "{n} in {lower}..={upper}"
                );
            }
        }
    }

    #[test]
    fn extreme_bounds() {
        let re = full(&int_range_regex(i64::MIN, i64::MAX, true));
        assert!(re.is_match(&i64::MIN.to_string()));
        assert!(re.is_match(&i64::MAX.to_string()));
        assert!(!re.is_match("9223372036854775808"));
        assert!(!re.is_match("-9223372036854775809"));
    }

    #[test]
    fn unanchored_search_respects_boundaries() {
        let re = Regex::new(&int_range_regex(-99, 99, true)).unwrap();
        assert_eq!(re.find("-12-").map(|m| m.as_str()), Some("-12"));
        assert_eq!(re.find("a-12").map(|m| m.as_str()), Some("-12"));
        assert!(re.find("a12").is_none());
        assert!(re.find("123").is_none());
        assert!(re.find("12a").is_none());
    }

    #[test]
    fn int_range_lengths() {
        assert_eq!(int_range_length_range(-10, 10), IntRange::new(1, 3));
        assert_eq!(int_range_length_range(-100, -5), IntRange::new(2, 4));
        assert_eq!(int_range_length_range(7, 1234), IntRange::new(1, 4));
        assert_eq!(int_range_length_range(i64::MIN, i64::MAX), IntRange::new(1, 20));
    }
}
