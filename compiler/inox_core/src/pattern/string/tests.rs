use pretty_assertions::assert_eq;

use super::*;
use crate::context::ContextConfig;
use crate::pattern::Pattern;

fn ctx() -> Context {
    Context::new_root(ContextConfig::default())
}

fn exact(s: &str) -> Heap<StringPattern> {
    Heap::new(StringPattern::exact(s))
}

fn group_texts(groups: Option<Vec<(String, Value)>>) -> Option<Vec<(String, String)>> {
    groups.map(|groups| {
        groups
            .into_iter()
            .map(|(k, v)| (k, v.as_str().unwrap_or_default().to_string()))
            .collect()
    })
}

fn groups(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn sequence_captures_named_groups() {
    let ctx = ctx();
    let pattern = StringPattern::sequence(
        vec![exact("12"), exact("AB")],
        vec![Some("digits".into()), Some("letters".into())],
    )
    .unwrap();

    assert!(pattern.test(&ctx, &Value::str("12AB")));
    assert!(!pattern.test(&ctx, &Value::str("12ABC")));
    assert_eq!(
        group_texts(pattern.match_groups(&ctx, &Value::str("12AB")).unwrap()),
        Some(groups(&[("0", "12AB"), ("digits", "12"), ("letters", "AB")]))
    );
    assert!(pattern.match_groups(&ctx, &Value::str("12AC")).unwrap().is_none());
}

#[test]
fn only_top_level_groups_capture() {
    let inner = Heap::new(StringPattern::from_regex("(a)(b)").unwrap());
    let pattern = StringPattern::sequence(
        vec![inner, Heap::new(StringPattern::from_regex("(c)").unwrap())],
        vec![None, Some("c".into())],
    )
    .unwrap();
    assert_eq!(pattern.regex(), Some("(?:(?:a)(?:b))((?:c))"));
    let compiled = regex::Regex::new(pattern.regex().unwrap()).unwrap();
    assert_eq!(compiled.captures_len(), 2);
}

#[test]
fn int_range_string_pattern() {
    let ctx = ctx();
    let pattern = StringPattern::int_range(IntRange::new(-10, 10)).unwrap();
    for (input, expected) in [("-10", true), ("-11", false), ("0", true), ("-0", false), ("99", false)] {
        assert_eq!(pattern.test(&ctx, &Value::str(input)), expected, "{input}");
    }
    assert_eq!(pattern.parse(&ctx, "-7").unwrap().as_int(), Some(-7));
    assert!(pattern.parse(&ctx, "-0").is_err());
    assert!(pattern.parse(&ctx, "11").is_err());
    assert!(StringPattern::int_range(IntRange::new(3, 1)).is_err());
}

#[test]
fn find_uses_word_boundaries_for_int_ranges() {
    let ctx = ctx();
    let pattern = StringPattern::int_range(IntRange::new(0, 99)).unwrap();
    let found = pattern
        .find_matches(&ctx, &Value::str("a1 22 333 4"), FindConfig::All)
        .unwrap();
    let found: Vec<&str> = found.iter().filter_map(Value::as_string).collect();
    assert_eq!(found, vec!["22", "4"]);
}

#[test]
fn union_tests_cases_in_order() {
    let ctx = ctx();
    let pattern = StringPattern::union(vec![exact("a"), exact("bc")]).unwrap();
    assert_eq!(pattern.regex(), Some("(?:a|bc)"));
    assert!(pattern.test(&ctx, &Value::str("bc")));
    assert!(!pattern.test(&ctx, &Value::str("abc")));
    assert_eq!(pattern.length_range(), IntRange::new(1, 2));
}

#[test]
fn union_without_regex_falls_back_to_cases() {
    let ctx = ctx();
    let short = Heap::new(StringPattern::length_checking(1, 2).unwrap());
    let pattern = StringPattern::union(vec![short, exact("hello")]).unwrap();
    assert!(!pattern.has_regex());
    assert!(pattern.test(&ctx, &Value::str("ab")));
    assert!(pattern.test(&ctx, &Value::str("hello")));
    assert!(!pattern.test(&ctx, &Value::str("abc")));
}

#[test]
fn union_of_regexless_cases_is_rejected() {
    let a = Heap::new(StringPattern::length_checking(1, 2).unwrap());
    let b = Heap::new(StringPattern::path(None));
    assert_eq!(
        StringPattern::union(vec![a, b]).unwrap_err(),
        PatternError::NoTerminalCase
    );
}

#[test]
fn repeated_elements() {
    let ctx = ctx();
    let ab = exact("ab");
    let plus = StringPattern::repeated(PatternQuantifier::AtLeastOne, 0, ab.clone());
    assert!(plus.test(&ctx, &Value::str("ababab")));
    assert!(!plus.test(&ctx, &Value::str("")));
    let three = StringPattern::repeated(PatternQuantifier::ExactCount, 3, ab);
    assert!(three.test(&ctx, &Value::str("ababab")));
    assert!(!three.test(&ctx, &Value::str("abab")));
    assert_eq!(three.length_range(), IntRange::new(6, 6));
}

#[test]
fn recursive_patterns_match_without_regex() {
    let ctx = ctx();
    let nested = StringPattern::sequence(
        vec![
            exact("("),
            Heap::new(StringPattern::dynamic("parens", &ctx)),
            exact(")"),
        ],
        vec![],
    )
    .unwrap();
    let parens = StringPattern::union(vec![exact("x"), Heap::new(nested)]).unwrap();
    ctx.add_named_pattern("parens", Heap::new(Pattern::string(parens)))
        .unwrap();
    let parens = ctx.resolve_named_pattern("parens").unwrap();

    assert!(parens.test(&ctx, &Value::str("x")));
    assert!(parens.test(&ctx, &Value::str("((x))")));
    assert!(!parens.test(&ctx, &Value::str("((x)")));
}

#[test]
fn dynamic_elements_resolve_late() {
    let ctx = ctx();
    let pattern = StringPattern::sequence(
        vec![exact("v"), Heap::new(StringPattern::dynamic("version", &ctx))],
        vec![],
    )
    .unwrap();
    assert!(!pattern.has_regex());
    assert!(!pattern.test(&ctx, &Value::str("v1")));

    let digits = StringPattern::from_regex("[0-9]+").unwrap();
    ctx.add_named_pattern("version", Heap::new(Pattern::string(digits)))
        .unwrap();
    assert!(pattern.has_regex());
    assert!(pattern.test(&ctx, &Value::str("v12")));
}

#[test]
fn call_narrows_the_length_range() {
    let ctx = ctx();
    let pattern = StringPattern::from_regex("[a-z]+").unwrap();
    let narrowed = pattern.call(&[Value::IntRange(IntRange::new(2, 3))]).unwrap();
    assert!(!narrowed.test(&ctx, &Value::str("a")));
    assert!(narrowed.test(&ctx, &Value::str("abc")));
    assert!(!narrowed.test(&ctx, &Value::str("abcd")));
    assert_eq!(narrowed.effective_length_range(), IntRange::new(2, 3));
    assert_eq!(narrowed.length_range(), IntRange::from_start(1));

    assert!(pattern.call(&[Value::IntRange(IntRange::new(0, 3))]).is_err());
    assert!(pattern
        .call(&[Value::IntRange(IntRange::with_unknown_start(3))])
        .is_err());
    assert!(pattern.call(&[Value::int(3)]).is_err());
    assert!(StringPattern::exact("a")
        .call(&[Value::IntRange(IntRange::new(1, 1))])
        .is_err());
}

#[test]
fn too_large_strings_are_rejected() {
    let ctx = ctx();
    let pattern = StringPattern::from_regex(".*").unwrap();
    let huge = Value::str("a".repeat(MAX_TESTED_STRING_BYTE_LENGTH + 1));
    assert!(!pattern.test(&ctx, &huge));
    let err = pattern.find_matches(&ctx, &huge, FindConfig::First).unwrap_err();
    assert_eq!(err.kind, crate::errors::EvalErrorKind::TestedStringTooLarge);
}

#[test]
fn rune_ranges_parse_runes() {
    let ctx = ctx();
    let pattern = StringPattern::rune_range(RuneRange::new('a', 'f'));
    assert!(pattern.test(&ctx, &Value::str("c")));
    assert!(!pattern.test(&ctx, &Value::str("g")));
    assert!(matches!(pattern.parse(&ctx, "e").unwrap(), Value::Rune('e')));
}

#[test]
fn paths_get_a_relative_prefix() {
    let ctx = ctx();
    let pattern = StringPattern::path(None);
    let parsed = pattern.parse(&ctx, "a/b").unwrap();
    assert!(matches!(&parsed, Value::Path(p) if &**p == "./a/b"));
    let under_tmp = StringPattern::path(Some("/tmp/*".into()));
    assert!(under_tmp.test(&ctx, &Value::str("/tmp/x")));
    assert!(!under_tmp.test(&ctx, &Value::str("/etc/x")));
}

#[test]
fn random_strings_match_their_pattern() {
    let ctx = ctx();
    let patterns = [
        StringPattern::from_regex("[a-c]{2,4}-[0-9]+").unwrap(),
        StringPattern::int_range(IntRange::new(-50, 50)).unwrap(),
        StringPattern::sequence(vec![exact("id-"), exact("x")], vec![]).unwrap(),
    ];
    for pattern in &patterns {
        for _ in 0..20 {
            let value = pattern.random(&ctx).unwrap();
            assert!(pattern.test(&ctx, &value), "{pattern} / {value:?}");
        }
    }
}
