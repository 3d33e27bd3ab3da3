use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::context::ContextConfig;
use crate::mutation::Mutation;
use crate::value::{Event, Secret};
use inox_ir::PatternQuantifier;

fn ctx() -> Context {
    Context::new_root(ContextConfig::default())
}

fn heap(pattern: Pattern) -> Heap<Pattern> {
    Heap::new(pattern)
}

fn named(ctx: &Context, name: &str) -> Heap<Pattern> {
    ctx.resolve_named_pattern(name).unwrap()
}

#[test]
fn exact_patterns_use_structural_equality() {
    let ctx = ctx();
    let pattern = Pattern::exact(Value::list(vec![Value::int(1)]));
    assert!(pattern.test(&ctx, &Value::list(vec![Value::int(1)])));
    assert!(!pattern.test(&ctx, &Value::list(vec![Value::int(2)])));
    assert!(Pattern::from_value(&Value::int(3)).test(&ctx, &Value::int(3)));
}

#[test]
fn disjoint_unions_need_exactly_one_match() {
    let ctx = ctx();
    let int = named(&ctx, "int");
    let one = heap(Pattern::exact(Value::int(1)));
    let disjoint = Pattern::Union {
        cases: vec![int.clone(), one.clone()],
        disjoint: true,
    };
    assert!(!disjoint.test(&ctx, &Value::int(1)));
    assert!(disjoint.test(&ctx, &Value::int(2)));
    assert!(Pattern::union(vec![int, one]).test(&ctx, &Value::int(1)));
}

#[test]
fn difference_and_optional() {
    let ctx = ctx();
    let not_one = Pattern::difference(named(&ctx, "int"), heap(Pattern::exact(Value::int(1))));
    assert!(not_one.test(&ctx, &Value::int(2)));
    assert!(!not_one.test(&ctx, &Value::int(1)));

    let optional = Pattern::optional(&ctx, named(&ctx, "int")).unwrap();
    assert!(optional.test(&ctx, &Value::Nil));
    assert!(optional.test(&ctx, &Value::int(5)));
    let already = heap(Pattern::exact(Value::Nil));
    assert_eq!(
        Pattern::optional(&ctx, already).unwrap_err(),
        PatternError::AlreadyOptional
    );
}

#[test]
fn object_patterns() {
    let ctx = ctx();
    let entry = |name: &str, optional| ObjectPatternEntry {
        name: name.into(),
        pattern: named(&ctx, "int"),
        optional,
    };
    let exact = Pattern::Object(ObjectPattern::new(vec![entry("a", false)], false));
    let inexact = Pattern::Object(ObjectPattern::new(vec![entry("a", false)], true));
    let with_optional =
        Pattern::Object(ObjectPattern::new(vec![entry("a", false), entry("b", true)], false));

    let a = Value::object(vec![("a".into(), Value::int(1))]);
    let ab = Value::object(vec![("a".into(), Value::int(1)), ("b".into(), Value::int(2))]);
    let a_str = Value::object(vec![("a".into(), Value::str("x"))]);

    assert!(exact.test(&ctx, &a));
    assert!(!exact.test(&ctx, &ab));
    assert!(!exact.test(&ctx, &a_str));
    assert!(inexact.test(&ctx, &ab));
    assert!(with_optional.test(&ctx, &a));
    assert!(with_optional.test(&ctx, &ab));
    assert!(!exact.test(&ctx, &Value::record(vec![("a".into(), Value::int(1))])));
}

#[test]
fn list_and_tuple_patterns() {
    let ctx = ctx();
    let ints = Pattern::List(ListPattern::of(named(&ctx, "int")));
    assert!(ints.test(&ctx, &Value::list(vec![Value::int(1), Value::int(2)])));
    assert!(!ints.test(&ctx, &Value::list(vec![Value::int(1), Value::str("a")])));

    let pair = Pattern::List(ListPattern::exact(vec![named(&ctx, "int"), named(&ctx, "str")]));
    assert!(pair.test(&ctx, &Value::list(vec![Value::int(1), Value::str("a")])));
    assert!(!pair.test(&ctx, &Value::list(vec![Value::int(1)])));

    let bounded = Pattern::List(ListPattern::with_counts(named(&ctx, "int"), 1, 2));
    assert!(!bounded.test(&ctx, &Value::list(vec![])));
    assert!(!bounded.test(&ctx, &Value::list(vec![Value::int(1); 3])));

    let tuple = Pattern::Tuple(TuplePattern::of(named(&ctx, "int")));
    assert!(tuple.test(&ctx, &Value::tuple(vec![Value::int(1)])));
    assert!(!tuple.test(&ctx, &Value::list(vec![Value::int(1)])));
}

#[test]
fn option_event_mutation_and_secret_patterns() {
    let ctx = ctx();
    let option = Pattern::Option {
        name: "level".into(),
        value: named(&ctx, "int"),
    };
    assert!(option.test(&ctx, &Value::option("level", Value::int(3))));
    assert!(!option.test(&ctx, &Value::option("verbose", Value::int(3))));

    let event = Pattern::Event(Some(named(&ctx, "int")));
    assert!(event.test(&ctx, &Value::event(Event::now(Value::int(1)))));
    assert!(!event.test(&ctx, &Value::event(Event::now(Value::str("a")))));

    let mutation = Pattern::Mutation {
        kind: MutationKind::AddProp,
        data0: named(&ctx, "any"),
    };
    assert!(mutation.test(&ctx, &Value::mutation(Mutation::add_prop("a", Value::int(1)))));
    assert!(!mutation.test(&ctx, &Value::mutation(Mutation::update_prop("a", Value::int(1)))));

    let secret = Pattern::Secret(Heap::new(StringPattern::from_regex("[a-z]+").unwrap()));
    assert!(secret.test(&ctx, &Value::secret(Secret::new("abc", None))));
    assert!(!secret.test(&ctx, &Value::secret(Secret::new("ABC", None))));
    assert!(!secret.test(&ctx, &Value::str("abc")));
}

#[test]
fn int_pattern_call_and_string_pattern() {
    let ctx = ctx();
    let int = named(&ctx, "int");
    let small = int
        .call(&ctx, &[Value::IntRange(IntRange::new(-10, 10))])
        .unwrap();
    assert!(small.test(&ctx, &Value::int(-10)));
    assert!(!small.test(&ctx, &Value::int(11)));

    let string = small.string_pattern().unwrap();
    for (input, expected) in [("-10", true), ("-11", false), ("0", true), ("-0", false), ("99", false)] {
        assert_eq!(string.test_str(input), expected, "{input}");
    }
    assert!(int
        .call(&ctx, &[Value::IntRange(IntRange::with_unknown_start(3))])
        .is_err());
    assert!(heap(Pattern::exact(Value::int(1))).call(&ctx, &[]).is_err());
}

#[test]
fn named_segment_groups() {
    let ctx = ctx();
    let pattern = Pattern::NamedSegmentPath(NamedSegmentPathPattern::new(vec![
        PathSegment::Static("/users/".into()),
        PathSegment::Named("id".into()),
    ]));
    let groups = pattern
        .match_groups(&ctx, &Value::path("/users/12"))
        .unwrap()
        .unwrap();
    assert_eq!(groups.prop(&ctx, "id").unwrap().as_string(), Some("12"));
    assert!(pattern
        .match_groups(&ctx, &Value::path("/users/12/x"))
        .unwrap()
        .is_none());
    assert!(named(&ctx, "int")
        .match_groups(&ctx, &Value::int(1))
        .is_err());
}

#[test]
fn structural_pattern_equality() {
    let ctx = ctx();
    let a = heap(Pattern::List(ListPattern::of(named(&ctx, "int"))));
    let b = heap(Pattern::List(ListPattern::of(named(&ctx, "int"))));
    let c = heap(Pattern::List(ListPattern::of(named(&ctx, "str"))));
    assert!(patterns_equal(&a, &b));
    assert!(!patterns_equal(&a, &c));
}

#[test]
fn random_values_match() {
    let ctx = ctx();
    let patterns = [
        heap(Pattern::List(ListPattern::of(named(&ctx, "int")))),
        heap(Pattern::IntRange(
            IntRangePattern::new(IntRange::new(0, 100), Some(7)).unwrap(),
        )),
        named(&ctx, "bool"),
    ];
    for pattern in &patterns {
        for _ in 0..10 {
            let value = pattern.random(&ctx).unwrap();
            assert!(pattern.test(&ctx, &value), "{pattern} / {value:?}");
        }
    }
}

#[test]
fn namespaces_are_sorted() {
    let namespace = PatternNamespace::new(
        "ns",
        vec![
            ("b".into(), heap(Pattern::exact(Value::int(2)))),
            ("a".into(), heap(Pattern::exact(Value::int(1)))),
        ],
    );
    assert_eq!(namespace.members()[0].0, "a");
    assert!(namespace.get("b").is_some());
    assert!(namespace.get("c").is_none());
}

// Length-range and regex laws

fn quantifier() -> impl Strategy<Value = (PatternQuantifier, usize)> {
    prop_oneof![
        Just((PatternQuantifier::ExactlyOne, 0)),
        Just((PatternQuantifier::AtLeastOne, 0)),
        Just((PatternQuantifier::ZeroOrMore, 0)),
        Just((PatternQuantifier::Optional, 0)),
        (1usize..5).prop_map(|n| (PatternQuantifier::ExactCount, n)),
    ]
}

proptest! {
    #[test]
    fn repeated_length_range_table(
        min in 0i64..20,
        extra in 0i64..20,
        (quantifier, count) in quantifier(),
    ) {
        let element = Heap::new(StringPattern::length_checking(min, min + extra).unwrap());
        let repeated = StringPattern::repeated(quantifier, count, element);
        let range = repeated.length_range();
        let expected = match quantifier {
            PatternQuantifier::ExactlyOne => IntRange::new(min, min + extra),
            PatternQuantifier::AtLeastOne => IntRange::new(min, i64::MAX),
            PatternQuantifier::ZeroOrMore => IntRange::new(0, i64::MAX),
            PatternQuantifier::Optional => IntRange::new(0, min + extra),
            PatternQuantifier::ExactCount => {
                let n = i64::try_from(count).unwrap();
                IntRange::new(min * n, (min + extra) * n)
            }
        };
        prop_assert_eq!(range, expected);
    }

    #[test]
    fn union_matches_iff_a_case_matches(
        cases in prop::collection::vec("[a-c]{1,3}", 1..4),
        input in "[a-c]{0,4}",
    ) {
        let heaps: Vec<Heap<StringPattern>> = cases
            .iter()
            .map(|c| Heap::new(StringPattern::exact(c.as_str())))
            .collect();
        let union = StringPattern::union(heaps.clone()).unwrap();
        prop_assert!(union.has_regex());
        prop_assert_eq!(
            union.test_str(&input),
            heaps.iter().any(|c| c.test_str(&input))
        );
    }

    #[test]
    fn union_of_regex_cases_matches_iff_a_case_matches(
        classes in prop::collection::vec("[a-d]{1,2}", 1..4),
        input in "[a-e]{0,5}",
    ) {
        let cases: Vec<Heap<StringPattern>> = classes
            .iter()
            .map(|class| StringPattern::from_regex(&format!("[{class}]+x?")).unwrap().shared())
            .collect();
        let union = StringPattern::union(cases.clone()).unwrap();
        prop_assert!(union.has_regex());
        prop_assert_eq!(
            union.test_str(&input),
            cases.iter().any(|c| c.test_str(&input))
        );
    }

    #[test]
    fn test_is_full_match_within_length_range(
        input in "[a-d0-9]{0,8}",
        start in 0i64..4,
        extra in 0i64..5,
    ) {
        let pattern = StringPattern::from_regex("[a-d]*[0-9]?")
            .unwrap()
            .call(&[Value::IntRange(IntRange::new(start, start + extra))])
            .unwrap();
        let full = regex::Regex::new(&format!("^(?:{})$", pattern.regex().unwrap())).unwrap();
        let len = i64::try_from(input.chars().count()).unwrap();
        let range = pattern.effective_length_range();
        prop_assert_eq!(
            pattern.test_str(&input),
            full.is_match(&input) && range.start <= len && len <= range.end
        );
    }

    #[test]
    fn int_range_strings(lower in -300i64..300, width in 0i64..300, n in -700i64..700) {
        let upper = lower + width;
        let pattern = StringPattern::int_range(IntRange::new(lower, upper)).unwrap();
        prop_assert_eq!(pattern.test_str(&n.to_string()), (lower..=upper).contains(&n));
    }
}
