//! Named patterns and pattern namespaces seeded into every root context.
//!
//! Most defaults are [`TypePattern`]s: a name plus plain function pointers for
//! `test`, and where it makes sense `string_pattern`, `call` and `random`.
//! The few defaults that are structural (`%dir_entry`, `%secret-string`, the
//! namespace members describing records) are built from ordinary patterns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};

use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::MutationKind;
use crate::pattern::{
    FloatRangePattern, IntRangePattern, ObjectPattern, ObjectPatternEntry, Pattern,
    PatternError, PatternNamespace, StringParser, StringPattern, TuplePattern, TypePattern,
};
use crate::value::{FloatRange, Heap, IntRange, Ulid, Value};

/// Register the default named patterns and namespaces in `ctx`.
pub fn register(ctx: &Context) {
    let patterns = named_patterns();
    let count = patterns.len();
    for (name, pattern) in patterns {
        if let Err(error) = ctx.add_named_pattern(name, pattern) {
            tracing::debug!(name, %error, "default pattern not registered");
        }
    }
    for namespace in namespaces() {
        let name = namespace.name.clone();
        if let Err(error) = ctx.add_pattern_namespace(name.clone(), Heap::new(namespace)) {
            tracing::debug!(%name, %error, "default pattern namespace not registered");
        }
    }
    tracing::trace!(count, "default patterns registered");
}

fn type_pattern(pattern: TypePattern) -> Heap<Pattern> {
    Heap::new(Pattern::Type(pattern))
}

fn simple(name: &str, test: fn(&Value) -> bool) -> Heap<Pattern> {
    type_pattern(TypePattern::new(name, test))
}

fn entry(name: &str, pattern: &Heap<Pattern>) -> ObjectPatternEntry {
    ObjectPatternEntry {
        name: name.to_string(),
        pattern: pattern.clone(),
        optional: false,
    }
}

fn named_patterns() -> Vec<(&'static str, Heap<Pattern>)> {
    let any = simple("any", |_| true);
    let string = type_pattern(
        TypePattern::new("str", Value::is_string_like)
            .with_string_pattern(|| Some(StringPattern::any_string()))
            .with_random(random_str),
    );
    let int = type_pattern(
        TypePattern::new("int", |v| matches!(v, Value::Int(_)))
            .with_string_pattern(|| StringPattern::int_range(IntRange::new(i64::MIN, i64::MAX)).ok())
            .with_call(call_int)
            .with_random(|_| Ok(Value::int(fastrand::i64(..)))),
    );
    let boolean = type_pattern(
        TypePattern::new("bool", |v| matches!(v, Value::Bool(_)))
            .with_random(|_| Ok(Value::Bool(fastrand::bool()))),
    );
    let path = type_pattern(
        TypePattern::new("path", |v| matches!(v, Value::Path(_)))
            .with_string_pattern(|| Some(StringPattern::path(None)))
            .with_random(|_| Ok(Value::path(format!("./{}", random_word())))),
    );
    let filemode = simple("filemode", |v| matches!(v, Value::FileMode(_)));
    let datetime = simple("datetime", |v| matches!(v, Value::DateTime(_)));
    let byte_count = simple("byte-count", |v| matches!(v, Value::ByteCount(_)));

    let dir_entry = Heap::new(Pattern::Record(ObjectPattern::new(
        vec![
            entry("abs-path", &path),
            entry("is-dir", &boolean),
            entry("size", &byte_count),
            entry("mode", &filemode),
            entry("mod-time", &datetime),
            entry("name", &string),
        ],
        false,
    )));

    vec![
        ("any", any),
        (
            "serializable",
            simple("serializable", Value::is_serializable),
        ),
        (
            "ident",
            type_pattern(
                TypePattern::new("ident", |v| matches!(v, Value::Identifier(_)))
                    .with_random(|_| Ok(Value::identifier(random_word()))),
            ),
        ),
        (
            "propname",
            type_pattern(
                TypePattern::new("propname", |v| matches!(v, Value::PropertyName(_)))
                    .with_random(|_| Ok(Value::property_name(random_word()))),
            ),
        ),
        (
            "rune",
            type_pattern(
                TypePattern::new("rune", |v| matches!(v, Value::Rune(_)))
                    .with_random(|_| Ok(Value::Rune(fastrand::alphanumeric()))),
            ),
        ),
        (
            "byte",
            type_pattern(
                TypePattern::new("byte", |v| matches!(v, Value::Byte(_)))
                    .with_random(|_| Ok(Value::Byte(fastrand::u8(..)))),
            ),
        ),
        ("str", string.clone()),
        ("path", path.clone()),
        ("url", simple("url", |v| matches!(v, Value::Url(_)))),
        ("scheme", simple("scheme", |v| matches!(v, Value::Scheme(_)))),
        ("host", simple("host", |v| matches!(v, Value::Host(_)))),
        (
            "emailaddr",
            type_pattern(
                TypePattern::new("emailaddr", |v| matches!(v, Value::EmailAddress(_)))
                    .with_string_pattern(|| StringPattern::from_regex(EMAIL_ADDRESS_REGEX).ok()),
            ),
        ),
        ("object", simple("object", |v| matches!(v, Value::Object(_)))),
        (
            "record",
            type_pattern(
                TypePattern::new("record", |v| matches!(v, Value::Record(_)))
                    .with_call(call_record),
            ),
        ),
        (
            "tuple",
            type_pattern(
                TypePattern::new("tuple", |v| matches!(v, Value::Tuple(_))).with_call(call_tuple),
            ),
        ),
        ("list", simple("list", |v| matches!(v, Value::List(_)))),
        ("dict", simple("dict", |v| matches!(v, Value::Dictionary(_)))),
        ("runes", simple("runes", |v| matches!(v, Value::RuneSlice(_)))),
        ("bytes", simple("bytes", |v| matches!(v, Value::ByteSlice(_)))),
        ("keylist", simple("keylist", |v| matches!(v, Value::KeyList(_)))),
        ("bool", boolean.clone()),
        ("int", int.clone()),
        (
            "float",
            type_pattern(
                TypePattern::new("float", |v| matches!(v, Value::Float(_)))
                    .with_string_pattern(|| {
                        StringPattern::float_range(FloatRange::new(-f64::MAX, f64::MAX, true)).ok()
                    })
                    .with_call(call_float)
                    .with_random(|_| Ok(Value::Float((fastrand::f64() - 0.5) * 2e6))),
            ),
        ),
        ("line-count", simple("line-count", |v| matches!(v, Value::LineCount(_)))),
        ("rune-count", simple("rune-count", |v| matches!(v, Value::RuneCount(_)))),
        ("byte-count", byte_count.clone()),
        ("filemode", filemode.clone()),
        ("date", simple("date", |v| matches!(v, Value::Date(_)))),
        ("datetime", datetime.clone()),
        ("duration", simple("duration", |v| matches!(v, Value::Duration(_)))),
        ("year", simple("year", |v| matches!(v, Value::Year(_)))),
        ("port", simple("port", |v| matches!(v, Value::Port(_)))),
        ("pattern", simple("pattern", |v| matches!(v, Value::Pattern(_)))),
        (
            "readable",
            simple("readable", |v| {
                matches!(
                    v,
                    Value::Str(_) | Value::ByteSlice(_) | Value::RuneSlice(_) | Value::Stream(_)
                )
            }),
        ),
        ("reader", simple("reader", |v| matches!(v, Value::Stream(_)))),
        ("iterable", simple("iterable", Value::is_iterable)),
        (
            "serializable-iterable",
            simple("serializable-iterable", |v| {
                v.is_iterable() && v.is_serializable()
            }),
        ),
        ("indexable", simple("indexable", Value::is_indexable)),
        (
            "value-receiver",
            simple("value-receiver", |v| matches!(v, Value::Object(_))),
        ),
        (
            "strlike",
            simple("strlike", |v| matches!(v, Value::Str(_) | Value::RuneSlice(_))),
        ),
        (
            "host-pattern",
            simple("host-pattern", |v| matches!(v, Value::HostPattern(_))),
        ),
        (
            "path-pattern",
            simple("path-pattern", |v| matches!(v, Value::PathPattern(_))),
        ),
        (
            "url-pattern",
            simple("url-pattern", |v| matches!(v, Value::UrlPattern(_))),
        ),
        ("opt", simple("opt", |v| matches!(v, Value::Option(_)))),
        ("dir_entry", dir_entry),
        (
            "event",
            type_pattern(
                TypePattern::new("event", |v| matches!(v, Value::Event(_))).with_call(call_event),
            ),
        ),
        (
            "mutation",
            type_pattern(
                TypePattern::new("mutation", |v| matches!(v, Value::Mutation(_)))
                    .with_call(call_mutation),
            ),
        ),
        // Values delivered by `sendval` reach handlers wrapped in events.
        ("message", simple("message", |v| matches!(v, Value::Event(_)))),
        ("error", simple("error", |v| matches!(v, Value::Error(_)))),
        ("int-range", simple("int-range", |v| matches!(v, Value::IntRange(_)))),
        // No value kind records its history in this runtime.
        ("value-history", simple("value-history", |_| false)),
        (
            "sysgraph",
            simple("sysgraph", |v| matches!(v, Value::SystemGraph(_))),
        ),
        (
            "secret",
            type_pattern(
                TypePattern::new("secret", |v| matches!(v, Value::Secret(_))).with_call(call_secret),
            ),
        ),
        (
            "secret-string",
            Heap::new(Pattern::Secret(Heap::new(StringPattern::any_string()))),
        ),
        (
            "ulid",
            type_pattern(
                TypePattern::new("ulid", |v| matches!(v, Value::Ulid(_)))
                    .with_string_pattern(|| {
                        Some(StringPattern::parser_based(Arc::new(UlidParser)))
                    })
                    .with_random(|_| Ok(Value::Ulid(Ulid::generate()))),
            ),
        ),
        (
            "uuidv4",
            type_pattern(
                TypePattern::new("uuidv4", |v| matches!(v, Value::UuidV4(_)))
                    .with_string_pattern(|| {
                        Some(StringPattern::parser_based(Arc::new(UuidV4Parser)))
                    })
                    .with_random(|_| Ok(Value::UuidV4(uuid::Uuid::new_v4()))),
            ),
        ),
        ("__val", type_pattern(TypePattern::new("__val", |_| false).with_call(call_val))),
    ]
}

fn namespaces() -> Vec<PatternNamespace> {
    let string = simple("str", Value::is_string_like);
    let int_range = simple("int-range", |v| matches!(v, Value::IntRange(_)));

    let node = Heap::new(Pattern::Record(ObjectPattern::new(
        vec![entry("kind", &string), entry("span", &int_range)],
        true,
    )));
    let module = Heap::new(Pattern::Record(ObjectPattern::new(
        vec![entry("name", &string), entry("kind", &string)],
        true,
    )));
    let source_position = simple("inox.source_position", |v| {
        matches!(v, Value::SourcePosition(_))
    });
    let graph_node = Heap::new(Pattern::Record(ObjectPattern::new(
        vec![entry("name", &string), entry("type_name", &string)],
        false,
    )));

    let date_format = |format: DateFormat| {
        Heap::new(Pattern::string(StringPattern::parser_based(Arc::new(
            DateFormatParser(format),
        ))))
    };

    vec![
        PatternNamespace::new(
            "inox",
            vec![
                ("node".into(), node),
                ("module".into(), module),
                ("source_position".into(), source_position),
            ],
        ),
        PatternNamespace::new(
            "date-format",
            vec![
                ("rfc822".into(), date_format(DateFormat::Rfc822)),
                ("date-only".into(), date_format(DateFormat::DateOnly)),
                ("time-only".into(), date_format(DateFormat::TimeOnly)),
            ],
        ),
        PatternNamespace::new("sysgraph", vec![("node".into(), graph_node)]),
    ]
}

// Calls

const EMAIL_ADDRESS_REGEX: &str = r"[-a-zA-Z0-9_+.]+@[-a-zA-Z0-9_.]+\.[a-zA-Z0-9]+";

fn single_arg<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, EvalError> {
    match args {
        [arg] => Ok(arg),
        [] => Err(errors::missing_argument(name)),
        _ => Err(errors::invalid_argument(format!(
            "a single {name} argument is expected"
        ))),
    }
}

/// Pattern argument; bare values stand for exact-value patterns.
fn pattern_arg(value: &Value) -> Heap<Pattern> {
    match value {
        Value::Pattern(pattern) => pattern.clone(),
        other => Pattern::from_value(other),
    }
}

fn call_int(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    let mut range = None;
    for arg in args {
        match arg {
            Value::IntRange(r) => {
                if range.replace(*r).is_some() {
                    return Err(errors::argument_given_twice("range"));
                }
            }
            other => {
                return Err(errors::invalid_argument(format!(
                    "a(n) {} is not an integer range",
                    other.type_name()
                )))
            }
        }
    }
    let range = range.ok_or_else(|| errors::missing_argument("range"))?;
    if range.unknown_start {
        return Err(PatternError::UnknownStart.into());
    }
    Ok(Pattern::IntRange(IntRangePattern::new(range, None)?))
}

fn call_float(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    match single_arg(args, "range")? {
        Value::FloatRange(range) => Ok(Pattern::FloatRange(FloatRangePattern::new(*range, None)?)),
        other => Err(errors::invalid_argument(format!(
            "a(n) {} is not a float range",
            other.type_name()
        ))),
    }
}

fn call_record(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    let arg = single_arg(args, "pattern")?;
    match arg.as_pattern().map(|p| &**p) {
        Some(Pattern::Object(object) | Pattern::Record(object)) => Ok(Pattern::Record(object.clone())),
        _ => Err(errors::invalid_argument(
            "an object or record pattern is expected",
        )),
    }
}

fn call_tuple(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    let element = pattern_arg(single_arg(args, "element pattern")?);
    Ok(Pattern::Tuple(TuplePattern::of(element)))
}

fn call_event(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    match args {
        [] => Ok(Pattern::Event(None)),
        [value_pattern] => Ok(Pattern::Event(Some(pattern_arg(value_pattern)))),
        _ => Err(errors::invalid_argument("at most one argument is expected")),
    }
}

fn call_mutation(ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    let (kind, data0) = match args {
        [kind] => (kind, None),
        [kind, data0] => (kind, Some(data0)),
        [] => return Err(errors::missing_argument("kind")),
        _ => return Err(errors::invalid_argument("at most two arguments are expected")),
    };
    let kind = match kind {
        Value::Identifier(name) => MutationKind::from_name(name)
            .ok_or_else(|| errors::invalid_argument(format!("unknown mutation kind #{name}")))?,
        other => {
            return Err(errors::invalid_argument(format!(
                "the mutation kind should be an identifier, not a(n) {}",
                other.type_name()
            )))
        }
    };
    let data0 = match data0 {
        Some(value) => pattern_arg(value),
        None => ctx
            .resolve_named_pattern("any")
            .unwrap_or_else(|| simple("any", |_| true)),
    };
    Ok(Pattern::Mutation { kind, data0 })
}

fn call_secret(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    let arg = single_arg(args, "pattern")?;
    arg.as_pattern()
        .and_then(|p| p.string_pattern())
        .map(Pattern::Secret)
        .ok_or_else(|| errors::invalid_argument("a string pattern is expected"))
}

fn call_val(_ctx: &Context, args: &[Value]) -> Result<Pattern, EvalError> {
    Ok(Pattern::exact(single_arg(args, "value")?.clone()))
}

// Random values

fn random_word() -> String {
    let len = fastrand::usize(1..=8);
    std::iter::repeat_with(fastrand::lowercase).take(len).collect()
}

fn random_str(_ctx: &Context) -> Result<Value, EvalError> {
    let len = fastrand::usize(0..=8);
    Ok(Value::str(
        std::iter::repeat_with(fastrand::alphanumeric)
            .take(len)
            .collect::<String>(),
    ))
}

// Parsers

struct UlidParser;

impl StringParser for UlidParser {
    fn name(&self) -> &str {
        "ulid"
    }

    fn validate(&self, s: &str) -> bool {
        Ulid::parse(s).is_some()
    }

    fn parse(&self, s: &str) -> Result<Value, EvalError> {
        Ulid::parse(s)
            .map(Value::Ulid)
            .ok_or_else(|| errors::parse_failure(format!("invalid ulid: {s}")))
    }
}

struct UuidV4Parser;

impl UuidV4Parser {
    fn parse_v4(s: &str) -> Option<uuid::Uuid> {
        uuid::Uuid::parse_str(s)
            .ok()
            .filter(|id| id.get_version_num() == 4)
    }
}

impl StringParser for UuidV4Parser {
    fn name(&self) -> &str {
        "uuidv4"
    }

    fn validate(&self, s: &str) -> bool {
        Self::parse_v4(s).is_some()
    }

    fn parse(&self, s: &str) -> Result<Value, EvalError> {
        Self::parse_v4(s)
            .map(Value::UuidV4)
            .ok_or_else(|| errors::parse_failure(format!("invalid uuidv4: {s}")))
    }
}

#[derive(Copy, Clone)]
enum DateFormat {
    /// `02 Jan 06 15:04 -0700`
    Rfc822,
    /// `2006-01-02`
    DateOnly,
    /// `15:04:05`, parsed as the duration since midnight.
    TimeOnly,
}

struct DateFormatParser(DateFormat);

impl StringParser for DateFormatParser {
    fn name(&self) -> &str {
        match self.0 {
            DateFormat::Rfc822 => "rfc822",
            DateFormat::DateOnly => "date-only",
            DateFormat::TimeOnly => "time-only",
        }
    }

    fn validate(&self, s: &str) -> bool {
        self.parse(s).is_ok()
    }

    fn parse(&self, s: &str) -> Result<Value, EvalError> {
        let parsed = match self.0 {
            DateFormat::Rfc822 => DateTime::parse_from_str(s, "%d %b %y %H:%M %z").map(Value::DateTime),
            DateFormat::DateOnly => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Value::Date),
            DateFormat::TimeOnly => NaiveTime::parse_from_str(s, "%H:%M:%S").map(|time| {
                Value::Duration(Duration::from_secs(u64::from(time.num_seconds_from_midnight())))
            }),
        };
        parsed.map_err(|error| errors::parse_failure(format!("{}: {error}", self.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::mutation::Mutation;
    use crate::value::{Event, Secret};

    fn ctx() -> Context {
        Context::new_root(ContextConfig::default())
    }

    fn named(ctx: &Context, name: &str) -> Heap<Pattern> {
        ctx.resolve_named_pattern(name).unwrap()
    }

    #[test]
    fn every_listed_name_is_registered() {
        let ctx = ctx();
        for name in [
            "any", "serializable", "ident", "propname", "rune", "byte", "str", "path", "url",
            "scheme", "host", "emailaddr", "object", "record", "tuple", "list", "dict", "runes",
            "bytes", "keylist", "bool", "int", "float", "line-count", "rune-count",
            "byte-count", "filemode", "date", "pattern", "readable", "reader", "iterable",
            "serializable-iterable", "indexable", "value-receiver", "strlike", "host-pattern",
            "path-pattern", "url-pattern", "opt", "dir_entry", "event", "mutation", "message",
            "error", "int-range", "value-history", "sysgraph", "secret", "secret-string",
            "__val",
        ] {
            assert!(ctx.resolve_named_pattern(name).is_some(), "%{name}");
        }
        for (namespace, member) in [
            ("inox", "node"),
            ("inox", "module"),
            ("inox", "source_position"),
            ("date-format", "rfc822"),
            ("date-format", "date-only"),
            ("date-format", "time-only"),
            ("sysgraph", "node"),
        ] {
            let ns = ctx.resolve_pattern_namespace(namespace).unwrap();
            assert!(ns.get(member).is_some(), "%{namespace}.{member}");
        }
    }

    #[test]
    fn opting_out_skips_defaults() {
        let ctx = Context::new_root(ContextConfig {
            no_default_patterns: true,
            ..ContextConfig::default()
        });
        assert!(ctx.resolve_named_pattern("int").is_none());
        assert!(ctx.resolve_pattern_namespace("inox").is_none());
    }

    #[test]
    fn type_patterns_test_their_kind() {
        let ctx = ctx();
        assert!(named(&ctx, "str").test(&ctx, &Value::str("a")));
        assert!(!named(&ctx, "str").test(&ctx, &Value::int(1)));
        assert!(named(&ctx, "iterable").test(&ctx, &Value::list(vec![])));
        assert!(!named(&ctx, "iterable").test(&ctx, &Value::int(1)));
        assert!(named(&ctx, "any").test(&ctx, &Value::Nil));
        assert!(!named(&ctx, "serializable").test(&ctx, &Value::secret(Secret::new("x", None))));
    }

    #[test]
    fn parameterised_patterns() {
        let ctx = ctx();
        let ints = named(&ctx, "tuple")
            .call(&ctx, &[Value::pattern(Pattern::Exact(Value::int(1)))])
            .unwrap();
        assert!(ints.test(&ctx, &Value::tuple(vec![Value::int(1), Value::int(1)])));
        assert!(!ints.test(&ctx, &Value::tuple(vec![Value::int(2)])));

        let event = named(&ctx, "event").call(&ctx, &[Value::int(3)]).unwrap();
        assert!(event.test(&ctx, &Value::event(Event::now(Value::int(3)))));

        let add_prop = named(&ctx, "mutation")
            .call(&ctx, &[Value::identifier("add-prop")])
            .unwrap();
        assert!(add_prop.test(&ctx, &Value::mutation(Mutation::add_prop("a", Value::Nil))));
        assert!(named(&ctx, "mutation")
            .call(&ctx, &[Value::identifier("not-a-kind")])
            .is_err());

        let object = Pattern::Object(ObjectPattern::new(vec![entry("a", &named(&ctx, "int"))], false));
        let record = named(&ctx, "record")
            .call(&ctx, &[Value::pattern(object)])
            .unwrap();
        assert!(record.test(&ctx, &Value::record(vec![("a".into(), Value::int(1))])));
        assert!(!record.test(&ctx, &Value::object(vec![("a".into(), Value::int(1))])));

        let val = named(&ctx, "__val").call(&ctx, &[Value::str("x")]).unwrap();
        assert!(val.test(&ctx, &Value::str("x")));
    }

    #[test]
    fn secret_patterns() {
        let ctx = ctx();
        let secret = Value::secret(Secret::new("s3cret", None));
        assert!(named(&ctx, "secret-string").test(&ctx, &secret));
        let digits = Value::pattern(Pattern::string(StringPattern::from_regex("[0-9]+").unwrap()));
        let numeric = named(&ctx, "secret").call(&ctx, &[digits]).unwrap();
        assert!(!numeric.test(&ctx, &secret));
        assert!(numeric.test(&ctx, &Value::secret(Secret::new("123", None))));
    }

    #[test]
    fn parser_based_string_patterns() {
        let ctx = ctx();
        let ulid = Ulid::generate().to_string();
        let pattern = named(&ctx, "ulid").string_pattern().unwrap();
        assert!(pattern.test_str(&ulid));
        assert!(!pattern.test_str("not a ulid"));
        assert!(matches!(pattern.parse(&ctx, &ulid).unwrap(), Value::Ulid(_)));

        let uuid = uuid::Uuid::new_v4().to_string();
        let pattern = named(&ctx, "uuidv4").string_pattern().unwrap();
        assert!(pattern.test_str(&uuid));

        let date_only = ctx
            .resolve_pattern_namespace("date-format")
            .unwrap()
            .get("date-only")
            .cloned()
            .unwrap()
            .string_pattern()
            .unwrap();
        assert!(date_only.test_str("2024-02-29"));
        assert!(!date_only.test_str("2023-02-29"));
        let time_only = ctx
            .resolve_pattern_namespace("date-format")
            .unwrap()
            .get("time-only")
            .cloned()
            .unwrap()
            .string_pattern()
            .unwrap();
        let parsed = time_only.parse(&ctx, "01:00:30").unwrap();
        assert!(parsed.equals(&Value::Duration(Duration::from_secs(3630))));
    }

    #[test]
    fn dir_entry_shape() {
        let ctx = ctx();
        let entry = Value::record(vec![
            ("abs-path".into(), Value::path("/a")),
            ("is-dir".into(), Value::Bool(false)),
            ("size".into(), Value::ByteCount(3)),
            ("mode".into(), Value::FileMode(0o644)),
            ("mod-time".into(), Value::DateTime(chrono::Utc::now().fixed_offset())),
            ("name".into(), Value::str("a")),
        ]);
        assert!(named(&ctx, "dir_entry").test(&ctx, &entry));
    }

    #[test]
    fn email_string_pattern() {
        let ctx = ctx();
        let pattern = named(&ctx, "emailaddr").string_pattern().unwrap();
        assert!(pattern.test_str("foo@example.com"));
        assert!(!pattern.test_str("foo"));
    }
}
