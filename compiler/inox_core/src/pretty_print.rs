//! Deterministic rendering of values.
//!
//! # Design
//!
//! One [`Printer`] walks the value with a depth counter. Containers deeper
//! than [`PrettyPrintConfig::max_depth`] collapse to `{(...)}` or `[(...)]`,
//! which also bounds the output for cyclic graphs. Objects print in their
//! stored (sorted) key order and dictionaries in sorted key order, so equal
//! values always render identically. Secrets never reveal their content.
//!
//! The compact form (single line, no colours) doubles as the key
//! representation of dictionaries and as the fallback of `Value::to_text`.

use std::fmt::{self, Write};
use std::time::Duration;

use crate::value::{TreedataEntry, Value};

/// Depth used by [`to_compact_string`].
const COMPACT_MAX_DEPTH: usize = 10;

/// Non-compact lists longer than this print the index of each element.
const INDEXED_LIST_THRESHOLD: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    Dark,
    Light,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrettyPrintConfig {
    pub max_depth: usize,
    pub colorize: bool,
    /// Spaces per nesting level.
    pub indent: usize,
    pub palette: Palette,
    pub compact: bool,
}

impl Default for PrettyPrintConfig {
    fn default() -> Self {
        PrettyPrintConfig {
            max_depth: 7,
            colorize: false,
            indent: 4,
            palette: Palette::Dark,
            compact: false,
        }
    }
}

impl PrettyPrintConfig {
    pub fn compact() -> Self {
        PrettyPrintConfig {
            max_depth: COMPACT_MAX_DEPTH,
            compact: true,
            ..Self::default()
        }
    }
}

/// ANSI escape sequences of a palette.
struct Colors {
    key: &'static str,
    string: &'static str,
    number: &'static str,
    constant: &'static str,
    pattern: &'static str,
    opaque: &'static str,
}

impl Colors {
    const DARK: Colors = Colors {
        key: "\x1b[36m",
        string: "\x1b[33m",
        number: "\x1b[92m",
        constant: "\x1b[35m",
        pattern: "\x1b[96m",
        opaque: "\x1b[90m",
    };

    const LIGHT: Colors = Colors {
        key: "\x1b[34m",
        string: "\x1b[31m",
        number: "\x1b[32m",
        constant: "\x1b[35m",
        pattern: "\x1b[36m",
        opaque: "\x1b[37m",
    };
}

const RESET: &str = "\x1b[0m";

pub fn pretty_print(value: &Value, config: &PrettyPrintConfig) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_pretty(&mut out, value, config, 0, 0);
    out
}

/// Render `value` as if it were found at `depth`, continuation lines being
/// indented by `indent` levels.
pub fn write_pretty(
    w: &mut dyn Write,
    value: &Value,
    config: &PrettyPrintConfig,
    depth: usize,
    indent: usize,
) -> fmt::Result {
    let colors = match config.palette {
        Palette::Dark => &Colors::DARK,
        Palette::Light => &Colors::LIGHT,
    };
    Printer { w, config, colors }.value(value, depth, indent)
}

pub fn to_compact_string(value: &Value) -> String {
    pretty_print(value, &PrettyPrintConfig::compact())
}

/// Floats always carry a decimal point or an exponent so they re-parse as
/// floats.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+inf" } else { "-inf" }.to_string();
    }
    let text = f.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// `1h30mn`, `10ms`, `0s`.
pub fn format_duration(duration: Duration) -> String {
    const UNITS: [(&str, u128); 6] = [
        ("h", 3_600_000_000_000),
        ("mn", 60_000_000_000),
        ("s", 1_000_000_000),
        ("ms", 1_000_000),
        ("us", 1_000),
        ("ns", 1),
    ];
    let mut nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    for (unit, size) in UNITS {
        if nanos >= size {
            let _ = write!(out, "{}{unit}", nanos / size);
            nanos %= size;
        }
    }
    out
}

fn is_identifier_like(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        && !key.starts_with(|c: char| c.is_ascii_digit())
}

struct Printer<'a> {
    w: &'a mut dyn Write,
    config: &'a PrettyPrintConfig,
    colors: &'static Colors,
}

impl Printer<'_> {
    fn colored(&mut self, color: fn(&Colors) -> &'static str, text: &str) -> fmt::Result {
        if self.config.colorize {
            write!(self.w, "{}{text}{RESET}", color(self.colors))
        } else {
            self.w.write_str(text)
        }
    }

    fn newline(&mut self, indent: usize) -> fmt::Result {
        self.w.write_char('\n')?;
        for _ in 0..indent * self.config.indent {
            self.w.write_char(' ')?;
        }
        Ok(())
    }

    fn key(&mut self, key: &str) -> fmt::Result {
        if is_identifier_like(key) {
            self.colored(|c| c.key, key)
        } else {
            self.colored(|c| c.key, &format!("{key:?}"))
        }
    }

    fn value(&mut self, value: &Value, depth: usize, indent: usize) -> fmt::Result {
        inox_stack::ensure_sufficient_stack(|| self.value_inner(value, depth, indent))
    }

    fn value_inner(&mut self, value: &Value, depth: usize, indent: usize) -> fmt::Result {
        match value {
            Value::Nil => self.colored(|c| c.constant, "nil"),
            Value::Bool(b) => self.colored(|c| c.constant, if *b { "true" } else { "false" }),
            Value::Int(n) => self.colored(|c| c.number, &n.to_string()),
            Value::Float(f) => self.colored(|c| c.number, &format_float(*f)),
            Value::Rune(r) => self.colored(|c| c.string, &format!("{r:?}")),
            Value::Byte(b) => self.colored(|c| c.number, &format!("{b:#04x}")),
            Value::Str(s) => self.colored(|c| c.string, &format!("{:?}", &**s)),
            Value::Path(s)
            | Value::Url(s)
            | Value::Host(s)
            | Value::EmailAddress(s) => self.colored(|c| c.string, s),
            Value::PathPattern(s) | Value::UrlPattern(s) | Value::HostPattern(s) => {
                self.colored(|c| c.pattern, &format!("%{}", &**s))
            }
            Value::Scheme(s) => self.colored(|c| c.string, &format!("{}://", &**s)),
            Value::Identifier(s) => self.colored(|c| c.constant, &format!("#{}", &**s)),
            Value::PropertyName(s) => self.colored(|c| c.key, &format!(".{}", &**s)),

            Value::ByteCount(n) => self.colored(|c| c.number, &format!("{n}B")),
            Value::LineCount(n) => self.colored(|c| c.number, &format!("{n}ln")),
            Value::RuneCount(n) => self.colored(|c| c.number, &format!("{n}rn")),
            Value::ByteRate(n) => self.colored(|c| c.number, &format!("{n}B/s")),
            Value::SimpleRate(n) => self.colored(|c| c.number, &format!("{n}x/s")),
            Value::Frequency(f) => self.colored(|c| c.number, &format!("{}x/s", format_float(*f))),
            Value::Duration(d) => self.colored(|c| c.number, &format_duration(*d)),

            Value::Year(y) => self.colored(|c| c.number, &format!("{y}y")),
            Value::Date(d) => self.colored(|c| c.number, &d.format("%Y-%m-%d").to_string()),
            Value::DateTime(t) => self.colored(|c| c.number, &t.to_rfc3339()),
            Value::Port(p) => self.colored(|c| c.number, &p.to_string()),
            Value::FileMode(m) => self.colored(|c| c.number, &format!("{m:#o}")),
            Value::Ulid(u) => self.colored(|c| c.constant, &format!("ulid({u})")),
            Value::UuidV4(u) => self.colored(|c| c.constant, &format!("uuidv4({u})")),

            Value::Option(o) => {
                self.w.write_str("--")?;
                self.key(&o.name)?;
                self.w.write_char('=')?;
                self.value(&o.value, depth + 1, indent)
            }
            Value::Object(o) => self.entries("{", &o.entries(), depth, indent),
            Value::Record(r) => self.entries("#{", &r.entries(), depth, indent),
            Value::Namespace(ns) => self.entries("namespace{", ns.entries(), depth, indent),
            Value::Dictionary(d) => {
                if depth > self.config.max_depth {
                    return self.w.write_str(":{(...)}");
                }
                let entries = d.entries();
                self.w.write_str(":{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    self.separator(index, indent + 1)?;
                    self.value(key, depth + 1, indent + 1)?;
                    self.w.write_str(": ")?;
                    self.value(value, depth + 1, indent + 1)?;
                }
                self.close(entries.is_empty(), indent, "}")
            }
            Value::List(l) => self.elements("[", &l.snapshot(), depth, indent),
            Value::Tuple(t) => self.elements("#[", t.items(), depth, indent),
            Value::OrderedPair(p) => {
                self.w.write_str("pair(")?;
                self.value(&p.0, depth + 1, indent)?;
                self.w.write_str(", ")?;
                self.value(&p.1, depth + 1, indent)?;
                self.w.write_char(')')
            }
            Value::RuneSlice(s) => {
                self.colored(|c| c.string, &format!("runes{:?}", s.to_text()))
            }
            Value::ByteSlice(s) => {
                let mut hex = String::with_capacity(s.len() * 2);
                for byte in s.to_vec() {
                    let _ = write!(hex, "{byte:02x}");
                }
                self.colored(|c| c.number, &format!("0x[{hex}]"))
            }
            Value::KeyList(keys) => {
                self.w.write_str(".{")?;
                for (index, key) in keys.0.iter().enumerate() {
                    if index > 0 {
                        self.w.write_str(", ")?;
                    }
                    self.key(key)?;
                }
                self.w.write_char('}')
            }
            Value::Treedata(t) => {
                self.w.write_str("treedata ")?;
                self.value(&t.root, depth + 1, indent)?;
                self.tree_children(&t.children, depth + 1, indent)
            }

            Value::IntRange(r) => {
                let text = match (r.unknown_start, r.end == i64::MAX) {
                    (true, _) => format!("..{}", r.end),
                    (false, true) => format!("{}..", r.start),
                    (false, false) => format!("{}..{}", r.start, r.end),
                };
                self.colored(|c| c.number, &text)
            }
            Value::FloatRange(r) => {
                let start = if r.unknown_start {
                    String::new()
                } else {
                    format_float(r.start)
                };
                let op = if r.inclusive_end { ".." } else { "..<" };
                self.colored(|c| c.number, &format!("{start}{op}{}", format_float(r.end)))
            }
            Value::RuneRange(r) => {
                self.colored(|c| c.string, &format!("{:?}..{:?}", r.start, r.end))
            }
            Value::QuantityRange(r) => {
                if !r.unknown_start {
                    self.value(&r.start, depth + 1, indent)?;
                }
                self.w
                    .write_str(if r.inclusive_end { ".." } else { "..<" })?;
                match &r.end {
                    Some(end) => self.value(end, depth + 1, indent),
                    None => Ok(()),
                }
            }

            Value::Mapping(_) => self.colored(|c| c.opaque, "Mapping(...)"),
            Value::HostFunction(f) => self.colored(|c| c.opaque, &format!("fn {}(...)", f.name)),
            Value::InoxFunction(f) => {
                let name = f.name.as_deref().unwrap_or("");
                self.colored(|c| c.opaque, &format!("fn {name}(...)"))
            }
            Value::LThread(t) => self.colored(|c| c.opaque, &format!("lthread({})", t.name())),
            Value::LThreadGroup(g) => {
                self.colored(|c| c.opaque, &format!("lthread-group({})", g.len()))
            }
            Value::Transaction(tx) => {
                self.colored(|c| c.opaque, &format!("transaction({})", tx.id()))
            }
            Value::Dynamic(d) => self.colored(|c| c.opaque, &format!("dyn({})", d.op().name())),
            Value::Iterator(_) => self.colored(|c| c.opaque, "iterator(...)"),
            Value::Stream(_) => self.colored(|c| c.opaque, "stream(...)"),
            Value::ReceptionHandler(h) => {
                self.colored(|c| c.opaque, &format!("reception-handler({})", h.pattern))
            }
            Value::LifetimeJob(_) => self.colored(|c| c.opaque, "lifetime-job(...)"),

            Value::Pattern(p) => self.colored(|c| c.pattern, &p.to_string()),
            Value::Error(e) => {
                self.w.write_str("error(")?;
                self.colored(|c| c.string, &format!("{:?}", e.text))?;
                if !e.data.is_nil() {
                    self.w.write_str(", ")?;
                    self.value(&e.data, depth + 1, indent)?;
                }
                self.w.write_char(')')
            }
            Value::SourcePosition(p) => self.colored(|c| c.opaque, &p.to_string()),
            Value::AssertionData(_) => self.colored(|c| c.opaque, "assertion-data(...)"),
            Value::Secret(_) => self.colored(|c| c.opaque, "secret(...)"),
            Value::MarkupElement(e) => {
                write!(self.w, "<{}", e.name)?;
                for (name, value) in &e.attributes {
                    write!(self.w, " {name}=")?;
                    self.value(value, depth + 1, indent)?;
                }
                if e.children.is_empty() {
                    return self.w.write_str("/>");
                }
                self.w.write_char('>')?;
                for child in &e.children {
                    self.value(child, depth + 1, indent)?;
                }
                write!(self.w, "</{}>", e.name)
            }
            Value::SystemGraph(g) => {
                self.colored(|c| c.opaque, &format!("sysgraph({} nodes)", g.nodes().len()))
            }
            Value::Event(e) => {
                self.w.write_str("event(")?;
                self.value(&e.value, depth + 1, indent)?;
                self.w.write_char(')')
            }
            Value::Mutation(m) => {
                write!(self.w, "mutation({} {}", m.kind, m.path)?;
                for data in &m.data {
                    self.w.write_char(' ')?;
                    self.value(data, depth + 1, indent)?;
                }
                self.w.write_char(')')
            }
        }
    }

    /// Writes the separator preceding the element at `index`.
    fn separator(&mut self, index: usize, inner_indent: usize) -> fmt::Result {
        if self.config.compact {
            if index > 0 {
                self.w.write_str(", ")?;
            }
            Ok(())
        } else {
            if index > 0 {
                self.w.write_char(',')?;
            }
            self.newline(inner_indent)
        }
    }

    fn close(&mut self, empty: bool, indent: usize, closing: &str) -> fmt::Result {
        if !self.config.compact && !empty {
            self.newline(indent)?;
        }
        self.w.write_str(closing)
    }

    fn entries(
        &mut self,
        open: &str,
        entries: &[(String, Value)],
        depth: usize,
        indent: usize,
    ) -> fmt::Result {
        if depth > self.config.max_depth {
            return write!(self.w, "{open}(...)}}");
        }
        self.w.write_str(open)?;
        for (index, (key, value)) in entries.iter().enumerate() {
            self.separator(index, indent + 1)?;
            self.key(key)?;
            self.w.write_str(": ")?;
            self.value(value, depth + 1, indent + 1)?;
        }
        self.close(entries.is_empty(), indent, "}")
    }

    fn elements(&mut self, open: &str, items: &[Value], depth: usize, indent: usize) -> fmt::Result {
        if depth > self.config.max_depth {
            return write!(self.w, "{open}(...)]");
        }
        let indexed = !self.config.compact && items.len() > INDEXED_LIST_THRESHOLD;
        let index_width = items.len().to_string().len();
        self.w.write_str(open)?;
        for (index, item) in items.iter().enumerate() {
            self.separator(index, indent + 1)?;
            if indexed {
                let label = format!("{index:>index_width$}: ");
                self.colored(|c| c.opaque, &label)?;
            }
            self.value(item, depth + 1, indent + 1)?;
        }
        self.close(items.is_empty(), indent, "]")
    }

    fn tree_children(&mut self, children: &[TreedataEntry], depth: usize, indent: usize) -> fmt::Result {
        if children.is_empty() {
            return Ok(());
        }
        if depth > self.config.max_depth {
            return self.w.write_str(" {(...)}");
        }
        self.w.write_str(" {")?;
        for (index, child) in children.iter().enumerate() {
            self.separator(index, indent + 1)?;
            self.value(&child.value, depth + 1, indent + 1)?;
            self.tree_children(&child.children, depth + 1, indent + 1)?;
        }
        self.close(false, indent, "}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::Secret;

    #[test]
    fn scalars() {
        assert_eq!(to_compact_string(&Value::int(-3)), "-3");
        assert_eq!(to_compact_string(&Value::Float(2.0)), "2.0");
        assert_eq!(to_compact_string(&Value::Float(0.25)), "0.25");
        assert_eq!(to_compact_string(&Value::str("a\"b")), "\"a\\\"b\"");
        assert_eq!(to_compact_string(&Value::ByteCount(10)), "10B");
        assert_eq!(
            to_compact_string(&Value::Duration(Duration::from_secs(5400))),
            "1h30mn"
        );
        assert_eq!(to_compact_string(&Value::Duration(Duration::ZERO)), "0s");
        assert_eq!(to_compact_string(&Value::identifier("a")), "#a");
    }

    #[test]
    fn compact_containers() {
        let value = Value::object(vec![
            ("b".into(), Value::list(vec![Value::int(1), Value::int(2)])),
            ("a".into(), Value::Nil),
        ]);
        assert_eq!(to_compact_string(&value), "{a: nil, b: [1, 2]}");
        let record = Value::record(vec![("x y".into(), Value::Bool(true))]);
        assert_eq!(to_compact_string(&record), "#{\"x y\": true}");
    }

    #[test]
    fn dictionaries_print_in_sorted_key_order() {
        let dict = Value::dictionary(vec![
            (Value::str("b"), Value::int(2)),
            (Value::str("a"), Value::int(1)),
        ]);
        assert_eq!(to_compact_string(&dict), ":{\"a\": 1, \"b\": 2}");
    }

    #[test]
    fn over_depth_containers_collapse() {
        let config = PrettyPrintConfig {
            max_depth: 0,
            ..PrettyPrintConfig::compact()
        };
        let value = Value::list(vec![Value::object(vec![]), Value::list(vec![])]);
        assert_eq!(pretty_print(&value, &config), "[{(...)}, [(...)]]");
    }

    #[test]
    fn multiline_object() {
        let config = PrettyPrintConfig {
            indent: 2,
            ..PrettyPrintConfig::default()
        };
        let value = Value::object(vec![
            ("a".into(), Value::int(1)),
            ("b".into(), Value::list(vec![Value::int(2)])),
        ]);
        assert_eq!(pretty_print(&value, &config), "{\n  a: 1,\n  b: [\n    2\n  ]\n}");
        assert_eq!(pretty_print(&Value::object(vec![]), &config), "{}");
    }

    #[test]
    fn long_lists_print_indices() {
        let config = PrettyPrintConfig {
            indent: 1,
            ..PrettyPrintConfig::default()
        };
        let value = Value::list((0..11).map(Value::int).collect());
        let text = pretty_print(&value, &config);
        assert!(text.contains("\n  0: 0,"), "{text}");
        assert!(text.contains("\n 10: 10\n"), "{text}");

        let short = Value::list((0..3).map(Value::int).collect());
        assert!(!pretty_print(&short, &config).contains(':'));
    }

    #[test]
    fn secrets_are_not_revealed() {
        let secret = Value::secret(Secret::new("hunter2", None));
        let text = pretty_print(&secret, &PrettyPrintConfig::default());
        assert!(!text.contains("hunter2"));
        let nested = Value::object(vec![("password".into(), secret)]);
        assert!(!to_compact_string(&nested).contains("hunter2"));
    }

    #[test]
    fn colorized_output_uses_palette() {
        let config = PrettyPrintConfig {
            colorize: true,
            ..PrettyPrintConfig::compact()
        };
        let text = pretty_print(&Value::int(1), &config);
        assert_eq!(text, format!("{}1{RESET}", Colors::DARK.number));
        let light = PrettyPrintConfig {
            palette: Palette::Light,
            ..config
        };
        assert_eq!(
            pretty_print(&Value::int(1), &light),
            format!("{}1{RESET}", Colors::LIGHT.number)
        );
    }

    #[test]
    fn cyclic_graphs_terminate() {
        let ctx = crate::context::Context::new_root(crate::context::ContextConfig::default());
        let outer = Value::object(vec![]);
        if let Value::Object(o) = &outer {
            o.set_prop(&ctx, "self", outer.clone()).unwrap();
        }
        let text = to_compact_string(&outer);
        assert!(text.contains("{(...)}"));
    }
}
