//! Structural equality.
//!
//! Mutable containers can form cycles, so the walker records every pair of
//! containers it is comparing: meeting a pair again means the comparison is
//! already in progress higher up and is assumed to hold.

use rustc_hash::FxHashSet;

use super::{Heap, Value};
use crate::pattern;

/// Recursion cap; deeper structures compare unequal.
const MAX_EQUALITY_DEPTH: usize = 200;

/// Pairs of mutable containers already being compared.
#[derive(Default)]
pub struct Visited(FxHashSet<(usize, usize)>);

impl Visited {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the pair was already recorded.
    fn enter(&mut self, a: usize, b: usize) -> bool {
        self.0.insert((a, b))
    }
}

impl Value {
    /// Structural equality.
    pub fn equals(&self, other: &Value) -> bool {
        self.equal(other, &mut Visited::new(), 0)
    }

    pub fn equal(&self, other: &Value, visited: &mut Visited, depth: usize) -> bool {
        if depth > MAX_EQUALITY_DEPTH {
            return false;
        }
        inox_stack::ensure_sufficient_stack(|| self.equal_inner(other, visited, depth))
    }

    fn equal_inner(&self, other: &Value, visited: &mut Visited, depth: usize) -> bool {
        let next = depth + 1;
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            #[allow(clippy::float_cmp, reason = "exact equality is the language semantics")]
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Rune(a), Value::Rune(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,

            (Value::Str(a), Value::Str(b))
            | (Value::Path(a), Value::Path(b))
            | (Value::PathPattern(a), Value::PathPattern(b))
            | (Value::Url(a), Value::Url(b))
            | (Value::UrlPattern(a), Value::UrlPattern(b))
            | (Value::Host(a), Value::Host(b))
            | (Value::HostPattern(a), Value::HostPattern(b))
            | (Value::Scheme(a), Value::Scheme(b))
            | (Value::EmailAddress(a), Value::EmailAddress(b))
            | (Value::Identifier(a), Value::Identifier(b))
            | (Value::PropertyName(a), Value::PropertyName(b)) => **a == **b,

            (Value::ByteCount(a), Value::ByteCount(b))
            | (Value::LineCount(a), Value::LineCount(b))
            | (Value::RuneCount(a), Value::RuneCount(b))
            | (Value::ByteRate(a), Value::ByteRate(b))
            | (Value::SimpleRate(a), Value::SimpleRate(b)) => a == b,
            #[allow(clippy::float_cmp, reason = "exact equality is the language semantics")]
            (Value::Frequency(a), Value::Frequency(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Year(a), Value::Year(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Port(a), Value::Port(b)) => a == b,
            (Value::FileMode(a), Value::FileMode(b)) => a == b,
            (Value::Ulid(a), Value::Ulid(b)) => a == b,
            (Value::UuidV4(a), Value::UuidV4(b)) => a == b,

            (Value::Option(a), Value::Option(b)) => {
                a.name == b.name && a.value.equal(&b.value, visited, next)
            }
            (Value::OrderedPair(a), Value::OrderedPair(b)) => {
                a.0.equal(&b.0, visited, next) && a.1.equal(&b.1, visited, next)
            }
            (Value::KeyList(a), Value::KeyList(b)) => a.0 == b.0,
            (Value::Tuple(a), Value::Tuple(b)) => {
                sequences_equal(a.items(), b.items(), visited, next)
            }
            (Value::Record(a), Value::Record(b)) => {
                a.keys() == b.keys()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((_, x), (_, y))| x.equal(y, visited, next))
            }

            (Value::Object(a), Value::Object(b)) => {
                if Heap::ptr_eq(a, b) || !visited.enter(Heap::addr(a), Heap::addr(b)) {
                    return true;
                }
                let (left, right) = (a.entries(), b.entries());
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right.iter())
                        .all(|((k1, v1), (k2, v2))| k1 == k2 && v1.equal(v2, visited, next))
            }
            (Value::List(a), Value::List(b)) => {
                if Heap::ptr_eq(a, b) || !visited.enter(Heap::addr(a), Heap::addr(b)) {
                    return true;
                }
                sequences_equal(&a.snapshot(), &b.snapshot(), visited, next)
            }
            (Value::Dictionary(a), Value::Dictionary(b)) => {
                if Heap::ptr_eq(a, b) || !visited.enter(Heap::addr(a), Heap::addr(b)) {
                    return true;
                }
                let (left, right) = (a.entries(), b.entries());
                left.len() == right.len()
                    && left.iter().zip(right.iter()).all(|((k1, v1), (k2, v2))| {
                        k1.equal(k2, visited, next) && v1.equal(v2, visited, next)
                    })
            }
            (Value::RuneSlice(a), Value::RuneSlice(b)) => {
                Heap::ptr_eq(a, b) || a.to_vec() == b.to_vec()
            }
            (Value::ByteSlice(a), Value::ByteSlice(b)) => {
                Heap::ptr_eq(a, b) || a.to_vec() == b.to_vec()
            }

            (Value::IntRange(a), Value::IntRange(b)) => a == b,
            (Value::FloatRange(a), Value::FloatRange(b)) => a == b,
            (Value::RuneRange(a), Value::RuneRange(b)) => a == b,
            (Value::QuantityRange(a), Value::QuantityRange(b)) => {
                a.unknown_start == b.unknown_start
                    && a.inclusive_end == b.inclusive_end
                    && a.start.equal(&b.start, visited, next)
                    && match (&a.end, &b.end) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.equal(y, visited, next),
                        _ => false,
                    }
            }

            (Value::Pattern(a), Value::Pattern(b)) => pattern::patterns_equal(a, b),
            (Value::Error(a), Value::Error(b)) => {
                a.text == b.text && a.data.equal(&b.data, visited, next)
            }
            (Value::SourcePosition(a), Value::SourcePosition(b)) => **a == **b,
            (Value::Namespace(a), Value::Namespace(b)) => {
                a.name == b.name
                    && a.entries().len() == b.entries().len()
                    && a.entries()
                        .iter()
                        .zip(b.entries().iter())
                        .all(|((k1, v1), (k2, v2))| k1 == k2 && v1.equal(v2, visited, next))
            }
            (Value::Event(a), Value::Event(b)) => {
                a.time == b.time && a.value.equal(&b.value, visited, next)
            }
            (Value::Mutation(a), Value::Mutation(b)) => {
                a.kind == b.kind
                    && a.path == b.path
                    && sequences_equal(&a.data, &b.data, visited, next)
            }
            (Value::MarkupElement(a), Value::MarkupElement(b)) => {
                a.name == b.name
                    && a.attributes.len() == b.attributes.len()
                    && a.attributes
                        .iter()
                        .zip(b.attributes.iter())
                        .all(|((k1, v1), (k2, v2))| k1 == k2 && v1.equal(v2, visited, next))
                    && sequences_equal(&a.children, &b.children, visited, next)
            }
            (Value::Treedata(a), Value::Treedata(b)) => {
                Heap::ptr_eq(a, b) || a.root.equal(&b.root, visited, next)
            }

            // Identity-only kinds
            _ => match (self.heap_addr(), other.heap_addr()) {
                (Some(a), Some(b)) => a == b && std::mem::discriminant(self) == std::mem::discriminant(other),
                _ => false,
            },
        }
    }
}

fn sequences_equal(a: &[Value], b: &[Value], visited: &mut Visited, depth: usize) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equal(y, visited, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, ContextConfig};

    #[test]
    fn immutable_values_equal_themselves() {
        let values = [
            Value::Nil,
            Value::int(3),
            Value::Float(1.5),
            Value::str("a"),
            Value::path("/tmp/"),
            Value::tuple(vec![Value::int(1), Value::str("x")]),
            Value::record(vec![("a".into(), Value::Bool(true))]),
            Value::ByteCount(10),
        ];
        for value in &values {
            assert!(value.equals(value), "{value:?}");
            assert!(!value.is_mutable());
        }
    }

    #[test]
    fn variants_do_not_mix() {
        assert!(!Value::str("/a").equals(&Value::path("/a")));
        assert!(!Value::ByteCount(1).equals(&Value::LineCount(1)));
        assert!(!Value::int(1).equals(&Value::Float(1.0)));
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        assert!(!Value::Float(f64::NAN).equals(&Value::Float(f64::NAN)));
    }

    #[test]
    fn cyclic_objects_terminate() {
        let ctx = Context::new_root(ContextConfig::default());
        let a = Value::object(vec![]);
        let b = Value::object(vec![]);
        let (Value::Object(oa), Value::Object(ob)) = (&a, &b) else {
            unreachable!()
        };
        oa.set_prop(&ctx, "self", a.clone()).unwrap();
        ob.set_prop(&ctx, "self", b.clone()).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn lists_compare_elementwise() {
        let a = Value::list(vec![Value::int(1), Value::list(vec![Value::int(2)])]);
        let b = Value::list(vec![Value::int(1), Value::list(vec![Value::int(2)])]);
        let c = Value::list(vec![Value::int(1)]);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }
}
