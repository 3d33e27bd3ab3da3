//! Runtime values.
//!
//! # Arc Enforcement
//!
//! Every heap allocation goes through a factory method on [`Value`]
//! (`Value::str`, `Value::object`, `Value::list`, ...). [`Heap`] has a
//! crate-private constructor so code outside `inox_core` cannot wrap arbitrary
//! allocations.
//!
//! # Mutability
//!
//! The set of mutable kinds is fixed: objects, lists, dictionaries, rune and
//! byte slices, lthreads and groups, iterators and streams, transactions,
//! mappings and dynamic values. Everything else is immutable and freely shared.
//! Mutable containers start private; [`Value::share`] switches them to the
//! shared state in which every mutation holds the container's [`SmartLock`].
//!
//! # Capabilities
//!
//! Capability operations (`prop`, `at`, `iterator`, `compare`, ...) live in
//! [`capabilities`], [`equality`] and [`comparison`]; a value lacking a
//! capability reports `TypeMismatch`.
//!
//! [`SmartLock`]: crate::smart_lock::SmartLock

mod capabilities;
mod comparison;
mod dictionary;
mod equality;
mod function;
mod heap;
mod iteration;
mod list;
mod lthread;
mod misc;
mod object;
mod ranges;
mod scalar_int;
mod slices;
mod stream;
mod treedata;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use inox_ir::SourcePosition;
use rustc_hash::FxHashSet;

use crate::context::Context;
use crate::dynamic::DynamicValue;
use crate::errors::{self, AssertionData, EvalError};
use crate::mutation::Mutation;
use crate::pattern::Pattern;

pub use comparison::natural_cmp;
pub use dictionary::Dictionary;
pub use equality::Visited;
pub use function::{HostFn, HostFunction, HostParam, InoxFunction};
pub use heap::Heap;
pub use iteration::{IteratorConfig, ValueIterator};
pub use list::{List, ListElementKind, Tuple};
pub use lthread::{LThread, LThreadGroup, LThreadResult};
pub use misc::{
    ErrorValue, Event, KeyList, LifetimeJob, Mapping, MarkupElement, Namespace, OptionValue,
    OrderedPair, Port, ReceptionHandler, Secret, SystemGraph, SystemGraphNode, Transaction, Ulid,
};
pub use object::{Object, Record, IMPLICIT_PROP_NAME};
pub use ranges::{FloatRange, IntRange, QuantityRange, RuneRange};
pub use scalar_int::ScalarInt;
pub use slices::{ByteSlice, RuneSlice};
pub use stream::{Stream, STREAM_ITERATION_WAIT_TIMEOUT};
pub use treedata::{Treedata, TreedataEntry};

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    // Scalars (inline)
    Nil,
    Bool(bool),
    /// Checked 64-bit integer.
    Int(ScalarInt),
    /// Finite floats only take part in arithmetic and comparison.
    Float(f64),
    Rune(char),
    Byte(u8),

    // String-like values
    Str(Heap<str>),
    Path(Heap<str>),
    PathPattern(Heap<str>),
    Url(Heap<str>),
    UrlPattern(Heap<str>),
    Host(Heap<str>),
    HostPattern(Heap<str>),
    Scheme(Heap<str>),
    EmailAddress(Heap<str>),
    Identifier(Heap<str>),
    PropertyName(Heap<str>),

    // Quantities
    ByteCount(i64),
    LineCount(i64),
    RuneCount(i64),
    /// Bytes per second.
    ByteRate(i64),
    /// Occurrences per second.
    SimpleRate(i64),
    Frequency(f64),
    Duration(Duration),

    // Time
    Year(i32),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),

    Port(Port),
    FileMode(u32),
    Ulid(Ulid),
    UuidV4(uuid::Uuid),

    // Containers
    Option(Heap<OptionValue>),
    Object(Heap<Object>),
    Record(Heap<Record>),
    Dictionary(Heap<Dictionary>),
    List(Heap<List>),
    Tuple(Heap<Tuple>),
    OrderedPair(Heap<OrderedPair>),
    RuneSlice(Heap<RuneSlice>),
    ByteSlice(Heap<ByteSlice>),
    KeyList(Heap<KeyList>),
    Treedata(Heap<Treedata>),

    // Ranges
    IntRange(IntRange),
    FloatRange(FloatRange),
    RuneRange(RuneRange),
    QuantityRange(Heap<QuantityRange>),

    // Callables
    Mapping(Heap<Mapping>),
    HostFunction(Heap<HostFunction>),
    InoxFunction(Heap<InoxFunction>),

    // Concurrency
    LThread(Heap<LThread>),
    LThreadGroup(Heap<LThreadGroup>),
    Transaction(Heap<Transaction>),
    Dynamic(Heap<DynamicValue>),
    Iterator(Heap<ValueIterator>),
    Stream(Heap<Stream>),
    ReceptionHandler(Heap<ReceptionHandler>),
    LifetimeJob(Heap<LifetimeJob>),

    // Misc
    Pattern(Heap<Pattern>),
    Error(Heap<ErrorValue>),
    SourcePosition(Heap<SourcePosition>),
    AssertionData(Heap<AssertionData>),
    Secret(Heap<Secret>),
    MarkupElement(Heap<MarkupElement>),
    Namespace(Heap<Namespace>),
    SystemGraph(Heap<SystemGraph>),
    Event(Heap<Event>),
    Mutation(Heap<Mutation>),
}

// Factory Methods

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(ScalarInt::new(n))
    }

    #[inline]
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn path(s: impl Into<Arc<str>>) -> Self {
        Value::Path(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn path_pattern(s: impl Into<Arc<str>>) -> Self {
        Value::PathPattern(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn url(s: impl Into<Arc<str>>) -> Self {
        Value::Url(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn url_pattern(s: impl Into<Arc<str>>) -> Self {
        Value::UrlPattern(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn host(s: impl Into<Arc<str>>) -> Self {
        Value::Host(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn host_pattern(s: impl Into<Arc<str>>) -> Self {
        Value::HostPattern(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn scheme(s: impl Into<Arc<str>>) -> Self {
        Value::Scheme(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn email_address(s: impl Into<Arc<str>>) -> Self {
        Value::EmailAddress(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn identifier(s: impl Into<Arc<str>>) -> Self {
        Value::Identifier(Heap::from_arc(s.into()))
    }

    #[inline]
    pub fn property_name(s: impl Into<Arc<str>>) -> Self {
        Value::PropertyName(Heap::from_arc(s.into()))
    }

    pub fn option(name: impl Into<String>, value: Value) -> Self {
        Value::Option(Heap::new(OptionValue {
            name: name.into(),
            value,
        }))
    }

    /// Private object; keys are sorted.
    pub fn object(entries: Vec<(String, Value)>) -> Self {
        Value::Object(Heap::new(Object::new(entries)))
    }

    pub fn record(entries: Vec<(String, Value)>) -> Self {
        Value::Record(Heap::new(Record::new(entries)))
    }

    pub fn dictionary(entries: Vec<(Value, Value)>) -> Self {
        Value::Dictionary(Heap::new(Dictionary::new(entries)))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(List::new(items)))
    }

    /// List specialised for `kind`; elements of another kind are rejected.
    pub fn typed_list(kind: ListElementKind, items: Vec<Value>) -> Result<Self, EvalError> {
        Ok(Value::List(Heap::new(List::typed(kind, items)?)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Heap::new(Tuple::new(items)))
    }

    pub fn ordered_pair(first: Value, second: Value) -> Self {
        Value::OrderedPair(Heap::new(OrderedPair(first, second)))
    }

    pub fn rune_slice(runes: Vec<char>) -> Self {
        Value::RuneSlice(Heap::new(RuneSlice::new(runes)))
    }

    pub fn byte_slice(bytes: Vec<u8>) -> Self {
        Value::ByteSlice(Heap::new(ByteSlice::new(bytes)))
    }

    pub fn key_list(keys: Vec<String>) -> Self {
        Value::KeyList(Heap::new(KeyList(keys)))
    }

    pub fn treedata(treedata: Treedata) -> Self {
        Value::Treedata(Heap::new(treedata))
    }

    pub fn quantity_range(range: QuantityRange) -> Self {
        Value::QuantityRange(Heap::new(range))
    }

    pub fn mapping(mapping: Mapping) -> Self {
        Value::Mapping(Heap::new(mapping))
    }

    pub fn host_function(function: HostFunction) -> Self {
        Value::HostFunction(Heap::new(function))
    }

    pub fn inox_function(function: InoxFunction) -> Self {
        Value::InoxFunction(Heap::new(function))
    }

    pub fn lthread_group(group: LThreadGroup) -> Self {
        Value::LThreadGroup(Heap::new(group))
    }

    pub fn pattern(pattern: Pattern) -> Self {
        Value::Pattern(Heap::new(pattern))
    }

    pub fn error(error: ErrorValue) -> Self {
        Value::Error(Heap::new(error))
    }

    /// Error value wrapping an evaluation error.
    pub fn from_eval_error(error: &EvalError) -> Self {
        Value::error(ErrorValue::new(error.message.clone(), Value::Nil))
    }

    pub fn source_position(position: SourcePosition) -> Self {
        Value::SourcePosition(Heap::new(position))
    }

    pub fn assertion_data(data: AssertionData) -> Self {
        Value::AssertionData(Heap::new(data))
    }

    pub fn secret(secret: Secret) -> Self {
        Value::Secret(Heap::new(secret))
    }

    pub fn markup_element(element: MarkupElement) -> Self {
        Value::MarkupElement(Heap::new(element))
    }

    pub fn namespace(namespace: Namespace) -> Self {
        Value::Namespace(Heap::new(namespace))
    }

    pub fn system_graph(graph: SystemGraph) -> Self {
        Value::SystemGraph(Heap::new(graph))
    }

    pub fn event(event: Event) -> Self {
        Value::Event(Heap::new(event))
    }

    pub fn mutation(mutation: Mutation) -> Self {
        Value::Mutation(Heap::new(mutation))
    }

    pub fn stream(stream: Stream) -> Self {
        Value::Stream(Heap::new(stream))
    }

    pub fn reception_handler(handler: ReceptionHandler) -> Self {
        Value::ReceptionHandler(Heap::new(handler))
    }

    pub fn lifetime_job(job: LifetimeJob) -> Self {
        Value::LifetimeJob(Heap::new(job))
    }
}

// Value Methods

impl Value {
    /// Name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Rune(_) => "rune",
            Value::Byte(_) => "byte",
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::PathPattern(_) => "path pattern",
            Value::Url(_) => "url",
            Value::UrlPattern(_) => "url pattern",
            Value::Host(_) => "host",
            Value::HostPattern(_) => "host pattern",
            Value::Scheme(_) => "scheme",
            Value::EmailAddress(_) => "email address",
            Value::Identifier(_) => "identifier",
            Value::PropertyName(_) => "property name",
            Value::ByteCount(_) => "byte count",
            Value::LineCount(_) => "line count",
            Value::RuneCount(_) => "rune count",
            Value::ByteRate(_) => "byte rate",
            Value::SimpleRate(_) => "simple rate",
            Value::Frequency(_) => "frequency",
            Value::Duration(_) => "duration",
            Value::Year(_) => "year",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Port(_) => "port",
            Value::FileMode(_) => "file mode",
            Value::Ulid(_) => "ulid",
            Value::UuidV4(_) => "uuidv4",
            Value::Option(_) => "option",
            Value::Object(_) => "object",
            Value::Record(_) => "record",
            Value::Dictionary(_) => "dictionary",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::OrderedPair(_) => "ordered pair",
            Value::RuneSlice(_) => "rune slice",
            Value::ByteSlice(_) => "byte slice",
            Value::KeyList(_) => "key list",
            Value::Treedata(_) => "treedata",
            Value::IntRange(_) => "integer range",
            Value::FloatRange(_) => "float range",
            Value::RuneRange(_) => "rune range",
            Value::QuantityRange(_) => "quantity range",
            Value::Mapping(_) => "mapping",
            Value::HostFunction(_) | Value::InoxFunction(_) => "function",
            Value::LThread(_) => "lthread",
            Value::LThreadGroup(_) => "lthread group",
            Value::Transaction(_) => "transaction",
            Value::Dynamic(_) => "dynamic value",
            Value::Iterator(_) => "iterator",
            Value::Stream(_) => "stream",
            Value::ReceptionHandler(_) => "reception handler",
            Value::LifetimeJob(_) => "lifetime job",
            Value::Pattern(_) => "pattern",
            Value::Error(_) => "error",
            Value::SourcePosition(_) => "source position",
            Value::AssertionData(_) => "assertion data",
            Value::Secret(_) => "secret",
            Value::MarkupElement(_) => "markup element",
            Value::Namespace(_) => "namespace",
            Value::SystemGraph(_) => "system graph",
            Value::Event(_) => "event",
            Value::Mutation(_) => "mutation",
        }
    }

    /// Whether the value can change after creation.
    pub fn is_mutable(&self) -> bool {
        matches!(
            self,
            Value::Object(_)
                | Value::List(_)
                | Value::Dictionary(_)
                | Value::RuneSlice(_)
                | Value::ByteSlice(_)
                | Value::LThread(_)
                | Value::LThreadGroup(_)
                | Value::Iterator(_)
                | Value::Stream(_)
                | Value::Transaction(_)
                | Value::Mapping(_)
                | Value::Dynamic(_)
        )
    }

    /// Whether the value may be shared between lthreads.
    ///
    /// Immutable values are always sharable; among mutable values only
    /// containers guarded by a lock and values that are thread safe by
    /// construction are.
    pub fn is_sharable(&self) -> bool {
        !matches!(self, Value::Iterator(_) | Value::Dynamic(_))
    }

    /// Whether the value is a mutable container in the shared state.
    pub fn is_shared(&self) -> bool {
        match self {
            Value::Object(o) => o.is_shared(),
            Value::List(l) => l.is_shared(),
            Value::Dictionary(d) => d.is_shared(),
            Value::RuneSlice(s) => s.is_shared(),
            Value::ByteSlice(s) => s.is_shared(),
            _ => !self.is_mutable(),
        }
    }

    /// Switch a mutable container (and the mutable values it holds) to the
    /// shared state. Immutable values are left untouched. Nothing is shared
    /// when any reachable value cannot be.
    pub fn share(&self, origin: &Context) -> Result<(), EvalError> {
        if let Some(type_name) = self.unsharable_part(&mut FxHashSet::default()) {
            return Err(errors::invalid_argument(format!(
                "a(n) {type_name} is not sharable"
            )));
        }
        self.share_checked(origin);
        Ok(())
    }

    /// Type name of the first reachable value that cannot be shared.
    /// Containers already shared were checked when they were.
    fn unsharable_part(&self, visited: &mut FxHashSet<usize>) -> Option<&'static str> {
        if !self.is_sharable() {
            return Some(self.type_name());
        }
        let children: Vec<Value> = match self {
            Value::Object(o) if !o.is_shared() && visited.insert(Heap::addr(o)) => {
                o.entries().into_iter().map(|(_, v)| v).collect()
            }
            Value::List(l) if !l.is_shared() && visited.insert(Heap::addr(l)) => l.snapshot(),
            Value::Dictionary(d) if !d.is_shared() && visited.insert(Heap::addr(d)) => {
                d.entries().into_iter().map(|(_, v)| v).collect()
            }
            _ => return None,
        };
        children.iter().find_map(|child| child.unsharable_part(visited))
    }

    pub(crate) fn share_checked(&self, origin: &Context) {
        match self {
            Value::Object(o) => o.share(origin),
            Value::List(l) => l.share(origin),
            Value::Dictionary(d) => d.share(origin),
            Value::RuneSlice(s) => s.share(),
            Value::ByteSlice(s) => s.share(),
            _ => {}
        }
    }

    /// Lock of a shared container, if the value has one.
    pub fn smart_lock(&self) -> Option<&crate::smart_lock::SmartLock> {
        match self {
            Value::Object(o) => Some(o.smart_lock()),
            Value::List(l) => Some(l.smart_lock()),
            Value::Dictionary(d) => Some(d.smart_lock()),
            Value::RuneSlice(s) => Some(s.smart_lock()),
            Value::ByteSlice(s) => Some(s.smart_lock()),
            _ => None,
        }
    }

    /// Identity of a heap value, `None` for inline scalars.
    pub fn heap_addr(&self) -> Option<usize> {
        Some(match self {
            Value::Str(h)
            | Value::Path(h)
            | Value::PathPattern(h)
            | Value::Url(h)
            | Value::UrlPattern(h)
            | Value::Host(h)
            | Value::HostPattern(h)
            | Value::Scheme(h)
            | Value::EmailAddress(h)
            | Value::Identifier(h)
            | Value::PropertyName(h) => Heap::addr(h),
            Value::Option(h) => Heap::addr(h),
            Value::Object(h) => Heap::addr(h),
            Value::Record(h) => Heap::addr(h),
            Value::Dictionary(h) => Heap::addr(h),
            Value::List(h) => Heap::addr(h),
            Value::Tuple(h) => Heap::addr(h),
            Value::OrderedPair(h) => Heap::addr(h),
            Value::RuneSlice(h) => Heap::addr(h),
            Value::ByteSlice(h) => Heap::addr(h),
            Value::KeyList(h) => Heap::addr(h),
            Value::Treedata(h) => Heap::addr(h),
            Value::QuantityRange(h) => Heap::addr(h),
            Value::Mapping(h) => Heap::addr(h),
            Value::HostFunction(h) => Heap::addr(h),
            Value::InoxFunction(h) => Heap::addr(h),
            Value::LThread(h) => Heap::addr(h),
            Value::LThreadGroup(h) => Heap::addr(h),
            Value::Transaction(h) => Heap::addr(h),
            Value::Dynamic(h) => Heap::addr(h),
            Value::Iterator(h) => Heap::addr(h),
            Value::Stream(h) => Heap::addr(h),
            Value::ReceptionHandler(h) => Heap::addr(h),
            Value::LifetimeJob(h) => Heap::addr(h),
            Value::Pattern(h) => Heap::addr(h),
            Value::Error(h) => Heap::addr(h),
            Value::SourcePosition(h) => Heap::addr(h),
            Value::AssertionData(h) => Heap::addr(h),
            Value::Secret(h) => Heap::addr(h),
            Value::MarkupElement(h) => Heap::addr(h),
            Value::Namespace(h) => Heap::addr(h),
            Value::SystemGraph(h) => Heap::addr(h),
            Value::Event(h) => Heap::addr(h),
            Value::Mutation(h) => Heap::addr(h),
            _ => return None,
        })
    }

    /// Identity comparison used by `is` / `is not`.
    ///
    /// Mutable values are identical only when they are the same allocation;
    /// immutable values are identical when they are equal.
    pub fn is_identical(&self, other: &Value) -> bool {
        if self.is_mutable() || other.is_mutable() {
            return match (self.heap_addr(), other.heap_addr()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
        }
        self.equals(other)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(n.raw()),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Content of any string-like value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s)
            | Value::Path(s)
            | Value::PathPattern(s)
            | Value::Url(s)
            | Value::UrlPattern(s)
            | Value::Host(s)
            | Value::HostPattern(s)
            | Value::Scheme(s)
            | Value::EmailAddress(s)
            | Value::Identifier(s)
            | Value::PropertyName(s) => Some(s),
            _ => None,
        }
    }

    /// `Str` only.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Heap<Pattern>> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }

    /// Whether the value is a string-like scalar usable where text is expected.
    pub fn is_string_like(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Whether a textual representation exists that can be re-parsed.
    pub fn is_serializable(&self) -> bool {
        match self {
            Value::HostFunction(_)
            | Value::InoxFunction(_)
            | Value::LThread(_)
            | Value::LThreadGroup(_)
            | Value::Transaction(_)
            | Value::Iterator(_)
            | Value::Stream(_)
            | Value::Dynamic(_)
            | Value::Mapping(_)
            | Value::Secret(_)
            | Value::ReceptionHandler(_)
            | Value::LifetimeJob(_)
            | Value::SystemGraph(_) => false,
            Value::List(l) => l.snapshot().iter().all(Value::is_serializable),
            Value::Tuple(t) => t.items().iter().all(Value::is_serializable),
            Value::Object(o) => o.entries().iter().all(|(_, v)| v.is_serializable()),
            Value::Record(r) => r.entries().iter().all(|(_, v)| v.is_serializable()),
            _ => true,
        }
    }

    /// Stringification used by interpolations and `concat`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Rune(r) => r.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Float(f) => crate::pretty_print::format_float(*f),
            v => v
                .as_str()
                .map_or_else(|| crate::pretty_print::to_compact_string(v), str::to_string),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::pretty_print::to_compact_string(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

#[cfg(test)]
mod tests;
