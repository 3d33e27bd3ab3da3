//! Smaller value kinds.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use inox_ir::{NodeId, SharedAst};
use parking_lot::Mutex;

use super::{Heap, Value};
use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::pattern::Pattern;

/// `--name=value` argument.
#[derive(Clone)]
pub struct OptionValue {
    pub name: String,
    pub value: Value,
}

#[derive(Clone)]
pub struct OrderedPair(pub Value, pub Value);

/// Ordered set of property names, e.g. `.{a, b}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyList(pub Vec<String>);

impl KeyList {
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }
}

/// Network port with an optional scheme, e.g. `:443/https`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Port {
    pub number: u16,
    pub scheme: Option<Arc<str>>,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.number)?;
        if let Some(scheme) = &self.scheme {
            write!(f, "/{scheme}")?;
        }
        Ok(())
    }
}

/// Lexicographically sortable identifier: 48-bit millisecond timestamp
/// followed by 80 random bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ulid(pub u128);

const CROCKFORD: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

impl Ulid {
    pub fn generate() -> Self {
        let millis = u128::try_from(Utc::now().timestamp_millis()).unwrap_or(0) & ((1 << 48) - 1);
        let random = uuid::Uuid::new_v4().as_u128() & ((1 << 80) - 1);
        Ulid((millis << 80) | random)
    }

    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != 26 {
            return None;
        }
        let mut value: u128 = 0;
        for byte in text.bytes() {
            let digit = CROCKFORD
                .iter()
                .position(|c| *c == byte.to_ascii_uppercase())?;
            value = value.checked_mul(32)?.checked_add(digit as u128)?;
        }
        Some(Ulid(value))
    }
}

impl fmt::Display for Ulid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [0u8; 26];
        let mut value = self.0;
        for slot in chars.iter_mut().rev() {
            *slot = CROCKFORD[(value & 31) as usize];
            value >>= 5;
        }
        f.write_str(&String::from_utf8_lossy(&chars))
    }
}

/// Error as a value, e.g. the second element returned by a fallible host
/// function called without `must`.
#[derive(Clone)]
pub struct ErrorValue {
    pub text: String,
    pub data: Value,
}

impl ErrorValue {
    pub fn new(text: impl Into<String>, data: Value) -> Self {
        ErrorValue {
            text: text.into(),
            data,
        }
    }
}

#[derive(Clone)]
pub struct Event {
    pub value: Value,
    pub time: DateTime<FixedOffset>,
}

impl Event {
    pub fn now(value: Value) -> Self {
        Event {
            value,
            time: Utc::now().fixed_offset(),
        }
    }
}

/// Value of a mapping expression.
///
/// Entries are evaluated on demand by the evaluator through the context's
/// call dispatcher; the globals referenced by the expression are captured
/// when the mapping is created.
#[derive(Clone)]
pub struct Mapping {
    pub ast: SharedAst,
    pub node: NodeId,
    pub captured_globals: Vec<(String, Value)>,
}

impl Mapping {
    pub fn compute(&self, ctx: &Context, key: &Value) -> Result<Value, EvalError> {
        ctx.dispatcher()?.compute_mapping(ctx, self, key)
    }
}

/// Named set of values, e.g. the globals passed to a spawned lthread.
#[derive(Clone, Default)]
pub struct Namespace {
    pub name: String,
    entries: Vec<(String, Value)>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, mut entries: Vec<(String, Value)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Namespace {
            name: name.into(),
            entries,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(name))
            .ok()
            .map(|index| &self.entries[index].1)
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// Callback run when a transaction ends; the flag is true on commit.
pub type TransactionEndCallback = Box<dyn FnOnce(&Context, bool) + Send>;

#[derive(Default)]
struct TransactionState {
    finished: bool,
    end_callbacks: Vec<TransactionEndCallback>,
}

pub struct Transaction {
    id: Ulid,
    state: Mutex<TransactionState>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Transaction {
            id: Ulid::generate(),
            state: Mutex::new(TransactionState::default()),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    pub fn on_end(&self, callback: TransactionEndCallback) -> Result<(), EvalError> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(errors::invalid_argument("transaction is already finished"));
        }
        state.end_callbacks.push(callback);
        Ok(())
    }

    pub fn commit(&self, ctx: &Context) -> Result<(), EvalError> {
        self.finish(ctx, true)
    }

    pub fn rollback(&self, ctx: &Context) -> Result<(), EvalError> {
        self.finish(ctx, false)
    }

    fn finish(&self, ctx: &Context, success: bool) -> Result<(), EvalError> {
        let callbacks = {
            let mut state = self.state.lock();
            if state.finished {
                return Err(errors::invalid_argument("transaction is already finished"));
            }
            state.finished = true;
            std::mem::take(&mut state.end_callbacks)
        };
        tracing::debug!(transaction = %self.id, success, "transaction finished");
        for callback in callbacks {
            callback(ctx, success);
        }
        ctx.clear_transaction(self);
        Ok(())
    }
}

impl Value {
    pub fn transaction(transaction: Heap<Transaction>) -> Self {
        Value::Transaction(transaction)
    }
}

/// Markup element handed uninterpreted to a namespace's markup factory.
#[derive(Clone)]
pub struct MarkupElement {
    pub name: String,
    pub attributes: Vec<(String, Value)>,
    pub children: Vec<Value>,
}

/// Value whose content is never revealed by printing.
#[derive(Clone)]
pub struct Secret {
    value: Arc<str>,
    pub pattern: Option<Heap<Pattern>>,
}

impl Secret {
    pub fn new(value: impl Into<Arc<str>>, pattern: Option<Heap<Pattern>>) -> Self {
        Secret {
            value: value.into(),
            pattern,
        }
    }

    /// The secret content; callers must not print it.
    pub fn reveal(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(secret)")
    }
}

#[derive(Clone, Debug)]
pub struct SystemGraphNode {
    pub name: String,
    pub type_name: String,
    pub edges: Vec<usize>,
}

/// Graph of the values of a running system, built by host code.
#[derive(Default)]
pub struct SystemGraph {
    nodes: Mutex<Vec<SystemGraphNode>>,
}

impl SystemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the new node.
    pub fn add_node(&self, name: impl Into<String>, type_name: impl Into<String>) -> usize {
        let mut nodes = self.nodes.lock();
        nodes.push(SystemGraphNode {
            name: name.into(),
            type_name: type_name.into(),
            edges: Vec::new(),
        });
        nodes.len() - 1
    }

    pub fn add_edge(&self, from: usize, to: usize) -> Result<(), EvalError> {
        let mut nodes = self.nodes.lock();
        let len = nodes.len();
        if to >= len {
            return Err(errors::index_out_of_bounds(
                i64::try_from(to).unwrap_or(i64::MAX),
                len,
            ));
        }
        match nodes.get_mut(from) {
            Some(node) => {
                node.edges.push(to);
                Ok(())
            }
            None => Err(errors::index_out_of_bounds(
                i64::try_from(from).unwrap_or(i64::MAX),
                len,
            )),
        }
    }

    pub fn nodes(&self) -> Vec<SystemGraphNode> {
        self.nodes.lock().clone()
    }
}

/// Handler attached to an object, run by `sendval` for matching values.
#[derive(Clone)]
pub struct ReceptionHandler {
    pub pattern: Heap<Pattern>,
    pub handler: Value,
}

/// Job attached to an object: an embedded module spawned as an lthread
/// with `self` bound to the object.
#[derive(Clone)]
pub struct LifetimeJob {
    pub ast: SharedAst,
    pub module: NodeId,
    pub meta: Value,
    pub subject: Option<Heap<Pattern>>,
    pub captured_globals: Vec<(String, Value)>,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::context::ContextConfig;

    #[test]
    fn ulid_text_round_trip() {
        let ulid = Ulid::generate();
        let text = ulid.to_string();
        assert_eq!(text.len(), 26);
        assert_eq!(Ulid::parse(&text), Some(ulid));
    }

    #[test]
    fn port_display() {
        let port = Port {
            number: 443,
            scheme: Some("https".into()),
        };
        assert_eq!(port.to_string(), ":443/https");
    }

    #[test]
    fn transaction_runs_end_callbacks_once() {
        let ctx = Context::new_root(ContextConfig::default());
        let tx = ctx.start_transaction().unwrap();
        let committed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&committed);
        tx.on_end(Box::new(move |_, success| flag.store(success, Ordering::SeqCst)))
            .unwrap();
        tx.commit(&ctx).unwrap();
        assert!(committed.load(Ordering::SeqCst));
        assert!(tx.rollback(&ctx).is_err());
        assert!(ctx.current_transaction().is_none());
    }

    #[test]
    fn namespace_lookup() {
        let ns = Namespace::new(
            "ns",
            vec![("b".into(), Value::int(2)), ("a".into(), Value::int(1))],
        );
        assert_eq!(ns.get("a").and_then(Value::as_int), Some(1));
        assert!(ns.get("c").is_none());
    }

    #[test]
    fn system_graph_edges() {
        let graph = SystemGraph::new();
        let a = graph.add_node("a", "object");
        let b = graph.add_node("b", "list");
        graph.add_edge(a, b).unwrap();
        assert!(graph.add_edge(a, 9).is_err());
        assert_eq!(graph.nodes()[a].edges, vec![b]);
    }
}
