//! Lists (mutable, optionally specialised) and tuples.
//!
//! A list whose element type is known to be `int`, `float`, `bool` or `str`
//! stores its elements unboxed. Storing a value of another kind in such a
//! list fails with `TypeMismatch`.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Heap, ScalarInt, Value};
use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::{
    CallbackHandle, Mutation, MutationCallbackFn, MutationCallbacks, MutationKind,
};
use crate::smart_lock::SmartLock;

/// Element kind of a specialised list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListElementKind {
    Int,
    Float,
    Bool,
    Str,
}

impl ListElementKind {
    /// Kind selected by a list type annotation naming a default pattern.
    pub fn from_pattern_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => ListElementKind::Int,
            "float" => ListElementKind::Float,
            "bool" => ListElementKind::Bool,
            "str" => ListElementKind::Str,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ListElementKind::Int => "int",
            ListElementKind::Float => "float",
            ListElementKind::Bool => "bool",
            ListElementKind::Str => "str",
        }
    }
}

enum ListStorage {
    Values(Vec<Value>),
    Ints(Vec<ScalarInt>),
    Floats(Vec<f64>),
    Bools(Vec<bool>),
    Strs(Vec<Heap<str>>),
}

impl ListStorage {
    fn empty(kind: ListElementKind) -> Self {
        match kind {
            ListElementKind::Int => ListStorage::Ints(Vec::new()),
            ListElementKind::Float => ListStorage::Floats(Vec::new()),
            ListElementKind::Bool => ListStorage::Bools(Vec::new()),
            ListElementKind::Str => ListStorage::Strs(Vec::new()),
        }
    }

    fn kind(&self) -> Option<ListElementKind> {
        match self {
            ListStorage::Values(_) => None,
            ListStorage::Ints(_) => Some(ListElementKind::Int),
            ListStorage::Floats(_) => Some(ListElementKind::Float),
            ListStorage::Bools(_) => Some(ListElementKind::Bool),
            ListStorage::Strs(_) => Some(ListElementKind::Str),
        }
    }

    fn len(&self) -> usize {
        match self {
            ListStorage::Values(v) => v.len(),
            ListStorage::Ints(v) => v.len(),
            ListStorage::Floats(v) => v.len(),
            ListStorage::Bools(v) => v.len(),
            ListStorage::Strs(v) => v.len(),
        }
    }

    fn get(&self, index: usize) -> Option<Value> {
        match self {
            ListStorage::Values(v) => v.get(index).cloned(),
            ListStorage::Ints(v) => v.get(index).map(|n| Value::Int(*n)),
            ListStorage::Floats(v) => v.get(index).map(|f| Value::Float(*f)),
            ListStorage::Bools(v) => v.get(index).map(|b| Value::Bool(*b)),
            ListStorage::Strs(v) => v.get(index).map(|s| Value::Str(s.clone())),
        }
    }

    fn to_vec(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    fn replace_range(&mut self, range: Range<usize>, values: Vec<Value>) -> Result<(), EvalError> {
        fn convert<T>(
            values: Vec<Value>,
            kind: ListElementKind,
            f: impl Fn(Value) -> Option<T>,
        ) -> Result<Vec<T>, EvalError> {
            values
                .into_iter()
                .map(|v| {
                    let type_name = v.type_name();
                    f(v).ok_or_else(|| errors::type_mismatch(kind.name(), type_name))
                })
                .collect()
        }

        match self {
            ListStorage::Values(v) => {
                v.splice(range, values);
            }
            ListStorage::Ints(v) => {
                let items = convert(values, ListElementKind::Int, |x| match x {
                    Value::Int(n) => Some(n),
                    _ => None,
                })?;
                v.splice(range, items);
            }
            ListStorage::Floats(v) => {
                let items = convert(values, ListElementKind::Float, |x| match x {
                    Value::Float(f) => Some(f),
                    _ => None,
                })?;
                v.splice(range, items);
            }
            ListStorage::Bools(v) => {
                let items = convert(values, ListElementKind::Bool, |x| match x {
                    Value::Bool(b) => Some(b),
                    _ => None,
                })?;
                v.splice(range, items);
            }
            ListStorage::Strs(v) => {
                let items = convert(values, ListElementKind::Str, |x| match x {
                    Value::Str(s) => Some(s),
                    _ => None,
                })?;
                v.splice(range, items);
            }
        }
        Ok(())
    }
}

/// Mutable ordered sequence.
pub struct List {
    storage: RwLock<ListStorage>,
    shared: AtomicBool,
    lock: SmartLock,
    callbacks: MutationCallbacks,
}

impl List {
    pub(crate) fn new(items: Vec<Value>) -> Self {
        Self::with_storage(ListStorage::Values(items))
    }

    pub(crate) fn typed(kind: ListElementKind, items: Vec<Value>) -> Result<Self, EvalError> {
        let mut storage = ListStorage::empty(kind);
        storage.replace_range(0..0, items)?;
        Ok(Self::with_storage(storage))
    }

    fn with_storage(storage: ListStorage) -> Self {
        List {
            storage: RwLock::new(storage),
            shared: AtomicBool::new(false),
            lock: SmartLock::new(),
            callbacks: MutationCallbacks::new(),
        }
    }

    /// Element kind of a specialised list, `None` for a generic list.
    pub fn element_kind(&self) -> Option<ListElementKind> {
        self.storage.read().kind()
    }

    pub fn len(&self) -> usize {
        self.storage.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at(&self, index: usize) -> Option<Value> {
        self.storage.read().get(index)
    }

    /// Copy of the elements.
    pub fn snapshot(&self) -> Vec<Value> {
        self.storage.read().to_vec()
    }

    /// Copy of the elements, taken under the lock when the list is shared.
    pub fn locked_snapshot(&self, ctx: &Context) -> Result<Vec<Value>, EvalError> {
        let _guard = self.guard_if_shared(ctx)?;
        Ok(self.snapshot())
    }

    pub fn set(&self, ctx: &Context, index: usize, value: Value) -> Result<(), EvalError> {
        let _guard = self.prepare_mutation(ctx, std::slice::from_ref(&value))?;
        {
            let mut storage = self.storage.write();
            let len = storage.len();
            if index >= len {
                return Err(errors::index_out_of_bounds(
                    i64::try_from(index).unwrap_or(i64::MAX),
                    len,
                ));
            }
            storage.replace_range(index..index + 1, vec![value.clone()])?;
        }
        self.callbacks.fire(ctx, &Mutation::set_elem(index, value));
        Ok(())
    }

    /// Replace `start..end` by `values`; the range must be non-empty.
    pub fn set_slice(
        &self,
        ctx: &Context,
        start: usize,
        end: usize,
        values: Vec<Value>,
    ) -> Result<(), EvalError> {
        if start >= end {
            return Err(errors::invalid_argument(format!(
                "slice start ({start}) should be smaller than its end ({end})"
            )));
        }
        let _guard = self.prepare_mutation(ctx, &values)?;
        {
            let mut storage = self.storage.write();
            let len = storage.len();
            if end > len {
                return Err(errors::index_out_of_bounds(
                    i64::try_from(end).unwrap_or(i64::MAX),
                    len,
                ));
            }
            storage.replace_range(start..end, values.clone())?;
        }
        let mutation = Mutation::new(
            MutationKind::SetSliceAtRange,
            format!("/{start}..{end}"),
            &values,
        );
        self.callbacks.fire(ctx, &mutation);
        Ok(())
    }

    pub fn append(&self, ctx: &Context, values: Vec<Value>) -> Result<(), EvalError> {
        let _guard = self.prepare_mutation(ctx, &values)?;
        let index = {
            let mut storage = self.storage.write();
            let len = storage.len();
            storage.replace_range(len..len, values.clone())?;
            len
        };
        let mutation = if values.len() == 1 {
            Mutation::insert_elem(index, values[0].clone())
        } else {
            Mutation::new(
                MutationKind::InsertSequenceAtIndex,
                format!("/{index}"),
                &values,
            )
        };
        self.callbacks.fire(ctx, &mutation);
        Ok(())
    }

    pub fn insert(&self, ctx: &Context, index: usize, value: Value) -> Result<(), EvalError> {
        let _guard = self.prepare_mutation(ctx, std::slice::from_ref(&value))?;
        {
            let mut storage = self.storage.write();
            let len = storage.len();
            if index > len {
                return Err(errors::index_out_of_bounds(
                    i64::try_from(index).unwrap_or(i64::MAX),
                    len,
                ));
            }
            storage.replace_range(index..index, vec![value.clone()])?;
        }
        self.callbacks.fire(ctx, &Mutation::insert_elem(index, value));
        Ok(())
    }

    pub fn remove(&self, ctx: &Context, index: usize) -> Result<Value, EvalError> {
        let _guard = self.prepare_mutation(ctx, &[])?;
        let removed = {
            let mut storage = self.storage.write();
            let len = storage.len();
            let Some(removed) = storage.get(index) else {
                return Err(errors::index_out_of_bounds(
                    i64::try_from(index).unwrap_or(i64::MAX),
                    len,
                ));
            };
            storage.replace_range(index..index + 1, Vec::new())?;
            removed
        };
        let mutation = Mutation::new(MutationKind::RemovePosition, format!("/{index}"), &[]);
        self.callbacks.fire(ctx, &mutation);
        Ok(removed)
    }

    fn guard_if_shared<'a>(
        &'a self,
        ctx: &'a Context,
    ) -> Result<Option<crate::smart_lock::SmartLockGuard<'a>>, EvalError> {
        if self.is_shared() {
            Ok(Some(self.lock.guard(ctx)?))
        } else {
            Ok(None)
        }
    }

    fn prepare_mutation<'a>(
        &'a self,
        ctx: &'a Context,
        incoming: &[Value],
    ) -> Result<Option<crate::smart_lock::SmartLockGuard<'a>>, EvalError> {
        if self.is_shared() {
            for value in incoming {
                value.share(ctx)?;
            }
        }
        self.guard_if_shared(ctx)
    }

    pub fn is_shared(&self) -> bool {
        self.shared.load(Ordering::Acquire)
    }

    pub(crate) fn share(&self, origin: &Context) {
        if self.shared.swap(true, Ordering::AcqRel) {
            return;
        }
        for value in self.snapshot() {
            value.share_checked(origin);
        }
    }

    pub fn smart_lock(&self) -> &SmartLock {
        &self.lock
    }

    pub fn on_mutation(&self, callback: MutationCallbackFn) -> CallbackHandle {
        self.callbacks.add(callback)
    }

    pub fn remove_mutation_callback(&self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(handle)
    }
}

/// Immutable ordered sequence.
#[derive(Clone, Default)]
pub struct Tuple {
    items: Arc<[Value]>,
}

impl Tuple {
    pub(crate) fn new(items: Vec<Value>) -> Self {
        Tuple {
            items: items.into(),
        }
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::ContextConfig;
    use crate::errors::EvalErrorKind;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|n| Value::int(*n)).collect()
    }

    #[test]
    fn typed_list_rejects_other_kinds() {
        let ctx = Context::new_root(ContextConfig::default());
        let list = List::typed(ListElementKind::Int, ints(&[1, 2])).unwrap();
        assert_eq!(list.element_kind(), Some(ListElementKind::Int));

        let err = list.set(&ctx, 0, Value::str("x")).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::TypeMismatch { .. }));
        assert!(list.at(0).unwrap().equals(&Value::int(1)));
    }

    #[test]
    fn typed_construction_validates_elements() {
        assert!(List::typed(ListElementKind::Bool, vec![Value::int(1)]).is_err());
    }

    #[test]
    fn set_slice_requires_a_non_empty_range() {
        let ctx = Context::new_root(ContextConfig::default());
        let list = List::new(ints(&[1, 2, 3]));
        assert!(list.set_slice(&ctx, 2, 2, ints(&[9])).is_err());

        list.set_slice(&ctx, 0, 2, ints(&[7])).unwrap();
        let values: Vec<i64> = list.snapshot().iter().filter_map(Value::as_int).collect();
        assert_eq!(values, vec![7, 3]);
    }

    #[test]
    fn set_out_of_bounds() {
        let ctx = Context::new_root(ContextConfig::default());
        let list = List::new(ints(&[1]));
        let err = list.set(&ctx, 1, Value::Nil).unwrap_err();
        assert!(matches!(
            err.kind,
            EvalErrorKind::IndexOutOfBounds { index: 1, len: 1 }
        ));
    }

    #[test]
    fn append_and_remove() {
        let ctx = Context::new_root(ContextConfig::default());
        let list = List::new(Vec::new());
        list.append(&ctx, ints(&[1, 2])).unwrap();
        list.insert(&ctx, 0, Value::int(0)).unwrap();
        assert_eq!(list.len(), 3);
        let removed = list.remove(&ctx, 1).unwrap();
        assert!(removed.equals(&Value::int(1)));
        assert_eq!(list.len(), 2);
    }
}
