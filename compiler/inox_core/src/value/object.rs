//! Objects (mutable, lockable) and records (their immutable sibling).
//!
//! # Key order
//!
//! Keys live in a sorted vector with a parallel value vector. Every insertion
//! goes to its sorted position, so iteration, pretty printing and equality
//! always see keys in the same order whatever the construction order was.
//!
//! # Implicit property
//!
//! Elements written without a key in an object literal are collected into a
//! list stored under [`IMPLICIT_PROP_NAME`].

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::{Heap, ReceptionHandler, Value};
use crate::context::Context;
use crate::errors::EvalError;
use crate::mutation::{CallbackHandle, Mutation, MutationCallbackFn, MutationCallbacks};
use crate::smart_lock::SmartLock;

/// Key of the list holding the elements written without a key.
pub const IMPLICIT_PROP_NAME: &str = "";

#[derive(Default)]
struct ObjectData {
    keys: Vec<String>,
    values: Vec<Value>,
    handlers: Vec<Heap<ReceptionHandler>>,
}

impl ObjectData {
    fn from_entries(entries: Vec<(String, Value)>) -> Self {
        let mut data = ObjectData::default();
        for (key, value) in entries {
            data.insert(key, value);
        }
        data
    }

    /// Returns whether the key was new.
    fn insert(&mut self, key: String, value: Value) -> bool {
        match self.keys.binary_search(&key) {
            Ok(index) => {
                self.values[index] = value;
                false
            }
            Err(index) => {
                self.keys.insert(index, key);
                self.values.insert(index, value);
                true
            }
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .binary_search_by(|k| k.as_str().cmp(key))
            .ok()
            .map(|index| &self.values[index])
    }
}

/// Mutable ordered map from property names to values.
pub struct Object {
    data: RwLock<ObjectData>,
    shared: AtomicBool,
    lock: SmartLock,
    callbacks: MutationCallbacks,
}

impl Object {
    pub(crate) fn new(entries: Vec<(String, Value)>) -> Self {
        Object {
            data: RwLock::new(ObjectData::from_entries(entries)),
            shared: AtomicBool::new(false),
            lock: SmartLock::new(),
            callbacks: MutationCallbacks::new(),
        }
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.data.read().get(name).cloned()
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.data.read().get(name).is_some()
    }

    /// Property names in sorted order, the implicit key included.
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys.clone()
    }

    /// Property names without the implicit key.
    pub fn property_names(&self) -> Vec<String> {
        self.data
            .read()
            .keys
            .iter()
            .filter(|k| k.as_str() != IMPLICIT_PROP_NAME)
            .cloned()
            .collect()
    }

    /// Snapshot of the entries in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let data = self.data.read();
        data.keys
            .iter()
            .cloned()
            .zip(data.values.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().keys.is_empty()
    }

    /// Elements written without a key, if any.
    pub fn implicit_elements(&self) -> Vec<Value> {
        match self.prop(IMPLICIT_PROP_NAME) {
            Some(Value::List(list)) => list.snapshot(),
            _ => Vec::new(),
        }
    }

    /// Set a property, locking the object first when it is shared, then
    /// notify watchers.
    pub fn set_prop(&self, ctx: &Context, name: &str, value: Value) -> Result<(), EvalError> {
        let _guard = if self.is_shared() {
            value.share(ctx)?;
            Some(self.lock.guard(ctx)?)
        } else {
            None
        };

        let added = self.data.write().insert(name.to_string(), value.clone());
        let mutation = if added {
            Mutation::add_prop(name, value)
        } else {
            Mutation::update_prop(name, value)
        };
        self.callbacks.fire(ctx, &mutation);
        Ok(())
    }

    pub fn is_shared(&self) -> bool {
        self.shared.load(Ordering::Acquire)
    }

    /// Entries were checked by [`Value::share`].
    pub(crate) fn share(&self, origin: &Context) {
        if self.shared.swap(true, Ordering::AcqRel) {
            return;
        }
        for (_, value) in self.entries() {
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

    /// Number of registered mutation callbacks.
    pub fn watcher_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn add_reception_handler(&self, handler: Heap<ReceptionHandler>) {
        self.data.write().handlers.push(handler);
    }

    pub fn reception_handlers(&self) -> Vec<Heap<ReceptionHandler>> {
        self.data.read().handlers.clone()
    }
}

/// Immutable ordered map from property names to values.
#[derive(Clone, Default)]
pub struct Record {
    keys: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(entries: Vec<(String, Value)>) -> Self {
        let data = ObjectData::from_entries(entries);
        Record {
            keys: data.keys,
            values: data.values,
        }
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.keys
            .binary_search_by(|k| k.as_str().cmp(name))
            .ok()
            .map(|index| &self.values[index])
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn property_names(&self) -> Vec<String> {
        self.keys
            .iter()
            .filter(|k| k.as_str() != IMPLICIT_PROP_NAME)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        self.keys
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests;
