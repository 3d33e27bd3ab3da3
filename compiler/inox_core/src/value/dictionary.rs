//! Dictionaries: maps from arbitrary representable keys to values.
//!
//! Entries are indexed by the compact textual representation of their key,
//! which makes `{1: a}` and `{"1": a}` distinct and keeps iteration in
//! sorted key order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::Value;
use crate::context::Context;
use crate::errors::EvalError;
use crate::mutation::{CallbackHandle, Mutation, MutationCallbackFn, MutationCallbacks};
use crate::pretty_print::to_compact_string;
use crate::smart_lock::SmartLock;

pub struct Dictionary {
    entries: RwLock<BTreeMap<String, (Value, Value)>>,
    shared: AtomicBool,
    lock: SmartLock,
    callbacks: MutationCallbacks,
}

impl Dictionary {
    pub(crate) fn new(entries: Vec<(Value, Value)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (Self::key_repr(&k), (k, v)))
            .collect();
        Dictionary {
            entries: RwLock::new(entries),
            shared: AtomicBool::new(false),
            lock: SmartLock::new(),
            callbacks: MutationCallbacks::new(),
        }
    }

    /// Representation under which `key` is stored.
    pub fn key_repr(key: &Value) -> String {
        to_compact_string(key)
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .read()
            .get(&Self::key_repr(key))
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.read().contains_key(&Self::key_repr(key))
    }

    /// Snapshot of the entries in sorted key order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.read().values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.read().values().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn set(&self, ctx: &Context, key: Value, value: Value) -> Result<(), EvalError> {
        let _guard = if self.is_shared() {
            value.share(ctx)?;
            Some(self.lock.guard(ctx)?)
        } else {
            None
        };
        let repr = Self::key_repr(&key);
        let added = self
            .entries
            .write()
            .insert(repr.clone(), (key, value.clone()))
            .is_none();
        let mutation = if added {
            Mutation::add_prop(&repr, value)
        } else {
            Mutation::update_prop(&repr, value)
        };
        self.callbacks.fire(ctx, &mutation);
        Ok(())
    }

    pub fn is_shared(&self) -> bool {
        self.shared.load(Ordering::Acquire)
    }

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
}
