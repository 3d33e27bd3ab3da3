//! Global and local variable storage.
//!
//! Globals live in a [`GlobalState`] shared by the interpreters of one
//! lthread (the module itself, the functions it calls back through the
//! dispatcher, its test suites). Locals live in a stack of frames; a frame
//! is pushed per function call and per mapping computation, and only the
//! top frame is visible.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use inox_check::InputGlobal;
use inox_core::{EvalError, Value};

#[derive(Clone)]
struct GlobalEntry {
    value: Value,
    constant: bool,
    /// Start constants are passed on to spawned lthreads.
    start_constant: bool,
}

/// Globals of a running module.
#[derive(Clone, Default)]
pub struct GlobalState(Arc<RwLock<FxHashMap<String, GlobalEntry>>>);

/// Non-owning handle on a [`GlobalState`].
#[derive(Clone, Default)]
pub struct WeakGlobalState(Weak<RwLock<FxHashMap<String, GlobalEntry>>>);

impl WeakGlobalState {
    pub fn upgrade(&self) -> Option<GlobalState> {
        self.0.upgrade().map(GlobalState)
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding the given start constants.
    pub fn with_start_constants(constants: impl IntoIterator<Item = (String, Value)>) -> Self {
        let state = Self::new();
        for (name, value) in constants {
            state.define_start_constant(name, value);
        }
        state
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read().get(name).map(|entry| entry.value.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.0.read().get(name).is_some_and(|entry| entry.constant)
    }

    pub fn define_start_constant(&self, name: impl Into<String>, value: Value) {
        self.insert(name.into(), value, true, true);
    }

    pub fn define_constant(&self, name: impl Into<String>, value: Value) {
        self.insert(name.into(), value, true, false);
    }

    /// Declare a global variable.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.insert(name.into(), value, false, false);
    }

    fn insert(&self, name: String, value: Value, constant: bool, start_constant: bool) {
        self.0.write().insert(
            name,
            GlobalEntry {
                value,
                constant,
                start_constant,
            },
        );
    }

    /// Assign a global variable, declaring it if needed.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let mut globals = self.0.write();
        match globals.get_mut(name) {
            Some(entry) if entry.constant => Err(EvalError::new(format!(
                "attempt to assign the constant global {name}"
            ))),
            Some(entry) => {
                entry.value = value;
                Ok(())
            }
            None => {
                globals.insert(
                    name.to_string(),
                    GlobalEntry {
                        value,
                        constant: false,
                        start_constant: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Sorted names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted `(name, value)` pairs of every global.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .0
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn start_constants(&self) -> Vec<(String, Value)> {
        let mut constants: Vec<(String, Value)> = self
            .0
            .read()
            .iter()
            .filter(|(_, entry)| entry.start_constant)
            .map(|(name, entry)| (name.clone(), entry.value.clone()))
            .collect();
        constants.sort_by(|a, b| a.0.cmp(&b.0));
        constants
    }

    /// Independent copy; values are not cloned deeply.
    pub fn snapshot(&self) -> GlobalState {
        GlobalState(Arc::new(RwLock::new(self.0.read().clone())))
    }

    /// Globals as seen by the static checker.
    pub fn input_globals(&self) -> Vec<InputGlobal> {
        let globals = self.0.read();
        let mut inputs: Vec<InputGlobal> = globals
            .iter()
            .map(|(name, entry)| InputGlobal {
                name: name.clone(),
                is_start_constant: entry.start_constant,
            })
            .collect();
        inputs.sort_by(|a, b| a.name.cmp(&b.name));
        inputs
    }

    pub fn downgrade(&self) -> WeakGlobalState {
        WeakGlobalState(Arc::downgrade(&self.0))
    }
}

/// Frames of local variables.
#[derive(Default)]
pub struct LocalScopes {
    frames: Vec<FxHashMap<String, Value>>,
}

impl LocalScopes {
    /// Stack with the module's frame.
    pub fn new() -> Self {
        LocalScopes {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.frames.last().and_then(|frame| frame.get(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|frame| frame.contains_key(name))
    }

    /// Bind `name` in the top frame, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if self.frames.is_empty() {
            self.frames.push(FxHashMap::default());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.frames.last_mut().and_then(|frame| frame.remove(name))
    }
}

#[cfg(test)]
mod tests;
