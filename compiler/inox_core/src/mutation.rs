//! Mutation events and per-value callback lists.
//!
//! # Design
//!
//! Each watchable value owns a [`MutationCallbacks`] list. Entries are keyed
//! by a [`CallbackHandle`] so that a dependent (for example a dynamic value)
//! can deregister itself without the source holding a pointer back to it.
//!
//! Callbacks fire synchronously, in registration order, before the mutating
//! operation returns. Dispatch is serialised by a reentrant lock: a callback
//! that mutates the same value again dispatches the nested mutation on the
//! same thread instead of deadlocking. A callback returning `false` is
//! removed after it ran.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use smallvec::SmallVec;

use crate::context::Context;
use crate::value::Value;

/// Kind of change reported to watchers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    AddProp,
    UpdateProp,
    InsertElemAtIndex,
    SetElemAtIndex,
    RemovePosition,
    RemovePositionRange,
    InsertSequenceAtIndex,
    SetSliceAtRange,
    Unspecified,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::AddProp => "add-prop",
            MutationKind::UpdateProp => "update-prop",
            MutationKind::InsertElemAtIndex => "insert-elem-at-index",
            MutationKind::SetElemAtIndex => "set-elem-at-index",
            MutationKind::RemovePosition => "remove-position",
            MutationKind::RemovePositionRange => "remove-position-range",
            MutationKind::InsertSequenceAtIndex => "insert-seq-at-index",
            MutationKind::SetSliceAtRange => "set-slice-at-range",
            MutationKind::Unspecified => "unspecified-mutation",
        }
    }

    /// Inverse of [`MutationKind::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "add-prop" => MutationKind::AddProp,
            "update-prop" => MutationKind::UpdateProp,
            "insert-elem-at-index" => MutationKind::InsertElemAtIndex,
            "set-elem-at-index" => MutationKind::SetElemAtIndex,
            "remove-position" => MutationKind::RemovePosition,
            "remove-position-range" => MutationKind::RemovePositionRange,
            "insert-seq-at-index" => MutationKind::InsertSequenceAtIndex,
            "set-slice-at-range" => MutationKind::SetSliceAtRange,
            "unspecified-mutation" => MutationKind::Unspecified,
            _ => return None,
        })
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change applied to a watchable value.
#[derive(Clone, Debug)]
pub struct Mutation {
    pub kind: MutationKind,
    /// Path of the changed location relative to the value, e.g. `/a` or `/3`.
    pub path: String,
    /// New values involved in the change.
    pub data: SmallVec<[Value; 2]>,
}

impl Mutation {
    pub fn new(kind: MutationKind, path: impl Into<String>, data: &[Value]) -> Self {
        Mutation {
            kind,
            path: path.into(),
            data: data.iter().cloned().collect(),
        }
    }

    pub fn add_prop(name: &str, value: Value) -> Self {
        Self::new(MutationKind::AddProp, format!("/{name}"), &[value])
    }

    pub fn update_prop(name: &str, value: Value) -> Self {
        Self::new(MutationKind::UpdateProp, format!("/{name}"), &[value])
    }

    pub fn set_elem(index: usize, value: Value) -> Self {
        Self::new(MutationKind::SetElemAtIndex, format!("/{index}"), &[value])
    }

    pub fn insert_elem(index: usize, value: Value) -> Self {
        Self::new(MutationKind::InsertElemAtIndex, format!("/{index}"), &[value])
    }

    pub fn unspecified(path: impl Into<String>) -> Self {
        Self::new(MutationKind::Unspecified, path, &[])
    }
}

/// Identifies a registered callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u64);

impl CallbackHandle {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        CallbackHandle(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Mutation callback; returning `false` unregisters it.
pub type MutationCallbackFn = Arc<dyn Fn(&Context, &Mutation) -> bool + Send + Sync>;

/// Callbacks registered on one watchable value.
#[derive(Default)]
pub struct MutationCallbacks {
    entries: Mutex<Vec<(CallbackHandle, MutationCallbackFn)>>,
    dispatch: ReentrantMutex<()>,
}

impl MutationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: MutationCallbackFn) -> CallbackHandle {
        let handle = CallbackHandle::next();
        self.entries.lock().push((handle, callback));
        handle
    }

    /// Returns whether a callback was removed.
    pub fn remove(&self, handle: CallbackHandle) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(h, _)| *h != handle);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Call every callback in registration order.
    pub fn fire(&self, ctx: &Context, mutation: &Mutation) {
        let _dispatch = self.dispatch.lock();
        let snapshot: Vec<(CallbackHandle, MutationCallbackFn)> = self.entries.lock().clone();
        if snapshot.is_empty() {
            return;
        }
        tracing::trace!(kind = %mutation.kind, path = %mutation.path, "dispatching mutation");

        let mut finished = SmallVec::<[CallbackHandle; 2]>::new();
        for (handle, callback) in &snapshot {
            if !callback(ctx, mutation) {
                finished.push(*handle);
            }
        }
        if !finished.is_empty() {
            self.entries.lock().retain(|(h, _)| !finished.contains(h));
        }
    }
}

impl fmt::Debug for MutationCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCallbacks")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::context::{Context, ContextConfig};

    #[test]
    fn callbacks_fire_in_registration_order() {
        let ctx = Context::new_root(ContextConfig::default());
        let callbacks = MutationCallbacks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            callbacks.add(Arc::new(move |_, _| {
                order.lock().push(i);
                true
            }));
        }

        callbacks.fire(&ctx, &Mutation::unspecified(""));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn returning_false_unregisters() {
        let ctx = Context::new_root(ContextConfig::default());
        let callbacks = MutationCallbacks::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        callbacks.add(Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            false
        }));

        callbacks.fire(&ctx, &Mutation::unspecified(""));
        callbacks.fire(&ctx, &Mutation::unspecified(""));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(callbacks.is_empty());
    }

    #[test]
    fn remove_by_handle() {
        let callbacks = MutationCallbacks::new();
        let handle = callbacks.add(Arc::new(|_, _| true));
        assert!(callbacks.remove(handle));
        assert!(!callbacks.remove(handle));
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            MutationKind::AddProp,
            MutationKind::UpdateProp,
            MutationKind::SetSliceAtRange,
            MutationKind::Unspecified,
        ] {
            assert_eq!(MutationKind::from_name(kind.as_str()), Some(kind));
        }
    }
}
