//! Mutable rune and byte slices.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::Value;
use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::{CallbackHandle, Mutation, MutationCallbackFn, MutationCallbacks};
use crate::smart_lock::SmartLock;

macro_rules! mutable_slice {
    ($(#[$doc:meta])* $name:ident, $elem:ty, $variant:ident, $elem_name:literal) => {
        $(#[$doc])*
        pub struct $name {
            items: RwLock<Vec<$elem>>,
            shared: AtomicBool,
            lock: SmartLock,
            callbacks: MutationCallbacks,
        }

        impl $name {
            pub(crate) fn new(items: Vec<$elem>) -> Self {
                $name {
                    items: RwLock::new(items),
                    shared: AtomicBool::new(false),
                    lock: SmartLock::new(),
                    callbacks: MutationCallbacks::new(),
                }
            }

            pub fn len(&self) -> usize {
                self.items.read().len()
            }

            pub fn is_empty(&self) -> bool {
                self.items.read().is_empty()
            }

            pub fn at(&self, index: usize) -> Option<$elem> {
                self.items.read().get(index).copied()
            }

            pub fn to_vec(&self) -> Vec<$elem> {
                self.items.read().clone()
            }

            pub fn set(&self, ctx: &Context, index: usize, value: &Value) -> Result<(), EvalError> {
                let Value::$variant(elem) = value else {
                    return Err(errors::type_mismatch($elem_name, value.type_name()));
                };
                let _guard = if self.is_shared() {
                    Some(self.lock.guard(ctx)?)
                } else {
                    None
                };
                {
                    let mut items = self.items.write();
                    let len = items.len();
                    let Some(slot) = items.get_mut(index) else {
                        return Err(errors::index_out_of_bounds(
                            i64::try_from(index).unwrap_or(i64::MAX),
                            len,
                        ));
                    };
                    *slot = *elem;
                }
                self.callbacks.fire(ctx, &Mutation::set_elem(index, value.clone()));
                Ok(())
            }

            pub fn is_shared(&self) -> bool {
                self.shared.load(Ordering::Acquire)
            }

            pub(crate) fn share(&self) {
                self.shared.store(true, Ordering::Release);
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
    };
}

mutable_slice!(
    /// Mutable sequence of runes.
    RuneSlice,
    char,
    Rune,
    "rune"
);

mutable_slice!(
    /// Mutable sequence of bytes.
    ByteSlice,
    u8,
    Byte,
    "byte"
);

impl RuneSlice {
    pub fn to_text(&self) -> String {
        self.items.read().iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;

    #[test]
    fn set_checks_the_element_kind() {
        let ctx = Context::new_root(ContextConfig::default());
        let slice = ByteSlice::new(vec![1, 2]);
        assert!(slice.set(&ctx, 0, &Value::Rune('a')).is_err());
        slice.set(&ctx, 1, &Value::Byte(9)).unwrap();
        assert_eq!(slice.to_vec(), vec![1, 9]);
    }

    #[test]
    fn rune_slice_text() {
        let slice = RuneSlice::new("héllo".chars().collect());
        assert_eq!(slice.len(), 5);
        assert_eq!(slice.to_text(), "héllo");
    }
}
