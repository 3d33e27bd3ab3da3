//! Enforced `Arc` wrapper for heap-allocated values.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared pointer to a heap value.
///
/// The constructor is crate-private: outside `inox_core`, heap values are
/// built through the factory methods on [`Value`](super::Value) and the
/// `shared` constructors of the pattern types. Identity of
/// mutable containers (`is` operator, equality cycle detection) is the
/// address of the allocation.
#[repr(transparent)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    #[inline]
    pub(crate) fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Heap<T> {
    #[inline]
    pub(crate) fn from_arc(arc: Arc<T>) -> Self {
        Heap(arc)
    }

    /// Same allocation.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Address of the allocation, used as an identity key.
    #[inline]
    pub fn addr(this: &Self) -> usize {
        Arc::as_ptr(&this.0).cast::<()>() as usize
    }

    #[inline]
    pub fn arc(this: &Self) -> &Arc<T> {
        &this.0
    }
}

impl<T: ?Sized> Clone for Heap<T> {
    #[inline]
    fn clone(&self) -> Self {
        Heap(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.0).fmt(f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.0).fmt(f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_allocation() {
        let a = Heap::new(vec![1, 2, 3]);
        let b = a.clone();
        assert!(Heap::ptr_eq(&a, &b));
        assert_eq!(Heap::addr(&a), Heap::addr(&b));
    }

    #[test]
    fn equality_is_structural() {
        let a = Heap::new("x".to_string());
        let b = Heap::new("x".to_string());
        assert_eq!(a, b);
        assert!(!Heap::ptr_eq(&a, &b));
    }
}
