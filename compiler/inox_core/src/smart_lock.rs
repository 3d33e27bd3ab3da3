//! Owner-reentrant lock guarding shared mutable values.
//!
//! A [`SmartLock`] is held by a context, not by an OS thread: the same
//! context can lock it several times, and waiting contexts poll their
//! cancellation state so a cancelled lthread never blocks forever on a lock
//! held by someone else.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::context::{Context, ContextId};
use crate::errors::{self, EvalError};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ContextId>,
    depth: usize,
}

#[derive(Debug, Default)]
pub struct SmartLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl SmartLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `ctx`, waiting while another context holds it.
    ///
    /// Fails with `Cancelled` if `ctx` completes while waiting.
    pub fn lock(&self, ctx: &Context) -> Result<(), EvalError> {
        let id = ctx.id();
        let mut state = self.state.lock();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(id);
                    state.depth = 1;
                    return Ok(());
                }
                Some(owner) if owner == id => {
                    state.depth += 1;
                    return Ok(());
                }
                Some(_) => {
                    if ctx.is_done() {
                        return Err(errors::cancelled());
                    }
                    self.released.wait_for(&mut state, POLL_INTERVAL);
                }
            }
        }
    }

    /// Release one level of ownership. Unlocking a lock held by another
    /// context is a no-op.
    pub fn unlock(&self, ctx: &Context) {
        let mut state = self.state.lock();
        if state.owner != Some(ctx.id()) {
            return;
        }
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.released.notify_all();
        }
    }

    /// Release every level held by `ctx`.
    pub fn force_unlock(&self, ctx: &Context) {
        let mut state = self.state.lock();
        if state.owner == Some(ctx.id()) {
            state.owner = None;
            state.depth = 0;
            drop(state);
            self.released.notify_all();
        }
    }

    pub fn is_held_by(&self, ctx: &Context) -> bool {
        self.state.lock().owner == Some(ctx.id())
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Lock for the lifetime of the returned guard.
    pub fn guard<'a>(&'a self, ctx: &'a Context) -> Result<SmartLockGuard<'a>, EvalError> {
        self.lock(ctx)?;
        Ok(SmartLockGuard { lock: self, ctx })
    }
}

/// Releases one level of a [`SmartLock`] on drop.
pub struct SmartLockGuard<'a> {
    lock: &'a SmartLock,
    ctx: &'a Context,
}

impl Drop for SmartLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock(self.ctx);
    }
}
