//! Handles on lightweight threads.
//!
//! The evaluator runs an lthread's module on its own OS thread and reports the
//! outcome through [`LThread::finish`]. Waiters block on a condition variable
//! with a short timeout so that a waiter whose own context completes stops
//! waiting.

use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::{Heap, Value};
use crate::context::Context;
use crate::errors::{self, EvalError};

/// Outcome of an lthread.
pub type LThreadResult = Result<Value, EvalError>;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub struct LThread {
    ctx: Context,
    name: String,
    result: Mutex<Option<LThreadResult>>,
    finished: Condvar,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl LThread {
    /// Handle for an lthread running in `ctx`.
    pub fn new(ctx: Context, name: impl Into<String>) -> Self {
        LThread {
            ctx,
            name: name.into(),
            result: Mutex::new(None),
            finished: Condvar::new(),
            thread: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_thread(&self, handle: JoinHandle<()>) {
        *self.thread.lock() = Some(handle);
    }

    /// Record the outcome and wake the waiters. Later calls are ignored.
    pub fn finish(&self, result: LThreadResult) {
        let mut slot = self.result.lock();
        if slot.is_none() {
            *slot = Some(result);
        }
        drop(slot);
        self.finished.notify_all();
    }

    pub fn is_done(&self) -> bool {
        self.result.lock().is_some()
    }

    /// Outcome if the lthread is done.
    pub fn try_result(&self) -> Option<LThreadResult> {
        self.result.lock().clone()
    }

    /// Block until the lthread is done.
    ///
    /// Fails with `Cancelled` if `waiter` completes first.
    pub fn wait_result(&self, waiter: &Context) -> LThreadResult {
        let mut slot = self.result.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            if waiter.is_done() {
                return Err(errors::cancelled());
            }
            self.finished.wait_for(&mut slot, WAIT_POLL_INTERVAL);
        }
    }

    /// Cancel the lthread's context.
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    /// Join the OS thread if the lthread is done.
    pub fn join(&self) {
        if !self.is_done() {
            return;
        }
        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                tracing::warn!(lthread = %self.name, "lthread thread panicked");
            }
        }
    }
}

/// Set of lthreads spawned with the same `group` meta property.
#[derive(Default)]
pub struct LThreadGroup {
    members: Mutex<Vec<Heap<LThread>>>,
}

impl LThreadGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, lthread: Heap<LThread>) {
        self.members.lock().push(lthread);
    }

    pub fn members(&self) -> Vec<Heap<LThread>> {
        self.members.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Results of all members in spawn order; the first error wins.
    pub fn wait_all_results(&self, waiter: &Context) -> Result<Vec<Value>, EvalError> {
        self.members()
            .iter()
            .map(|lthread| lthread.wait_result(waiter))
            .collect()
    }

    pub fn cancel_all(&self) {
        for lthread in self.members() {
            lthread.cancel();
        }
    }
}

impl Value {
    pub fn lthread(lthread: LThread) -> Self {
        Value::LThread(Heap::new(lthread))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::context::ContextConfig;

    #[test]
    fn wait_result_returns_the_finished_value() {
        let root = Context::new_root(ContextConfig::default());
        let lthread = Arc::new(LThread::new(root.new_child(ContextConfig::default()).unwrap(), "t"));
        let worker = Arc::clone(&lthread);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            worker.finish(Ok(Value::int(7)));
        });
        let result = lthread.wait_result(&root).unwrap();
        assert_eq!(result.as_int(), Some(7));
    }

    #[test]
    fn first_finish_wins() {
        let root = Context::new_root(ContextConfig::default());
        let lthread = LThread::new(root.clone(), "t");
        lthread.finish(Ok(Value::int(1)));
        lthread.finish(Ok(Value::int(2)));
        assert_eq!(lthread.try_result().unwrap().unwrap().as_int(), Some(1));
    }

    #[test]
    fn waiter_cancellation() {
        let root = Context::new_root(ContextConfig::default());
        let waiter = root.new_child(ContextConfig::default()).unwrap();
        let lthread = LThread::new(root.clone(), "t");
        waiter.cancel();
        assert!(lthread.wait_result(&waiter).unwrap_err().is_cancellation());
    }
}
