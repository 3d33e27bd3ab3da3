//! RAII-style scope guards for the interpreter's local scopes and call frames.
//!
//! # Design
//!
//! The guard holds `&mut Interpreter` and implements `Deref`/`DerefMut`, so
//! the interpreter is used through it transparently. Dropping the guard pops
//! the local scope, even during unwinding. A call-frame guard additionally
//! restores the caller's AST, `self`, captured globals and pending
//! control-flow change.
//!
//! # Usage
//!
//! ```text
//! let mut scoped = interpreter.call_frame(ast, self_value, captured)?;
//! scoped.env.set(param, arg);
//! scoped.eval(body)?;
//! // caller state restored here
//! ```

use std::ops::{Deref, DerefMut};

use inox_core::errors::{self, AssertionData, EvalError};
use inox_core::Value;
use inox_ir::SharedAst;

use super::{Interpreter, IterationChange};

/// Caller state saved by a call frame.
struct SavedFrame {
    ast: SharedAst,
    self_value: Option<Value>,
    iteration_change: IterationChange,
    assertion: Option<AssertionData>,
}

/// RAII guard popping a local scope (and restoring a call frame) on drop.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
    saved: Option<SavedFrame>,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
        if let Some(saved) = self.saved.take() {
            self.interpreter.ast = saved.ast;
            self.interpreter.self_value = saved.self_value;
            self.interpreter.iteration_change = saved.iteration_change;
            self.interpreter.assertion = saved.assertion;
            self.interpreter.captured_globals.pop();
            self.interpreter.call_depth -= 1;
        }
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Fresh local scope, popped when the guard is dropped.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        self.env.push_scope();
        ScopedInterpreter {
            interpreter: self,
            saved: None,
        }
    }

    /// Execute `f` within a fresh local scope.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Fresh local scope evaluating code of `ast` with `self_value` bound and
    /// `captured_globals` shadowing the module's globals.
    ///
    /// Fails with `StackOverflow` past the configured call depth.
    pub fn call_frame(
        &mut self,
        ast: SharedAst,
        self_value: Option<Value>,
        captured_globals: Vec<(String, Value)>,
    ) -> Result<ScopedInterpreter<'_>, EvalError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(errors::stack_overflow(self.call_depth));
        }
        let saved = SavedFrame {
            ast: std::mem::replace(&mut self.ast, ast),
            self_value: std::mem::replace(&mut self.self_value, self_value),
            iteration_change: std::mem::take(&mut self.iteration_change),
            assertion: self.assertion.take(),
        };
        self.captured_globals.push(captured_globals);
        self.call_depth += 1;
        self.env.push_scope();
        Ok(ScopedInterpreter {
            interpreter: self,
            saved: Some(saved),
        })
    }
}
