//! `InterpreterBuilder` for creating interpreters of modules, functions,
//! spawned lthreads and test modules.

use std::sync::Arc;

use inox_check::StaticCheckData;
use inox_core::{Context, Value};
use inox_ir::Module;

use super::{Interpreter, IterationChange};
use crate::config::EvalConfig;
use crate::environment::{GlobalState, LocalScopes};

pub struct InterpreterBuilder {
    ctx: Context,
    module: Arc<Module>,
    globals: Option<GlobalState>,
    static_data: Option<Arc<StaticCheckData>>,
    config: Option<Arc<EvalConfig>>,
    self_value: Option<Value>,
}

impl InterpreterBuilder {
    pub fn new(ctx: Context, module: Arc<Module>) -> Self {
        Self {
            ctx,
            module,
            globals: None,
            static_data: None,
            config: None,
            self_value: None,
        }
    }

    #[must_use]
    pub fn globals(mut self, globals: GlobalState) -> Self {
        self.globals = Some(globals);
        self
    }

    #[must_use]
    pub fn static_data(mut self, data: Arc<StaticCheckData>) -> Self {
        self.static_data = Some(data);
        self
    }

    #[must_use]
    pub fn config(mut self, config: Arc<EvalConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Value bound to `self` at the module level (lifetime jobs).
    #[must_use]
    pub fn self_value(mut self, value: Value) -> Self {
        self.self_value = Some(value);
        self
    }

    pub fn build(self) -> Interpreter {
        let ast = Arc::clone(&self.module.ast);
        Interpreter {
            ctx: self.ctx,
            module: self.module,
            ast,
            globals: self.globals.unwrap_or_default(),
            env: LocalScopes::new(),
            static_data: self.static_data.unwrap_or_default(),
            config: self.config.unwrap_or_default(),
            captured_globals: Vec::new(),
            call_depth: 0,
            self_value: self.self_value,
            iteration_change: IterationChange::None,
            assertion: None,
        }
    }
}
