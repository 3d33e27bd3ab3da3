//! Calls into Inox code from host code.
//!
//! Host functions, dynamic values and mappings call back into Inox code
//! through the context's [`CallDispatcher`]. The dispatcher installed here
//! evaluates each call with a fresh interpreter over the module's globals.

use std::sync::Arc;

use inox_check::StaticCheckData;
use inox_core::errors;
use inox_core::value::Mapping;
use inox_core::{CallDispatcher, Context, EvalResult, Value};
use inox_ir::Module;

use crate::config::EvalConfig;
use crate::environment::{GlobalState, WeakGlobalState};
use crate::interpreter::{Interpreter, InterpreterBuilder};

/// Dispatcher of one running module.
///
/// Holds its globals weakly: globals may hold values that hold the context.
pub struct Dispatcher {
    globals: WeakGlobalState,
    module: Arc<Module>,
    static_data: Arc<StaticCheckData>,
    config: Arc<EvalConfig>,
}

impl Dispatcher {
    pub fn new(
        globals: &GlobalState,
        module: Arc<Module>,
        static_data: Arc<StaticCheckData>,
        config: Arc<EvalConfig>,
    ) -> Self {
        Dispatcher {
            globals: globals.downgrade(),
            module,
            static_data,
            config,
        }
    }

    fn interpreter(&self, ctx: &Context) -> Result<Interpreter, inox_core::EvalError> {
        let globals = self.globals.upgrade().ok_or_else(errors::cancelled)?;
        Ok(InterpreterBuilder::new(ctx.clone(), Arc::clone(&self.module))
            .globals(globals)
            .static_data(Arc::clone(&self.static_data))
            .config(Arc::clone(&self.config))
            .build())
    }
}

impl CallDispatcher for Dispatcher {
    fn call(&self, ctx: &Context, callee: &Value, args: Vec<Value>) -> EvalResult {
        self.interpreter(ctx)?.call_value(callee, args, None)
    }

    fn compute_mapping(&self, ctx: &Context, mapping: &Mapping, key: &Value) -> EvalResult {
        self.interpreter(ctx)?.compute_mapping(mapping, key)
    }
}

/// Install the dispatcher of a module on `ctx`, unless the configuration
/// provides one.
pub fn install(
    ctx: &Context,
    globals: &GlobalState,
    module: Arc<Module>,
    static_data: Arc<StaticCheckData>,
    config: Arc<EvalConfig>,
) {
    let dispatcher: Arc<dyn CallDispatcher> = match &config.dispatcher {
        Some(dispatcher) => Arc::clone(dispatcher),
        None => Arc::new(Dispatcher::new(globals, module, static_data, config)),
    };
    ctx.set_dispatcher(dispatcher);
}
