//! Running lthreads on OS threads.
//!
//! An lthread evaluates its module in its own context, on its own thread,
//! with its own interpreter. The outcome is recorded on the [`LThread`]
//! handle; a panic in the evaluation becomes an error result. The context is
//! shut down before the result is recorded, which cancels the lthread's
//! children and releases the values it still holds locked, so waiters never
//! observe a finished lthread that still holds locks.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use inox_check::StaticCheckData;
use inox_core::errors::{self, EvalError};
use inox_core::value::LThread;
use inox_core::{Context, Heap, Value};
use inox_ir::Module;

use crate::config::EvalConfig;
use crate::dispatcher;
use crate::environment::GlobalState;
use crate::interpreter::InterpreterBuilder;

/// What an lthread runs and with what.
pub struct LThreadSpec {
    pub name: String,
    pub ctx: Context,
    pub module: Arc<Module>,
    pub globals: GlobalState,
    pub static_data: Arc<StaticCheckData>,
    pub config: Arc<EvalConfig>,
    /// `self` of lifetime jobs.
    pub self_value: Option<Value>,
}

/// Start an lthread and return its handle.
#[tracing::instrument(level = "debug", skip_all, fields(lthread = %spec.name))]
pub fn start_lthread(spec: LThreadSpec) -> Result<Heap<LThread>, EvalError> {
    let Value::LThread(lthread) = Value::lthread(LThread::new(spec.ctx.clone(), spec.name.as_str()))
    else {
        return Err(errors::invalid_argument("failed to create the lthread handle"));
    };

    let worker = lthread.clone();
    let thread_name = format!("lthread {}", spec.name);
    let handle = std::thread::Builder::new()
        .name(thread_name)
        .spawn(move || run_lthread(spec, &worker))
        .map_err(|error| errors::host_error(format!("failed to start the lthread: {error}")))?;
    lthread.set_thread(handle);
    Ok(lthread)
}

fn run_lthread(spec: LThreadSpec, lthread: &LThread) {
    let LThreadSpec {
        name,
        ctx,
        module,
        globals,
        static_data,
        config,
        self_value,
    } = spec;
    tracing::debug!(lthread = %name, "lthread started");

    dispatcher::install(
        &ctx,
        &globals,
        Arc::clone(&module),
        Arc::clone(&static_data),
        Arc::clone(&config),
    );
    let mut builder = InterpreterBuilder::new(ctx.clone(), module)
        .globals(globals)
        .static_data(static_data)
        .config(config);
    if let Some(value) = self_value {
        builder = builder.self_value(value);
    }
    let mut interpreter = builder.build();

    let result = catch_unwind(AssertUnwindSafe(|| interpreter.run_module())).unwrap_or_else(|payload| {
        Err(errors::host_error(format!(
            "lthread panicked: {}",
            panic_message(payload.as_ref())
        )))
    });
    match &result {
        Ok(_) => tracing::debug!(lthread = %name, "lthread finished"),
        Err(error) => tracing::debug!(lthread = %name, %error, "lthread failed"),
    }
    ctx.shutdown();
    lthread.finish(result);
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use inox_core::ContextConfig;
    use inox_ir::{AstBuilder, NodeKind};

    use super::*;

    #[test]
    fn waiters_see_the_context_already_shut_down() {
        let mut b = AstBuilder::new("worker.ix", "");
        let one = b.int(1);
        let ret = b.node(NodeKind::ReturnStatement { expr: Some(one) });
        let root = b.chunk(vec![ret]);
        let module = Arc::new(Module::new(b.finish_shared(), root));

        let parent = Context::new_root(ContextConfig::default());
        let ctx = parent.new_child(ContextConfig::default()).unwrap();
        let lthread = start_lthread(LThreadSpec {
            name: "worker".to_string(),
            ctx,
            module,
            globals: GlobalState::new(),
            static_data: Arc::new(StaticCheckData::default()),
            config: Arc::new(EvalConfig::default()),
            self_value: None,
        })
        .unwrap();

        let result = lthread.wait_result(&parent).unwrap();
        assert_eq!(result.as_int(), Some(1));
        assert!(lthread.context().is_done());
        assert_eq!(lthread.context().locked_value_count(), 0);
        lthread.join();
    }

    #[test]
    fn panic_payload_text() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
