#![allow(
    clippy::result_large_err,
    reason = "evaluation errors carry position stacks and assertion data"
)]
//! Inox Eval - tree-walking evaluator of the Inox runtime.
//!
//! # Architecture
//!
//! - `interpreter`: the [`Interpreter`], one per running module, split by
//!   node family
//! - `environment`: [`GlobalState`] shared by the interpreters of an lthread
//!   and the local scopes of one interpreter
//! - `operators`: binary and unary operator dispatch
//! - `dispatcher`: the context's [`CallDispatcher`](inox_core::CallDispatcher),
//!   through which host code calls Inox functions and mappings
//! - `spawn`: lthreads on OS threads
//! - `manifest`: manifest objects to context configurations
//! - `config`, `output`, `tracing_setup`: settings, printing and logging
//!
//! # Running a Module
//!
//! ```text
//! let ctx = prepare_context(&module, None)?;
//! let result = eval_module(Arc::new(module), &ctx, GlobalState::new(), EvalConfig::default());
//! ```
//!
//! The module is statically checked first unless the configuration opts
//! out; a check failure is returned as a `StaticCheck` error.

mod config;
mod dispatcher;
mod environment;
pub mod interpreter;
mod manifest;
mod operators;
mod output;
mod spawn;
mod tracing_setup;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use inox_check::CheckInput;
use inox_core::errors;
use inox_core::{Context, ContextConfig, EvalError, EvalResult, Permission, PermissionKind};
use inox_ir::{Module, NodeKind};

pub use config::{EvalConfig, SymbolicHooks, DEFAULT_MAX_CALL_DEPTH};
pub use dispatcher::Dispatcher;
pub use environment::{GlobalState, LocalScopes, WeakGlobalState};
pub use interpreter::{
    Interpreter, InterpreterBuilder, IterationChange, ScopedInterpreter, FROM_MARKUP_FACTORY,
};
pub use manifest::{
    default_global_var_permissions, manifest_to_context_config, permissions_from_listing,
    ManifestError,
};
pub use operators::{evaluate_binary, evaluate_unary};
pub use output::OutputHandler;
pub use spawn::{start_lthread, LThreadSpec};
pub use tracing_setup::init_tracing;

/// Permissions of a module run without a manifest: all global variable
/// operations and lthread creation.
pub fn default_permissions() -> Vec<Permission> {
    let mut permissions: Vec<Permission> = [
        PermissionKind::READ,
        PermissionKind::USE,
        PermissionKind::CREATE,
        PermissionKind::UPDATE,
    ]
    .into_iter()
    .map(|kind| Permission::global_var(kind, "*"))
    .collect();
    permissions.push(Permission::lthread_create());
    permissions
}

/// Check then evaluate `module` in `ctx`.
///
/// The module's dispatcher is installed on `ctx`. A panic during the
/// evaluation is returned as an error.
#[tracing::instrument(level = "debug", skip_all, fields(module = %module.name))]
pub fn eval_module(
    module: Arc<Module>,
    ctx: &Context,
    globals: GlobalState,
    config: EvalConfig,
) -> EvalResult {
    let static_data = if config.static_check {
        let mut input = CheckInput::from_context(&module, ctx);
        input.globals.extend(globals.input_globals());
        inox_check::check(&input)?
    } else {
        inox_check::StaticCheckData::default()
    };
    let static_data = Arc::new(static_data);
    let config = Arc::new(config);

    dispatcher::install(
        ctx,
        &globals,
        Arc::clone(&module),
        Arc::clone(&static_data),
        Arc::clone(&config),
    );
    let mut interpreter = InterpreterBuilder::new(ctx.clone(), module)
        .globals(globals)
        .static_data(static_data)
        .config(config)
        .build();

    catch_unwind(AssertUnwindSafe(|| interpreter.run_module())).unwrap_or_else(|payload| {
        Err(errors::host_error(format!(
            "evaluation panicked: {}",
            spawn::panic_message(payload.as_ref())
        )))
    })
}

/// Context a module runs in, configured by its manifest.
///
/// Without a manifest the module gets [`default_permissions`]. With a
/// parent, the context is a child of it and every permission the manifest
/// requires must be held by the parent.
pub fn prepare_context(module: &Module, parent: Option<&Context>) -> Result<Context, EvalError> {
    let config = match manifest_object(module) {
        Some(object) => {
            let scratch = Context::new_root(ContextConfig::default());
            let mut interpreter =
                InterpreterBuilder::new(scratch.clone(), Arc::new(module.clone())).build();
            let manifest = interpreter.eval(object);
            scratch.shutdown();
            manifest_to_context_config(&manifest?)?
        }
        None => ContextConfig::with_permissions(default_permissions()),
    };
    match parent {
        Some(parent) => parent.new_child(config),
        None => Ok(Context::new_root(config)),
    }
}

/// Object literal of the module's manifest.
fn manifest_object(module: &Module) -> Option<inox_ir::NodeId> {
    let manifest = match module.ast.kind(module.main_chunk) {
        NodeKind::Chunk { manifest, .. } | NodeKind::EmbeddedModule { manifest, .. } => (*manifest)?,
        _ => return None,
    };
    match module.ast.kind(manifest) {
        NodeKind::Manifest { object } => Some(*object),
        _ => None,
    }
}

/// Evaluate a standalone expression-only module: no static check, the
/// default permissions, a fresh root context.
pub fn eval_standalone(module: Module) -> EvalResult {
    let ctx = Context::new_root(ContextConfig::with_permissions(default_permissions()));
    let result = eval_module(
        Arc::new(module),
        &ctx,
        GlobalState::new(),
        EvalConfig::default().without_static_check(),
    );
    ctx.shutdown();
    result
}
