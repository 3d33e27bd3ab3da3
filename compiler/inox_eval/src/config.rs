//! Evaluation settings.

use std::fmt;
use std::sync::Arc;

use inox_core::{CallDispatcher, Value};
use inox_ir::NodeId;

use crate::output::OutputHandler;

/// Default cap on nested Inox function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// Answers from the symbolic checker, an external collaborator.
///
/// Without hooks runtime type checks always pass and `::` expressions fail.
pub trait SymbolicHooks: Send + Sync {
    /// Whether `value`, produced by the runtime type check `node`, has the
    /// type the symbolic checker expected.
    fn check_runtime_type(&self, node: NodeId, value: &Value) -> bool;

    /// Id of the type extension used by the double-colon expression `node`.
    fn used_type_extension(&self, node: NodeId) -> Option<String>;
}

/// Settings shared by every interpreter of an evaluation, including the
/// interpreters of spawned lthreads.
#[derive(Clone)]
pub struct EvalConfig {
    pub max_call_depth: usize,
    pub output: Arc<OutputHandler>,
    pub hooks: Option<Arc<dyn SymbolicHooks>>,
    /// Replaces the dispatcher installed on the context.
    pub dispatcher: Option<Arc<dyn CallDispatcher>>,
    /// Run the static checker before evaluating.
    pub static_check: bool,
}

impl EvalConfig {
    #[must_use]
    pub fn with_output(mut self, output: Arc<OutputHandler>) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn SymbolicHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    #[must_use]
    pub fn without_static_check(mut self) -> Self {
        self.static_check = false;
        self
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            output: OutputHandler::stdout(),
            hooks: None,
            dispatcher: None,
            static_check: true,
        }
    }
}

impl fmt::Debug for EvalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalConfig")
            .field("max_call_depth", &self.max_call_depth)
            .field("has_hooks", &self.hooks.is_some())
            .field("static_check", &self.static_check)
            .finish_non_exhaustive()
    }
}
