//! What a static check starts from.

use inox_core::Context;
use inox_ir::{Module, NodeId};

/// A global visible before the checked module starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputGlobal {
    pub name: String,
    /// Start constants are passed on to spawned lthreads.
    pub is_start_constant: bool,
}

/// Input of [`check`](crate::check).
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    pub module: &'a Module,
    /// Root of the check; defaults to the module's main chunk.
    pub node: NodeId,
    pub globals: Vec<InputGlobal>,
    pub patterns: Vec<String>,
    pub pattern_namespaces: Vec<String>,
}

impl<'a> CheckInput<'a> {
    pub fn new(module: &'a Module) -> Self {
        CheckInput {
            module,
            node: module.main_chunk,
            globals: Vec::new(),
            patterns: Vec::new(),
            pattern_namespaces: Vec::new(),
        }
    }

    /// Input seeded with the named patterns and namespaces visible from `ctx`.
    pub fn from_context(module: &'a Module, ctx: &Context) -> Self {
        CheckInput::new(module)
            .with_patterns(ctx.named_pattern_names())
            .with_pattern_namespaces(ctx.pattern_namespace_names())
    }

    #[must_use]
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = node;
        self
    }

    #[must_use]
    pub fn with_global(mut self, name: impl Into<String>, is_start_constant: bool) -> Self {
        self.globals.push(InputGlobal {
            name: name.into(),
            is_start_constant,
        });
        self
    }

    /// Add start constants.
    #[must_use]
    pub fn with_start_constants<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globals
            .extend(names.into_iter().map(|name| InputGlobal {
                name: name.into(),
                is_start_constant: true,
            }));
        self
    }

    #[must_use]
    pub fn with_patterns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns.extend(names.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_pattern_namespaces<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pattern_namespaces
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub(crate) fn is_input_global(&self, name: &str) -> bool {
        self.globals.iter().any(|g| g.name == name)
    }

    pub(crate) fn is_input_pattern(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p == name)
    }

    pub(crate) fn is_input_pattern_namespace(&self, name: &str) -> bool {
        self.pattern_namespaces.iter().any(|p| p == name)
    }
}
