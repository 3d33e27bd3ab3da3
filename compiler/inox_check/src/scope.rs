//! Name tables of the checker.
//!
//! Globals, function declarations, patterns and pattern namespaces are
//! tracked per module node (chunk or embedded module). Locals are tracked per
//! scope node: chunks, embedded modules, function expressions and mapping
//! entries.

use rustc_hash::{FxHashMap, FxHashSet};

use inox_ir::NodeId;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct GlobalInfo {
    pub is_const: bool,
    pub is_start_constant: bool,
    /// Function expression of a declared function.
    pub function: Option<NodeId>,
}

impl GlobalInfo {
    pub const VARIABLE: GlobalInfo = GlobalInfo {
        is_const: false,
        is_start_constant: false,
        function: None,
    };

    pub const CONSTANT: GlobalInfo = GlobalInfo {
        is_const: true,
        is_start_constant: false,
        function: None,
    };
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct LocalInfo {
    pub is_group_matching_var: bool,
}

pub(crate) type Locals = FxHashMap<String, LocalInfo>;

#[derive(Debug, Default)]
pub(crate) struct ScopeTables {
    globals: FxHashMap<NodeId, FxHashMap<String, GlobalInfo>>,
    locals: FxHashMap<NodeId, Locals>,
    functions: FxHashMap<NodeId, FxHashSet<String>>,
    patterns: FxHashMap<NodeId, FxHashSet<String>>,
    pattern_namespaces: FxHashMap<NodeId, FxHashSet<String>>,
    /// Locals of a scope before a `for`, `walk` or `match`, restored after it.
    saved_locals: FxHashMap<NodeId, Locals>,
}

impl ScopeTables {
    pub fn globals(&mut self, module: NodeId) -> &mut FxHashMap<String, GlobalInfo> {
        self.globals.entry(module).or_default()
    }

    pub fn global(&self, module: NodeId, name: &str) -> Option<GlobalInfo> {
        self.globals.get(&module)?.get(name).copied()
    }

    pub fn locals(&mut self, scope: NodeId) -> &mut Locals {
        self.locals.entry(scope).or_default()
    }

    pub fn local(&self, scope: NodeId, name: &str) -> Option<LocalInfo> {
        self.locals.get(&scope)?.get(name).copied()
    }

    pub fn functions(&mut self, module: NodeId) -> &mut FxHashSet<String> {
        self.functions.entry(module).or_default()
    }

    pub fn is_function(&self, module: NodeId, name: &str) -> bool {
        self.functions
            .get(&module)
            .is_some_and(|names| names.contains(name))
    }

    pub fn patterns(&mut self, module: NodeId) -> &mut FxHashSet<String> {
        self.patterns.entry(module).or_default()
    }

    pub fn pattern_namespaces(&mut self, module: NodeId) -> &mut FxHashSet<String> {
        self.pattern_namespaces.entry(module).or_default()
    }

    /// Copy the globals, patterns and namespaces of `from` into `to`.
    pub fn inherit(&mut self, from: NodeId, to: NodeId, globals: bool) {
        if globals {
            let inherited = self.globals(from).clone();
            self.globals(to).extend(inherited);
        }
        let patterns = self.patterns(from).clone();
        self.patterns(to).extend(patterns);
        let namespaces = self.pattern_namespaces(from).clone();
        self.pattern_namespaces(to).extend(namespaces);
    }

    pub fn save_locals(&mut self, statement: NodeId, scope: NodeId) {
        let snapshot = self.locals(scope).clone();
        self.saved_locals.insert(statement, snapshot);
    }

    pub fn restore_locals(&mut self, statement: NodeId, scope: NodeId) {
        if let Some(saved) = self.saved_locals.remove(&statement) {
            self.locals.insert(scope, saved);
        }
    }

    /// Tables of a module, moved out for merging into another checker.
    pub fn take_module(&mut self, module: NodeId) -> ModuleTables {
        ModuleTables {
            globals: self.globals.remove(&module).unwrap_or_default(),
            locals: self.locals.remove(&module).unwrap_or_default(),
            functions: self.functions.remove(&module).unwrap_or_default(),
            patterns: self.patterns.remove(&module).unwrap_or_default(),
            pattern_namespaces: self.pattern_namespaces.remove(&module).unwrap_or_default(),
        }
    }
}

/// Top-level names declared by an included chunk.
#[derive(Debug, Default)]
pub(crate) struct ModuleTables {
    pub globals: FxHashMap<String, GlobalInfo>,
    pub locals: Locals,
    pub functions: FxHashSet<String>,
    pub patterns: FxHashSet<String>,
    pub pattern_namespaces: FxHashSet<String>,
}
