//! The module record handed to the checker and the evaluator.

use rustc_hash::FxHashMap;

use crate::{NodeId, SharedAst};

/// What a module is run as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ModuleKind {
    #[default]
    Ordinary,
    /// Body of a spawn expression.
    UserLThread,
    LifetimeJob,
    TestSuite,
    TestCase,
}

impl ModuleKind {
    /// Modules whose assertion failures are reported as test failures.
    pub fn is_test(self) -> bool {
        matches!(self, ModuleKind::TestSuite | ModuleKind::TestCase)
    }

    /// Modules rooted at an embedded module rather than a chunk.
    pub fn is_embedded(self) -> bool {
        !matches!(self, ModuleKind::Ordinary)
    }
}

/// A parsed module.
#[derive(Clone, Debug)]
pub struct Module {
    pub ast: SharedAst,
    /// `Chunk` (ordinary modules) or `EmbeddedModule` root.
    pub main_chunk: NodeId,
    /// Inclusion import statement → root of the included chunk.
    pub inclusions: FxHashMap<NodeId, NodeId>,
    pub kind: ModuleKind,
    pub name: String,
}

impl Module {
    /// Ordinary module without inclusions.
    pub fn new(ast: SharedAst, main_chunk: NodeId) -> Self {
        Module {
            ast,
            main_chunk,
            inclusions: FxHashMap::default(),
            kind: ModuleKind::Ordinary,
            name: String::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_inclusion(mut self, statement: NodeId, included_chunk: NodeId) -> Self {
        self.inclusions.insert(statement, included_chunk);
        self
    }

    /// Root of the chunk included by `statement`.
    pub fn included_chunk(&self, statement: NodeId) -> Option<NodeId> {
        self.inclusions.get(&statement).copied()
    }
}
