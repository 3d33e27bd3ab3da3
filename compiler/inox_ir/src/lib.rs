//! Syntax tree and module records for the Inox runtime.
//!
//! The parser of the language is an external collaborator: it produces an
//! [`Ast`] (flat node arena) and a [`Module`] record. This crate defines those
//! structures, the source-position machinery used by error messages, a
//! traversal with ancestor tracking used by the static checker, and
//! [`AstBuilder`] for programmatic construction.

mod ast;
mod builder;
mod module;
mod node_id;
mod source;
mod span;
pub mod walk;

pub use ast::{
    AssignmentOp, Ast, BinaryOp, Children, Node, NodeKind, PatternQuantifier, SharedAst, UnaryOp,
};
pub use builder::AstBuilder;
pub use module::{Module, ModuleKind};
pub use node_id::{NodeId, SourceId};
pub use source::{SourceFile, SourcePosition};
pub use span::{Span, SpanError};
