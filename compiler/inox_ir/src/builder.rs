//! Programmatic construction of syntax trees.
//!
//! The parser is an external collaborator; hosts embedding the runtime and
//! the test suites of the workspace build trees through [`AstBuilder`].
//! Every helper allocates one node in the current source file with a dummy
//! span unless [`AstBuilder::at`] set one.

use std::sync::Arc;

use crate::ast::{AssignmentOp, BinaryOp, NodeKind};
use crate::source::SourceFile;
use crate::{Ast, NodeId, SharedAst, SourceId, Span};

/// Incremental builder for an [`Ast`].
pub struct AstBuilder {
    ast: Ast,
    source: SourceId,
    next_span: Option<Span>,
}

impl AstBuilder {
    /// Start a tree whose nodes belong to the given source file.
    pub fn new(name: &str, text: &str) -> Self {
        let mut ast = Ast::new();
        let source = ast.add_source(SourceFile::new(name, text));
        AstBuilder {
            ast,
            source,
            next_span: None,
        }
    }

    /// Switch to another source file, e.g. for an included chunk.
    pub fn add_source(&mut self, name: &str, text: &str) -> SourceId {
        self.source = self.ast.add_source(SourceFile::new(name, text));
        self.source
    }

    /// Use `span` for the next allocated node.
    pub fn at(&mut self, start: u32, end: u32) -> &mut Self {
        self.next_span = Some(Span::new(start, end));
        self
    }

    /// Allocate a node of any kind.
    pub fn node(&mut self, kind: NodeKind) -> NodeId {
        let span = self.next_span.take().unwrap_or(Span::DUMMY);
        self.ast.alloc(kind, span, self.source)
    }

    pub fn finish(self) -> Ast {
        self.ast
    }

    pub fn finish_shared(self) -> SharedAst {
        Arc::new(self.ast)
    }

    // Literals

    pub fn nil(&mut self) -> NodeId {
        self.node(NodeKind::NilLiteral)
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.node(NodeKind::BooleanLiteral(value))
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.node(NodeKind::IntLiteral(value))
    }

    pub fn float(&mut self, value: f64) -> NodeId {
        self.node(NodeKind::FloatLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.node(NodeKind::StringLiteral(value.to_string()))
    }

    pub fn quantity(&mut self, values: &[f64], units: &[&str]) -> NodeId {
        self.node(NodeKind::QuantityLiteral {
            values: values.to_vec(),
            units: units.iter().map(|u| (*u).to_string()).collect(),
        })
    }

    pub fn path(&mut self, value: &str) -> NodeId {
        self.node(NodeKind::PathLiteral {
            value: value.to_string(),
            absolute: value.starts_with('/'),
        })
    }

    pub fn int_range(&mut self, lower: i64, upper: Option<i64>) -> NodeId {
        self.node(NodeKind::IntegerRangeLiteral { lower, upper })
    }

    // Names

    pub fn ident(&mut self, name: &str) -> NodeId {
        self.node(NodeKind::IdentifierLiteral(name.to_string()))
    }

    pub fn var(&mut self, name: &str) -> NodeId {
        self.node(NodeKind::Variable(name.to_string()))
    }

    pub fn global(&mut self, name: &str) -> NodeId {
        self.node(NodeKind::GlobalVariable(name.to_string()))
    }

    pub fn pattern_ident(&mut self, name: &str) -> NodeId {
        self.node(NodeKind::PatternIdentifierLiteral {
            name: name.to_string(),
            unprefixed: false,
        })
    }

    pub fn key_list(&mut self, keys: &[&str]) -> NodeId {
        let keys = keys.iter().map(|k| self.ident(k)).collect();
        self.node(NodeKind::KeyListExpression { keys })
    }

    // Expressions

    pub fn binary(&mut self, operator: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.node(NodeKind::BinaryExpression {
            operator,
            left,
            right,
        })
    }

    pub fn member(&mut self, left: NodeId, property: &str) -> NodeId {
        let property = self.ident(property);
        self.node(NodeKind::MemberExpression {
            left,
            property,
            optional: false,
        })
    }

    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::CallExpression {
            callee,
            arguments,
            must: false,
            command_like: false,
        })
    }

    pub fn must_call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::CallExpression {
            callee,
            arguments,
            must: true,
            command_like: false,
        })
    }

    pub fn list(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::ListLiteral {
            elements,
            type_annotation: None,
        })
    }

    /// Object literal with explicit keys.
    pub fn object(&mut self, properties: &[(&str, NodeId)]) -> NodeId {
        let properties = properties
            .iter()
            .map(|(key, value)| {
                let key = self.ident(key);
                self.node(NodeKind::ObjectProperty {
                    key: Some(key),
                    type_annotation: None,
                    value: *value,
                })
            })
            .collect();
        self.node(NodeKind::ObjectLiteral {
            properties,
            meta_properties: vec![],
            spread_elements: vec![],
        })
    }

    /// `fn(params) body`
    pub fn function(&mut self, params: Vec<&str>, body: NodeId) -> NodeId {
        let parameters = params
            .into_iter()
            .map(|p| {
                let var = self.ident(p);
                self.node(NodeKind::FunctionParameter {
                    var,
                    type_annotation: None,
                })
            })
            .collect();
        let is_body_expression = !matches!(self.ast.kind(body), NodeKind::Block { .. });
        self.node(NodeKind::FunctionExpression {
            captured_locals: vec![],
            parameters,
            return_type: None,
            body,
            is_body_expression,
            is_variadic: false,
        })
    }

    // Statements

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block { statements })
    }

    pub fn assign(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.node(NodeKind::Assignment {
            left,
            right,
            operator: AssignmentOp::Assign,
        })
    }

    pub fn assign_op(&mut self, left: NodeId, operator: AssignmentOp, right: NodeId) -> NodeId {
        self.node(NodeKind::Assignment {
            left,
            right,
            operator,
        })
    }

    /// `var name = value`
    pub fn local_decl(&mut self, name: &str, value: NodeId) -> NodeId {
        let left = self.ident(name);
        let decl = self.node(NodeKind::LocalVariableDeclaration {
            left,
            type_annotation: None,
            right: Some(value),
        });
        self.node(NodeKind::LocalVariableDeclarations {
            declarations: vec![decl],
        })
    }

    /// `const (name = value ...)`
    pub fn constants(&mut self, constants: &[(&str, NodeId)]) -> NodeId {
        let declarations = constants
            .iter()
            .map(|(name, value)| {
                let left = self.ident(name);
                self.node(NodeKind::GlobalConstantDeclaration {
                    left,
                    right: *value,
                })
            })
            .collect();
        self.node(NodeKind::GlobalConstantDeclarations { declarations })
    }

    pub fn assert(&mut self, expr: NodeId) -> NodeId {
        self.node(NodeKind::AssertionStatement { expr })
    }

    // Modules

    pub fn chunk(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Chunk {
            global_constants: None,
            manifest: None,
            statements,
        })
    }

    pub fn chunk_with_constants(&mut self, constants: NodeId, statements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Chunk {
            global_constants: Some(constants),
            manifest: None,
            statements,
        })
    }

    pub fn embedded_module(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::EmbeddedModule {
            manifest: None,
            statements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_apply_to_the_next_node_only() {
        let mut b = AstBuilder::new("main.ix", "1 + 2");
        let one = b.at(0, 1).int(1);
        let two = b.int(2);
        let ast = b.finish();
        assert_eq!(ast.span(one), Span::new(0, 1));
        assert_eq!(ast.span(two), Span::DUMMY);
        assert_eq!(ast.text(one), Some("1"));
    }

    #[test]
    fn function_body_kind_is_detected() {
        let mut b = AstBuilder::new("main.ix", "");
        let x = b.ident("x");
        let f = b.function(vec!["x"], x);
        let ast = b.finish();
        let NodeKind::FunctionExpression {
            is_body_expression,
            parameters,
            ..
        } = ast.kind(f)
        else {
            panic!("expected a function expression");
        };
        assert!(*is_body_expression);
        assert_eq!(parameters.len(), 1);
    }
}
