//! The checking pass.
//!
//! # Module Structure
//!
//! - `names`: declarations, assignments and name resolution
//! - `literals`: object, dictionary, quantity, rate and range literals
//! - `placement`: statements and expressions only valid in some places
//! - `modules`: spawn, lifetime job, test and inclusion boundaries
//! - `manifest`: shape of manifest sections
//!
//! [`Checker`] is a [`NodeVisitor`]. `pre` applies the rules of a node before
//! its children are visited and records declarations; `post` restores the
//! locals saved by `for`, `walk` and `match` constructs, whose variables are
//! not visible after them.

mod literals;
mod manifest;
mod modules;
mod names;
mod placement;

use rustc_hash::{FxHashMap, FxHashSet};

use inox_core::errors::SourcePositionStack;
use inox_ir::walk::{self, NodeVisitor, TraversalAction, Visit};
use inox_ir::{Ast, NodeId, NodeKind};

use crate::data::StaticCheckData;
use crate::errors::{CheckError, CheckErrorKind};
use crate::input::CheckInput;
use crate::scope::{GlobalInfo, ModuleTables, ScopeTables};

/// Module and scope enclosing the visited node.
#[derive(Copy, Clone, Debug)]
struct Scopes {
    module: NodeId,
    scope: NodeId,
}

pub(crate) struct Checker<'a> {
    ast: &'a Ast,
    input: &'a CheckInput<'a>,
    root: NodeId,
    /// Inclusion statements leading to the checked chunk, outermost first.
    inclusion_chain: Vec<NodeId>,
    tables: ScopeTables,
    /// Keys of each object literal, for `self.name` checks.
    object_keys: FxHashMap<NodeId, FxHashSet<String>>,
    data: StaticCheckData,
    errors: Vec<CheckError>,
}

impl<'a> Checker<'a> {
    pub fn new(input: &'a CheckInput<'a>) -> Self {
        let root = input.node;
        let mut tables = ScopeTables::default();
        let globals = tables.globals(root);
        for global in &input.globals {
            globals.insert(
                global.name.clone(),
                GlobalInfo {
                    is_const: true,
                    is_start_constant: global.is_start_constant,
                    function: None,
                },
            );
        }
        tables.patterns(root).extend(input.patterns.iter().cloned());
        tables
            .pattern_namespaces(root)
            .extend(input.pattern_namespaces.iter().cloned());

        Checker {
            ast: &input.module.ast,
            input,
            root,
            inclusion_chain: Vec::new(),
            tables,
            object_keys: FxHashMap::default(),
            data: StaticCheckData::default(),
            errors: Vec::new(),
        }
    }

    /// Checker of a chunk included by `statement`: it sees the input globals
    /// and patterns, not the declarations of the including chunk.
    fn for_inclusion(&self, statement: NodeId, chunk: NodeId) -> Checker<'a> {
        let mut tables = ScopeTables::default();
        let globals = tables.globals(chunk);
        for global in &self.input.globals {
            globals.insert(
                global.name.clone(),
                GlobalInfo {
                    is_const: global.is_start_constant,
                    is_start_constant: global.is_start_constant,
                    function: None,
                },
            );
        }
        tables
            .patterns(chunk)
            .extend(self.input.patterns.iter().cloned());
        tables
            .pattern_namespaces(chunk)
            .extend(self.input.pattern_namespaces.iter().cloned());

        let mut inclusion_chain = self.inclusion_chain.clone();
        inclusion_chain.push(statement);

        Checker {
            ast: self.ast,
            input: self.input,
            root: chunk,
            inclusion_chain,
            tables,
            object_keys: FxHashMap::default(),
            data: StaticCheckData::default(),
            errors: Vec::new(),
        }
    }

    pub fn run(mut self) -> (StaticCheckData, Vec<CheckError>) {
        let ast = self.ast;
        walk::walk(ast, self.root, &mut self);
        (self.data, self.errors)
    }

    fn run_included(mut self) -> (StaticCheckData, Vec<CheckError>, ModuleTables) {
        let ast = self.ast;
        walk::walk(ast, self.root, &mut self);
        let tables = self.tables.take_module(self.root);
        (self.data, self.errors, tables)
    }

    fn error(&mut self, node: NodeId, kind: CheckErrorKind) {
        let ast = self.ast;
        let positions = self
            .inclusion_chain
            .iter()
            .map(|statement| ast.position(*statement))
            .chain(std::iter::once(ast.position(node)))
            .collect();
        self.errors.push(CheckError {
            kind,
            positions: SourcePositionStack::new(positions),
        });
    }

    fn scopes(&self, visit: &Visit<'_>) -> Scopes {
        let module = walk::find_closest(self.ast, visit.ancestors, NodeKind::is_module)
            .map_or(self.root, |(_, id)| id);
        let scope = walk::find_closest(self.ast, visit.ancestors, is_local_scope)
            .map_or(self.root, |(_, id)| id);
        Scopes { module, scope }
    }

    fn is_top_level(&self, visit: &Visit<'_>) -> bool {
        visit
            .parent
            .is_some_and(|parent| self.ast.kind(parent).is_module())
    }

    #[allow(clippy::too_many_lines)]
    fn check_node(&mut self, visit: &Visit<'_>, scopes: Scopes) -> TraversalAction {
        let ast = self.ast;
        let node = visit.node;

        match ast.kind(node) {
            NodeKind::Chunk { statements, .. } | NodeKind::EmbeddedModule { statements, .. } => {
                self.hoist_functions(node, statements);
            }
            NodeKind::Manifest { object } => self.check_manifest(visit, *object),

            // Literals
            NodeKind::IntegerRangeLiteral { lower, upper } => {
                if upper.is_some_and(|upper| *lower > upper) {
                    self.error(node, CheckErrorKind::InvalidIntRange);
                }
            }
            NodeKind::QuantityLiteral { values, units } => self.check_quantity(node, values, units),
            NodeKind::RateLiteral { quantity, div_unit } => {
                self.check_rate(node, *quantity, div_unit);
            }
            NodeKind::ObjectLiteral {
                properties,
                spread_elements,
                ..
            } => {
                let keys = self.check_properties(properties, spread_elements, true);
                self.object_keys.insert(node, keys);
            }
            NodeKind::RecordLiteral {
                properties,
                spread_elements,
            } => {
                self.check_properties(properties, spread_elements, false);
            }
            NodeKind::ObjectPatternLiteral {
                properties,
                spread_elements,
                ..
            }
            | NodeKind::RecordPatternLiteral {
                properties,
                spread_elements,
                ..
            } => self.check_pattern_properties(properties, spread_elements),
            NodeKind::DictionaryLiteral { entries } => self.check_dictionary_keys(entries),

            // Module boundaries
            NodeKind::SpawnExpression { meta, module } => {
                self.check_spawn(node, *meta, *module, scopes);
            }
            NodeKind::LifetimeJobExpression {
                subject, module, ..
            } => {
                self.tables.inherit(scopes.module, *module, true);
                if subject.is_none() && !self.is_implicit_key_property(visit) {
                    self.error(node, CheckErrorKind::MissingLifetimeJobSubject);
                }
            }
            NodeKind::TestSuiteExpression { module, .. }
            | NodeKind::TestCaseExpression { module, .. } => {
                self.tables.inherit(scopes.module, *module, true);
            }
            NodeKind::ReceptionHandlerExpression { .. } => {
                if !self.is_implicit_key_property(visit) {
                    self.error(node, CheckErrorKind::MisplacedReceptionHandler);
                }
            }
            NodeKind::InclusionImportStatement { .. } => self.check_inclusion(visit, scopes),

            // Mappings
            NodeKind::StaticMappingEntry { key, .. } => self.check_mapping_key(*key),
            NodeKind::DynamicMappingEntry {
                key,
                key_var,
                group_matching_variable,
                ..
            } => {
                self.check_mapping_key(*key);
                for var in std::iter::once(*key_var).chain(*group_matching_variable) {
                    if let Some(name) = ast.identifier_name(var) {
                        self.tables
                            .locals(node)
                            .insert(name.to_string(), Default::default());
                    }
                }
            }
            NodeKind::ComputeExpression { .. } => self.check_compute(visit, scopes),

            // Declarations and assignments
            NodeKind::GlobalConstantDeclarations { declarations } => {
                self.declare_constants(declarations, scopes);
            }
            NodeKind::GlobalVariableDeclarations { declarations } => {
                if self.is_top_level(visit) {
                    self.declare_globals(declarations, scopes);
                } else {
                    self.error(node, CheckErrorKind::MisplacedGlobalDeclaration);
                }
            }
            NodeKind::LocalVariableDeclarations { declarations } => {
                self.declare_locals(declarations, scopes);
            }
            NodeKind::Assignment { left, operator, .. } => {
                self.check_assignment(node, *left, *operator, scopes);
            }
            NodeKind::MultiAssignment { variables, .. } => {
                self.check_multi_assignment(node, variables, scopes);
            }
            NodeKind::FunctionDeclaration { .. } => {
                if !self.is_top_level(visit) {
                    self.error(node, CheckErrorKind::MisplacedFunctionDeclaration);
                }
            }
            NodeKind::FunctionExpression {
                captured_locals,
                parameters,
                ..
            } => self.check_function_expression(node, captured_locals, parameters, scopes),
            NodeKind::ExtendStatement { .. } => {
                if !self.is_top_level(visit) {
                    self.error(node, CheckErrorKind::MisplacedExtend);
                }
            }

            // Iteration and matching
            NodeKind::ForStatement {
                key_index,
                value_elem,
                ..
            }
            | NodeKind::ForExpression {
                key_index,
                value_elem,
                ..
            } => {
                self.tables.save_locals(node, scopes.scope);
                self.declare_iteration_variables(node, [*key_index, *value_elem], scopes);
            }
            NodeKind::WalkStatement {
                meta_ident,
                entry_ident,
                ..
            } => {
                self.tables.save_locals(node, scopes.scope);
                self.declare_iteration_variables(node, [*meta_ident, Some(*entry_ident)], scopes);
            }
            NodeKind::MatchStatement { .. } | NodeKind::MatchExpression { .. } => {
                self.tables.save_locals(node, scopes.scope);
            }
            NodeKind::MatchCase {
                group_matching_variable: Some(variable),
                ..
            } => self.declare_group_matching_variable(*variable, scopes),
            NodeKind::BreakStatement => self.check_break_or_continue(visit, true),
            NodeKind::ContinueStatement => self.check_break_or_continue(visit, false),
            NodeKind::PruneStatement => self.check_prune(visit),
            NodeKind::YieldStatement { .. } => self.check_yield(visit),

            // Names
            NodeKind::IdentifierLiteral(name) => self.check_identifier(visit, scopes, name),
            NodeKind::Variable(name) => self.check_variable(visit, scopes, name),
            NodeKind::GlobalVariable(name) => self.check_global_variable(visit, scopes, name),
            NodeKind::SelfExpression => self.check_self(visit, false),
            NodeKind::SendValueExpression { .. } => self.check_self(visit, true),

            // Patterns
            NodeKind::PatternDefinition { left, .. } => {
                if !self.is_top_level(visit) {
                    self.error(node, CheckErrorKind::MisplacedPatternDefinition);
                    return TraversalAction::Prune;
                }
                self.declare_pattern(node, *left, scopes);
            }
            NodeKind::PatternNamespaceDefinition { left, .. } => {
                if !self.is_top_level(visit) {
                    self.error(node, CheckErrorKind::MisplacedPatternNamespaceDefinition);
                    return TraversalAction::Prune;
                }
                self.declare_pattern_namespace(node, *left, scopes);
            }
            NodeKind::PatternIdentifierLiteral { name, .. } => {
                self.check_pattern_identifier(visit, scopes, name);
            }
            NodeKind::PatternNamespaceIdentifierLiteral(name) => {
                if !self.tables.pattern_namespaces(scopes.module).contains(name) {
                    self.error(
                        node,
                        CheckErrorKind::PatternNamespaceNotDeclared(name.clone()),
                    );
                }
            }

            // Checks
            NodeKind::RuntimeTypeCheckExpression { .. } => self.check_runtime_type_check(visit),
            NodeKind::DynamicMemberExpression { optional: true, .. } => {
                self.error(node, CheckErrorKind::OptionalDynamicMember);
            }
            _ => {}
        }

        TraversalAction::Continue
    }
}

/// Nodes owning the locals declared below them.
fn is_local_scope(kind: &NodeKind) -> bool {
    kind.is_scope_container()
        || matches!(
            kind,
            NodeKind::StaticMappingEntry { .. } | NodeKind::DynamicMappingEntry { .. }
        )
}

impl NodeVisitor for Checker<'_> {
    fn pre(&mut self, _ast: &Ast, visit: &Visit<'_>) -> TraversalAction {
        self.check_assertion_member(visit);
        let scopes = self.scopes(visit);
        self.check_node(visit, scopes)
    }

    fn post(&mut self, _ast: &Ast, visit: &Visit<'_>) -> TraversalAction {
        match self.ast.kind(visit.node) {
            NodeKind::ForStatement { .. }
            | NodeKind::ForExpression { .. }
            | NodeKind::WalkStatement { .. }
            | NodeKind::MatchStatement { .. }
            | NodeKind::MatchExpression { .. } => {
                let scopes = self.scopes(visit);
                self.tables.restore_locals(visit.node, scopes.scope);
            }
            _ => {}
        }
        TraversalAction::Continue
    }
}

#[cfg(test)]
mod tests;
