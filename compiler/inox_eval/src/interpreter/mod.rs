//! Tree-walking interpreter for Inox modules.
//!
//! # Architecture
//!
//! All evaluation goes through [`Interpreter::eval`], which guards the native
//! stack, dispatches on the node kind and attaches the node's position to
//! errors that have none yet. Node families live in sibling modules:
//!
//! - `literals`: scalar literals, interpolated paths, URLs and hosts
//! - `containers`: member access, objects, records, lists, tuples,
//!   dictionaries, treedata and concatenation
//! - `patterns`: pattern literals and pattern definitions
//! - `assignment`: declarations and assignments
//! - `calls`: functions, calls, `must`, pipelines and mappings
//! - `control`: blocks, conditionals, loops, walks, switch and match
//! - `checks`: assertions, runtime type checks and permission dropping
//! - `modules`: chunks, inclusions, spawn, test modules, extensions, markup
//!
//! # AST Threading
//!
//! Functions, mappings and lifetime jobs carry the AST they were created
//! from. Evaluating one of them swaps `self.ast` for the callee's AST for the
//! duration of the call; [`Interpreter::call_frame`] restores the caller's.
//!
//! # Control Flow
//!
//! `break`, `continue`, `prune`, `yield` and `return` set a pending
//! [`IterationChange`]. Statement lists stop at the first pending change and
//! the construct the change targets consumes it.

mod assignment;
mod builder;
mod calls;
mod checks;
mod containers;
mod control;
mod literals;
mod modules;
mod patterns;
mod scope_guard;

pub use builder::InterpreterBuilder;
pub use modules::FROM_MARKUP_FACTORY;
pub use scope_guard::ScopedInterpreter;

use std::sync::Arc;

use inox_check::StaticCheckData;
use inox_core::errors::{self, AssertionData, EvalError, SourcePositionStack};
use inox_core::{Context, DynamicValue, EvalResult, Permission, PermissionKind, Value};
use inox_ir::{BinaryOp, Module, NodeId, NodeKind, SharedAst};
use inox_stack::ensure_sufficient_stack;

use crate::config::EvalConfig;
use crate::environment::{GlobalState, LocalScopes};
use crate::operators::{evaluate_binary, evaluate_unary};

/// Local holding the pipeline value `$`.
pub(crate) const PIPE_VARIABLE: &str = "";

/// Pending change of control flow.
#[derive(Clone, Debug, Default)]
pub enum IterationChange {
    #[default]
    None,
    Break,
    Continue,
    Prune,
    Yield(Value),
    Return(Value),
}

impl IterationChange {
    pub fn is_none(&self) -> bool {
        matches!(self, IterationChange::None)
    }
}

/// Evaluator of one module (or embedded module) in one context.
///
/// Interpreters own everything they touch, so the interpreter of a spawned
/// lthread moves to its thread.
pub struct Interpreter {
    ctx: Context,
    module: Arc<Module>,
    /// AST of the code being evaluated; differs from the module's inside
    /// functions created elsewhere.
    ast: SharedAst,
    globals: GlobalState,
    env: LocalScopes,
    static_data: Arc<StaticCheckData>,
    config: Arc<EvalConfig>,
    /// Globals captured by the functions being called, innermost last.
    captured_globals: Vec<Vec<(String, Value)>>,
    call_depth: usize,
    self_value: Option<Value>,
    iteration_change: IterationChange,
    /// Values recorded while an assertion is evaluated.
    assertion: Option<AssertionData>,
}

impl Interpreter {
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn globals(&self) -> &GlobalState {
        &self.globals
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Evaluate the module's root.
    pub fn run_module(&mut self) -> EvalResult {
        let root = self.module.main_chunk;
        self.eval(root)
    }

    /// Evaluate a node.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn eval(&mut self, node: NodeId) -> EvalResult {
        match ensure_sufficient_stack(|| self.eval_inner(node)) {
            Ok(value) => {
                if let Some(assertion) = self.assertion.as_mut() {
                    assertion.intermediary_values.push((node, value.clone()));
                }
                Ok(value)
            }
            Err(error) if error.has_position() => Err(error),
            Err(error) => Err(error.with_positions(SourcePositionStack::new(vec![
                self.ast.position(node),
            ]))),
        }
    }

    fn eval_inner(&mut self, node: NodeId) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        match ast.kind(node) {
            // Modules
            NodeKind::Chunk {
                global_constants,
                statements,
                ..
            } => self.eval_module_body(*global_constants, statements),
            NodeKind::EmbeddedModule { statements, .. } => self.eval_module_body(None, statements),
            NodeKind::Manifest { .. } => Ok(Value::Nil),

            // Literals
            NodeKind::NilLiteral => Ok(Value::Nil),
            NodeKind::BooleanLiteral(b) => Ok(Value::Bool(*b)),
            NodeKind::IntLiteral(n) => Ok(Value::int(*n)),
            NodeKind::FloatLiteral(f) => Ok(Value::Float(*f)),
            NodeKind::RuneLiteral(c) => Ok(Value::Rune(*c)),
            NodeKind::StringLiteral(s) => Ok(Value::str(s.as_str())),
            NodeKind::PortLiteral { number, scheme } => Ok(literals::port(*number, scheme.as_deref())),
            NodeKind::QuantityLiteral { values, units } => literals::quantity(values, units),
            NodeKind::RateLiteral { quantity, div_unit } => {
                let quantity = self.eval(*quantity)?;
                literals::rate(&quantity, div_unit)
            }
            NodeKind::YearLiteral(year) => Ok(Value::Year(*year)),
            NodeKind::DateLiteral { year, month, day } => literals::date(*year, *month, *day),
            NodeKind::DateTimeLiteral(text) => literals::datetime(text),
            NodeKind::ByteSliceLiteral(bytes) => Ok(Value::byte_slice(bytes.clone())),
            NodeKind::RegexLiteral(regex) => literals::regex(regex),
            NodeKind::UrlLiteral(s) => Ok(Value::url(s.as_str())),
            NodeKind::SchemeLiteral(s) => Ok(Value::scheme(s.as_str())),
            NodeKind::HostLiteral(s) => Ok(Value::host(s.as_str())),
            NodeKind::HostPatternLiteral(s) => Ok(Value::host_pattern(s.as_str())),
            NodeKind::UrlPatternLiteral(s) => Ok(Value::url_pattern(s.as_str())),
            NodeKind::EmailAddressLiteral(s) => Ok(Value::email_address(s.as_str())),
            NodeKind::PathLiteral { value, .. } => Ok(Value::path(value.as_str())),
            NodeKind::PathPatternLiteral { value, .. } => Ok(Value::path_pattern(value.as_str())),
            NodeKind::NamedSegmentPathPatternLiteral { slices } => {
                self.eval_named_segment_path_pattern(slices)
            }
            NodeKind::PathPatternSlice(s)
            | NodeKind::NamedPathSegment(s)
            | NodeKind::PathSlice(s)
            | NodeKind::UrlQueryParameterValueSlice(s) => Ok(Value::str(s.as_str())),
            NodeKind::FlagLiteral(name) => Ok(Value::option(name.as_str(), Value::Bool(true))),
            NodeKind::OptionExpression { name, value } => {
                let value = self.eval(*value)?;
                Ok(Value::option(name.as_str(), value))
            }
            NodeKind::IntegerRangeLiteral { lower, upper } => Ok(literals::int_range(*lower, *upper)),
            NodeKind::FloatRangeLiteral { lower, upper } => Ok(literals::float_range(*lower, *upper)),
            NodeKind::QuantityRangeLiteral { lower, upper } => {
                self.eval_quantity_range(*lower, *upper)
            }
            NodeKind::RuneRangeExpression { lower, upper } => {
                Ok(literals::rune_range(*lower, *upper))
            }

            // Interpolated literals
            NodeKind::PathExpression { slices, .. } => self.eval_path_expression(slices),
            NodeKind::UrlExpression {
                host_part,
                path,
                query,
            } => self.eval_url_expression(*host_part, path, query),
            NodeKind::HostExpression { scheme, host } => self.eval_host_expression(scheme, *host),

            // Names
            NodeKind::IdentifierLiteral(name) => self.identifier_value(name),
            NodeKind::UnambiguousIdentifierLiteral(name) => Ok(Value::identifier(name.as_str())),
            NodeKind::PropertyNameLiteral(name) => Ok(Value::property_name(name.as_str())),
            NodeKind::Variable(name) => self
                .env
                .get(name)
                .ok_or_else(|| errors::undeclared_variable(name)),
            NodeKind::GlobalVariable(name) => {
                self.ctx
                    .check_has_permission(&Permission::global_var(PermissionKind::READ, name))?;
                self.global(name)
                    .ok_or_else(|| errors::undeclared_variable(name))
            }
            NodeKind::SelfExpression => self
                .self_value
                .clone()
                .ok_or_else(|| errors::invalid_argument("self is not available here")),

            // Member access
            NodeKind::MemberExpression {
                left,
                property,
                optional,
            } => {
                let object = self.eval(*left)?;
                let name = self.name_of(*property)?;
                self.member(&object, &name, *optional)
            }
            NodeKind::ComputedMemberExpression {
                left,
                property,
                optional,
            } => {
                let object = self.eval(*left)?;
                let name = self.eval(*property)?;
                let name = name
                    .as_str()
                    .ok_or_else(|| errors::type_mismatch("string", name.type_name()))?
                    .to_string();
                self.member(&object, &name, *optional)
            }
            NodeKind::IdentifierMemberExpression {
                left,
                property_names,
            } => {
                let mut value = self.eval(*left)?;
                for property in property_names {
                    let name = self.name_of(*property)?;
                    value = self.member(&value, &name, false)?;
                }
                Ok(value)
            }
            NodeKind::DynamicMemberExpression { left, property, .. } => {
                let object = self.eval(*left)?;
                let name = self.name_of(*property)?;
                DynamicValue::member(&self.ctx, &object, &name)
            }
            NodeKind::DoubleColonExpression { left, element } => {
                self.eval(*left)?;
                let name = self.name_of(*element)?;
                self.extension_member(node, &name)
            }
            NodeKind::IndexExpression { indexed, index } => self.eval_index(*indexed, *index),
            NodeKind::SliceExpression {
                indexed,
                start,
                end,
            } => self.eval_slice(*indexed, *start, *end),
            NodeKind::KeyListExpression { keys } => {
                let names = keys
                    .iter()
                    .map(|key| self.name_of(*key))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::key_list(names))
            }
            NodeKind::ExtractionExpression { object, keys } => self.eval_extraction(*object, *keys),
            NodeKind::BooleanConversionExpression { expr } => {
                let value = self.eval(*expr)?;
                Ok(Value::Bool(truthiness(&value)))
            }

            // Containers
            NodeKind::ObjectLiteral {
                properties,
                meta_properties,
                spread_elements,
            } => self.eval_object_literal(properties, meta_properties, spread_elements),
            NodeKind::RecordLiteral {
                properties,
                spread_elements,
            } => self.eval_record_literal(properties, spread_elements),
            NodeKind::ListLiteral {
                elements,
                type_annotation,
            } => self.eval_list_literal(elements, *type_annotation),
            NodeKind::TupleLiteral {
                elements,
                type_annotation,
            } => self.eval_tuple_literal(elements, *type_annotation),
            NodeKind::DictionaryLiteral { entries } => self.eval_dictionary_literal(entries),
            NodeKind::TreedataLiteral { root, children } => self.eval_treedata(*root, children),
            NodeKind::TreedataPair { key, value } => {
                let key = self.eval(*key)?;
                let value = self.eval(*value)?;
                Ok(Value::ordered_pair(key, value))
            }

            // Patterns
            NodeKind::PatternIdentifierLiteral { name, .. } => self.named_pattern(name),
            NodeKind::PatternNamespaceIdentifierLiteral(name) => self.pattern_namespace(name),
            NodeKind::PatternNamespaceMemberExpression { namespace, member } => {
                self.pattern_namespace_member(*namespace, *member)
            }
            NodeKind::OptionalPatternExpression { pattern } => self.eval_optional_pattern(*pattern),
            NodeKind::ObjectPatternLiteral {
                properties,
                spread_elements,
                inexact,
            } => self.eval_object_pattern(properties, spread_elements, *inexact, false),
            NodeKind::RecordPatternLiteral {
                properties,
                spread_elements,
                inexact,
            } => self.eval_object_pattern(properties, spread_elements, *inexact, true),
            NodeKind::ListPatternLiteral {
                elements,
                general_element,
            } => self.eval_sequence_pattern(elements, *general_element, false),
            NodeKind::TuplePatternLiteral {
                elements,
                general_element,
            } => self.eval_sequence_pattern(elements, *general_element, true),
            NodeKind::OptionPatternLiteral { name, value } => self.eval_option_pattern(name, *value),
            NodeKind::PatternDefinition { left, right, .. } => {
                self.eval_pattern_definition(*left, *right)
            }
            NodeKind::PatternNamespaceDefinition { left, right } => {
                self.eval_pattern_namespace_definition(*left, *right)
            }
            NodeKind::ComplexStringPatternPiece { elements } => self.eval_string_pattern_piece(elements),
            NodeKind::PatternUnion { cases } => self.eval_pattern_union(cases),
            NodeKind::PatternCallExpression { callee, arguments } => {
                self.eval_pattern_call(*callee, arguments)
            }
            NodeKind::PatternConversionExpression { value } => {
                let value = self.eval(*value)?;
                Ok(Value::Pattern(inox_core::Pattern::from_value(&value)))
            }

            // Declarations and assignments
            NodeKind::GlobalConstantDeclarations { declarations } => {
                self.eval_global_constants(declarations)
            }
            NodeKind::LocalVariableDeclarations { declarations } => {
                self.eval_variable_declarations(declarations, false)
            }
            NodeKind::GlobalVariableDeclarations { declarations } => {
                self.eval_variable_declarations(declarations, true)
            }
            NodeKind::Assignment {
                left,
                right,
                operator,
            } => self.eval_assignment(*left, *right, *operator),
            NodeKind::MultiAssignment {
                variables,
                right,
                nillable,
            } => self.eval_multi_assignment(variables, *right, *nillable),
            NodeKind::FunctionDeclaration { name, function } => {
                self.declare_function(*name, *function)?;
                Ok(Value::Nil)
            }
            NodeKind::FunctionExpression { .. } => self.make_function(node, None),
            NodeKind::ExtendStatement {
                extended_pattern,
                extension,
            } => self.eval_extend(node, *extended_pattern, *extension),

            // Calls
            NodeKind::CallExpression {
                callee,
                arguments,
                must,
                ..
            } => self.eval_call(node, *callee, arguments, *must),
            NodeKind::PipelineStatement { stages } | NodeKind::PipelineExpression { stages } => {
                self.eval_pipeline(stages)
            }

            // Control flow
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => self.eval_if(*test, *consequent, *alternate, false),
            NodeKind::IfExpression {
                test,
                consequent,
                alternate,
            } => self.eval_if(*test, *consequent, *alternate, true),
            NodeKind::ForStatement {
                key_index,
                value_elem,
                key_pattern,
                value_pattern,
                iterated,
                body,
                chunked,
            } => self.eval_for(
                control::ForLoop {
                    key_pattern: *key_pattern,
                    key_index: *key_index,
                    value_pattern: *value_pattern,
                    value_elem: *value_elem,
                    iterated: *iterated,
                    body: *body,
                    chunked: *chunked,
                },
                false,
            ),
            NodeKind::ForExpression {
                key_index,
                value_elem,
                key_pattern,
                value_pattern,
                iterated,
                body,
                chunked,
            } => self.eval_for(
                control::ForLoop {
                    key_pattern: *key_pattern,
                    key_index: *key_index,
                    value_pattern: *value_pattern,
                    value_elem: *value_elem,
                    iterated: *iterated,
                    body: *body,
                    chunked: *chunked,
                },
                true,
            ),
            NodeKind::WalkStatement {
                walked,
                meta_ident,
                entry_ident,
                body,
            } => self.eval_walk(*walked, *meta_ident, *entry_ident, *body),
            NodeKind::PruneStatement => {
                self.iteration_change = IterationChange::Prune;
                Ok(Value::Nil)
            }
            NodeKind::Block { statements } => {
                self.eval_statements(statements)?;
                Ok(Value::Nil)
            }
            NodeKind::SynchronizedBlockStatement { values, block } => {
                self.eval_synchronized(values, *block)
            }
            NodeKind::ReturnStatement { expr } => {
                let value = self.eval_optional(*expr)?;
                self.iteration_change = IterationChange::Return(value);
                Ok(Value::Nil)
            }
            NodeKind::YieldStatement { expr } => {
                let value = self.eval_optional(*expr)?;
                self.iteration_change = IterationChange::Yield(value);
                Ok(Value::Nil)
            }
            NodeKind::BreakStatement => {
                self.iteration_change = IterationChange::Break;
                Ok(Value::Nil)
            }
            NodeKind::ContinueStatement => {
                self.iteration_change = IterationChange::Continue;
                Ok(Value::Nil)
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
                default_cases,
            }
            | NodeKind::SwitchExpression {
                discriminant,
                cases,
                default_cases,
            } => self.eval_switch(*discriminant, cases, default_cases),
            NodeKind::MatchStatement {
                discriminant,
                cases,
                default_cases,
            }
            | NodeKind::MatchExpression {
                discriminant,
                cases,
                default_cases,
            } => self.eval_match(*discriminant, cases, default_cases),

            // Operators
            NodeKind::UnaryExpression { operator, operand } => {
                let operand = self.eval(*operand)?;
                evaluate_unary(*operator, &operand)
            }
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => self.eval_binary(*operator, *left, *right),
            NodeKind::ConcatenationExpression { elements } => self.eval_concatenation(elements),

            // Checks
            NodeKind::AssertionStatement { expr } => self.eval_assertion(node, *expr),
            NodeKind::RuntimeTypeCheckExpression { expr } => self.eval_runtime_type_check(node, *expr),
            NodeKind::PermissionDroppingStatement { object } => self.eval_permission_dropping(*object),

            // Modules and concurrency
            NodeKind::InclusionImportStatement { .. } => self.eval_inclusion(node),
            NodeKind::SpawnExpression { meta, module } => self.eval_spawn(*meta, *module),
            NodeKind::MappingExpression { .. } => Ok(self.make_mapping(node)),
            NodeKind::ComputeExpression { arg } => self.eval(*arg),
            NodeKind::TestSuiteExpression { meta, module } => {
                self.eval_test_module(node, *meta, *module, inox_ir::ModuleKind::TestSuite)
            }
            NodeKind::TestCaseExpression { meta, module } => {
                self.eval_test_module(node, *meta, *module, inox_ir::ModuleKind::TestCase)
            }
            NodeKind::LifetimeJobExpression {
                meta,
                subject,
                module,
            } => self.make_lifetime_job(*meta, *subject, *module),
            NodeKind::ReceptionHandlerExpression { pattern, handler } => {
                self.make_reception_handler(*pattern, *handler)
            }
            NodeKind::SendValueExpression { value, receiver } => self.eval_sendval(*value, *receiver),

            // Markup
            NodeKind::MarkupExpression { namespace, element } => {
                self.eval_markup(*namespace, *element)
            }
            NodeKind::MarkupElement { .. } => self.eval_markup_element(node),
            NodeKind::MarkupText(text) => Ok(Value::str(text.as_str())),
            NodeKind::MarkupInterpolation { expr } => self.eval(*expr),

            // Only evaluated through their parent
            other @ (NodeKind::ObjectProperty { .. }
            | NodeKind::ObjectMetaProperty { .. }
            | NodeKind::InitializationBlock { .. }
            | NodeKind::PropertySpreadElement { .. }
            | NodeKind::ElementSpreadElement { .. }
            | NodeKind::DictionaryEntry { .. }
            | NodeKind::TreedataEntry { .. }
            | NodeKind::ObjectPatternProperty { .. }
            | NodeKind::PatternPropertySpreadElement { .. }
            | NodeKind::PatternPieceElement { .. }
            | NodeKind::GlobalConstantDeclaration { .. }
            | NodeKind::LocalVariableDeclaration { .. }
            | NodeKind::GlobalVariableDeclaration { .. }
            | NodeKind::FunctionParameter { .. }
            | NodeKind::SpreadArgument { .. }
            | NodeKind::SwitchCase { .. }
            | NodeKind::MatchCase { .. }
            | NodeKind::DefaultCase { .. }
            | NodeKind::StaticMappingEntry { .. }
            | NodeKind::DynamicMappingEntry { .. }
            | NodeKind::UrlQueryParameter { .. }
            | NodeKind::MarkupAttribute { .. }) => Err(errors::invalid_argument(format!(
                "a(n) {} cannot be evaluated on its own",
                other.name()
            ))),
        }
    }

    fn eval_optional(&mut self, node: Option<NodeId>) -> EvalResult {
        match node {
            Some(node) => self.eval(node),
            None => Ok(Value::Nil),
        }
    }

    /// `and`, `or` and `??` evaluate their right operand only when needed.
    fn eval_binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> EvalResult {
        let left = self.eval(left)?;
        match op {
            BinaryOp::And if left.as_bool() == Some(false) => Ok(Value::Bool(false)),
            BinaryOp::Or if left.as_bool() == Some(true) => Ok(Value::Bool(true)),
            BinaryOp::NilCoalescing if !left.is_nil() => Ok(left),
            _ => {
                let right = self.eval(right)?;
                evaluate_binary(&self.ctx, op, &left, &right)
            }
        }
    }

    /// Global visible from the code being evaluated: globals captured by the
    /// current function shadow the module's.
    fn global(&self, name: &str) -> Option<Value> {
        let captured = self.captured_globals.last().and_then(|captured| {
            captured
                .iter()
                .find(|(captured_name, _)| captured_name == name)
                .map(|(_, value)| value.clone())
        });
        captured.or_else(|| self.globals.get(name))
    }

    /// Local, else global (with `use` permission).
    fn identifier_value(&self, name: &str) -> EvalResult {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        match self.global(name) {
            Some(value) => {
                self.ctx
                    .check_has_permission(&Permission::global_var(PermissionKind::USE, name))?;
                Ok(value)
            }
            None => Err(errors::undeclared_variable(name)),
        }
    }

    /// Name of an identifier-like node or a string literal.
    fn name_of(&self, node: NodeId) -> Result<String, EvalError> {
        match self.ast.kind(node) {
            NodeKind::StringLiteral(s) | NodeKind::PropertyNameLiteral(s) => Ok(s.clone()),
            kind => kind.identifier_name().map(str::to_string).ok_or_else(|| {
                errors::type_mismatch("identifier", kind.name())
            }),
        }
    }

    fn output(&self) -> &crate::output::OutputHandler {
        &self.config.output
    }
}

/// Truthiness used by `expr?`: nil, false, zero and empty containers are
/// false.
fn truthiness(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        Value::Int(n) => n.raw() != 0,
        Value::Float(f) => *f != 0.0,
        Value::Error(_) => false,
        other => {
            if other.is_string_like() {
                return other.as_str().is_some_and(|s| !s.is_empty());
            }
            match other.len() {
                Ok(len) => len != 0,
                Err(_) => true,
            }
        }
    }
}
