//! Node kinds of the Inox syntax tree.
//!
//! # Design Notes
//! - Children are referenced by [`NodeId`] into the owning [`Ast`](super::Ast).
//! - Optional children use `Option<NodeId>`; lists use `Vec<NodeId>`.
//! - Literals carry their already-decoded value; the parser (an external
//!   collaborator) is responsible for decoding escapes and numbers.

use smallvec::SmallVec;

use super::operators::{AssignmentOp, BinaryOp, PatternQuantifier, UnaryOp};
use crate::{NodeId, SourceId, Span};

/// A node of the syntax tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Source file the node was parsed from (included chunks have their own).
    pub source: SourceId,
}

/// Children of a node, in source order.
pub type Children = SmallVec<[NodeId; 4]>;

/// Every node class of the language.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    // Modules
    /// Top-level file.
    Chunk {
        global_constants: Option<NodeId>,
        manifest: Option<NodeId>,
        statements: Vec<NodeId>,
    },
    /// Body of a spawn expression, lifetime job, test suite or test case.
    EmbeddedModule {
        manifest: Option<NodeId>,
        statements: Vec<NodeId>,
    },
    /// `manifest { ... }`
    Manifest { object: NodeId },

    // Simple literals
    NilLiteral,
    BooleanLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    PortLiteral { number: u16, scheme: Option<String> },
    /// `1h30mn`, `10kB`, `5%`: one value per unit.
    QuantityLiteral { values: Vec<f64>, units: Vec<String> },
    /// `10kB/s`
    RateLiteral { quantity: NodeId, div_unit: String },
    YearLiteral(i32),
    DateLiteral { year: i32, month: u32, day: u32 },
    /// RFC 3339 text.
    DateTimeLiteral(String),
    RuneLiteral(char),
    StringLiteral(String),
    ByteSliceLiteral(Vec<u8>),
    RegexLiteral(String),
    UrlLiteral(String),
    SchemeLiteral(String),
    HostLiteral(String),
    HostPatternLiteral(String),
    UrlPatternLiteral(String),
    EmailAddressLiteral(String),
    PathLiteral { value: String, absolute: bool },
    PathPatternLiteral { value: String, absolute: bool },
    /// `%/users/{:id}`: static slices and named segments.
    NamedSegmentPathPatternLiteral { slices: Vec<NodeId> },
    PathPatternSlice(String),
    NamedPathSegment(String),
    /// `--verbose`
    FlagLiteral(String),
    /// `--level=3`
    OptionExpression { name: String, value: NodeId },
    IntegerRangeLiteral { lower: i64, upper: Option<i64> },
    FloatRangeLiteral { lower: f64, upper: Option<f64> },
    QuantityRangeLiteral { lower: NodeId, upper: Option<NodeId> },
    RuneRangeExpression { lower: char, upper: char },

    // Interpolated literals
    /// `/home/{name}/file`: `PathSlice` nodes and interpolated expressions.
    PathExpression { slices: Vec<NodeId>, absolute: bool },
    PathSlice(String),
    /// `https://{host}/path?q={v}`
    UrlExpression {
        host_part: NodeId,
        path: Vec<NodeId>,
        query: Vec<NodeId>,
    },
    UrlQueryParameter { name: String, value: Vec<NodeId> },
    UrlQueryParameterValueSlice(String),
    /// `https://{name}`: a scheme followed by an interpolated host name.
    HostExpression { scheme: String, host: NodeId },

    // Names
    /// Bare identifier, resolved as a local or global variable.
    IdentifierLiteral(String),
    /// `#name`
    UnambiguousIdentifierLiteral(String),
    /// `.name`
    PropertyNameLiteral(String),
    /// `$name`: local variable.
    Variable(String),
    /// `$$name`: global variable.
    GlobalVariable(String),
    SelfExpression,

    // Member access
    MemberExpression {
        left: NodeId,
        property: NodeId,
        optional: bool,
    },
    ComputedMemberExpression {
        left: NodeId,
        property: NodeId,
        optional: bool,
    },
    /// `a.b.c` where `a` is an identifier.
    IdentifierMemberExpression {
        left: NodeId,
        property_names: Vec<NodeId>,
    },
    /// `obj<-prop`: builds a dynamic member value.
    DynamicMemberExpression {
        left: NodeId,
        property: NodeId,
        optional: bool,
    },
    /// `value::name`: extension member access.
    DoubleColonExpression { left: NodeId, element: NodeId },
    IndexExpression { indexed: NodeId, index: NodeId },
    SliceExpression {
        indexed: NodeId,
        start: Option<NodeId>,
        end: Option<NodeId>,
    },
    /// `.{a, b}`
    KeyListExpression { keys: Vec<NodeId> },
    /// `obj.{a, b}`
    ExtractionExpression { object: NodeId, keys: NodeId },
    /// `value?`
    BooleanConversionExpression { expr: NodeId },

    // Containers
    ObjectLiteral {
        properties: Vec<NodeId>,
        meta_properties: Vec<NodeId>,
        spread_elements: Vec<NodeId>,
    },
    /// A property of an object or record literal; `key` is `None` for
    /// no-key (implicit) elements.
    ObjectProperty {
        key: Option<NodeId>,
        type_annotation: Option<NodeId>,
        value: NodeId,
    },
    /// `_constraints_ { ... }`
    ObjectMetaProperty { key: NodeId, initialization: NodeId },
    InitializationBlock { statements: Vec<NodeId> },
    /// `...obj.{a, b}`
    PropertySpreadElement { extraction: NodeId },
    RecordLiteral {
        properties: Vec<NodeId>,
        spread_elements: Vec<NodeId>,
    },
    ListLiteral {
        elements: Vec<NodeId>,
        type_annotation: Option<NodeId>,
    },
    TupleLiteral {
        elements: Vec<NodeId>,
        type_annotation: Option<NodeId>,
    },
    /// `...list` inside a list, tuple, or concatenation.
    ElementSpreadElement { expr: NodeId },
    DictionaryLiteral { entries: Vec<NodeId> },
    DictionaryEntry { key: NodeId, value: NodeId },
    TreedataLiteral { root: NodeId, children: Vec<NodeId> },
    TreedataEntry { value: NodeId, children: Vec<NodeId> },
    TreedataPair { key: NodeId, value: NodeId },

    // Patterns
    /// `%int`, or `int` in pattern position when `unprefixed`.
    PatternIdentifierLiteral { name: String, unprefixed: bool },
    /// `%dom.`
    PatternNamespaceIdentifierLiteral(String),
    /// `%dom.div`
    PatternNamespaceMemberExpression { namespace: NodeId, member: NodeId },
    /// `%int?`
    OptionalPatternExpression { pattern: NodeId },
    ObjectPatternLiteral {
        properties: Vec<NodeId>,
        spread_elements: Vec<NodeId>,
        inexact: bool,
    },
    ObjectPatternProperty {
        key: NodeId,
        value: NodeId,
        optional: bool,
    },
    /// `...%pattern` inside an object or record pattern.
    PatternPropertySpreadElement { expr: NodeId },
    RecordPatternLiteral {
        properties: Vec<NodeId>,
        spread_elements: Vec<NodeId>,
        inexact: bool,
    },
    ListPatternLiteral {
        elements: Vec<NodeId>,
        general_element: Option<NodeId>,
    },
    TuplePatternLiteral {
        elements: Vec<NodeId>,
        general_element: Option<NodeId>,
    },
    /// `%--name=%int`
    OptionPatternLiteral { name: String, value: NodeId },
    /// `pattern name = ...`
    PatternDefinition {
        left: NodeId,
        right: NodeId,
        lazy: bool,
    },
    /// `pnamespace ns. = { ... }`
    PatternNamespaceDefinition { left: NodeId, right: NodeId },
    /// `%str(...)`: a sequence of pattern piece elements.
    ComplexStringPatternPiece { elements: Vec<NodeId> },
    PatternPieceElement {
        quantifier: PatternQuantifier,
        exact_count: u32,
        expr: NodeId,
        group_name: Option<String>,
    },
    /// `%| a | b`
    PatternUnion { cases: Vec<NodeId> },
    /// `%int(0..10)`
    PatternCallExpression { callee: NodeId, arguments: Vec<NodeId> },
    /// `%(value)`: exact-value pattern.
    PatternConversionExpression { value: NodeId },

    // Declarations
    GlobalConstantDeclarations { declarations: Vec<NodeId> },
    GlobalConstantDeclaration { left: NodeId, right: NodeId },
    LocalVariableDeclarations { declarations: Vec<NodeId> },
    LocalVariableDeclaration {
        left: NodeId,
        type_annotation: Option<NodeId>,
        right: Option<NodeId>,
    },
    GlobalVariableDeclarations { declarations: Vec<NodeId> },
    GlobalVariableDeclaration {
        left: NodeId,
        type_annotation: Option<NodeId>,
        right: Option<NodeId>,
    },
    Assignment {
        left: NodeId,
        right: NodeId,
        operator: AssignmentOp,
    },
    /// `assign a b = list`
    MultiAssignment {
        variables: Vec<NodeId>,
        right: NodeId,
        nillable: bool,
    },
    FunctionDeclaration { name: NodeId, function: NodeId },
    FunctionExpression {
        captured_locals: Vec<NodeId>,
        parameters: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
        is_body_expression: bool,
        is_variadic: bool,
    },
    FunctionParameter {
        var: NodeId,
        type_annotation: Option<NodeId>,
    },
    /// `extend %pattern { ... }`
    ExtendStatement {
        extended_pattern: NodeId,
        extension: NodeId,
    },

    // Calls
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
        must: bool,
        command_like: bool,
    },
    SpreadArgument { expr: NodeId },
    /// `a | b $ | c`
    PipelineStatement { stages: Vec<NodeId> },
    PipelineExpression { stages: Vec<NodeId> },

    // Control flow
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    IfExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    ForStatement {
        key_pattern: Option<NodeId>,
        key_index: Option<NodeId>,
        value_pattern: Option<NodeId>,
        value_elem: Option<NodeId>,
        iterated: NodeId,
        body: NodeId,
        chunked: bool,
    },
    /// Body is either a block (with `yield`) or a single expression.
    ForExpression {
        key_pattern: Option<NodeId>,
        key_index: Option<NodeId>,
        value_pattern: Option<NodeId>,
        value_elem: Option<NodeId>,
        iterated: NodeId,
        body: NodeId,
        chunked: bool,
    },
    WalkStatement {
        walked: NodeId,
        meta_ident: Option<NodeId>,
        entry_ident: NodeId,
        body: NodeId,
    },
    PruneStatement,
    Block { statements: Vec<NodeId> },
    SynchronizedBlockStatement { values: Vec<NodeId>, block: NodeId },
    ReturnStatement { expr: Option<NodeId> },
    YieldStatement { expr: Option<NodeId> },
    BreakStatement,
    ContinueStatement,
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
        default_cases: Vec<NodeId>,
    },
    MatchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
        default_cases: Vec<NodeId>,
    },
    SwitchExpression {
        discriminant: NodeId,
        cases: Vec<NodeId>,
        default_cases: Vec<NodeId>,
    },
    MatchExpression {
        discriminant: NodeId,
        cases: Vec<NodeId>,
        default_cases: Vec<NodeId>,
    },
    /// Case of a switch statement or expression; `body` is a block or an
    /// expression.
    SwitchCase { values: Vec<NodeId>, body: NodeId },
    MatchCase {
        values: Vec<NodeId>,
        group_matching_variable: Option<NodeId>,
        body: NodeId,
    },
    DefaultCase { body: NodeId },

    // Operators
    UnaryExpression { operator: UnaryOp, operand: NodeId },
    BinaryExpression {
        operator: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    /// `concat a b ...c`
    ConcatenationExpression { elements: Vec<NodeId> },

    // Checks
    /// `assert expr`
    AssertionStatement { expr: NodeId },
    /// `~expr`
    RuntimeTypeCheckExpression { expr: NodeId },
    /// `drop-perms { ... }`
    PermissionDroppingStatement { object: NodeId },

    // Modules and concurrency
    /// `import ./file.ix`
    InclusionImportStatement { source: NodeId },
    /// `go { meta } do { ... }`
    SpawnExpression { meta: Option<NodeId>, module: NodeId },
    MappingExpression { entries: Vec<NodeId> },
    StaticMappingEntry { key: NodeId, value: NodeId },
    DynamicMappingEntry {
        key: NodeId,
        key_var: NodeId,
        group_matching_variable: Option<NodeId>,
        value_computation: NodeId,
    },
    /// `compute expr` inside a dynamic mapping entry.
    ComputeExpression { arg: NodeId },
    TestSuiteExpression { meta: Option<NodeId>, module: NodeId },
    TestCaseExpression { meta: Option<NodeId>, module: NodeId },
    LifetimeJobExpression {
        meta: NodeId,
        subject: Option<NodeId>,
        module: NodeId,
    },
    /// `on received %pattern handler`
    ReceptionHandlerExpression { pattern: NodeId, handler: NodeId },
    /// `sendval value to receiver`
    SendValueExpression { value: NodeId, receiver: NodeId },

    // Markup
    MarkupExpression {
        namespace: Option<NodeId>,
        element: NodeId,
    },
    MarkupElement {
        name: String,
        attributes: Vec<NodeId>,
        children: Vec<NodeId>,
    },
    MarkupAttribute { name: String, value: Option<NodeId> },
    MarkupText(String),
    MarkupInterpolation { expr: NodeId },
}

fn push_opt(children: &mut Children, id: Option<NodeId>) {
    if let Some(id) = id {
        children.push(id);
    }
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Children {
        let mut c = Children::new();
        match self {
            NodeKind::Chunk {
                global_constants,
                manifest,
                statements,
            } => {
                push_opt(&mut c, *global_constants);
                push_opt(&mut c, *manifest);
                c.extend(statements.iter().copied());
            }
            NodeKind::EmbeddedModule {
                manifest,
                statements,
            } => {
                push_opt(&mut c, *manifest);
                c.extend(statements.iter().copied());
            }
            NodeKind::Manifest { object } => c.push(*object),
            NodeKind::RateLiteral { quantity, .. } => c.push(*quantity),
            NodeKind::NamedSegmentPathPatternLiteral { slices }
            | NodeKind::PathExpression { slices, .. } => c.extend(slices.iter().copied()),
            NodeKind::OptionExpression { value, .. }
            | NodeKind::OptionPatternLiteral { value, .. }
            | NodeKind::PatternConversionExpression { value } => c.push(*value),
            NodeKind::QuantityRangeLiteral { lower, upper } => {
                c.push(*lower);
                push_opt(&mut c, *upper);
            }
            NodeKind::UrlExpression {
                host_part,
                path,
                query,
            } => {
                c.push(*host_part);
                c.extend(path.iter().copied());
                c.extend(query.iter().copied());
            }
            NodeKind::UrlQueryParameter { value, .. } => c.extend(value.iter().copied()),
            NodeKind::HostExpression { host, .. } => c.push(*host),
            NodeKind::MemberExpression { left, property, .. }
            | NodeKind::ComputedMemberExpression { left, property, .. }
            | NodeKind::DynamicMemberExpression { left, property, .. } => {
                c.push(*left);
                c.push(*property);
            }
            NodeKind::IdentifierMemberExpression {
                left,
                property_names,
            } => {
                c.push(*left);
                c.extend(property_names.iter().copied());
            }
            NodeKind::DoubleColonExpression { left, element } => {
                c.push(*left);
                c.push(*element);
            }
            NodeKind::IndexExpression { indexed, index } => {
                c.push(*indexed);
                c.push(*index);
            }
            NodeKind::SliceExpression {
                indexed,
                start,
                end,
            } => {
                c.push(*indexed);
                push_opt(&mut c, *start);
                push_opt(&mut c, *end);
            }
            NodeKind::KeyListExpression { keys } => c.extend(keys.iter().copied()),
            NodeKind::ExtractionExpression { object, keys } => {
                c.push(*object);
                c.push(*keys);
            }
            NodeKind::BooleanConversionExpression { expr }
            | NodeKind::ElementSpreadElement { expr }
            | NodeKind::PatternPropertySpreadElement { expr }
            | NodeKind::SpreadArgument { expr }
            | NodeKind::AssertionStatement { expr }
            | NodeKind::RuntimeTypeCheckExpression { expr }
            | NodeKind::MarkupInterpolation { expr } => c.push(*expr),
            NodeKind::ObjectLiteral {
                properties,
                meta_properties,
                spread_elements,
            } => {
                c.extend(properties.iter().copied());
                c.extend(meta_properties.iter().copied());
                c.extend(spread_elements.iter().copied());
            }
            NodeKind::ObjectProperty {
                key,
                type_annotation,
                value,
            } => {
                push_opt(&mut c, *key);
                push_opt(&mut c, *type_annotation);
                c.push(*value);
            }
            NodeKind::ObjectMetaProperty {
                key,
                initialization,
            } => {
                c.push(*key);
                c.push(*initialization);
            }
            NodeKind::InitializationBlock { statements } | NodeKind::Block { statements } => {
                c.extend(statements.iter().copied());
            }
            NodeKind::PropertySpreadElement { extraction } => c.push(*extraction),
            NodeKind::RecordLiteral {
                properties,
                spread_elements,
            }
            | NodeKind::ObjectPatternLiteral {
                properties,
                spread_elements,
                ..
            }
            | NodeKind::RecordPatternLiteral {
                properties,
                spread_elements,
                ..
            } => {
                c.extend(properties.iter().copied());
                c.extend(spread_elements.iter().copied());
            }
            NodeKind::ListLiteral {
                elements,
                type_annotation,
            }
            | NodeKind::TupleLiteral {
                elements,
                type_annotation,
            } => {
                c.extend(elements.iter().copied());
                push_opt(&mut c, *type_annotation);
            }
            NodeKind::DictionaryLiteral { entries } | NodeKind::MappingExpression { entries } => {
                c.extend(entries.iter().copied());
            }
            NodeKind::DictionaryEntry { key, value }
            | NodeKind::TreedataPair { key, value }
            | NodeKind::StaticMappingEntry { key, value }
            | NodeKind::ObjectPatternProperty { key, value, .. } => {
                c.push(*key);
                c.push(*value);
            }
            NodeKind::TreedataLiteral { root, children } => {
                c.push(*root);
                c.extend(children.iter().copied());
            }
            NodeKind::TreedataEntry { value, children } => {
                c.push(*value);
                c.extend(children.iter().copied());
            }
            NodeKind::PatternNamespaceMemberExpression { namespace, member } => {
                c.push(*namespace);
                c.push(*member);
            }
            NodeKind::OptionalPatternExpression { pattern } => c.push(*pattern),
            NodeKind::ListPatternLiteral {
                elements,
                general_element,
            }
            | NodeKind::TuplePatternLiteral {
                elements,
                general_element,
            } => {
                c.extend(elements.iter().copied());
                push_opt(&mut c, *general_element);
            }
            NodeKind::PatternDefinition { left, right, .. }
            | NodeKind::PatternNamespaceDefinition { left, right }
            | NodeKind::GlobalConstantDeclaration { left, right } => {
                c.push(*left);
                c.push(*right);
            }
            NodeKind::ComplexStringPatternPiece { elements }
            | NodeKind::ConcatenationExpression { elements } => c.extend(elements.iter().copied()),
            NodeKind::PatternPieceElement { expr, .. } => c.push(*expr),
            NodeKind::PatternUnion { cases } => c.extend(cases.iter().copied()),
            NodeKind::PatternCallExpression { callee, arguments }
            | NodeKind::CallExpression {
                callee, arguments, ..
            } => {
                c.push(*callee);
                c.extend(arguments.iter().copied());
            }
            NodeKind::GlobalConstantDeclarations { declarations }
            | NodeKind::LocalVariableDeclarations { declarations }
            | NodeKind::GlobalVariableDeclarations { declarations } => {
                c.extend(declarations.iter().copied());
            }
            NodeKind::LocalVariableDeclaration {
                left,
                type_annotation,
                right,
            }
            | NodeKind::GlobalVariableDeclaration {
                left,
                type_annotation,
                right,
            } => {
                c.push(*left);
                push_opt(&mut c, *type_annotation);
                push_opt(&mut c, *right);
            }
            NodeKind::Assignment { left, right, .. } => {
                c.push(*left);
                c.push(*right);
            }
            NodeKind::MultiAssignment {
                variables, right, ..
            } => {
                c.extend(variables.iter().copied());
                c.push(*right);
            }
            NodeKind::FunctionDeclaration { name, function } => {
                c.push(*name);
                c.push(*function);
            }
            NodeKind::FunctionExpression {
                captured_locals,
                parameters,
                return_type,
                body,
                ..
            } => {
                c.extend(captured_locals.iter().copied());
                c.extend(parameters.iter().copied());
                push_opt(&mut c, *return_type);
                c.push(*body);
            }
            NodeKind::FunctionParameter {
                var,
                type_annotation,
            } => {
                c.push(*var);
                push_opt(&mut c, *type_annotation);
            }
            NodeKind::ExtendStatement {
                extended_pattern,
                extension,
            } => {
                c.push(*extended_pattern);
                c.push(*extension);
            }
            NodeKind::PipelineStatement { stages } | NodeKind::PipelineExpression { stages } => {
                c.extend(stages.iter().copied());
            }
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            }
            | NodeKind::IfExpression {
                test,
                consequent,
                alternate,
            } => {
                c.push(*test);
                c.push(*consequent);
                push_opt(&mut c, *alternate);
            }
            NodeKind::ForStatement {
                key_pattern,
                key_index,
                value_pattern,
                value_elem,
                iterated,
                body,
                ..
            }
            | NodeKind::ForExpression {
                key_pattern,
                key_index,
                value_pattern,
                value_elem,
                iterated,
                body,
                ..
            } => {
                push_opt(&mut c, *key_pattern);
                push_opt(&mut c, *key_index);
                push_opt(&mut c, *value_pattern);
                push_opt(&mut c, *value_elem);
                c.push(*iterated);
                c.push(*body);
            }
            NodeKind::WalkStatement {
                walked,
                meta_ident,
                entry_ident,
                body,
            } => {
                c.push(*walked);
                push_opt(&mut c, *meta_ident);
                c.push(*entry_ident);
                c.push(*body);
            }
            NodeKind::SynchronizedBlockStatement { values, block } => {
                c.extend(values.iter().copied());
                c.push(*block);
            }
            NodeKind::ReturnStatement { expr } | NodeKind::YieldStatement { expr } => {
                push_opt(&mut c, *expr);
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
                default_cases,
            }
            | NodeKind::MatchStatement {
                discriminant,
                cases,
                default_cases,
            }
            | NodeKind::SwitchExpression {
                discriminant,
                cases,
                default_cases,
            }
            | NodeKind::MatchExpression {
                discriminant,
                cases,
                default_cases,
            } => {
                c.push(*discriminant);
                c.extend(cases.iter().copied());
                c.extend(default_cases.iter().copied());
            }
            NodeKind::SwitchCase { values, body } => {
                c.extend(values.iter().copied());
                c.push(*body);
            }
            NodeKind::MatchCase {
                values,
                group_matching_variable,
                body,
            } => {
                c.extend(values.iter().copied());
                push_opt(&mut c, *group_matching_variable);
                c.push(*body);
            }
            NodeKind::DefaultCase { body } => c.push(*body),
            NodeKind::UnaryExpression { operand, .. } => c.push(*operand),
            NodeKind::BinaryExpression { left, right, .. } => {
                c.push(*left);
                c.push(*right);
            }
            NodeKind::PermissionDroppingStatement { object } => c.push(*object),
            NodeKind::InclusionImportStatement { source } => c.push(*source),
            NodeKind::SpawnExpression { meta, module }
            | NodeKind::TestSuiteExpression { meta, module }
            | NodeKind::TestCaseExpression { meta, module } => {
                push_opt(&mut c, *meta);
                c.push(*module);
            }
            NodeKind::DynamicMappingEntry {
                key,
                key_var,
                group_matching_variable,
                value_computation,
            } => {
                c.push(*key);
                c.push(*key_var);
                push_opt(&mut c, *group_matching_variable);
                c.push(*value_computation);
            }
            NodeKind::ComputeExpression { arg } => c.push(*arg),
            NodeKind::LifetimeJobExpression {
                meta,
                subject,
                module,
            } => {
                c.push(*meta);
                push_opt(&mut c, *subject);
                c.push(*module);
            }
            NodeKind::ReceptionHandlerExpression { pattern, handler } => {
                c.push(*pattern);
                c.push(*handler);
            }
            NodeKind::SendValueExpression { value, receiver } => {
                c.push(*value);
                c.push(*receiver);
            }
            NodeKind::MarkupExpression { namespace, element } => {
                push_opt(&mut c, *namespace);
                c.push(*element);
            }
            NodeKind::MarkupElement {
                attributes,
                children,
                ..
            } => {
                c.extend(attributes.iter().copied());
                c.extend(children.iter().copied());
            }
            NodeKind::MarkupAttribute { value, .. } => push_opt(&mut c, *value),
            NodeKind::NilLiteral
            | NodeKind::BooleanLiteral(_)
            | NodeKind::IntLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::PortLiteral { .. }
            | NodeKind::QuantityLiteral { .. }
            | NodeKind::YearLiteral(_)
            | NodeKind::DateLiteral { .. }
            | NodeKind::DateTimeLiteral(_)
            | NodeKind::RuneLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::ByteSliceLiteral(_)
            | NodeKind::RegexLiteral(_)
            | NodeKind::UrlLiteral(_)
            | NodeKind::SchemeLiteral(_)
            | NodeKind::HostLiteral(_)
            | NodeKind::HostPatternLiteral(_)
            | NodeKind::UrlPatternLiteral(_)
            | NodeKind::EmailAddressLiteral(_)
            | NodeKind::PathLiteral { .. }
            | NodeKind::PathPatternLiteral { .. }
            | NodeKind::PathPatternSlice(_)
            | NodeKind::NamedPathSegment(_)
            | NodeKind::FlagLiteral(_)
            | NodeKind::IntegerRangeLiteral { .. }
            | NodeKind::FloatRangeLiteral { .. }
            | NodeKind::RuneRangeExpression { .. }
            | NodeKind::PathSlice(_)
            | NodeKind::UrlQueryParameterValueSlice(_)
            | NodeKind::IdentifierLiteral(_)
            | NodeKind::UnambiguousIdentifierLiteral(_)
            | NodeKind::PropertyNameLiteral(_)
            | NodeKind::Variable(_)
            | NodeKind::GlobalVariable(_)
            | NodeKind::SelfExpression
            | NodeKind::PatternIdentifierLiteral { .. }
            | NodeKind::PatternNamespaceIdentifierLiteral(_)
            | NodeKind::PruneStatement
            | NodeKind::BreakStatement
            | NodeKind::ContinueStatement
            | NodeKind::MarkupText(_) => {}
        }
        c
    }

    /// Literal whose value is known without evaluation.
    pub fn is_simple_value_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::NilLiteral
                | NodeKind::BooleanLiteral(_)
                | NodeKind::IntLiteral(_)
                | NodeKind::FloatLiteral(_)
                | NodeKind::PortLiteral { .. }
                | NodeKind::QuantityLiteral { .. }
                | NodeKind::RateLiteral { .. }
                | NodeKind::YearLiteral(_)
                | NodeKind::DateLiteral { .. }
                | NodeKind::DateTimeLiteral(_)
                | NodeKind::RuneLiteral(_)
                | NodeKind::StringLiteral(_)
                | NodeKind::ByteSliceLiteral(_)
                | NodeKind::RegexLiteral(_)
                | NodeKind::UrlLiteral(_)
                | NodeKind::SchemeLiteral(_)
                | NodeKind::HostLiteral(_)
                | NodeKind::HostPatternLiteral(_)
                | NodeKind::UrlPatternLiteral(_)
                | NodeKind::EmailAddressLiteral(_)
                | NodeKind::PathLiteral { .. }
                | NodeKind::PathPatternLiteral { .. }
                | NodeKind::NamedSegmentPathPatternLiteral { .. }
                | NodeKind::FlagLiteral(_)
                | NodeKind::IntegerRangeLiteral { .. }
                | NodeKind::FloatRangeLiteral { .. }
                | NodeKind::RuneRangeExpression { .. }
                | NodeKind::UnambiguousIdentifierLiteral(_)
                | NodeKind::PropertyNameLiteral(_)
        )
    }

    /// Nodes that own a local-variable scope.
    pub fn is_scope_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Chunk { .. }
                | NodeKind::EmbeddedModule { .. }
                | NodeKind::FunctionExpression { .. }
        )
    }

    /// Nodes that own a global-variable table.
    pub fn is_module(&self) -> bool {
        matches!(self, NodeKind::Chunk { .. } | NodeKind::EmbeddedModule { .. })
    }

    /// Name of a node holding an identifier-like name.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            NodeKind::IdentifierLiteral(name)
            | NodeKind::Variable(name)
            | NodeKind::GlobalVariable(name)
            | NodeKind::UnambiguousIdentifierLiteral(name) => Some(name),
            _ => None,
        }
    }

    /// Short human-readable name of the node class.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Chunk { .. } => "chunk",
            NodeKind::EmbeddedModule { .. } => "embedded module",
            NodeKind::Manifest { .. } => "manifest",
            NodeKind::NilLiteral => "nil literal",
            NodeKind::BooleanLiteral(_) => "boolean literal",
            NodeKind::IntLiteral(_) => "integer literal",
            NodeKind::FloatLiteral(_) => "float literal",
            NodeKind::PortLiteral { .. } => "port literal",
            NodeKind::QuantityLiteral { .. } => "quantity literal",
            NodeKind::RateLiteral { .. } => "rate literal",
            NodeKind::YearLiteral(_) => "year literal",
            NodeKind::DateLiteral { .. } => "date literal",
            NodeKind::DateTimeLiteral(_) => "datetime literal",
            NodeKind::RuneLiteral(_) => "rune literal",
            NodeKind::StringLiteral(_) => "string literal",
            NodeKind::ByteSliceLiteral(_) => "byte slice literal",
            NodeKind::RegexLiteral(_) => "regex literal",
            NodeKind::UrlLiteral(_) => "url literal",
            NodeKind::SchemeLiteral(_) => "scheme literal",
            NodeKind::HostLiteral(_) => "host literal",
            NodeKind::HostPatternLiteral(_) => "host pattern literal",
            NodeKind::UrlPatternLiteral(_) => "url pattern literal",
            NodeKind::EmailAddressLiteral(_) => "email address literal",
            NodeKind::PathLiteral { .. } => "path literal",
            NodeKind::PathPatternLiteral { .. } => "path pattern literal",
            NodeKind::NamedSegmentPathPatternLiteral { .. } => "named segment path pattern",
            NodeKind::PathPatternSlice(_) => "path pattern slice",
            NodeKind::NamedPathSegment(_) => "named path segment",
            NodeKind::FlagLiteral(_) => "flag literal",
            NodeKind::OptionExpression { .. } => "option expression",
            NodeKind::IntegerRangeLiteral { .. } => "integer range literal",
            NodeKind::FloatRangeLiteral { .. } => "float range literal",
            NodeKind::QuantityRangeLiteral { .. } => "quantity range literal",
            NodeKind::RuneRangeExpression { .. } => "rune range expression",
            NodeKind::PathExpression { .. } => "path expression",
            NodeKind::PathSlice(_) => "path slice",
            NodeKind::UrlExpression { .. } => "url expression",
            NodeKind::UrlQueryParameter { .. } => "url query parameter",
            NodeKind::UrlQueryParameterValueSlice(_) => "url query parameter value slice",
            NodeKind::HostExpression { .. } => "host expression",
            NodeKind::IdentifierLiteral(_) => "identifier",
            NodeKind::UnambiguousIdentifierLiteral(_) => "unambiguous identifier",
            NodeKind::PropertyNameLiteral(_) => "property name literal",
            NodeKind::Variable(_) => "variable",
            NodeKind::GlobalVariable(_) => "global variable",
            NodeKind::SelfExpression => "self",
            NodeKind::MemberExpression { .. } => "member expression",
            NodeKind::ComputedMemberExpression { .. } => "computed member expression",
            NodeKind::IdentifierMemberExpression { .. } => "identifier member expression",
            NodeKind::DynamicMemberExpression { .. } => "dynamic member expression",
            NodeKind::DoubleColonExpression { .. } => "double-colon expression",
            NodeKind::IndexExpression { .. } => "index expression",
            NodeKind::SliceExpression { .. } => "slice expression",
            NodeKind::KeyListExpression { .. } => "key list expression",
            NodeKind::ExtractionExpression { .. } => "extraction expression",
            NodeKind::BooleanConversionExpression { .. } => "boolean conversion",
            NodeKind::ObjectLiteral { .. } => "object literal",
            NodeKind::ObjectProperty { .. } => "object property",
            NodeKind::ObjectMetaProperty { .. } => "object metaproperty",
            NodeKind::InitializationBlock { .. } => "initialization block",
            NodeKind::PropertySpreadElement { .. } => "property spread element",
            NodeKind::RecordLiteral { .. } => "record literal",
            NodeKind::ListLiteral { .. } => "list literal",
            NodeKind::TupleLiteral { .. } => "tuple literal",
            NodeKind::ElementSpreadElement { .. } => "element spread element",
            NodeKind::DictionaryLiteral { .. } => "dictionary literal",
            NodeKind::DictionaryEntry { .. } => "dictionary entry",
            NodeKind::TreedataLiteral { .. } => "treedata literal",
            NodeKind::TreedataEntry { .. } => "treedata entry",
            NodeKind::TreedataPair { .. } => "treedata pair",
            NodeKind::PatternIdentifierLiteral { .. } => "pattern identifier",
            NodeKind::PatternNamespaceIdentifierLiteral(_) => "pattern namespace identifier",
            NodeKind::PatternNamespaceMemberExpression { .. } => "pattern namespace member",
            NodeKind::OptionalPatternExpression { .. } => "optional pattern",
            NodeKind::ObjectPatternLiteral { .. } => "object pattern literal",
            NodeKind::ObjectPatternProperty { .. } => "object pattern property",
            NodeKind::PatternPropertySpreadElement { .. } => "pattern property spread element",
            NodeKind::RecordPatternLiteral { .. } => "record pattern literal",
            NodeKind::ListPatternLiteral { .. } => "list pattern literal",
            NodeKind::TuplePatternLiteral { .. } => "tuple pattern literal",
            NodeKind::OptionPatternLiteral { .. } => "option pattern literal",
            NodeKind::PatternDefinition { .. } => "pattern definition",
            NodeKind::PatternNamespaceDefinition { .. } => "pattern namespace definition",
            NodeKind::ComplexStringPatternPiece { .. } => "string pattern piece",
            NodeKind::PatternPieceElement { .. } => "pattern piece element",
            NodeKind::PatternUnion { .. } => "pattern union",
            NodeKind::PatternCallExpression { .. } => "pattern call",
            NodeKind::PatternConversionExpression { .. } => "pattern conversion",
            NodeKind::GlobalConstantDeclarations { .. } => "global constant declarations",
            NodeKind::GlobalConstantDeclaration { .. } => "global constant declaration",
            NodeKind::LocalVariableDeclarations { .. } => "local variable declarations",
            NodeKind::LocalVariableDeclaration { .. } => "local variable declaration",
            NodeKind::GlobalVariableDeclarations { .. } => "global variable declarations",
            NodeKind::GlobalVariableDeclaration { .. } => "global variable declaration",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::MultiAssignment { .. } => "multi-assignment",
            NodeKind::FunctionDeclaration { .. } => "function declaration",
            NodeKind::FunctionExpression { .. } => "function expression",
            NodeKind::FunctionParameter { .. } => "function parameter",
            NodeKind::ExtendStatement { .. } => "extend statement",
            NodeKind::CallExpression { .. } => "call",
            NodeKind::SpreadArgument { .. } => "spread argument",
            NodeKind::PipelineStatement { .. } => "pipeline statement",
            NodeKind::PipelineExpression { .. } => "pipeline expression",
            NodeKind::IfStatement { .. } => "if statement",
            NodeKind::IfExpression { .. } => "if expression",
            NodeKind::ForStatement { .. } => "for statement",
            NodeKind::ForExpression { .. } => "for expression",
            NodeKind::WalkStatement { .. } => "walk statement",
            NodeKind::PruneStatement => "prune statement",
            NodeKind::Block { .. } => "block",
            NodeKind::SynchronizedBlockStatement { .. } => "synchronized block",
            NodeKind::ReturnStatement { .. } => "return statement",
            NodeKind::YieldStatement { .. } => "yield statement",
            NodeKind::BreakStatement => "break statement",
            NodeKind::ContinueStatement => "continue statement",
            NodeKind::SwitchStatement { .. } => "switch statement",
            NodeKind::MatchStatement { .. } => "match statement",
            NodeKind::SwitchExpression { .. } => "switch expression",
            NodeKind::MatchExpression { .. } => "match expression",
            NodeKind::SwitchCase { .. } => "switch case",
            NodeKind::MatchCase { .. } => "match case",
            NodeKind::DefaultCase { .. } => "default case",
            NodeKind::UnaryExpression { .. } => "unary expression",
            NodeKind::BinaryExpression { .. } => "binary expression",
            NodeKind::ConcatenationExpression { .. } => "concatenation",
            NodeKind::AssertionStatement { .. } => "assertion",
            NodeKind::RuntimeTypeCheckExpression { .. } => "runtime type check",
            NodeKind::PermissionDroppingStatement { .. } => "permission dropping statement",
            NodeKind::InclusionImportStatement { .. } => "inclusion import",
            NodeKind::SpawnExpression { .. } => "spawn expression",
            NodeKind::MappingExpression { .. } => "mapping expression",
            NodeKind::StaticMappingEntry { .. } => "static mapping entry",
            NodeKind::DynamicMappingEntry { .. } => "dynamic mapping entry",
            NodeKind::ComputeExpression { .. } => "compute expression",
            NodeKind::TestSuiteExpression { .. } => "test suite expression",
            NodeKind::TestCaseExpression { .. } => "test case expression",
            NodeKind::LifetimeJobExpression { .. } => "lifetime job expression",
            NodeKind::ReceptionHandlerExpression { .. } => "reception handler",
            NodeKind::SendValueExpression { .. } => "sendval expression",
            NodeKind::MarkupExpression { .. } => "markup expression",
            NodeKind::MarkupElement { .. } => "markup element",
            NodeKind::MarkupAttribute { .. } => "markup attribute",
            NodeKind::MarkupText(_) => "markup text",
            NodeKind::MarkupInterpolation { .. } => "markup interpolation",
        }
    }
}
