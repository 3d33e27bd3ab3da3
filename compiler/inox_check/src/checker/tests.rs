use pretty_assertions::assert_eq;

use inox_ir::{AssignmentOp, AstBuilder, Module, ModuleKind, NodeId, NodeKind};

use crate::{check, is_metadata_key, CheckErrorKind, CheckInput, StaticCheckError};

fn module(b: AstBuilder, root: NodeId) -> Module {
    Module::new(b.finish_shared(), root)
}

fn error_kinds(module: &Module) -> Vec<CheckErrorKind> {
    match check(&CheckInput::new(module)) {
        Ok(_) => vec![],
        Err(err) => err.errors().iter().map(|e| e.kind.clone()).collect(),
    }
}

fn errors_of(b: AstBuilder, root: NodeId) -> Vec<CheckErrorKind> {
    error_kinds(&module(b, root))
}

fn for_statement(b: &mut AstBuilder, elem: &str, iterated: NodeId, body: NodeId) -> NodeId {
    let value_elem = b.ident(elem);
    b.node(NodeKind::ForStatement {
        key_pattern: None,
        key_index: None,
        value_pattern: None,
        value_elem: Some(value_elem),
        iterated,
        body,
        chunked: false,
    })
}

fn function_declaration(b: &mut AstBuilder, name: &str, function: NodeId) -> NodeId {
    let name = b.ident(name);
    b.node(NodeKind::FunctionDeclaration { name, function })
}

#[test]
fn undeclared_identifier_is_reported() {
    let mut b = AstBuilder::new("main.ix", "");
    let x = b.ident("x");
    let root = b.chunk(vec![x]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::VariableNotDeclared("x".into())]
    );
}

#[test]
fn declared_local_is_visible() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let decl = b.local_decl("x", one);
    let x = b.ident("x");
    let root = b.chunk(vec![decl, x]);
    assert_eq!(errors_of(b, root), vec![]);
}

#[test]
fn locals_cannot_shadow_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let constants = b.constants(&[("x", one)]);
    let two = b.int(2);
    let decl = b.local_decl("x", two);
    let root = b.chunk_with_constants(constants, vec![decl]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::CannotShadowGlobal("x".into())]
    );
}

#[test]
fn constants_are_not_assignable() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let constants = b.constants(&[("c", one)]);
    let target = b.global("c");
    let two = b.int(2);
    let assign = b.assign(target, two);
    let root = b.chunk_with_constants(constants, vec![assign]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::ConstantAssigned("c".into())]
    );
}

#[test]
fn augmented_assignment_needs_an_existing_variable() {
    let mut b = AstBuilder::new("main.ix", "");
    let target = b.global("g");
    let one = b.int(1);
    let global = b.assign_op(target, AssignmentOp::PlusAssign, one);
    let local = b.var("l");
    let two = b.int(2);
    let local = b.assign_op(local, AssignmentOp::PlusAssign, two);
    let root = b.chunk(vec![global, local]);
    assert_eq!(
        errors_of(b, root),
        vec![
            CheckErrorKind::AssignedGlobalDoesNotExist("g".into()),
            CheckErrorKind::AssignedVariableDoesNotExist("l".into()),
        ]
    );
}

#[test]
fn anonymous_variable_is_not_assignable() {
    let mut b = AstBuilder::new("main.ix", "");
    let target = b.var("");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let root = b.chunk(vec![assign]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::AnonymousVariableAssigned]
    );
}

#[test]
fn functions_can_be_called_before_their_declaration() {
    let mut b = AstBuilder::new("main.ix", "");
    let callee = b.ident("f");
    let call = b.call(callee, vec![]);
    let body = b.nil();
    let function = b.function(vec![], body);
    let decl = function_declaration(&mut b, "f", function);
    let root = b.chunk(vec![call, decl]);
    assert_eq!(errors_of(b, root), vec![]);
}

#[test]
fn function_names_are_not_assignable() {
    let mut b = AstBuilder::new("main.ix", "");
    let body = b.nil();
    let function = b.function(vec![], body);
    let decl = function_declaration(&mut b, "f", function);
    let target = b.global("f");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let root = b.chunk(vec![decl, assign]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::FunctionNameAssigned("f".into())]
    );
}

#[test]
fn function_bodies_record_referenced_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let target = b.global("g");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let g = b.ident("g");
    let x = b.ident("x");
    let sum = b.binary(inox_ir::BinaryOp::Add, g, x);
    let function = b.function(vec!["x"], sum);
    let decl = function_declaration(&mut b, "f", function);
    let root = b.chunk(vec![assign, decl]);
    let module = module(b, root);

    let data = check(&CheckInput::new(&module)).unwrap();
    assert_eq!(data.fn_captured_globals(function), ["g".to_string()]);
}

#[test]
fn parameters_cannot_shadow_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let constants = b.constants(&[("x", one)]);
    let body = b.nil();
    let function = b.function(vec!["x"], body);
    let root = b.chunk_with_constants(constants, vec![function]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::ParameterShadowsGlobal("x".into())]
    );
}

#[test]
fn locals_of_the_enclosing_scope_are_not_visible_in_functions() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let decl = b.local_decl("a", one);
    let a = b.ident("a");
    let function = b.function(vec![], a);
    let root = b.chunk(vec![decl, function]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::VariableNotDeclared("a".into())]
    );
}

#[test]
fn break_is_only_valid_in_loops() {
    let mut b = AstBuilder::new("main.ix", "");
    let misplaced = b.node(NodeKind::BreakStatement);

    let valid = b.node(NodeKind::BreakStatement);
    let consequent = b.block(vec![valid]);
    let test = b.bool(true);
    let if_stmt = b.node(NodeKind::IfStatement {
        test,
        consequent,
        alternate: None,
    });
    let body = b.block(vec![if_stmt]);
    let iterated = b.list(vec![]);
    let for_stmt = for_statement(&mut b, "e", iterated, body);

    let root = b.chunk(vec![misplaced, for_stmt]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::MisplacedBreak]);
}

#[test]
fn loop_variables_are_not_visible_after_the_loop() {
    let mut b = AstBuilder::new("main.ix", "");
    let e_in_body = b.ident("e");
    let body = b.block(vec![e_in_body]);
    let iterated = b.list(vec![]);
    let for_stmt = for_statement(&mut b, "e", iterated, body);
    let e_after = b.ident("e");
    let root = b.chunk(vec![for_stmt, e_after]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::VariableNotDeclared("e".into())]
    );
}

#[test]
fn prune_is_only_valid_in_walk_statements() {
    let mut b = AstBuilder::new("main.ix", "");
    let prune = b.node(NodeKind::PruneStatement);
    let body = b.block(vec![prune]);
    let iterated = b.list(vec![]);
    let for_stmt = for_statement(&mut b, "e", iterated, body);
    let root = b.chunk(vec![for_stmt]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::MisplacedPrune]);
}

#[test]
fn yield_is_valid_in_embedded_modules_only() {
    let mut b = AstBuilder::new("main.ix", "");
    let misplaced = b.node(NodeKind::YieldStatement { expr: None });
    let valid = b.node(NodeKind::YieldStatement { expr: None });
    let embedded = b.embedded_module(vec![valid]);
    let spawn = b.node(NodeKind::SpawnExpression {
        meta: None,
        module: embedded,
    });
    let root = b.chunk(vec![misplaced, spawn]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::MisplacedYield]);
}

#[test]
fn object_literals_reject_duplicate_and_metaproperty_keys() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let object = b.object(&[("a", one), ("a", two), ("_meta_", three)]);
    let root = b.chunk(vec![object]);
    assert_eq!(
        errors_of(b, root),
        vec![
            CheckErrorKind::DuplicateKey("a".into()),
            CheckErrorKind::MetapropertyKey,
        ]
    );
}

#[test]
fn explicit_keys_cannot_alias_implicit_ones() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let implicit = b.node(NodeKind::ObjectProperty {
        key: None,
        type_annotation: None,
        value: one,
    });
    let key = b.string("0");
    let two = b.int(2);
    let explicit = b.node(NodeKind::ObjectProperty {
        key: Some(key),
        type_annotation: None,
        value: two,
    });
    let object = b.node(NodeKind::ObjectLiteral {
        properties: vec![implicit, explicit],
        meta_properties: vec![],
        spread_elements: vec![],
    });
    let root = b.chunk(vec![object]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::ExplicitKeyAliasesImplicit {
            literal: "object",
            key: "0".into()
        }]
    );
}

#[test]
fn dictionary_keys_are_unique() {
    fn entry(b: &mut AstBuilder, key: &str) -> NodeId {
        let key = b.string(key);
        let value = b.nil();
        b.node(NodeKind::DictionaryEntry { key, value })
    }

    let mut b = AstBuilder::new("main.ix", "");
    let first = entry(&mut b, "k");
    let second = entry(&mut b, "k");
    let third = entry(&mut b, "other");
    let dict = b.node(NodeKind::DictionaryLiteral {
        entries: vec![first, second, third],
    });
    let root = b.chunk(vec![dict]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::DuplicateDictionaryKey("\"k\"".into())]
    );
}

#[test]
fn quantities_and_ranges_are_validated() {
    let mut b = AstBuilder::new("main.ix", "");
    let valid = b.quantity(&[1.0, 30.0], &["h", "mn"]);
    let wrong_order = b.quantity(&[1.0, 1.0], &["s", "h"]);
    let unit = b.quantity(&[1.0], &["parsec"]);
    let range = b.int_range(5, Some(1));
    let root = b.chunk(vec![valid, wrong_order, unit, range]);
    assert_eq!(
        errors_of(b, root),
        vec![
            CheckErrorKind::InvalidQuantity,
            CheckErrorKind::UnsupportedUnit("parsec".into()),
            CheckErrorKind::InvalidIntRange,
        ]
    );
}

#[test]
fn rates_divide_bytes_or_counts_by_seconds() {
    let mut b = AstBuilder::new("main.ix", "");
    let bytes = b.quantity(&[10.0], &["kB"]);
    let valid = b.node(NodeKind::RateLiteral {
        quantity: bytes,
        div_unit: "s".into(),
    });
    let duration = b.quantity(&[1.0], &["h"]);
    let invalid = b.node(NodeKind::RateLiteral {
        quantity: duration,
        div_unit: "s".into(),
    });
    let root = b.chunk(vec![valid, invalid]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::InvalidRate]);
}

#[test]
fn spawned_modules_only_see_passed_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let target = b.global("a");
    let one = b.int(1);
    let assign = b.assign(target, one);

    let a = b.ident("a");
    let hidden = b.embedded_module(vec![a]);
    let spawn_without_globals = b.node(NodeKind::SpawnExpression {
        meta: None,
        module: hidden,
    });

    let a = b.ident("a");
    let passed = b.embedded_module(vec![a]);
    let globals = b.key_list(&["a"]);
    let meta = b.object(&[("globals", globals)]);
    let spawn_with_globals = b.node(NodeKind::SpawnExpression {
        meta: Some(meta),
        module: passed,
    });

    let root = b.chunk(vec![assign, spawn_without_globals, spawn_with_globals]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::VariableNotDeclared("a".into())]
    );
}

#[test]
fn spawned_modules_cannot_receive_undeclared_globals() {
    let mut b = AstBuilder::new("main.ix", "");
    let embedded = b.embedded_module(vec![]);
    let globals = b.key_list(&["missing"]);
    let meta = b.object(&[("globals", globals)]);
    let spawn = b.node(NodeKind::SpawnExpression {
        meta: Some(meta),
        module: embedded,
    });
    let root = b.chunk(vec![spawn]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::SpawnGlobalNotDeclared("missing".into())]
    );
}

#[test]
fn included_chunks_declare_globals_in_the_including_module() {
    let mut b = AstBuilder::new("main.ix", "");
    let source = b.path("./lib.ix");
    let import = b.node(NodeKind::InclusionImportStatement { source });
    let a = b.ident("a");
    let root = b.chunk(vec![import, a]);

    b.add_source("lib.ix", "");
    let target = b.global("a");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let included = b.chunk(vec![assign]);

    let module = module(b, root).with_inclusion(import, included);
    assert_eq!(error_kinds(&module), vec![]);
}

#[test]
fn errors_in_included_chunks_carry_the_import_position() {
    let mut b = AstBuilder::new("main.ix", "import ./lib.ix");
    let source = b.path("./lib.ix");
    let import = b.at(0, 15).node(NodeKind::InclusionImportStatement { source });
    let root = b.chunk(vec![import]);

    b.add_source("lib.ix", "zz");
    let zz = b.at(0, 2).ident("zz");
    let included = b.chunk(vec![zz]);

    let module = module(b, root).with_inclusion(import, included);
    let err = check(&CheckInput::new(&module)).unwrap_err();
    let [error] = err.errors() else {
        panic!("expected one error, got {err}");
    };
    assert_eq!(error.kind, CheckErrorKind::VariableNotDeclared("zz".into()));
    assert_eq!(error.positions.positions().len(), 2);
}

#[test]
fn manifest_sections_are_validated() {
    let mut b = AstBuilder::new("main.ix", "");
    let globals = b.string("*");
    let read = b.object(&[("globals", globals)]);
    let fly = b.object(&[]);
    let permissions = b.object(&[("read", read), ("fly", fly)]);
    let unknown = b.int(1);
    let object = b.object(&[("permissions", permissions), ("colors", unknown)]);
    let manifest = b.node(NodeKind::Manifest { object });
    let root = b.node(NodeKind::Chunk {
        global_constants: None,
        manifest: Some(manifest),
        statements: vec![],
    });
    assert_eq!(
        errors_of(b, root),
        vec![
            CheckErrorKind::InvalidPermissionKind("fly".into()),
            CheckErrorKind::UnknownManifestSection("colors".into()),
        ]
    );
}

#[test]
fn embedded_manifests_cannot_declare_env() {
    let mut b = AstBuilder::new("main.ix", "");
    let env = b.node(NodeKind::ObjectPatternLiteral {
        properties: vec![],
        spread_elements: vec![],
        inexact: false,
    });
    let object = b.object(&[("env", env)]);
    let manifest = b.node(NodeKind::Manifest { object });
    let embedded = b.node(NodeKind::EmbeddedModule {
        manifest: Some(manifest),
        statements: vec![],
    });
    let spawn = b.node(NodeKind::SpawnExpression {
        meta: None,
        module: embedded,
    });
    let root = b.chunk(vec![spawn]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::EnvInEmbeddedModule]);
}

#[test]
fn self_is_only_valid_in_methods() {
    let mut b = AstBuilder::new("main.ix", "");
    let misplaced = b.node(NodeKind::SelfExpression);

    let this = b.node(NodeKind::SelfExpression);
    let access = b.member(this, "name");
    let method = b.function(vec![], access);
    let name = b.string("inox");
    let object = b.object(&[("name", name), ("get", method)]);

    let this = b.node(NodeKind::SelfExpression);
    let unknown = b.member(this, "age");
    let method = b.function(vec![], unknown);
    let other = b.object(&[("get", method)]);

    let root = b.chunk(vec![misplaced, object, other]);
    assert_eq!(
        errors_of(b, root),
        vec![
            CheckErrorKind::MisplacedSelf,
            CheckErrorKind::SelfPropertyNotFound("age".into()),
        ]
    );
}

#[test]
fn self_is_valid_in_lifetime_job_modules() {
    let mut b = AstBuilder::new("main.ix", "");
    let this = b.node(NodeKind::SelfExpression);
    let root = b.chunk(vec![this]);
    let module = module(b, root).with_kind(ModuleKind::LifetimeJob);
    assert_eq!(error_kinds(&module), vec![]);
}

#[test]
fn assertions_only_contain_simple_nodes() {
    let mut b = AstBuilder::new("main.ix", "");
    let callee = b.ident("f");
    let call = b.call(callee, vec![]);
    let body = b.nil();
    let function = b.function(vec![], body);
    let decl = function_declaration(&mut b, "f", function);
    let assertion = b.assert(call);
    let root = b.chunk(vec![decl, assertion]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::NotAllowedInAssertion("call")]
    );
}

#[test]
fn runtime_type_checks_are_call_arguments() {
    let mut b = AstBuilder::new("main.ix", "");
    let body = b.nil();
    let function = b.function(vec!["x"], body);
    let decl = function_declaration(&mut b, "f", function);
    let one = b.int(1);
    let argument = b.node(NodeKind::RuntimeTypeCheckExpression { expr: one });
    let callee = b.ident("f");
    let call = b.call(callee, vec![argument]);
    let two = b.int(2);
    let misplaced = b.node(NodeKind::RuntimeTypeCheckExpression { expr: two });
    let root = b.chunk(vec![decl, call, misplaced]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::MisplacedRuntimeTypeCheck]
    );
}

#[test]
fn patterns_must_be_declared_before_use() {
    let mut b = AstBuilder::new("main.ix", "");
    let undeclared = b.pattern_ident("user");
    let left = b.pattern_ident("user");
    let right = b.pattern_ident("int");
    let definition = b.node(NodeKind::PatternDefinition {
        left,
        right,
        lazy: false,
    });
    let used = b.pattern_ident("user");
    let root = b.chunk(vec![undeclared, definition, used]);
    let module = module(b, root);
    let input = CheckInput::new(&module).with_patterns(["int"]);
    let err = check(&input).unwrap_err();
    let kinds: Vec<_> = err.errors().iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds, vec![CheckErrorKind::PatternNotDeclared("user".into())]);
}

#[test]
fn input_globals_are_visible_and_constant() {
    let mut b = AstBuilder::new("main.ix", "");
    let print = b.ident("print");
    let target = b.global("print");
    let one = b.int(1);
    let assign = b.assign(target, one);
    let root = b.chunk(vec![print, assign]);
    let module = module(b, root);
    let input = CheckInput::new(&module).with_global("print", false);
    let err = check(&input).unwrap_err();
    let kinds: Vec<_> = err.errors().iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds, vec![CheckErrorKind::ConstantAssigned("print".into())]);
}

#[test]
fn checks_start_at_modules() {
    let mut b = AstBuilder::new("main.ix", "");
    let root = b.int(1);
    let module = module(b, root);
    assert_eq!(
        check(&CheckInput::new(&module)),
        Err(StaticCheckError::InvalidRoot("integer literal"))
    );
}

#[test]
fn metadata_keys_have_single_underscores() {
    assert!(is_metadata_key("_constraints_"));
    assert!(is_metadata_key("_a_"));
    assert!(!is_metadata_key("__a_"));
    assert!(!is_metadata_key("_a__"));
    assert!(!is_metadata_key("__"));
    assert!(!is_metadata_key("name"));
}

#[test]
fn compute_is_only_valid_in_dynamic_entry_values() {
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let top_level = b.node(NodeKind::ComputeExpression { arg: one });

    let key = b.int(1);
    let two = b.int(2);
    let in_static = b.node(NodeKind::ComputeExpression { arg: two });
    let static_entry = b.node(NodeKind::StaticMappingEntry {
        key,
        value: in_static,
    });

    let int_pattern = b.pattern_ident("int");
    let key_var = b.ident("k");
    let k = b.ident("k");
    let valid = b.node(NodeKind::ComputeExpression { arg: k });
    let dynamic_entry = b.node(NodeKind::DynamicMappingEntry {
        key: int_pattern,
        key_var,
        group_matching_variable: None,
        value_computation: valid,
    });
    let mapping = b.node(NodeKind::MappingExpression {
        entries: vec![static_entry, dynamic_entry],
    });
    let root = b.chunk(vec![top_level, mapping]);
    let module = module(b, root);
    let input = CheckInput::new(&module).with_patterns(["int"]);
    let kinds: Vec<_> = match check(&input) {
        Ok(_) => vec![],
        Err(err) => err.errors().iter().map(|e| e.kind.clone()).collect(),
    };
    assert_eq!(
        kinds,
        vec![CheckErrorKind::MisplacedCompute, CheckErrorKind::MisplacedCompute]
    );
}

#[test]
fn names_are_limited_to_64_bytes() {
    let longest = "a".repeat(64);
    let too_long = "b".repeat(65);
    let mut b = AstBuilder::new("main.ix", "");
    let one = b.int(1);
    let two = b.int(2);
    let object = b.object(&[(longest.as_str(), one), (too_long.as_str(), two)]);
    let three = b.int(3);
    let decl = b.local_decl(&too_long, three);
    let root = b.chunk(vec![object, decl]);
    let errors = errors_of(b, root);
    assert!(!errors.is_empty());
    assert!(
        errors
            .iter()
            .all(|e| *e == CheckErrorKind::NameTooLong(too_long.clone())),
        "{errors:?}"
    );
}

#[test]
fn property_spreads_cannot_reintroduce_keys() {
    let mut b = AstBuilder::new("main.ix", "");
    let source = b.object(&[]);
    let decl = b.local_decl("src", source);

    let one = b.int(1);
    let a_key = b.ident("a");
    let a = b.node(NodeKind::ObjectProperty {
        key: Some(a_key),
        type_annotation: None,
        value: one,
    });
    let src = b.ident("src");
    let keys = b.key_list(&["a", "b"]);
    let extraction = b.node(NodeKind::ExtractionExpression { object: src, keys });
    let spread = b.node(NodeKind::PropertySpreadElement { extraction });
    let object = b.node(NodeKind::ObjectLiteral {
        properties: vec![a],
        meta_properties: vec![],
        spread_elements: vec![spread],
    });
    let root = b.chunk(vec![decl, object]);
    assert_eq!(
        errors_of(b, root),
        vec![CheckErrorKind::DuplicateKey("a".into())]
    );
}

fn int_case(b: &mut AstBuilder, variable: &str) -> NodeId {
    let pattern = b.pattern_ident("int");
    let variable = b.ident(variable);
    let body = b.block(vec![]);
    b.node(NodeKind::MatchCase {
        values: vec![pattern],
        group_matching_variable: Some(variable),
        body,
    })
}

#[test]
fn group_matching_variables_are_shared_across_cases() {
    let mut b = AstBuilder::new("main.ix", "");
    let zero = b.int(0);
    let decl = b.local_decl("taken", zero);

    let first = int_case(&mut b, "m");
    let second = int_case(&mut b, "m");
    let clashing = int_case(&mut b, "taken");
    let discriminant = b.int(1);
    let match_stmt = b.node(NodeKind::MatchStatement {
        discriminant,
        cases: vec![first, second, clashing],
        default_cases: vec![],
    });
    let root = b.chunk(vec![decl, match_stmt]);
    let module = module(b, root);
    let input = CheckInput::new(&module).with_patterns(["int"]);
    let err = check(&input).unwrap_err();
    let kinds: Vec<_> = err.errors().iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds, vec![CheckErrorKind::CannotShadowLocal("taken".into())]);
}

#[test]
fn sendval_is_only_valid_where_self_is() {
    let mut b = AstBuilder::new("main.ix", "");
    let receiver = b.object(&[]);
    let decl = b.local_decl("r", receiver);

    let one = b.int(1);
    let r = b.ident("r");
    let misplaced = b.node(NodeKind::SendValueExpression {
        value: one,
        receiver: r,
    });

    let two = b.int(2);
    let target = b.ident("target");
    let send = b.node(NodeKind::SendValueExpression {
        value: two,
        receiver: target,
    });
    let body = b.block(vec![send]);
    let method = b.function(vec!["target"], body);
    let sender = b.object(&[("notify", method)]);

    let root = b.chunk(vec![decl, misplaced, sender]);
    assert_eq!(errors_of(b, root), vec![CheckErrorKind::MisplacedSendval]);
}
