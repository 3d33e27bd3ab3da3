//! Declarations, assignments and name resolution.

use inox_ir::walk::Visit;
use inox_ir::{AssignmentOp, NodeId, NodeKind};

use super::{Checker, Scopes};
use crate::errors::{CheckErrorKind, MAX_NAME_BYTE_LEN};
use crate::is_metadata_key;
use crate::scope::{GlobalInfo, LocalInfo};

impl Checker<'_> {
    /// Declare the top-level functions of a module before its statements
    /// are checked, so that functions can be called before their
    /// declaration and can call each other.
    pub(super) fn hoist_functions(&mut self, module: NodeId, statements: &[NodeId]) {
        let ast = self.ast;
        for statement in statements {
            let NodeKind::FunctionDeclaration { name, function } = ast.kind(*statement) else {
                continue;
            };
            let Some(name) = ast.identifier_name(*name) else {
                continue;
            };
            if self.tables.is_function(module, name) {
                self.error(
                    *statement,
                    CheckErrorKind::FunctionAlreadyDeclared(name.to_string()),
                );
                continue;
            }
            if self.tables.global(module, name).is_some() {
                self.error(
                    *statement,
                    CheckErrorKind::FunctionNameIsGlobal(name.to_string()),
                );
                continue;
            }
            self.tables.functions(module).insert(name.to_string());
            self.tables.globals(module).insert(
                name.to_string(),
                GlobalInfo {
                    is_const: true,
                    is_start_constant: false,
                    function: Some(*function),
                },
            );
        }
    }

    fn var_exists(&self, name: &str, scopes: Scopes) -> bool {
        self.tables.local(scopes.scope, name).is_some()
            || self.tables.global(scopes.module, name).is_some()
    }

    fn check_name_length(&mut self, node: NodeId, name: &str) -> bool {
        if name.len() > MAX_NAME_BYTE_LEN {
            self.error(node, CheckErrorKind::NameTooLong(name.to_string()));
            return false;
        }
        true
    }

    pub(super) fn check_identifier(&mut self, visit: &Visit<'_>, scopes: Scopes, name: &str) {
        let node = visit.node;
        if !self.check_name_length(node, name) || !self.is_variable_reference(visit) {
            return;
        }
        if !self.var_exists(name, scopes) {
            self.error(node, CheckErrorKind::VariableNotDeclared(name.to_string()));
            return;
        }
        if self.tables.local(scopes.scope, name).is_none() {
            self.capture_global(visit, name);
        }
    }

    pub(super) fn check_variable(&mut self, visit: &Visit<'_>, scopes: Scopes, name: &str) {
        let node = visit.node;
        if !self.check_name_length(node, name) || name.is_empty() || self.is_assigned(visit) {
            return;
        }
        if self.tables.local(scopes.scope, name).is_none() {
            self.error(
                node,
                CheckErrorKind::LocalVariableNotDeclared(name.to_string()),
            );
        }
    }

    pub(super) fn check_global_variable(&mut self, visit: &Visit<'_>, scopes: Scopes, name: &str) {
        let node = visit.node;
        if !self.check_name_length(node, name) || self.is_assigned(visit) {
            return;
        }
        if self.tables.global(scopes.module, name).is_none() {
            self.error(
                node,
                CheckErrorKind::GlobalVariableNotDeclared(name.to_string()),
            );
            return;
        }
        self.capture_global(visit, name);
    }

    /// Whether the visited node is the target of an assignment.
    fn is_assigned(&self, visit: &Visit<'_>) -> bool {
        visit.parent.is_some_and(|parent| {
            matches!(self.ast.kind(parent), NodeKind::Assignment { left, .. } if *left == visit.node)
        })
    }

    /// Whether an identifier denotes a variable rather than a key, a
    /// property, or the name being declared.
    fn is_variable_reference(&self, visit: &Visit<'_>) -> bool {
        let node = visit.node;
        let Some(parent) = visit.parent else {
            return true;
        };
        match self.ast.kind(parent) {
            NodeKind::CallExpression {
                callee,
                command_like,
                ..
            } => !*command_like || *callee == node,
            NodeKind::ObjectProperty { key, .. } => *key != Some(node),
            NodeKind::ObjectPatternProperty { key, .. }
            | NodeKind::ObjectMetaProperty { key, .. } => *key != node,
            NodeKind::IdentifierMemberExpression { left, .. }
            | NodeKind::DynamicMemberExpression { left, .. } => *left == node,
            NodeKind::MemberExpression { property, .. } => *property != node,
            NodeKind::DoubleColonExpression { element, .. } => *element != node,
            NodeKind::DynamicMappingEntry {
                key_var,
                group_matching_variable,
                ..
            } => *key_var != node && *group_matching_variable != Some(node),
            NodeKind::ForStatement {
                key_index,
                value_elem,
                ..
            }
            | NodeKind::ForExpression {
                key_index,
                value_elem,
                ..
            } => *key_index != Some(node) && *value_elem != Some(node),
            NodeKind::WalkStatement {
                meta_ident,
                entry_ident,
                ..
            } => *meta_ident != Some(node) && *entry_ident != node,
            NodeKind::FunctionExpression {
                captured_locals, ..
            } => !captured_locals.contains(&node),
            NodeKind::FunctionParameter { var, .. } => *var != node,
            NodeKind::LocalVariableDeclaration { left, .. }
            | NodeKind::GlobalVariableDeclaration { left, .. }
            | NodeKind::GlobalConstantDeclaration { left, .. } => *left != node,
            NodeKind::MatchCase {
                group_matching_variable,
                ..
            } => *group_matching_variable != Some(node),
            NodeKind::MultiAssignment { variables, .. } => !variables.contains(&node),
            NodeKind::PatternNamespaceMemberExpression { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::KeyListExpression { .. }
            | NodeKind::QuantityLiteral { .. }
            | NodeKind::RateLiteral { .. } => false,
            _ => true,
        }
    }

    /// Record a global referenced from a function body or a mapping entry.
    ///
    /// Every function expression between the reference and the module
    /// captures the global; lifetime jobs are transparent since they run
    /// with the globals of the function that created them.
    fn capture_global(&mut self, visit: &Visit<'_>, name: &str) {
        let ast = self.ast;
        let ancestors = visit.ancestors;
        for (index, ancestor) in ancestors.iter().enumerate().rev() {
            match ast.kind(*ancestor) {
                NodeKind::FunctionExpression { .. } => {
                    self.data.add_fn_captured_global(*ancestor, name);
                }
                NodeKind::StaticMappingEntry { .. } | NodeKind::DynamicMappingEntry { .. } => {
                    let mapping = ancestors[..index]
                        .iter()
                        .rev()
                        .find(|a| matches!(ast.kind(**a), NodeKind::MappingExpression { .. }));
                    if let Some(mapping) = mapping {
                        self.data.add_mapping_captured_global(*mapping, name);
                    }
                }
                NodeKind::EmbeddedModule { .. } => {
                    let in_lifetime_job = index > 0
                        && matches!(
                            ast.kind(ancestors[index - 1]),
                            NodeKind::LifetimeJobExpression { .. }
                        );
                    if !in_lifetime_job {
                        return;
                    }
                }
                NodeKind::Chunk { .. } => return,
                _ => {}
            }
        }
    }

    pub(super) fn declare_constants(&mut self, declarations: &[NodeId], scopes: Scopes) {
        let ast = self.ast;
        for declaration in declarations {
            let NodeKind::GlobalConstantDeclaration { left, .. } = ast.kind(*declaration) else {
                continue;
            };
            let Some(name) = ast.identifier_name(*left) else {
                continue;
            };
            if self.tables.global(scopes.module, name).is_some() {
                self.error(
                    *declaration,
                    CheckErrorKind::ConstantAlreadyDeclared(name.to_string()),
                );
                return;
            }
            self.tables
                .globals(scopes.module)
                .insert(name.to_string(), GlobalInfo::CONSTANT);
        }
    }

    pub(super) fn declare_globals(&mut self, declarations: &[NodeId], scopes: Scopes) {
        let ast = self.ast;
        for declaration in declarations {
            let NodeKind::GlobalVariableDeclaration { left, .. } = ast.kind(*declaration) else {
                continue;
            };
            let Some(name) = ast.identifier_name(*left) else {
                continue;
            };
            if self.tables.local(scopes.scope, name).is_some() {
                self.error(
                    *declaration,
                    CheckErrorKind::CannotShadowLocal(name.to_string()),
                );
                return;
            }
            if self.tables.global(scopes.module, name).is_some() {
                self.error(
                    *declaration,
                    CheckErrorKind::GlobalAlreadyDeclared(name.to_string()),
                );
                return;
            }
            self.tables
                .globals(scopes.module)
                .insert(name.to_string(), GlobalInfo::VARIABLE);
        }
    }

    pub(super) fn declare_locals(&mut self, declarations: &[NodeId], scopes: Scopes) {
        let ast = self.ast;
        for declaration in declarations {
            let NodeKind::LocalVariableDeclaration { left, .. } = ast.kind(*declaration) else {
                continue;
            };
            let Some(name) = ast.identifier_name(*left) else {
                continue;
            };
            if self.tables.global(scopes.module, name).is_some() {
                self.error(
                    *declaration,
                    CheckErrorKind::CannotShadowGlobal(name.to_string()),
                );
                return;
            }
            if self.tables.local(scopes.scope, name).is_some() {
                self.error(
                    *declaration,
                    CheckErrorKind::LocalAlreadyDeclared(name.to_string()),
                );
                return;
            }
            self.tables
                .locals(scopes.scope)
                .insert(name.to_string(), LocalInfo::default());
        }
    }

    pub(super) fn check_assignment(
        &mut self,
        node: NodeId,
        left: NodeId,
        operator: AssignmentOp,
        scopes: Scopes,
    ) {
        let ast = self.ast;
        match ast.kind(left) {
            NodeKind::GlobalVariable(name) => {
                if self.tables.is_function(scopes.module, name) {
                    self.error(node, CheckErrorKind::FunctionNameAssigned(name.clone()));
                    return;
                }
                if self.tables.local(scopes.scope, name).is_some() {
                    self.error(node, CheckErrorKind::CannotShadowLocal(name.clone()));
                    return;
                }
                match self.tables.global(scopes.module, name) {
                    Some(info) if info.is_const => {
                        self.error(node, CheckErrorKind::ConstantAssigned(name.clone()));
                    }
                    Some(_) => {}
                    None => {
                        if operator != AssignmentOp::Assign {
                            self.error(
                                node,
                                CheckErrorKind::AssignedGlobalDoesNotExist(name.clone()),
                            );
                        }
                        self.tables
                            .globals(scopes.module)
                            .insert(name.clone(), GlobalInfo::VARIABLE);
                    }
                }
            }
            NodeKind::Variable(name) | NodeKind::IdentifierLiteral(name) => {
                if name.is_empty() {
                    self.error(node, CheckErrorKind::AnonymousVariableAssigned);
                    return;
                }
                if self.tables.global(scopes.module, name).is_some() {
                    self.error(node, CheckErrorKind::CannotShadowGlobal(name.clone()));
                    return;
                }
                if self.tables.local(scopes.scope, name).is_none()
                    && operator != AssignmentOp::Assign
                {
                    self.error(
                        node,
                        CheckErrorKind::AssignedVariableDoesNotExist(name.clone()),
                    );
                }
                self.tables
                    .locals(scopes.scope)
                    .insert(name.clone(), LocalInfo::default());
            }
            NodeKind::IdentifierMemberExpression { property_names, .. } => {
                for property in property_names {
                    if let Some(name) = ast.identifier_name(*property) {
                        if is_metadata_key(name) {
                            self.error(node, CheckErrorKind::MetapropertyAssigned(name.to_string()));
                        }
                    }
                }
            }
            NodeKind::MemberExpression { .. } => {
                let mut current = left;
                while let NodeKind::MemberExpression { left, property, .. } = ast.kind(current) {
                    if let Some(name) = ast.identifier_name(*property) {
                        if is_metadata_key(name) {
                            self.error(node, CheckErrorKind::MetapropertyAssigned(name.to_string()));
                            break;
                        }
                    }
                    current = *left;
                }
            }
            NodeKind::SliceExpression { .. } => {
                if operator != AssignmentOp::Assign {
                    self.error(node, CheckErrorKind::SliceAugmentedAssignment);
                }
            }
            _ => {}
        }
    }

    pub(super) fn check_multi_assignment(&mut self, node: NodeId, variables: &[NodeId], scopes: Scopes) {
        let ast = self.ast;
        for variable in variables {
            let Some(name) = ast.identifier_name(*variable) else {
                continue;
            };
            if self.tables.global(scopes.module, name).is_some() {
                self.error(node, CheckErrorKind::CannotShadowGlobal(name.to_string()));
            }
            self.tables
                .locals(scopes.scope)
                .insert(name.to_string(), LocalInfo::default());
        }
    }

    /// Declare the key/value (or meta/entry) variables of a loop.
    pub(super) fn declare_iteration_variables(
        &mut self,
        node: NodeId,
        variables: [Option<NodeId>; 2],
        scopes: Scopes,
    ) {
        let ast = self.ast;
        for variable in variables.into_iter().flatten() {
            let Some(name) = ast.identifier_name(variable) else {
                continue;
            };
            if self.tables.local(scopes.scope, name).is_some() {
                self.error(node, CheckErrorKind::CannotShadowVariable(name.to_string()));
                return;
            }
            if self.tables.global(scopes.module, name).is_some() {
                self.error(node, CheckErrorKind::CannotShadowGlobal(name.to_string()));
                return;
            }
            self.tables
                .locals(scopes.scope)
                .insert(name.to_string(), LocalInfo::default());
        }
    }

    pub(super) fn declare_group_matching_variable(&mut self, variable: NodeId, scopes: Scopes) {
        let Some(name) = self.ast.identifier_name(variable) else {
            return;
        };
        if self.tables.global(scopes.module, name).is_some() {
            self.error(variable, CheckErrorKind::CannotShadowGlobal(name.to_string()));
            return;
        }
        let group_var = LocalInfo {
            is_group_matching_var: true,
        };
        match self.tables.local(scopes.scope, name) {
            Some(info) if info != group_var => {
                self.error(variable, CheckErrorKind::CannotShadowLocal(name.to_string()));
            }
            _ => {
                self.tables
                    .locals(scopes.scope)
                    .insert(name.to_string(), group_var);
            }
        }
    }

    pub(super) fn check_function_expression(
        &mut self,
        function: NodeId,
        captured_locals: &[NodeId],
        parameters: &[NodeId],
        scopes: Scopes,
    ) {
        let ast = self.ast;
        for captured in captured_locals {
            let Some(name) = ast.identifier_name(*captured) else {
                continue;
            };
            if !self.var_exists(name, scopes) {
                self.error(function, CheckErrorKind::VariableNotDeclared(name.to_string()));
            } else if self.tables.global(scopes.module, name).is_some() {
                self.error(function, CheckErrorKind::CannotCaptureGlobal(name.to_string()));
            }
            self.tables
                .locals(function)
                .insert(name.to_string(), LocalInfo::default());
        }

        for parameter in parameters {
            let NodeKind::FunctionParameter { var, .. } = ast.kind(*parameter) else {
                continue;
            };
            let Some(name) = ast.identifier_name(*var) else {
                continue;
            };
            if self.tables.global(scopes.module, name).is_some() {
                self.error(
                    *parameter,
                    CheckErrorKind::ParameterShadowsGlobal(name.to_string()),
                );
                return;
            }
            if self.tables.local(function, name).is_some() {
                self.error(
                    *parameter,
                    CheckErrorKind::ParameterAlreadyDeclared(name.to_string()),
                );
            }
            self.tables
                .locals(function)
                .insert(name.to_string(), LocalInfo::default());
        }
    }

    pub(super) fn declare_pattern(&mut self, definition: NodeId, left: NodeId, scopes: Scopes) {
        let NodeKind::PatternIdentifierLiteral { name, .. } = self.ast.kind(left) else {
            return;
        };
        if !self.tables.patterns(scopes.module).insert(name.clone()) {
            self.error(
                definition,
                CheckErrorKind::PatternAlreadyDeclared(name.clone()),
            );
        }
    }

    pub(super) fn declare_pattern_namespace(
        &mut self,
        definition: NodeId,
        left: NodeId,
        scopes: Scopes,
    ) {
        let NodeKind::PatternNamespaceIdentifierLiteral(name) = self.ast.kind(left) else {
            return;
        };
        if !self
            .tables
            .pattern_namespaces(scopes.module)
            .insert(name.clone())
        {
            self.error(
                definition,
                CheckErrorKind::PatternNamespaceAlreadyDeclared(name.clone()),
            );
        }
    }

    pub(super) fn check_pattern_identifier(&mut self, visit: &Visit<'_>, scopes: Scopes, name: &str) {
        let ast = self.ast;
        let in_lazy_definition = visit
            .ancestors
            .iter()
            .any(|a| matches!(ast.kind(*a), NodeKind::PatternDefinition { lazy: true, .. }));
        if in_lazy_definition {
            return;
        }
        if !self.tables.patterns(scopes.module).contains(name) {
            self.error(
                visit.node,
                CheckErrorKind::PatternNotDeclared(name.to_string()),
            );
        }
    }
}
