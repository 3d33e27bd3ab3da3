//! Statements and expressions that are only valid in some places.

use inox_ir::walk::{self, Visit};
use inox_ir::{ModuleKind, NodeKind};

use super::{Checker, Scopes};
use crate::errors::CheckErrorKind;

impl Checker<'_> {
    /// `break` and `continue` reach the closest `for` or `walk` through
    /// conditionals and blocks only.
    pub(super) fn check_break_or_continue(&mut self, visit: &Visit<'_>, is_break: bool) {
        let error = if is_break {
            CheckErrorKind::MisplacedBreak
        } else {
            CheckErrorKind::MisplacedContinue
        };
        let loop_index = walk::find_closest(self.ast, visit.ancestors, |kind| {
            matches!(
                kind,
                NodeKind::ForStatement { .. }
                    | NodeKind::ForExpression { .. }
                    | NodeKind::WalkStatement { .. }
            )
        });
        let valid = loop_index.is_some_and(|(index, _)| {
            visit.ancestors[index + 1..].iter().all(|a| {
                matches!(
                    self.ast.kind(*a),
                    NodeKind::IfStatement { .. }
                        | NodeKind::SwitchStatement { .. }
                        | NodeKind::SwitchCase { .. }
                        | NodeKind::MatchStatement { .. }
                        | NodeKind::MatchCase { .. }
                        | NodeKind::DefaultCase { .. }
                        | NodeKind::Block { .. }
                )
            })
        });
        if !valid {
            self.error(visit.node, error);
        }
    }

    pub(super) fn check_prune(&mut self, visit: &Visit<'_>) {
        let walk_index = walk::find_closest(self.ast, visit.ancestors, |kind| {
            matches!(kind, NodeKind::WalkStatement { .. })
        });
        let valid = walk_index.is_some_and(|(index, _)| {
            visit.ancestors[index + 1..].iter().all(|a| {
                matches!(
                    self.ast.kind(*a),
                    NodeKind::IfStatement { .. }
                        | NodeKind::SwitchStatement { .. }
                        | NodeKind::SwitchCase { .. }
                        | NodeKind::MatchStatement { .. }
                        | NodeKind::MatchCase { .. }
                        | NodeKind::DefaultCase { .. }
                        | NodeKind::Block { .. }
                        | NodeKind::ForStatement { .. }
                )
            })
        });
        if !valid {
            self.error(visit.node, CheckErrorKind::MisplacedPrune);
        }
    }

    /// `yield` ends an embedded module or produces an element of a `for`
    /// expression.
    pub(super) fn check_yield(&mut self, visit: &Visit<'_>) {
        let ast = self.ast;
        let mut valid = false;
        for ancestor in visit.ancestors.iter().rev() {
            match ast.kind(*ancestor) {
                NodeKind::ForExpression { .. } | NodeKind::EmbeddedModule { .. } => {
                    valid = true;
                    break;
                }
                kind if kind.is_scope_container() => {
                    valid = *ancestor == self.root && self.input.module.kind.is_embedded();
                    break;
                }
                _ => {}
            }
        }
        if !valid {
            self.error(visit.node, CheckErrorKind::MisplacedYield);
        }
    }

    /// `self` and `sendval` are valid in object methods, metaproperty
    /// initialization blocks and lifetime jobs.
    pub(super) fn check_self(&mut self, visit: &Visit<'_>, is_sendval: bool) {
        let ast = self.ast;
        let ancestors = visit.ancestors;
        let error = if is_sendval {
            CheckErrorKind::MisplacedSendval
        } else {
            CheckErrorKind::MisplacedSelf
        };

        let mut object_literal = None;
        for (index, ancestor) in ancestors.iter().enumerate().rev() {
            match ast.kind(*ancestor) {
                NodeKind::InitializationBlock { .. } => {
                    if index >= 2
                        && matches!(ast.kind(ancestors[index - 1]), NodeKind::ObjectMetaProperty { .. })
                        && matches!(ast.kind(ancestors[index - 2]), NodeKind::ObjectLiteral { .. })
                    {
                        object_literal = Some(ancestors[index - 2]);
                    }
                    break;
                }
                NodeKind::FunctionExpression { .. } => {
                    let mut j = index;
                    if j > 0
                        && matches!(
                            ast.kind(ancestors[j - 1]),
                            NodeKind::ReceptionHandlerExpression { .. }
                        )
                    {
                        j -= 1;
                    }
                    if j >= 2
                        && matches!(ast.kind(ancestors[j - 1]), NodeKind::ObjectProperty { .. })
                        && matches!(ast.kind(ancestors[j - 2]), NodeKind::ObjectLiteral { .. })
                    {
                        object_literal = Some(ancestors[j - 2]);
                    }
                    break;
                }
                NodeKind::EmbeddedModule { .. } => {
                    let in_lifetime_job = index > 0
                        && matches!(
                            ast.kind(ancestors[index - 1]),
                            NodeKind::LifetimeJobExpression { .. }
                        );
                    if !in_lifetime_job {
                        self.error(visit.node, error);
                    }
                    return;
                }
                NodeKind::Chunk { .. } => {
                    if self.input.module.kind == ModuleKind::LifetimeJob {
                        return;
                    }
                    break;
                }
                _ => {}
            }
        }

        let Some(object_literal) = object_literal else {
            self.error(visit.node, error);
            return;
        };

        let Some(parent) = visit.parent else {
            return;
        };
        if let NodeKind::MemberExpression { property, .. } = ast.kind(parent) {
            let Some(name) = ast.identifier_name(*property) else {
                return;
            };
            let known = self
                .object_keys
                .get(&object_literal)
                .is_some_and(|keys| keys.contains(name));
            if !known {
                self.error(parent, CheckErrorKind::SelfPropertyNotFound(name.to_string()));
            }
        }
    }

    /// `compute` is only valid in the value computation of a dynamic mapping
    /// entry.
    pub(super) fn check_compute(&mut self, visit: &Visit<'_>, scopes: Scopes) {
        let ast = self.ast;
        let NodeKind::DynamicMappingEntry { key, .. } = ast.kind(scopes.scope) else {
            self.error(visit.node, CheckErrorKind::MisplacedCompute);
            return;
        };
        let in_key = *key == visit.node || visit.ancestors.contains(key);
        if in_key {
            self.error(visit.node, CheckErrorKind::MisplacedCompute);
        }
    }

    pub(super) fn check_runtime_type_check(&mut self, visit: &Visit<'_>) {
        let is_argument = visit.parent.is_some_and(|parent| {
            matches!(
                self.ast.kind(parent),
                NodeKind::CallExpression { arguments, .. } if arguments.contains(&visit.node)
            )
        });
        if !is_argument {
            self.error(visit.node, CheckErrorKind::MisplacedRuntimeTypeCheck);
        }
    }

    /// Assertions only contain comparisons, pattern tests and simple values.
    pub(super) fn check_assertion_member(&mut self, visit: &Visit<'_>) {
        let ast = self.ast;
        let in_assertion = visit
            .ancestors
            .iter()
            .any(|a| matches!(ast.kind(*a), NodeKind::AssertionStatement { .. }));
        if !in_assertion {
            return;
        }
        let kind = ast.kind(visit.node);
        let allowed = kind.is_simple_value_literal()
            || matches!(
                kind,
                NodeKind::Variable(_)
                    | NodeKind::GlobalVariable(_)
                    | NodeKind::IdentifierLiteral(_)
                    | NodeKind::BinaryExpression { .. }
                    | NodeKind::PatternIdentifierLiteral { .. }
                    | NodeKind::ObjectPatternLiteral { .. }
                    | NodeKind::RecordPatternLiteral { .. }
                    | NodeKind::ObjectProperty { .. }
                    | NodeKind::ObjectPatternProperty { .. }
                    | NodeKind::ListPatternLiteral { .. }
                    | NodeKind::TuplePatternLiteral { .. }
                    | NodeKind::ObjectLiteral { .. }
                    | NodeKind::ListLiteral { .. }
                    | NodeKind::PatternNamespaceIdentifierLiteral(_)
                    | NodeKind::PatternNamespaceMemberExpression { .. }
                    | NodeKind::OptionPatternLiteral { .. }
                    | NodeKind::OptionalPatternExpression { .. }
                    | NodeKind::MemberExpression { .. }
                    | NodeKind::IdentifierMemberExpression { .. }
            );
        if !allowed {
            self.error(visit.node, CheckErrorKind::NotAllowedInAssertion(kind.name()));
        }
    }
}
