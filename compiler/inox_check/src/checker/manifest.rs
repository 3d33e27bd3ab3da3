//! Shape of manifests.
//!
//! A manifest is an object literal whose explicit-key properties are
//! sections. Each section accepts a small set of node classes so that it can
//! be evaluated before the module runs.

use inox_core::PermissionKind;
use inox_ir::walk::{self, TraversalAction, Visit};
use inox_ir::{NodeId, NodeKind};

use super::Checker;
use crate::errors::CheckErrorKind;

const PERMISSIONS_SECTION: &str = "permissions";
const HOST_RESOLUTION_SECTION: &str = "host_resolution";
const LIMITS_SECTION: &str = "limits";
const ENV_SECTION: &str = "env";
const PARAMETERS_SECTION: &str = "parameters";

impl Checker<'_> {
    pub(super) fn check_manifest(&mut self, visit: &Visit<'_>, object: NodeId) {
        let ast = self.ast;
        let embedded = visit
            .parent
            .is_some_and(|parent| matches!(ast.kind(parent), NodeKind::EmbeddedModule { .. }));

        let NodeKind::ObjectLiteral { properties, .. } = ast.kind(object) else {
            self.error(object, CheckErrorKind::ManifestNotObject);
            return;
        };

        self.check_manifest_spreads(object);

        for property in properties {
            let NodeKind::ObjectProperty { key, value, .. } = ast.kind(*property) else {
                continue;
            };
            let Some(name) = key.and_then(|key| property_key(ast.kind(key))) else {
                self.error(*property, CheckErrorKind::ManifestImplicitKey);
                continue;
            };
            match name {
                PERMISSIONS_SECTION => self.check_permission_listing(*property, *value),
                HOST_RESOLUTION_SECTION => self.check_host_resolution(*property, *value),
                LIMITS_SECTION => self.check_limits(*property, *value),
                ENV_SECTION => {
                    if embedded {
                        self.error(*property, CheckErrorKind::EnvInEmbeddedModule);
                    } else {
                        self.check_env(*property, *value);
                    }
                }
                PARAMETERS_SECTION => {
                    if embedded {
                        self.error(*property, CheckErrorKind::ParametersInEmbeddedModule);
                    } else if !matches!(ast.kind(*value), NodeKind::ObjectLiteral { .. }) {
                        self.error(*property, CheckErrorKind::ParametersNotObject);
                    }
                }
                other => {
                    if !embedded {
                        self.error(
                            *property,
                            CheckErrorKind::UnknownManifestSection(other.to_string()),
                        );
                    }
                }
            }
        }
    }

    /// Objects, records and lists of a manifest cannot have spread elements.
    fn check_manifest_spreads(&mut self, object: NodeId) {
        let mut spread = Vec::new();
        walk::walk_fn(self.ast, object, |ast, visit| {
            let has_spread = match ast.kind(visit.node) {
                NodeKind::ObjectLiteral {
                    spread_elements, ..
                }
                | NodeKind::RecordLiteral {
                    spread_elements, ..
                } => !spread_elements.is_empty(),
                NodeKind::ListLiteral { elements, .. } => elements
                    .iter()
                    .any(|e| matches!(ast.kind(*e), NodeKind::ElementSpreadElement { .. })),
                _ => false,
            };
            if has_spread {
                spread.push(visit.node);
            }
            TraversalAction::Continue
        });
        for node in spread {
            self.error(node, CheckErrorKind::ManifestSpread);
        }
    }

    /// Report every node below `root` rejected by `allowed`.
    ///
    /// `allowed` returns `None` for forbidden nodes and the action to take
    /// otherwise. Returns whether a node was rejected.
    fn check_section_nodes(
        &mut self,
        root: NodeId,
        allowed: impl Fn(&NodeKind, Option<&NodeKind>) -> Option<TraversalAction>,
        error: fn(&'static str) -> CheckErrorKind,
    ) -> bool {
        let mut forbidden = Vec::new();
        walk::walk_fn(self.ast, root, |ast, visit| {
            if visit.node == root {
                return TraversalAction::Continue;
            }
            let kind = ast.kind(visit.node);
            let parent = visit.parent.map(|parent| ast.kind(parent));
            if let Some(action) = allowed(kind, parent) {
                return action;
            }
            forbidden.push((visit.node, kind.name()));
            TraversalAction::Continue
        });
        let rejected = !forbidden.is_empty();
        for (node, name) in forbidden {
            self.error(node, error(name));
        }
        rejected
    }

    fn check_permission_listing(&mut self, property: NodeId, value: NodeId) {
        let ast = self.ast;
        let NodeKind::ObjectLiteral { properties, .. } = ast.kind(value) else {
            self.error(property, CheckErrorKind::PermissionsNotObject);
            return;
        };

        self.check_section_nodes(
            value,
            |kind, parent| match kind {
                NodeKind::UrlExpression { .. } | NodeKind::PathExpression { .. } => {
                    Some(TraversalAction::Prune)
                }
                NodeKind::ObjectLiteral { .. }
                | NodeKind::ListLiteral { .. }
                | NodeKind::DictionaryLiteral { .. }
                | NodeKind::DictionaryEntry { .. }
                | NodeKind::ObjectProperty { .. }
                | NodeKind::GlobalVariable(_)
                | NodeKind::PatternIdentifierLiteral { .. } => Some(TraversalAction::Continue),
                NodeKind::IdentifierLiteral(_)
                    if matches!(parent, Some(NodeKind::ObjectProperty { .. })) =>
                {
                    Some(TraversalAction::Continue)
                }
                kind if kind.is_simple_value_literal() => Some(TraversalAction::Continue),
                _ => None,
            },
            CheckErrorKind::ForbiddenNodeInPermissions,
        );

        for permission_kind in properties {
            let NodeKind::ObjectProperty { key, .. } = ast.kind(*permission_kind) else {
                continue;
            };
            let Some(key) = *key else {
                self.error(*permission_kind, CheckErrorKind::PermissionsImplicitKey);
                continue;
            };
            let Some(name) = property_key(ast.kind(key)) else {
                continue;
            };
            if PermissionKind::from_manifest_name(name).is_none() {
                self.error(key, CheckErrorKind::InvalidPermissionKind(name.to_string()));
            }
        }
    }

    fn check_host_resolution(&mut self, property: NodeId, value: NodeId) {
        let ast = self.ast;
        let NodeKind::DictionaryLiteral { entries } = ast.kind(value) else {
            self.error(property, CheckErrorKind::HostResolutionNotDictionary);
            return;
        };

        let rejected = self.check_section_nodes(
            value,
            |kind, parent| match kind {
                NodeKind::ObjectLiteral { .. }
                | NodeKind::ObjectProperty { .. }
                | NodeKind::DictionaryEntry { .. }
                | NodeKind::GlobalVariable(_)
                | NodeKind::IdentifierMemberExpression { .. } => Some(TraversalAction::Continue),
                NodeKind::IdentifierLiteral(_)
                    if matches!(
                        parent,
                        Some(NodeKind::ObjectProperty { .. } | NodeKind::IdentifierMemberExpression { .. })
                    ) =>
                {
                    Some(TraversalAction::Continue)
                }
                kind if kind.is_simple_value_literal() => Some(TraversalAction::Continue),
                _ => None,
            },
            CheckErrorKind::ForbiddenNodeInHostResolution,
        );
        if rejected {
            return;
        }

        for entry in entries {
            let NodeKind::DictionaryEntry { key, .. } = ast.kind(*entry) else {
                continue;
            };
            if !matches!(ast.kind(*key), NodeKind::HostLiteral(_)) {
                self.error(*key, CheckErrorKind::HostResolutionNotDictionary);
            }
        }
    }

    fn check_limits(&mut self, property: NodeId, value: NodeId) {
        if !matches!(self.ast.kind(value), NodeKind::ObjectLiteral { .. }) {
            self.error(property, CheckErrorKind::LimitsNotObject);
            return;
        }
        self.check_section_nodes(
            value,
            |kind, parent| match kind {
                NodeKind::ObjectProperty { .. } | NodeKind::GlobalVariable(_) => {
                    Some(TraversalAction::Continue)
                }
                NodeKind::IdentifierLiteral(_)
                    if matches!(parent, Some(NodeKind::ObjectProperty { .. })) =>
                {
                    Some(TraversalAction::Continue)
                }
                kind if kind.is_simple_value_literal() => Some(TraversalAction::Continue),
                _ => None,
            },
            CheckErrorKind::ForbiddenNodeInLimits,
        );
    }

    fn check_env(&mut self, property: NodeId, value: NodeId) {
        if !matches!(self.ast.kind(value), NodeKind::ObjectPatternLiteral { .. }) {
            self.error(property, CheckErrorKind::EnvNotObjectPattern);
            return;
        }
        self.check_section_nodes(
            value,
            |kind, parent| match kind {
                NodeKind::PatternIdentifierLiteral { .. }
                | NodeKind::PatternNamespaceMemberExpression { .. }
                | NodeKind::ObjectPatternProperty { .. }
                | NodeKind::PatternCallExpression { .. }
                | NodeKind::GlobalVariable(_) => Some(TraversalAction::Continue),
                NodeKind::PatternNamespaceIdentifierLiteral(_)
                    if matches!(parent, Some(NodeKind::PatternNamespaceMemberExpression { .. })) =>
                {
                    Some(TraversalAction::Continue)
                }
                NodeKind::IdentifierLiteral(_)
                    if matches!(
                        parent,
                        Some(
                            NodeKind::ObjectPatternProperty { .. }
                                | NodeKind::PatternNamespaceMemberExpression { .. }
                        )
                    ) =>
                {
                    Some(TraversalAction::Continue)
                }
                kind if kind.is_simple_value_literal() => Some(TraversalAction::Continue),
                _ => None,
            },
            CheckErrorKind::ForbiddenNodeInEnv,
        );
    }
}

/// Name of an explicit property key.
pub(super) fn property_key(key: &NodeKind) -> Option<&str> {
    match key {
        NodeKind::IdentifierLiteral(name) | NodeKind::StringLiteral(name) => Some(name),
        _ => None,
    }
}
