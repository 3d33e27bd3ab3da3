//! Boundaries between modules: spawned lthreads and included chunks.

use inox_ir::walk::Visit;
use inox_ir::{NodeId, NodeKind};

use super::manifest::property_key;
use super::{Checker, Scopes};
use crate::errors::CheckErrorKind;
use crate::scope::GlobalInfo;

impl Checker<'_> {
    /// The embedded module of a spawn expression sees the start constants
    /// of its parent, the globals listed in `meta`, and the parent's patterns.
    pub(super) fn check_spawn(
        &mut self,
        node: NodeId,
        meta: Option<NodeId>,
        module: NodeId,
        scopes: Scopes,
    ) {
        let ast = self.ast;
        let mut globals: Vec<(String, GlobalInfo)> = self
            .tables
            .globals(scopes.module)
            .iter()
            .filter(|(_, info)| info.is_start_constant)
            .map(|(name, info)| (name.clone(), *info))
            .collect();

        let mut globals_description = None;
        match meta.map(|meta| (meta, ast.kind(meta))) {
            Some((
                meta,
                NodeKind::ObjectLiteral {
                    properties,
                    spread_elements,
                    ..
                },
            )) => {
                let mut valid = spread_elements.is_empty();
                for property in properties {
                    let NodeKind::ObjectProperty { key, value, .. } = ast.kind(*property) else {
                        continue;
                    };
                    match key.map(|key| property_key(ast.kind(key))) {
                        None => valid = false,
                        Some(Some("globals")) => globals_description = Some(*value),
                        Some(_) => {}
                    }
                }
                if !valid {
                    self.error(meta, CheckErrorKind::InvalidSpawnMeta);
                }
            }
            Some((meta, _)) => self.error(meta, CheckErrorKind::InvalidSpawnMeta),
            None => {}
        }

        if let Some(description) = globals_description {
            match ast.kind(description) {
                NodeKind::KeyListExpression { keys } => {
                    for key in keys {
                        let Some(name) = ast.identifier_name(*key) else {
                            continue;
                        };
                        if self.tables.global(scopes.module, name).is_none() {
                            self.error(
                                description,
                                CheckErrorKind::SpawnGlobalNotDeclared(name.to_string()),
                            );
                        }
                        globals.push((name.to_string(), GlobalInfo::CONSTANT));
                    }
                }
                NodeKind::ObjectLiteral {
                    properties,
                    spread_elements,
                    ..
                } => {
                    if !spread_elements.is_empty() {
                        self.error(description, CheckErrorKind::InvalidSpawnGlobals);
                    }
                    for property in properties {
                        let NodeKind::ObjectProperty { key, .. } = ast.kind(*property) else {
                            continue;
                        };
                        match key.and_then(|key| property_key(ast.kind(key))) {
                            Some(name) => globals.push((name.to_string(), GlobalInfo::CONSTANT)),
                            None => self.error(description, CheckErrorKind::InvalidSpawnGlobals),
                        }
                    }
                }
                NodeKind::NilLiteral => {}
                _ => self.error(description, CheckErrorKind::InvalidSpawnGlobals),
            }
        }

        self.tables.inherit(scopes.module, module, false);
        self.tables.globals(module).extend(globals);
        tracing::trace!(spawn = ?node, "declared globals of spawned module");
    }

    /// Whether the visited node is the value of an implicit-key property.
    pub(super) fn is_implicit_key_property(&self, visit: &Visit<'_>) -> bool {
        visit.parent.is_some_and(|parent| {
            matches!(self.ast.kind(parent), NodeKind::ObjectProperty { key: None, .. })
        })
    }

    /// Check an included chunk with its own checker and merge its top-level
    /// declarations into the including module.
    pub(super) fn check_inclusion(&mut self, visit: &Visit<'_>, scopes: Scopes) {
        let node = visit.node;
        let at_chunk_top_level = visit
            .parent
            .is_some_and(|parent| matches!(self.ast.kind(parent), NodeKind::Chunk { .. }));
        if !at_chunk_top_level {
            self.error(node, CheckErrorKind::MisplacedInclusion);
            return;
        }
        let Some(chunk) = self.input.module.included_chunk(node) else {
            self.error(node, CheckErrorKind::MissingIncludedChunk);
            return;
        };

        let (data, errors, included) = self.for_inclusion(node, chunk).run_included();
        self.errors.extend(errors);
        self.data.merge(data);

        for name in included.functions {
            if !self.input.is_input_global(&name) {
                self.tables.functions(scopes.module).insert(name);
            }
        }

        for (name, info) in included.globals {
            if self.input.is_input_global(&name) {
                continue;
            }
            if self.tables.global(scopes.module, &name).is_some() {
                self.error(node, CheckErrorKind::CannotShadowGlobal(name));
            } else {
                self.tables.globals(scopes.module).insert(name, info);
            }
        }

        for (name, info) in included.locals {
            if self.tables.local(scopes.module, &name).is_some() {
                self.error(node, CheckErrorKind::CannotShadowLocal(name));
            } else {
                self.tables.locals(scopes.module).insert(name, info);
            }
        }

        for name in included.patterns {
            if self.input.is_input_pattern(&name) {
                continue;
            }
            if !self.tables.patterns(scopes.module).insert(name.clone()) {
                self.error(node, CheckErrorKind::PatternAlreadyDeclared(name));
            }
        }

        for name in included.pattern_namespaces {
            if self.input.is_input_pattern_namespace(&name) {
                continue;
            }
            if !self.tables.pattern_namespaces(scopes.module).insert(name.clone()) {
                self.error(node, CheckErrorKind::PatternNamespaceAlreadyDeclared(name));
            }
        }
    }
}
