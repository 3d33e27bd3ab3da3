//! Shape of literals: keys of object-like literals, quantities and rates.

use rustc_hash::{FxHashMap, FxHashSet};

use inox_core::quantity::{self, BYTE_COUNT_UNIT, LINE_COUNT_UNIT, RUNE_COUNT_UNIT};
use inox_ir::{NodeId, NodeKind};

use super::Checker;
use crate::errors::{CheckErrorKind, MAX_NAME_BYTE_LEN};
use crate::is_metadata_key;

const DURATION_UNITS: [&str; 6] = ["h", "mn", "s", "ms", "us", "ns"];

fn split_multiplier(unit: &str) -> (bool, &str) {
    match unit.as_bytes().first() {
        Some(b'k' | b'M' | b'G' | b'T') => (true, &unit[1..]),
        _ => (false, unit),
    }
}

impl Checker<'_> {
    pub(super) fn check_quantity(&mut self, node: NodeId, values: &[f64], units: &[String]) {
        let mut prev_unit: Option<&str> = None;
        let mut prev_duration_rank: Option<usize> = None;

        for (index, (value, unit)) in values.iter().zip(units).enumerate() {
            if *value < 0.0 {
                self.error(node, CheckErrorKind::Quantity(quantity::QuantityError::Negative.to_string()));
                return;
            }
            let (has_multiplier, base) = split_multiplier(unit);
            if has_multiplier && base.is_empty() {
                self.error(node, CheckErrorKind::UnsupportedUnit(units[0].clone()));
                return;
            }

            if let Some(rank) = DURATION_UNITS.iter().position(|u| *u == base) {
                if prev_unit.is_some() && prev_duration_rank.is_none_or(|prev| rank <= prev) {
                    self.error(node, CheckErrorKind::InvalidQuantity);
                    return;
                }
                prev_duration_rank = Some(rank);
                prev_unit = Some(base);
                continue;
            }

            match base {
                "x" | LINE_COUNT_UNIT | RUNE_COUNT_UNIT | BYTE_COUNT_UNIT => {}
                "%" if !has_multiplier => {}
                _ => {
                    self.error(node, CheckErrorKind::UnsupportedUnit(units[0].clone()));
                    return;
                }
            }
            if index != 0 || prev_unit.is_some() {
                self.error(node, CheckErrorKind::InvalidQuantity);
                return;
            }
            prev_unit = Some(base);
        }

        if let Err(err) = quantity::evaluate(values, units) {
            self.error(node, CheckErrorKind::Quantity(err.to_string()));
        }
    }

    /// Only byte counts and plain counts per second are rates.
    pub(super) fn check_rate(&mut self, node: NodeId, quantity: NodeId, div_unit: &str) {
        let NodeKind::QuantityLiteral { units, .. } = self.ast.kind(quantity) else {
            self.error(node, CheckErrorKind::InvalidRate);
            return;
        };
        let valid = div_unit == "s"
            && units.last().is_some_and(|unit| {
                let (_, base) = split_multiplier(unit);
                base == "x" || base == BYTE_COUNT_UNIT
            });
        if !valid {
            self.error(node, CheckErrorKind::InvalidRate);
        }
    }

    /// Check the keys of an object or record literal and return them.
    ///
    /// Implicit-key properties are keyed by their index among implicit-key
    /// properties.
    pub(super) fn check_properties(
        &mut self,
        properties: &[NodeId],
        spread_elements: &[NodeId],
        is_object: bool,
    ) -> FxHashSet<String> {
        let ast = self.ast;
        let mut implicit_index = 0usize;
        // key -> whether it was explicit
        let mut keys: FxHashMap<String, bool> = FxHashMap::default();

        for property in properties {
            let NodeKind::ObjectProperty {
                key,
                type_annotation,
                ..
            } = ast.kind(*property)
            else {
                continue;
            };
            if let Some(annotation) = type_annotation {
                self.error(*annotation, CheckErrorKind::PropertyTypeAnnotation);
            }

            let (name, is_explicit, located) = match key.map(|k| (k, ast.kind(k))) {
                Some((key, NodeKind::StringLiteral(name) | NodeKind::IdentifierLiteral(name))) => {
                    (name.clone(), true, key)
                }
                Some((key, _)) => (self.literal_repr(key), true, key),
                None => {
                    let name = implicit_index.to_string();
                    implicit_index += 1;
                    (name, false, *property)
                }
            };

            if name.len() > MAX_NAME_BYTE_LEN {
                self.error(located, CheckErrorKind::NameTooLong(name.clone()));
            }

            if is_metadata_key(&name) {
                self.error(located, CheckErrorKind::MetapropertyKey);
            } else if let Some(prev_is_explicit) = keys.get(&name) {
                if is_explicit && !prev_is_explicit {
                    let literal = if is_object { "object" } else { "record" };
                    self.error(
                        *property,
                        CheckErrorKind::ExplicitKeyAliasesImplicit {
                            literal,
                            key: name.clone(),
                        },
                    );
                } else {
                    self.error(*property, CheckErrorKind::DuplicateKey(name.clone()));
                }
            }
            keys.insert(name, is_explicit);
        }

        for element in spread_elements {
            for key in self.spread_keys(*element) {
                let Some(name) = ast.identifier_name(key) else {
                    continue;
                };
                if keys.contains_key(name) {
                    self.error(key, CheckErrorKind::DuplicateKey(name.to_string()));
                    return keys.into_keys().collect();
                }
                keys.insert(name.to_string(), true);
            }
        }

        keys.into_keys().collect()
    }

    /// Keys extracted by a `...obj.{a, b}` element.
    fn spread_keys(&self, element: NodeId) -> Vec<NodeId> {
        let ast = self.ast;
        let extraction = match ast.kind(element) {
            NodeKind::PropertySpreadElement { extraction }
            | NodeKind::PatternPropertySpreadElement { expr: extraction } => *extraction,
            _ => return Vec::new(),
        };
        let NodeKind::ExtractionExpression { keys, .. } = ast.kind(extraction) else {
            return Vec::new();
        };
        match ast.kind(*keys) {
            NodeKind::KeyListExpression { keys } => keys.clone(),
            _ => Vec::new(),
        }
    }

    pub(super) fn check_pattern_properties(&mut self, properties: &[NodeId], spread_elements: &[NodeId]) {
        let ast = self.ast;
        let mut keys: FxHashSet<String> = FxHashSet::default();

        for property in properties {
            let NodeKind::ObjectPatternProperty { key, .. } = ast.kind(*property) else {
                continue;
            };
            let name = match ast.kind(*key) {
                NodeKind::StringLiteral(name) | NodeKind::IdentifierLiteral(name) => name.clone(),
                _ => continue,
            };
            if name.len() > MAX_NAME_BYTE_LEN {
                self.error(*key, CheckErrorKind::NameTooLong(name.clone()));
            }
            if is_metadata_key(&name) {
                self.error(*key, CheckErrorKind::MetapropertyKey);
            } else if keys.contains(&name) {
                self.error(*property, CheckErrorKind::DuplicateKey(name.clone()));
            }
            keys.insert(name);
        }

        for element in spread_elements {
            for key in self.spread_keys(*element) {
                let Some(name) = ast.identifier_name(key) else {
                    continue;
                };
                if !keys.insert(name.to_string()) {
                    self.error(key, CheckErrorKind::DuplicateKey(name.to_string()));
                    return;
                }
            }
        }
    }

    pub(super) fn check_dictionary_keys(&mut self, entries: &[NodeId]) {
        let ast = self.ast;
        let mut keys: FxHashSet<String> = FxHashSet::default();
        for entry in entries {
            let NodeKind::DictionaryEntry { key, .. } = ast.kind(*entry) else {
                continue;
            };
            let repr = self.literal_repr(*key);
            if keys.contains(&repr) {
                self.error(*key, CheckErrorKind::DuplicateDictionaryKey(repr));
            } else {
                keys.insert(repr);
            }
        }
    }

    /// Source representation of a simple literal.
    fn literal_repr(&self, node: NodeId) -> String {
        let ast = self.ast;
        if let Some(text) = ast.text(node).filter(|text| !text.is_empty()) {
            return text.to_string();
        }
        match ast.kind(node) {
            NodeKind::NilLiteral => "nil".to_string(),
            NodeKind::BooleanLiteral(b) => b.to_string(),
            NodeKind::IntLiteral(i) => i.to_string(),
            NodeKind::FloatLiteral(f) => format!("{f:?}"),
            NodeKind::StringLiteral(s) => format!("{s:?}"),
            NodeKind::RuneLiteral(r) => format!("{r:?}"),
            NodeKind::PathLiteral { value, .. }
            | NodeKind::PathPatternLiteral { value, .. }
            | NodeKind::UrlLiteral(value)
            | NodeKind::HostLiteral(value)
            | NodeKind::UrlPatternLiteral(value)
            | NodeKind::HostPatternLiteral(value)
            | NodeKind::SchemeLiteral(value)
            | NodeKind::EmailAddressLiteral(value) => value.clone(),
            NodeKind::UnambiguousIdentifierLiteral(name) => format!("#{name}"),
            NodeKind::PropertyNameLiteral(name) => format!(".{name}"),
            other => format!("{other:?}"),
        }
    }

    pub(super) fn check_mapping_key(&mut self, key: NodeId) {
        let kind = self.ast.kind(key);
        let valid = kind.is_simple_value_literal()
            || matches!(
                kind,
                NodeKind::PatternIdentifierLiteral { .. }
                    | NodeKind::PatternNamespaceMemberExpression { .. }
            );
        if !valid {
            self.error(key, CheckErrorKind::InvalidMappingKey);
        }
    }
}
