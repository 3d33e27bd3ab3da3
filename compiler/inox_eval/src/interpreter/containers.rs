//! Member access, container literals and concatenation.

use std::sync::Arc;

use inox_core::errors::{self, EvalError};
use inox_core::value::{ListElementKind, Treedata, TreedataEntry, IMPLICIT_PROP_NAME};
use inox_core::{EvalResult, Heap, Pattern, Value};
use inox_ir::{NodeId, NodeKind};

use super::Interpreter;

impl Interpreter {
    /// `object.name`; optional access yields nil for a missing property.
    pub(super) fn member(&self, object: &Value, name: &str, optional: bool) -> EvalResult {
        if optional {
            let present = object
                .property_names()
                .is_ok_and(|names| names.iter().any(|n| n == name));
            if !present {
                return Ok(Value::Nil);
            }
        }
        object.prop(&self.ctx, name)
    }

    pub(super) fn eval_index(&mut self, indexed: NodeId, index: NodeId) -> EvalResult {
        let indexed = self.eval(indexed)?;
        let index = self.eval(index)?;
        let index = index
            .as_int()
            .ok_or_else(|| errors::type_mismatch("integer", index.type_name()))?;
        indexed.at(index)
    }

    pub(super) fn eval_slice(
        &mut self,
        indexed: NodeId,
        start: Option<NodeId>,
        end: Option<NodeId>,
    ) -> EvalResult {
        let indexed = self.eval(indexed)?;
        let start = match start {
            Some(start) => self.eval_int(start)?,
            None => 0,
        };
        let end = end.map(|end| self.eval_int(end)).transpose()?;
        indexed.slice(start, end)
    }

    pub(super) fn eval_int(&mut self, node: NodeId) -> Result<i64, EvalError> {
        let value = self.eval(node)?;
        value
            .as_int()
            .ok_or_else(|| errors::type_mismatch("integer", value.type_name()))
    }

    /// Names listed by a key list expression.
    pub(super) fn key_list_names(&self, node: NodeId) -> Result<Vec<String>, EvalError> {
        match self.ast.kind(node) {
            NodeKind::KeyListExpression { keys } => keys.iter().map(|key| self.name_of(*key)).collect(),
            other => Err(errors::type_mismatch("key list", other.name())),
        }
    }

    /// `object.{a, b}`: an object holding the listed properties.
    pub(super) fn eval_extraction(&mut self, object: NodeId, keys: NodeId) -> EvalResult {
        let object = self.eval(object)?;
        let names = self.key_list_names(keys)?;
        let entries = names
            .into_iter()
            .map(|name| {
                let value = object.prop(&self.ctx, &name)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok(Value::object(entries))
    }

    /// Elements of a list, tuple or concatenation, expanding spreads.
    fn eval_elements(&mut self, elements: &[NodeId]) -> Result<Vec<Value>, EvalError> {
        let ast = Arc::clone(&self.ast);
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match ast.kind(*element) {
                NodeKind::ElementSpreadElement { expr } => {
                    let spread = self.eval(*expr)?;
                    values.extend(spread.sequence_elements()?);
                }
                _ => values.push(self.eval(*element)?),
            }
        }
        Ok(values)
    }

    /// Properties of an object or record literal: named entries plus the
    /// values of unkeyed properties.
    fn eval_properties(
        &mut self,
        properties: &[NodeId],
        spread_elements: &[NodeId],
    ) -> Result<(Vec<(String, Value)>, Vec<Value>), EvalError> {
        let ast = Arc::clone(&self.ast);
        let mut entries = Vec::with_capacity(properties.len());
        let mut unkeyed = Vec::new();
        for property in properties {
            let NodeKind::ObjectProperty {
                key,
                type_annotation,
                value,
            } = ast.kind(*property)
            else {
                continue;
            };
            let value = self.eval(*value)?;
            if let Some(annotation) = type_annotation {
                self.check_annotation(*annotation, &value)?;
            }
            match key {
                Some(key) => entries.push((self.name_of(*key)?, value)),
                None => unkeyed.push(value),
            }
        }
        for spread in spread_elements {
            let NodeKind::PropertySpreadElement { extraction } = ast.kind(*spread) else {
                continue;
            };
            match self.eval(*extraction)? {
                Value::Object(object) => entries.extend(object.entries()),
                Value::Record(record) => entries.extend(record.entries()),
                other => return Err(errors::type_mismatch("object", other.type_name())),
            }
        }
        Ok((entries, unkeyed))
    }

    /// Fail unless `value` matches the pattern `annotation` evaluates to.
    pub(super) fn check_annotation(&mut self, annotation: NodeId, value: &Value) -> Result<(), EvalError> {
        let pattern = self.eval_pattern(annotation)?;
        if pattern.test(&self.ctx, value) {
            Ok(())
        } else {
            Err(errors::type_mismatch(&pattern.to_string(), value.type_name()))
        }
    }

    /// Object literal: unkeyed values become implicit elements, except
    /// reception handlers (registered on the object) and lifetime jobs
    /// (started with the object as `self`).
    pub(super) fn eval_object_literal(
        &mut self,
        properties: &[NodeId],
        meta_properties: &[NodeId],
        spread_elements: &[NodeId],
    ) -> EvalResult {
        let (mut entries, unkeyed) = self.eval_properties(properties, spread_elements)?;

        let mut implicit = Vec::new();
        let mut handlers = Vec::new();
        let mut jobs = Vec::new();
        for value in unkeyed {
            match value {
                Value::ReceptionHandler(handler) => handlers.push(handler),
                Value::LifetimeJob(job) => jobs.push(job),
                other => implicit.push(other),
            }
        }
        if !implicit.is_empty() {
            entries.push((IMPLICIT_PROP_NAME.to_string(), Value::list(implicit)));
        }

        let object = Value::object(entries);
        if let Value::Object(handle) = &object {
            for handler in handlers {
                handle.add_reception_handler(handler);
            }
        }

        let ast = Arc::clone(&self.ast);
        for meta in meta_properties {
            let NodeKind::ObjectMetaProperty { initialization, .. } = ast.kind(*meta) else {
                continue;
            };
            let NodeKind::InitializationBlock { statements } = ast.kind(*initialization) else {
                continue;
            };
            let previous = self.self_value.replace(object.clone());
            let result = self.eval_statements(statements);
            self.self_value = previous;
            result?;
        }

        if !jobs.is_empty() {
            object.share(&self.ctx)?;
            for job in jobs {
                self.start_lifetime_job(&job, &object)?;
            }
        }
        Ok(object)
    }

    /// Record literal; every value must be immutable.
    pub(super) fn eval_record_literal(
        &mut self,
        properties: &[NodeId],
        spread_elements: &[NodeId],
    ) -> EvalResult {
        let (mut entries, unkeyed) = self.eval_properties(properties, spread_elements)?;
        if !unkeyed.is_empty() {
            entries.push((IMPLICIT_PROP_NAME.to_string(), Value::tuple(unkeyed)));
        }
        if let Some((name, value)) = entries.iter().find(|(_, value)| value.is_mutable()) {
            return Err(errors::invalid_argument(format!(
                "records can only contain immutable values: .{name} is a(n) {}",
                value.type_name()
            )));
        }
        Ok(Value::record(entries))
    }

    /// List literal; `[]int` style annotations produce typed lists.
    pub(super) fn eval_list_literal(
        &mut self,
        elements: &[NodeId],
        type_annotation: Option<NodeId>,
    ) -> EvalResult {
        let values = self.eval_elements(elements)?;
        let Some(annotation) = type_annotation else {
            return Ok(Value::list(values));
        };
        if let NodeKind::PatternIdentifierLiteral { name, .. } = self.ast.kind(annotation) {
            if let Some(kind) = ListElementKind::from_pattern_name(name) {
                return Value::typed_list(kind, values);
            }
        }
        for value in &values {
            self.check_annotation(annotation, value)?;
        }
        Ok(Value::list(values))
    }

    /// Tuple literal; every element must be immutable.
    pub(super) fn eval_tuple_literal(
        &mut self,
        elements: &[NodeId],
        type_annotation: Option<NodeId>,
    ) -> EvalResult {
        let values = self.eval_elements(elements)?;
        if let Some(mutable) = values.iter().find(|value| value.is_mutable()) {
            return Err(errors::invalid_argument(format!(
                "tuples can only contain immutable values, not a(n) {}",
                mutable.type_name()
            )));
        }
        if let Some(annotation) = type_annotation {
            for value in &values {
                self.check_annotation(annotation, value)?;
            }
        }
        Ok(Value::tuple(values))
    }

    pub(super) fn eval_dictionary_literal(&mut self, entries: &[NodeId]) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let mut pairs = Vec::with_capacity(entries.len());
        for entry in entries {
            let NodeKind::DictionaryEntry { key, value } = ast.kind(*entry) else {
                continue;
            };
            let key = self.eval(*key)?;
            let value = self.eval(*value)?;
            pairs.push((key, value));
        }
        Ok(Value::dictionary(pairs))
    }

    pub(super) fn eval_treedata(&mut self, root: NodeId, children: &[NodeId]) -> EvalResult {
        let root = self.eval(root)?;
        let children = children
            .iter()
            .map(|child| self.treedata_entry(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::treedata(Treedata::new(root, children)))
    }

    fn treedata_entry(&mut self, node: NodeId) -> Result<TreedataEntry, EvalError> {
        let ast = Arc::clone(&self.ast);
        let NodeKind::TreedataEntry { value, children } = ast.kind(node) else {
            return Err(errors::type_mismatch("treedata entry", ast.kind(node).name()));
        };
        let value = self.eval(*value)?;
        let children = children
            .iter()
            .map(|child| self.treedata_entry(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TreedataEntry::new(value, children))
    }

    /// `concat a b ...` over strings, byte slices or tuples.
    pub(super) fn eval_concatenation(&mut self, elements: &[NodeId]) -> EvalResult {
        let values = self.eval_elements(elements)?;
        match values.first() {
            None => Err(errors::invalid_argument("nothing to concatenate")),
            Some(Value::ByteSlice(_)) => {
                let mut bytes = Vec::new();
                for value in &values {
                    let Value::ByteSlice(slice) = value else {
                        return Err(errors::type_mismatch("byte slice", value.type_name()));
                    };
                    bytes.extend(slice.to_vec());
                }
                Ok(Value::byte_slice(bytes))
            }
            Some(Value::Tuple(_)) => {
                let mut items = Vec::new();
                for value in &values {
                    let Value::Tuple(tuple) = value else {
                        return Err(errors::type_mismatch("tuple", value.type_name()));
                    };
                    items.extend(tuple.items().iter().cloned());
                }
                Ok(Value::tuple(items))
            }
            Some(first) if first.is_string_like() => {
                let mut text = String::new();
                for value in &values {
                    let part = value
                        .as_str()
                        .ok_or_else(|| errors::type_mismatch("string-like value", value.type_name()))?;
                    text.push_str(part);
                }
                Ok(Value::str(text))
            }
            Some(other) => Err(errors::type_mismatch(
                "string-like value, byte slice or tuple",
                other.type_name(),
            )),
        }
    }

    /// Pattern a node evaluates to; plain values become exact-value patterns.
    pub(super) fn eval_pattern(&mut self, node: NodeId) -> Result<Heap<Pattern>, EvalError> {
        let value = self.eval(node)?;
        Ok(Pattern::from_value(&value))
    }
}
