//! Pattern literals and definitions.

use std::sync::Arc;

use inox_core::errors::{self, EvalError};
use inox_core::pattern::{
    ListPattern, NamedSegmentPathPattern, ObjectPattern, ObjectPatternEntry, PathSegment,
    PatternNamespace, TuplePattern,
};
use inox_core::value::Namespace;
use inox_core::{EvalResult, Heap, Pattern, StringPattern, Value};
use inox_ir::{NodeId, NodeKind, PatternQuantifier};

use super::Interpreter;

impl Interpreter {
    pub(super) fn named_pattern(&self, name: &str) -> EvalResult {
        self.ctx
            .resolve_named_pattern(name)
            .map(Value::Pattern)
            .ok_or_else(|| errors::undeclared_pattern(name))
    }

    /// A pattern namespace, as a namespace of patterns.
    pub(super) fn pattern_namespace(&self, name: &str) -> EvalResult {
        let namespace = self
            .ctx
            .resolve_pattern_namespace(name)
            .ok_or_else(|| errors::undeclared_pattern_namespace(name))?;
        let members = namespace
            .members()
            .iter()
            .map(|(member, pattern)| (member.clone(), Value::Pattern(pattern.clone())))
            .collect();
        Ok(Value::namespace(Namespace::new(name, members)))
    }

    pub(super) fn pattern_namespace_member(&self, namespace: NodeId, member: NodeId) -> EvalResult {
        let NodeKind::PatternNamespaceIdentifierLiteral(name) = self.ast.kind(namespace) else {
            return Err(errors::type_mismatch(
                "pattern namespace",
                self.ast.kind(namespace).name(),
            ));
        };
        let member = self.name_of(member)?;
        let resolved = self
            .ctx
            .resolve_pattern_namespace(name)
            .ok_or_else(|| errors::undeclared_pattern_namespace(name))?;
        resolved
            .get(&member)
            .cloned()
            .map(Value::Pattern)
            .ok_or_else(|| errors::undeclared_pattern(&format!("{name}.{member}")))
    }

    pub(super) fn eval_optional_pattern(&mut self, pattern: NodeId) -> EvalResult {
        let inner = self.eval_pattern(pattern)?;
        Ok(Value::pattern(Pattern::optional(&self.ctx, inner)?))
    }

    pub(super) fn eval_named_segment_path_pattern(&mut self, slices: &[NodeId]) -> EvalResult {
        let segments = slices
            .iter()
            .filter_map(|slice| match self.ast.kind(*slice) {
                NodeKind::PathPatternSlice(text) => Some(PathSegment::Static(text.clone())),
                NodeKind::NamedPathSegment(name) => Some(PathSegment::Named(name.clone())),
                _ => None,
            })
            .collect();
        Ok(Value::pattern(Pattern::NamedSegmentPath(
            NamedSegmentPathPattern::new(segments),
        )))
    }

    /// Object and record patterns; spreads copy the entries of other object
    /// patterns.
    pub(super) fn eval_object_pattern(
        &mut self,
        properties: &[NodeId],
        spread_elements: &[NodeId],
        inexact: bool,
        record: bool,
    ) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let mut entries = Vec::with_capacity(properties.len());
        for spread in spread_elements {
            let NodeKind::PatternPropertySpreadElement { expr } = ast.kind(*spread) else {
                continue;
            };
            let spread = self.eval_pattern(*expr)?;
            match &*spread {
                Pattern::Object(pattern) | Pattern::Record(pattern) => {
                    entries.extend(pattern.entries().iter().cloned());
                }
                other => return Err(errors::type_mismatch("object pattern", &other.to_string())),
            }
        }
        for property in properties {
            let NodeKind::ObjectPatternProperty {
                key,
                value,
                optional,
            } = ast.kind(*property)
            else {
                continue;
            };
            let name = self.name_of(*key)?;
            let pattern = self.eval_pattern(*value)?;
            entries.retain(|entry: &ObjectPatternEntry| entry.name != name);
            entries.push(ObjectPatternEntry {
                name,
                pattern,
                optional: *optional,
            });
        }
        let pattern = ObjectPattern::new(entries, inexact);
        Ok(Value::pattern(if record {
            Pattern::Record(pattern)
        } else {
            Pattern::Object(pattern)
        }))
    }

    pub(super) fn eval_sequence_pattern(
        &mut self,
        elements: &[NodeId],
        general_element: Option<NodeId>,
        tuple: bool,
    ) -> EvalResult {
        if let Some(general) = general_element {
            let element = self.eval_pattern(general)?;
            return Ok(Value::pattern(if tuple {
                Pattern::Tuple(TuplePattern::of(element))
            } else {
                Pattern::List(ListPattern::of(element))
            }));
        }
        let elements = elements
            .iter()
            .map(|element| self.eval_pattern(*element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::pattern(if tuple {
            Pattern::Tuple(TuplePattern::exact(elements))
        } else {
            Pattern::List(ListPattern::exact(elements))
        }))
    }

    pub(super) fn eval_option_pattern(&mut self, name: &str, value: NodeId) -> EvalResult {
        let value = self.eval_pattern(value)?;
        Ok(Value::pattern(Pattern::Option {
            name: name.to_string(),
            value,
        }))
    }

    pub(super) fn eval_pattern_union(&mut self, cases: &[NodeId]) -> EvalResult {
        let cases = cases
            .iter()
            .map(|case| self.eval_pattern(*case))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::pattern(Pattern::union(cases)))
    }

    pub(super) fn eval_pattern_call(&mut self, callee: NodeId, arguments: &[NodeId]) -> EvalResult {
        let callee = self.eval_pattern(callee)?;
        let args = arguments
            .iter()
            .map(|argument| self.eval(*argument))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::pattern(callee.call(&self.ctx, &args)?))
    }

    /// `pattern name = ...` registers the pattern in the context.
    pub(super) fn eval_pattern_definition(&mut self, left: NodeId, right: NodeId) -> EvalResult {
        let NodeKind::PatternIdentifierLiteral { name, .. } = self.ast.kind(left).clone() else {
            return Err(errors::type_mismatch("pattern identifier", self.ast.kind(left).name()));
        };
        let pattern = self.eval_pattern(right)?;
        tracing::debug!(pattern = %name, "pattern defined");
        self.ctx.add_named_pattern(name, pattern)?;
        Ok(Value::Nil)
    }

    /// `pnamespace name. = {...}`: every property becomes a member pattern.
    pub(super) fn eval_pattern_namespace_definition(&mut self, left: NodeId, right: NodeId) -> EvalResult {
        let NodeKind::PatternNamespaceIdentifierLiteral(name) = self.ast.kind(left).clone() else {
            return Err(errors::type_mismatch(
                "pattern namespace identifier",
                self.ast.kind(left).name(),
            ));
        };
        let members = match self.eval(right)? {
            Value::Object(object) => object.entries(),
            Value::Record(record) => record.entries(),
            other => return Err(errors::type_mismatch("object", other.type_name())),
        };
        let members = members
            .into_iter()
            .map(|(member, value)| (member, Pattern::from_value(&value)))
            .collect();
        self.ctx
            .add_pattern_namespace(name.as_str(), PatternNamespace::new(name.as_str(), members).shared())?;
        Ok(Value::Nil)
    }

    /// Sequence of string pattern elements with optional quantifiers and
    /// group names.
    pub(super) fn eval_string_pattern_piece(&mut self, elements: &[NodeId]) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let mut patterns = Vec::with_capacity(elements.len());
        let mut group_names = Vec::with_capacity(elements.len());
        for element in elements {
            let NodeKind::PatternPieceElement {
                quantifier,
                exact_count,
                expr,
                group_name,
            } = ast.kind(*element)
            else {
                continue;
            };
            let mut pattern = self.eval_string_pattern(*expr)?;
            if *quantifier != PatternQuantifier::ExactlyOne {
                let count = usize::try_from(*exact_count).unwrap_or(usize::MAX);
                pattern = StringPattern::repeated(*quantifier, count, pattern).shared();
            }
            patterns.push(pattern);
            group_names.push(group_name.clone());
        }
        let sequence = StringPattern::sequence(patterns, group_names)?;
        Ok(Value::pattern(Pattern::string(sequence)))
    }

    /// String pattern an element of a complex string pattern evaluates to.
    ///
    /// Named patterns not defined yet resolve lazily, which allows recursive
    /// definitions.
    fn eval_string_pattern(&mut self, node: NodeId) -> Result<Heap<StringPattern>, EvalError> {
        if let NodeKind::PatternIdentifierLiteral { name, .. } = self.ast.kind(node) {
            if self.ctx.resolve_named_pattern(name).is_none() {
                return Ok(StringPattern::dynamic(name.as_str(), &self.ctx).shared());
            }
        }
        match self.eval(node)? {
            Value::Str(s) => Ok(StringPattern::exact(&*s).shared()),
            Value::Rune(c) => Ok(StringPattern::exact(c.to_string()).shared()),
            Value::RuneRange(range) => Ok(StringPattern::rune_range(range).shared()),
            Value::Pattern(pattern) => pattern
                .string_pattern()
                .ok_or_else(|| errors::type_mismatch("string pattern", &pattern.to_string())),
            other => Err(errors::type_mismatch("string pattern", other.type_name())),
        }
    }
}
