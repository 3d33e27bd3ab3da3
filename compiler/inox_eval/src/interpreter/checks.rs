//! Assertions, runtime type checks and permission dropping.

use inox_core::errors::{self, AssertionData};
use inox_core::{to_compact_string, EvalResult, Value};
use inox_ir::{BinaryOp, NodeId, NodeKind};

use super::Interpreter;
use crate::manifest::permissions_from_listing;

impl Interpreter {
    /// `assert expr`. The values of the subexpressions are recorded so that
    /// a failure can show them.
    pub(super) fn eval_assertion(&mut self, node: NodeId, expr: NodeId) -> EvalResult {
        let previous = self.assertion.replace(AssertionData {
            assertion: Some(node),
            intermediary_values: Vec::new(),
        });
        let result = self.eval(expr);
        let data = std::mem::replace(&mut self.assertion, previous).unwrap_or_default();
        let value = result?;

        if value.as_bool() == Some(true) {
            return Ok(Value::Nil);
        }

        let message = match self.ast.kind(expr) {
            NodeKind::BinaryExpression {
                operator: BinaryOp::Equal,
                left,
                right,
            } => match (data.value_of(*left), data.value_of(*right)) {
                (Some(left), Some(right)) => format!(
                    "expected {} to be equal to {}",
                    to_compact_string(left),
                    to_compact_string(right)
                ),
                _ => self.assertion_source_message(expr),
            },
            _ => self.assertion_source_message(expr),
        };

        let mut error = errors::assertion_failed(message);
        error.assertion_data = Some(Box::new(data));
        error.is_test_assertion = self.module.kind.is_test();
        Err(error)
    }

    fn assertion_source_message(&self, expr: NodeId) -> String {
        match self.ast.text(expr) {
            Some(text) => format!("assertion is false: {text}"),
            None => "assertion is false".to_string(),
        }
    }

    /// `expr!`: the symbolic checker decides whether the value has the
    /// expected type. Without hooks the check passes.
    pub(super) fn eval_runtime_type_check(&mut self, node: NodeId, expr: NodeId) -> EvalResult {
        let value = self.eval(expr)?;
        if let Some(hooks) = &self.config.hooks {
            if !hooks.check_runtime_type(node, &value) {
                return Err(errors::type_check_failed(&to_compact_string(&value)));
            }
        }
        Ok(value)
    }

    /// `drop-perms {...}`: removes the listed permissions from the context.
    pub(super) fn eval_permission_dropping(&mut self, object: NodeId) -> EvalResult {
        let listing = self.eval(object)?;
        let dropped = permissions_from_listing(&listing)?;
        tracing::debug!(count = dropped.len(), "dropping permissions");
        self.ctx.drop_permissions(&dropped);
        Ok(Value::Nil)
    }
}
