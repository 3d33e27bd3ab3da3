//! Declarations and assignments.

use std::sync::Arc;

use inox_core::errors::{self, EvalError};
use inox_core::{EvalResult, Permission, PermissionKind, Value};
use inox_ir::{AssignmentOp, NodeId, NodeKind};

use super::Interpreter;
use crate::operators::evaluate_binary;

impl Interpreter {
    /// `const (...)`: module constants, passed on to spawned lthreads.
    pub(super) fn eval_global_constants(&mut self, declarations: &[NodeId]) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        for declaration in declarations {
            let NodeKind::GlobalConstantDeclaration { left, right } = ast.kind(*declaration) else {
                continue;
            };
            let name = self.name_of(*left)?;
            let value = self.eval(*right)?;
            self.globals.define_start_constant(name, value);
        }
        Ok(Value::Nil)
    }

    /// `var` and `globalvar` declarations, with optional type annotations.
    pub(super) fn eval_variable_declarations(
        &mut self,
        declarations: &[NodeId],
        global: bool,
    ) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        for declaration in declarations {
            let (NodeKind::LocalVariableDeclaration {
                left,
                type_annotation,
                right,
            }
            | NodeKind::GlobalVariableDeclaration {
                left,
                type_annotation,
                right,
            }) = ast.kind(*declaration)
            else {
                continue;
            };
            let name = self.name_of(*left)?;
            let value = self.eval_optional(*right)?;
            if let Some(annotation) = type_annotation {
                self.check_annotation(*annotation, &value)?;
            }
            if global {
                self.ctx
                    .check_has_permission(&Permission::global_var(PermissionKind::CREATE, &name))?;
                self.globals.define(name, value);
            } else {
                self.env.set(name, value);
            }
        }
        Ok(Value::Nil)
    }

    /// Define the function declared by `fn name(...)`. Declarations are
    /// hoisted, so the second visit of the same declaration is a no-op.
    pub(super) fn declare_function(&mut self, name: NodeId, function: NodeId) -> Result<(), EvalError> {
        let name = self.name_of(name)?;
        if let Some(Value::InoxFunction(existing)) = self.globals.get(&name) {
            if existing.node == function && Arc::ptr_eq(&existing.ast, &self.ast) {
                return Ok(());
            }
        }
        let value = self.make_function(function, Some(name.clone()))?;
        self.globals.define_constant(name, value);
        Ok(())
    }

    /// `left = right` and `left op= right`. The target is evaluated before
    /// the right operand.
    pub(super) fn eval_assignment(
        &mut self,
        left: NodeId,
        right: NodeId,
        operator: AssignmentOp,
    ) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        match ast.kind(left) {
            NodeKind::IdentifierLiteral(name) | NodeKind::Variable(name) => {
                let current = self.env.get(name);
                let value = self.assigned_value(operator, current, right, name)?;
                self.env.set(name.as_str(), value);
            }
            NodeKind::GlobalVariable(name) => {
                let exists = self.globals.contains(name);
                let kind = if exists {
                    PermissionKind::UPDATE
                } else {
                    PermissionKind::CREATE
                };
                self.ctx
                    .check_has_permission(&Permission::global_var(kind, name))?;
                let current = self.globals.get(name);
                let value = self.assigned_value(operator, current, right, name)?;
                self.globals.set(name, value)?;
            }
            NodeKind::MemberExpression { left, property, .. } => {
                let object = self.eval(*left)?;
                let name = self.name_of(*property)?;
                self.assign_property(&object, &name, operator, right)?;
            }
            NodeKind::ComputedMemberExpression { left, property, .. } => {
                let object = self.eval(*left)?;
                let name = self.eval(*property)?;
                let name = name
                    .as_str()
                    .ok_or_else(|| errors::type_mismatch("string", name.type_name()))?
                    .to_string();
                self.assign_property(&object, &name, operator, right)?;
            }
            NodeKind::IdentifierMemberExpression {
                left,
                property_names,
            } => {
                let Some((last, path)) = property_names.split_last() else {
                    return Err(errors::invalid_argument("empty member chain"));
                };
                let mut object = self.eval(*left)?;
                for property in path {
                    let name = self.name_of(*property)?;
                    object = self.member(&object, &name, false)?;
                }
                let name = self.name_of(*last)?;
                self.assign_property(&object, &name, operator, right)?;
            }
            NodeKind::IndexExpression { indexed, index } => {
                let sequence = self.eval(*indexed)?;
                let index = self.eval_int(*index)?;
                let current = match operator.arithmetic() {
                    Some(_) => Some(sequence.at(index)?),
                    None => None,
                };
                let value = self.assigned_value(operator, current, right, "element")?;
                sequence.set_at(&self.ctx, index, value)?;
            }
            NodeKind::SliceExpression {
                indexed,
                start,
                end,
            } => {
                if operator != AssignmentOp::Assign {
                    return Err(errors::invalid_argument(format!(
                        "{} cannot be used on a slice",
                        operator.as_symbol()
                    )));
                }
                let sequence = self.eval(*indexed)?;
                let start = match start {
                    Some(start) => self.eval_int(*start)?,
                    None => 0,
                };
                let end = match end {
                    Some(end) => self.eval_int(*end)?,
                    None => i64::try_from(sequence.len()?).unwrap_or(i64::MAX),
                };
                let values = self.eval(right)?;
                sequence.set_slice(&self.ctx, start, end, &values)?;
            }
            other => {
                return Err(errors::invalid_argument(format!(
                    "a(n) {} cannot be assigned",
                    other.name()
                )))
            }
        }
        Ok(Value::Nil)
    }

    fn assign_property(
        &mut self,
        object: &Value,
        name: &str,
        operator: AssignmentOp,
        right: NodeId,
    ) -> Result<(), EvalError> {
        let current = match operator.arithmetic() {
            Some(_) => Some(object.prop(&self.ctx, name)?),
            None => None,
        };
        let value = self.assigned_value(operator, current, right, name)?;
        object.set_prop(&self.ctx, name, value)
    }

    /// Right operand, combined with the current value for `+=` and friends.
    fn assigned_value(
        &mut self,
        operator: AssignmentOp,
        current: Option<Value>,
        right: NodeId,
        target: &str,
    ) -> EvalResult {
        match operator.arithmetic() {
            None => self.eval(right),
            Some(op) => {
                let current = current.ok_or_else(|| errors::undeclared_variable(target))?;
                let right = self.eval(right)?;
                evaluate_binary(&self.ctx, op, &current, &right)
            }
        }
    }

    /// `assign a b = seq`: binds the leading elements of a sequence. A
    /// nillable assignment binds nil to the variables past the end.
    pub(super) fn eval_multi_assignment(
        &mut self,
        variables: &[NodeId],
        right: NodeId,
        nillable: bool,
    ) -> EvalResult {
        let sequence = self.eval(right)?;
        let elements = sequence.sequence_elements()?;
        if elements.len() < variables.len() && !nillable {
            return Err(errors::invalid_argument(format!(
                "not enough elements to assign: {} variables, {} elements",
                variables.len(),
                elements.len()
            )));
        }
        let mut elements = elements.into_iter();
        for variable in variables {
            let name = self.name_of(*variable)?;
            self.env.set(name, elements.next().unwrap_or(Value::Nil));
        }
        Ok(Value::Nil)
    }
}
