//! Functions, calls, `must`, pipelines and mappings.
//!
//! # Calling Convention
//!
//! Inox functions run in a call frame (see [`Interpreter::call_frame`]) on
//! the AST they were created from, with their captured locals bound first
//! and then their parameters. A variadic function collects the arguments
//! past its fixed parameters in a list. Host functions marked fallible turn
//! their errors into error values unless the call is a `must` call.

use std::sync::Arc;

use inox_core::errors::{self, EvalError};
use inox_core::value::{InoxFunction, Mapping};
use inox_core::{EvalResult, Heap, Permission, PermissionKind, Value};
use inox_ir::{NodeId, NodeKind};

use super::{IterationChange, Interpreter, PIPE_VARIABLE};

impl Interpreter {
    /// Function value of a function expression, capturing the locals it
    /// lists.
    pub(super) fn make_function(&mut self, node: NodeId, name: Option<String>) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let NodeKind::FunctionExpression {
            captured_locals, ..
        } = ast.kind(node)
        else {
            return Err(errors::type_mismatch("function expression", ast.kind(node).name()));
        };
        let mut locals = Vec::with_capacity(captured_locals.len());
        for local in captured_locals {
            let local = self.name_of(*local)?;
            let value = self
                .env
                .get(&local)
                .ok_or_else(|| errors::undeclared_variable(&local))?;
            locals.push((local, value));
        }
        let mut function = InoxFunction::new(ast, node);
        function.captured_locals = locals;
        if let Some(name) = name {
            function = function.with_name(name);
        }
        Ok(Value::inox_function(function))
    }

    pub(super) fn make_mapping(&self, node: NodeId) -> Value {
        Value::mapping(Mapping {
            ast: Arc::clone(&self.ast),
            node,
            captured_globals: Vec::new(),
        })
    }

    /// Callee looked up by name: calling a global requires `use` permission.
    fn callee_by_name(&self, name: &str) -> EvalResult {
        if let Some(local) = self.env.get(name) {
            return Ok(local);
        }
        self.ctx
            .check_has_permission(&Permission::global_var(PermissionKind::USE, name))?;
        self.global(name)
            .ok_or_else(|| errors::undeclared_variable(name))
    }

    /// Callee and the value bound to `self` when it is a method.
    fn eval_callee(&mut self, callee: NodeId) -> Result<(Value, Option<Value>), EvalError> {
        let ast = Arc::clone(&self.ast);
        match ast.kind(callee) {
            NodeKind::IdentifierLiteral(name) => Ok((self.callee_by_name(name)?, None)),
            NodeKind::MemberExpression { left, property, .. } => {
                let receiver = self.eval(*left)?;
                let name = self.name_of(*property)?;
                let method = self.member(&receiver, &name, false)?;
                Ok((method, Some(receiver).filter(|r| matches!(r, Value::Object(_)))))
            }
            NodeKind::IdentifierMemberExpression {
                left,
                property_names,
            } => {
                let mut receiver = self.eval(*left)?;
                let mut method = receiver.clone();
                for property in property_names {
                    receiver = method;
                    let name = self.name_of(*property)?;
                    method = self.member(&receiver, &name, false)?;
                }
                Ok((method, Some(receiver).filter(|r| matches!(r, Value::Object(_)))))
            }
            NodeKind::DoubleColonExpression { left, element } => {
                let receiver = self.eval(*left)?;
                let name = self.name_of(*element)?;
                let method = self.extension_member(callee, &name)?;
                Ok((method, Some(receiver)))
            }
            _ => Ok((self.eval(callee)?, None)),
        }
    }

    fn eval_arguments(&mut self, arguments: &[NodeId]) -> Result<Vec<Value>, EvalError> {
        let ast = Arc::clone(&self.ast);
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match ast.kind(*argument) {
                NodeKind::SpreadArgument { expr } => {
                    let spread = self.eval(*expr)?;
                    args.extend(spread.sequence_elements()?);
                }
                _ => args.push(self.eval(*argument)?),
            }
        }
        Ok(args)
    }

    pub(super) fn eval_call(
        &mut self,
        node: NodeId,
        callee: NodeId,
        arguments: &[NodeId],
        must: bool,
    ) -> EvalResult {
        let (callee, receiver) = self.eval_callee(callee)?;
        let args = self.eval_arguments(arguments)?;
        let is_inox = matches!(callee, Value::InoxFunction(_));
        self.invoke(&callee, args, receiver, must).map_err(|mut error| {
            if is_inox && error.has_position() {
                error.positions.push_outer(self.ast.position(node));
            }
            error
        })
    }

    /// Call `callee`, applying `must` semantics to the result.
    fn invoke(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        receiver: Option<Value>,
        must: bool,
    ) -> EvalResult {
        let result = match callee {
            Value::HostFunction(function) => match function.call(&self.ctx, args) {
                Err(error) if function.fallible && !must && !error.is_cancellation() => {
                    Ok(Value::from_eval_error(&error))
                }
                other => other,
            },
            other => self.call_value(other, args, receiver),
        }?;
        if must {
            apply_must(result)
        } else {
            Ok(result)
        }
    }

    /// Call any callable value.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, receiver: Option<Value>) -> EvalResult {
        match callee {
            Value::InoxFunction(function) => self.call_inox_function(function, args, receiver),
            Value::HostFunction(function) => function.call(&self.ctx, args),
            Value::Pattern(pattern) => Ok(Value::pattern(pattern.call(&self.ctx, &args)?)),
            Value::Dynamic(dynamic) => {
                let resolved = dynamic.resolve(&self.ctx)?;
                self.call_value(&resolved, args, receiver)
            }
            other => Err(errors::not_callable(other.type_name())),
        }
    }

    fn call_inox_function(
        &mut self,
        function: &Heap<InoxFunction>,
        args: Vec<Value>,
        receiver: Option<Value>,
    ) -> EvalResult {
        let ast = Arc::clone(&function.ast);
        let NodeKind::FunctionExpression {
            parameters,
            return_type,
            body,
            is_body_expression,
            is_variadic,
            ..
        } = ast.kind(function.node)
        else {
            return Err(errors::not_callable("function"));
        };

        let fixed = if *is_variadic {
            parameters.len().saturating_sub(1)
        } else {
            parameters.len()
        };
        let arity_ok = if *is_variadic {
            args.len() >= fixed
        } else {
            args.len() == fixed
        };
        if !arity_ok {
            return Err(errors::invalid_argument(format!(
                "{} expects {}{fixed} argument(s), got {}",
                function.name.as_deref().unwrap_or("function"),
                if *is_variadic { "at least " } else { "" },
                args.len()
            )));
        }

        tracing::trace!(
            function = function.name.as_deref().unwrap_or("<anonymous>"),
            args = args.len(),
            "calling inox function"
        );
        let mut scoped = self.call_frame(
            Arc::clone(&ast),
            receiver,
            function.captured_globals.clone(),
        )?;
        for (name, value) in &function.captured_locals {
            scoped.env.set(name.as_str(), value.clone());
        }

        let mut args = args.into_iter();
        for (index, parameter) in parameters.iter().enumerate() {
            let NodeKind::FunctionParameter {
                var,
                type_annotation,
            } = ast.kind(*parameter)
            else {
                continue;
            };
            let name = scoped.name_of(*var)?;
            let value = if *is_variadic && index == fixed {
                Value::list(args.by_ref().collect())
            } else {
                args.next().unwrap_or(Value::Nil)
            };
            if let Some(annotation) = type_annotation {
                scoped.check_annotation(*annotation, &value)?;
            }
            scoped.env.set(name, value);
        }

        let body_value = scoped.eval(*body)?;
        let result = if *is_body_expression {
            body_value
        } else {
            match std::mem::take(&mut scoped.iteration_change) {
                IterationChange::Return(value) => value,
                _ => Value::Nil,
            }
        };
        if let Some(return_type) = return_type {
            scoped.check_annotation(*return_type, &result)?;
        }
        Ok(result)
    }

    /// `a | f | g`: each stage sees the previous result as `$`. Stages that
    /// are bare identifiers are called with `$` as their only argument, as
    /// `must` calls. The caller's `$` is restored afterwards.
    pub(super) fn eval_pipeline(&mut self, stages: &[NodeId]) -> EvalResult {
        let saved = self.env.get(PIPE_VARIABLE);
        let result = self.eval_pipeline_stages(stages);
        match saved {
            Some(saved) => self.env.set(PIPE_VARIABLE, saved),
            None => {
                self.env.remove(PIPE_VARIABLE);
            }
        }
        result
    }

    fn eval_pipeline_stages(&mut self, stages: &[NodeId]) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        let Some((first, rest)) = stages.split_first() else {
            return Ok(Value::Nil);
        };
        let mut piped = self.eval(*first)?;
        for stage in rest {
            self.env.set(PIPE_VARIABLE, piped);
            piped = match ast.kind(*stage) {
                NodeKind::IdentifierLiteral(_) | NodeKind::IdentifierMemberExpression { .. } => {
                    let (callee, receiver) = self.eval_callee(*stage)?;
                    let argument = self
                        .env
                        .get(PIPE_VARIABLE)
                        .unwrap_or(Value::Nil);
                    self.invoke(&callee, vec![argument], receiver, true)?
                }
                _ => self.eval(*stage)?,
            };
        }
        Ok(piped)
    }

    /// Value a mapping associates with `key`, or nil.
    ///
    /// Static entries match keys equal to their key, or matched by it when
    /// the key is a pattern. Dynamic entries bind the key (and the match
    /// groups) before computing the value.
    pub fn compute_mapping(&mut self, mapping: &Mapping, key: &Value) -> EvalResult {
        let ast = Arc::clone(&mapping.ast);
        let NodeKind::MappingExpression { entries } = ast.kind(mapping.node) else {
            return Err(errors::type_mismatch("mapping", ast.kind(mapping.node).name()));
        };
        let mut scoped = self.call_frame(Arc::clone(&ast), None, mapping.captured_globals.clone())?;
        for entry in entries {
            match ast.kind(*entry) {
                NodeKind::StaticMappingEntry {
                    key: entry_key,
                    value,
                } => {
                    let matched = match scoped.eval(*entry_key)? {
                        Value::Pattern(pattern) => pattern.test(&scoped.ctx, key),
                        other => other.equals(key),
                    };
                    if matched {
                        return scoped.eval(*value);
                    }
                }
                NodeKind::DynamicMappingEntry {
                    key: entry_key,
                    key_var,
                    group_matching_variable,
                    value_computation,
                } => {
                    let pattern = scoped.eval_pattern(*entry_key)?;
                    if !pattern.test(&scoped.ctx, key) {
                        continue;
                    }
                    let key_var = scoped.name_of(*key_var)?;
                    scoped.env.set(key_var, key.clone());
                    if let Some(variable) = group_matching_variable {
                        let groups = pattern
                            .match_groups(&scoped.ctx, key)?
                            .unwrap_or(Value::Nil);
                        let variable = scoped.name_of(*variable)?;
                        scoped.env.set(variable, groups);
                    }
                    return scoped.eval(*value_computation);
                }
                _ => {}
            }
        }
        Ok(Value::Nil)
    }
}

/// `must` semantics: an error value (or a tuple ending with one) becomes an
/// error; a tuple ending with nil loses that element.
fn apply_must(value: Value) -> EvalResult {
    match value {
        Value::Error(error) => Err(errors::host_error(error.text.clone())),
        Value::Tuple(tuple) => {
            let items = tuple.items();
            match items.last() {
                Some(Value::Error(error)) => Err(errors::host_error(error.text.clone())),
                Some(Value::Nil) if items.len() == 2 => Ok(items[0].clone()),
                Some(Value::Nil) => Ok(Value::tuple(items[..items.len() - 1].to_vec())),
                _ => Ok(Value::Tuple(tuple.clone())),
            }
        }
        other => Ok(other),
    }
}
