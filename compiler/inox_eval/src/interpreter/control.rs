//! Statement lists, conditionals, loops, walks, switch and match.

use std::sync::Arc;

use inox_core::errors::{self, EvalError};
use inox_core::value::{IteratorConfig, Stream, STREAM_ITERATION_WAIT_TIMEOUT};
use inox_core::{Context, DynamicValue, EvalErrorKind, EvalResult, Heap, Pattern, Value};
use inox_ir::{NodeId, NodeKind};

use super::{IterationChange, Interpreter};

/// Elements taken per iteration of a chunked `for` over a stream.
const STREAM_CHUNK_SIZE: usize = 32;

/// Parts of a `for` statement or expression.
pub(super) struct ForLoop {
    pub key_pattern: Option<NodeId>,
    pub key_index: Option<NodeId>,
    pub value_pattern: Option<NodeId>,
    pub value_elem: Option<NodeId>,
    pub iterated: NodeId,
    pub body: NodeId,
    pub chunked: bool,
}

/// What a loop does after its body ran.
enum LoopStep {
    Next,
    Exit,
}

/// Unlocks, on drop, the values locked since the guard was created.
struct LockedValues {
    ctx: Context,
    base: usize,
}

impl Drop for LockedValues {
    fn drop(&mut self) {
        while self.ctx.locked_value_count() > self.base {
            self.ctx.unlock_last_value();
        }
    }
}

impl Interpreter {
    /// Evaluate statements in order, stopping at the first pending change of
    /// control flow. Cancellation is checked before each statement.
    pub(super) fn eval_statements(&mut self, statements: &[NodeId]) -> Result<(), EvalError> {
        for statement in statements {
            self.ctx.check_not_done()?;
            self.eval(*statement)?;
            if !self.iteration_change.is_none() {
                break;
            }
        }
        Ok(())
    }

    pub(super) fn eval_if(
        &mut self,
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
        expression: bool,
    ) -> EvalResult {
        let condition = self.eval(test)?;
        if expression {
            if let Value::Dynamic(dynamic) = &condition {
                let consequent = self.eval(consequent)?;
                let alternate = self.eval_optional(alternate)?;
                return DynamicValue::conditional(&self.ctx, dynamic.clone(), consequent, alternate);
            }
        }
        let condition = condition
            .as_bool()
            .ok_or_else(|| errors::type_mismatch("boolean", condition.type_name()))?;
        if condition {
            self.eval(consequent)
        } else {
            self.eval_optional(alternate)
        }
    }

    fn bind_optional(&mut self, name: Option<NodeId>, value: Value) -> Result<(), EvalError> {
        if let Some(name) = name {
            let name = self.name_of(name)?;
            self.env.set(name, value);
        }
        Ok(())
    }

    /// Run a loop body and consume the change of control flow it left.
    ///
    /// `collected` receives the values of a `for` expression: yielded values,
    /// or the body's value when the body is an expression.
    fn run_loop_body(
        &mut self,
        body: NodeId,
        collected: Option<&mut Vec<Value>>,
    ) -> Result<LoopStep, EvalError> {
        let value = self.eval(body)?;
        let body_is_expression = !matches!(self.ast.kind(body), NodeKind::Block { .. });
        match std::mem::take(&mut self.iteration_change) {
            IterationChange::None => {
                if let Some(collected) = collected {
                    if body_is_expression {
                        collected.push(value);
                    }
                }
                Ok(LoopStep::Next)
            }
            IterationChange::Continue => Ok(LoopStep::Next),
            IterationChange::Break => Ok(LoopStep::Exit),
            IterationChange::Yield(yielded) if collected.is_some() => {
                if let Some(collected) = collected {
                    collected.push(yielded);
                }
                Ok(LoopStep::Next)
            }
            other => {
                self.iteration_change = other;
                Ok(LoopStep::Exit)
            }
        }
    }

    /// `for` statements and expressions. Expressions evaluate to the list of
    /// collected values.
    pub(super) fn eval_for(&mut self, for_loop: ForLoop, expression: bool) -> EvalResult {
        let iterated = self.eval(for_loop.iterated)?;
        let key_pattern = for_loop
            .key_pattern
            .map(|pattern| self.eval_pattern(pattern))
            .transpose()?;
        let value_pattern = for_loop
            .value_pattern
            .map(|pattern| self.eval_pattern(pattern))
            .transpose()?;
        let mut collected = Vec::new();

        if let Value::Stream(stream) = &iterated {
            self.iterate_stream(stream, &for_loop, key_pattern, value_pattern, expression, &mut collected)?;
        } else {
            if for_loop.chunked {
                return Err(errors::invalid_argument("chunked iteration requires a stream"));
            }
            let iterator = iterated.iterator(
                &self.ctx,
                IteratorConfig {
                    key_pattern,
                    value_pattern,
                },
            )?;
            while let Some((key, value)) = iterator.next(&self.ctx) {
                self.ctx.check_not_done()?;
                self.bind_optional(for_loop.key_index, key)?;
                self.bind_optional(for_loop.value_elem, value)?;
                let target = expression.then_some(&mut collected);
                if let LoopStep::Exit = self.run_loop_body(for_loop.body, target)? {
                    break;
                }
            }
        }

        Ok(if expression {
            Value::list(collected)
        } else {
            Value::Nil
        })
    }

    /// Iterate a stream until it ends, polling for cancellation between
    /// waits. Keys are element indexes.
    fn iterate_stream(
        &mut self,
        stream: &Heap<Stream>,
        for_loop: &ForLoop,
        key_pattern: Option<Heap<Pattern>>,
        value_pattern: Option<Heap<Pattern>>,
        expression: bool,
        collected: &mut Vec<Value>,
    ) -> Result<(), EvalError> {
        let mut index: i64 = 0;
        loop {
            self.ctx.check_not_done()?;
            let next = if for_loop.chunked {
                stream
                    .wait_next_chunk(&self.ctx, STREAM_CHUNK_SIZE, STREAM_ITERATION_WAIT_TIMEOUT)
                    .map(Value::list)
            } else {
                stream.wait_next(&self.ctx, STREAM_ITERATION_WAIT_TIMEOUT)
            };
            let value = match next {
                Ok(value) => value,
                Err(error) if matches!(error.kind, EvalErrorKind::WaitTimeout) => continue,
                Err(error) if matches!(error.kind, EvalErrorKind::StreamEnded) => break,
                Err(error) => return Err(error),
            };
            let key = Value::int(index);
            index += 1;
            let key_matches = key_pattern.as_ref().is_none_or(|p| p.test(&self.ctx, &key));
            let value_matches = value_pattern.as_ref().is_none_or(|p| p.test(&self.ctx, &value));
            if !key_matches || !value_matches {
                continue;
            }
            self.bind_optional(for_loop.key_index, key)?;
            self.bind_optional(for_loop.value_elem, value)?;
            let target = expression.then_some(&mut *collected);
            if let LoopStep::Exit = self.run_loop_body(for_loop.body, target)? {
                break;
            }
        }
        Ok(())
    }

    /// Depth-first walk of a treedata value; `prune` skips the children of
    /// the current entry.
    pub(super) fn eval_walk(
        &mut self,
        walked: NodeId,
        meta_ident: Option<NodeId>,
        entry_ident: NodeId,
        body: NodeId,
    ) -> EvalResult {
        let walked = self.eval(walked)?;
        let Value::Treedata(treedata) = &walked else {
            return Err(errors::type_mismatch("treedata", walked.type_name()));
        };
        let entry_name = self.name_of(entry_ident)?;
        let mut walker = treedata.walker();
        while let Some((entry, depth)) = walker.next() {
            self.ctx.check_not_done()?;
            self.env.set(entry_name.as_str(), entry);
            let depth = i64::try_from(depth).unwrap_or(i64::MAX);
            self.bind_optional(
                meta_ident,
                Value::record(vec![("depth".to_string(), Value::int(depth))]),
            )?;
            self.eval(body)?;
            match std::mem::take(&mut self.iteration_change) {
                IterationChange::None | IterationChange::Continue => {}
                IterationChange::Prune => walker.prune(),
                IterationChange::Break => break,
                other => {
                    self.iteration_change = other;
                    break;
                }
            }
        }
        Ok(Value::Nil)
    }

    /// `synchronized(values...) { ... }`: locks the mutable values for the
    /// duration of the block, releasing them in reverse order.
    pub(super) fn eval_synchronized(&mut self, values: &[NodeId], block: NodeId) -> EvalResult {
        let _locked = LockedValues {
            ctx: self.ctx.clone(),
            base: self.ctx.locked_value_count(),
        };
        for value in values {
            let value = self.eval(*value)?;
            if value.is_mutable() {
                self.ctx.lock_value(&value)?;
            }
        }
        self.eval(block)
    }

    /// `switch`: the first case value equal to the discriminant selects its
    /// body.
    pub(super) fn eval_switch(
        &mut self,
        discriminant: NodeId,
        cases: &[NodeId],
        default_cases: &[NodeId],
    ) -> EvalResult {
        let discriminant = self.eval(discriminant)?;
        let ast = Arc::clone(&self.ast);
        for case in cases {
            let NodeKind::SwitchCase { values, body } = ast.kind(*case) else {
                continue;
            };
            for value in values {
                if self.eval(*value)?.equals(&discriminant) {
                    return self.eval(*body);
                }
            }
        }
        self.eval_default_case(default_cases)
    }

    /// `match`: the first case pattern matching the discriminant selects its
    /// body; plain values match by equality.
    pub(super) fn eval_match(
        &mut self,
        discriminant: NodeId,
        cases: &[NodeId],
        default_cases: &[NodeId],
    ) -> EvalResult {
        let discriminant = self.eval(discriminant)?;
        let ast = Arc::clone(&self.ast);
        for case in cases {
            let NodeKind::MatchCase {
                values,
                group_matching_variable,
                body,
            } = ast.kind(*case)
            else {
                continue;
            };
            for value in values {
                let pattern = self.eval_pattern(*value)?;
                match group_matching_variable {
                    Some(variable) => {
                        if let Some(groups) = pattern.match_groups(&self.ctx, &discriminant)? {
                            let name = self.name_of(*variable)?;
                            self.env.set(name, groups);
                            return self.eval(*body);
                        }
                    }
                    None => {
                        if pattern.test(&self.ctx, &discriminant) {
                            return self.eval(*body);
                        }
                    }
                }
            }
        }
        self.eval_default_case(default_cases)
    }

    fn eval_default_case(&mut self, default_cases: &[NodeId]) -> EvalResult {
        let ast = Arc::clone(&self.ast);
        match default_cases.first().map(|case| ast.kind(*case)) {
            Some(NodeKind::DefaultCase { body }) => self.eval(*body),
            _ => Ok(Value::Nil),
        }
    }
}
