//! Dynamic values: values recomputed from a watched source.
//!
//! # Design
//!
//! A [`DynamicValue`] applies one operation (member access, map invocation,
//! conditional or call) to an operand. It registers mutation callbacks on the
//! watchable values it depends on; each callback holds only a weak reference
//! to the dynamic value, and the handles are removed from the sources when the
//! dynamic value is dropped, so a source never keeps its dependents alive.
//!
//! When a source changes, the dynamic value updates its state under its own
//! lock, releases the lock and then notifies its own watchers with an
//! `unspecified-mutation`. A dynamic call that fails when called again keeps
//! the error and reports it on every read until a later call succeeds.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::{
    CallbackHandle, Mutation, MutationCallbackFn, MutationCallbacks, MutationKind,
};
use crate::value::{Heap, IteratorConfig, Value};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DynamicValueError {
    #[error("cannot create dynamic member: property .{0} is missing")]
    MissingProperty(String),
    #[error("cannot create dynamic map invocation: a(n) {0} is not iterable")]
    NotIterable(&'static str),
    #[error("condition of dynamic if should be a boolean, not a(n) {0}")]
    ConditionNotBoolean(&'static str),
    #[error("callee of dynamic call should be a function, not a(n) {0}")]
    CalleeNotFunction(&'static str),
}

impl From<DynamicValueError> for EvalError {
    fn from(error: DynamicValueError) -> Self {
        match error {
            DynamicValueError::MissingProperty(name) => errors::property_not_found(&name),
            DynamicValueError::NotIterable(got) => errors::type_mismatch("iterable", got),
            DynamicValueError::ConditionNotBoolean(got) => errors::type_mismatch("boolean", got),
            DynamicValueError::CalleeNotFunction(got) => errors::not_callable(got),
        }
    }
}

/// Operation applied by a dynamic value.
pub enum DynamicOp {
    Member(String),
    MapInvocation { mapper: Value },
    If { consequent: Value, alternate: Value },
    Call { callee: Value, args: Vec<Value> },
}

impl DynamicOp {
    pub fn name(&self) -> &'static str {
        match self {
            DynamicOp::Member(_) => "dynamic-member",
            DynamicOp::MapInvocation { .. } => "dynamic-map-invocation",
            DynamicOp::If { .. } => "dynamic-if",
            DynamicOp::Call { .. } => "dynamic-call",
        }
    }
}

struct DynamicState {
    /// Object or iterable operated on, selected branch, or last call result.
    operand: Value,
    /// Cached result of a map invocation; cleared when the iterable changes.
    map_result: Option<Value>,
    /// Error of the last call of a dynamic call.
    failure: Option<EvalError>,
}

pub struct DynamicValue {
    op: DynamicOp,
    /// Dynamic value the operand is resolved from.
    inner: Option<Heap<DynamicValue>>,
    state: Mutex<DynamicState>,
    callbacks: MutationCallbacks,
    /// Callbacks registered on sources, removed on drop.
    registrations: Mutex<Vec<(Value, CallbackHandle)>>,
}

impl DynamicValue {
    fn build(op: DynamicOp, inner: Option<Heap<DynamicValue>>, operand: Value) -> Heap<Self> {
        Heap::new(DynamicValue {
            op,
            inner,
            state: Mutex::new(DynamicState {
                operand,
                map_result: None,
                failure: None,
            }),
            callbacks: MutationCallbacks::new(),
            registrations: Mutex::new(Vec::new()),
        })
    }

    /// `obj.<name>` kept up to date with the object.
    pub fn member(ctx: &Context, object: &Value, name: &str) -> Result<Value, EvalError> {
        let (inner, operand) = split_inner(ctx, object)?;
        if !operand.property_names()?.iter().any(|n| n == name) {
            return Err(DynamicValueError::MissingProperty(name.to_string()).into());
        }
        let dynamic = Self::build(DynamicOp::Member(name.to_string()), inner, operand.clone());
        Self::watch_inner(&dynamic)?;
        let path = format!("/{name}");
        Self::watch(&dynamic, &operand, move |dynamic, ctx, mutation| {
            let affects_member = matches!(mutation.kind, MutationKind::AddProp | MutationKind::UpdateProp)
                && mutation.path == path;
            if affects_member {
                dynamic.notify(ctx);
            }
        })?;
        Ok(Value::Dynamic(dynamic))
    }

    /// `map(iterable, mapper)` recomputed when the iterable changes.
    pub fn map_invocation(ctx: &Context, iterable: &Value, mapper: Value) -> Result<Value, EvalError> {
        let (inner, operand) = split_inner(ctx, iterable)?;
        if !operand.is_iterable() {
            return Err(DynamicValueError::NotIterable(operand.type_name()).into());
        }
        let dynamic = Self::build(DynamicOp::MapInvocation { mapper }, inner, operand.clone());
        Self::watch_inner(&dynamic)?;
        Self::watch(&dynamic, &operand, |dynamic, ctx, _| {
            dynamic.state.lock().map_result = None;
            dynamic.notify(ctx);
        })?;
        Ok(Value::Dynamic(dynamic))
    }

    /// `if condition consequent else alternate`, following a dynamic condition.
    pub fn conditional(
        ctx: &Context,
        condition: Heap<DynamicValue>,
        consequent: Value,
        alternate: Value,
    ) -> Result<Value, EvalError> {
        let branch = match condition.resolve(ctx)? {
            Value::Bool(true) => consequent.clone(),
            Value::Bool(false) => alternate.clone(),
            other => return Err(DynamicValueError::ConditionNotBoolean(other.type_name()).into()),
        };
        let dynamic = Self::build(
            DynamicOp::If {
                consequent,
                alternate,
            },
            Some(condition),
            branch,
        );
        Self::watch_inner(&dynamic)?;
        Ok(Value::Dynamic(dynamic))
    }

    /// `callee(args...)` called again whenever a watchable argument changes.
    pub fn call(ctx: &Context, callee: Value, args: Vec<Value>) -> Result<Value, EvalError> {
        if !matches!(callee, Value::HostFunction(_) | Value::InoxFunction(_)) {
            return Err(DynamicValueError::CalleeNotFunction(callee.type_name()).into());
        }
        let first = call_with_resolved_args(ctx, &callee, &args)?;
        let watched: Vec<Value> = args.iter().filter(|a| a.is_watchable()).cloned().collect();
        let dynamic = Self::build(DynamicOp::Call { callee, args }, None, first);
        for arg in &watched {
            Self::watch(&dynamic, arg, |dynamic, ctx, _| {
                let DynamicOp::Call { callee, args } = &dynamic.op else {
                    return;
                };
                match call_with_resolved_args(ctx, callee, args) {
                    Ok(result) => {
                        let mut state = dynamic.state.lock();
                        state.operand = result;
                        state.failure = None;
                    }
                    Err(error) => {
                        tracing::warn!(%error, "error during dynamic call");
                        dynamic.state.lock().failure = Some(error);
                    }
                }
                dynamic.notify(ctx);
            })?;
        }
        Ok(Value::Dynamic(dynamic))
    }

    pub fn op(&self) -> &DynamicOp {
        &self.op
    }

    /// Current value.
    pub fn resolve(&self, ctx: &Context) -> Result<Value, EvalError> {
        inox_stack::ensure_sufficient_stack(|| match &self.op {
            DynamicOp::Member(name) => {
                let object = self.state.lock().operand.clone();
                object.prop(ctx, name)
            }
            DynamicOp::MapInvocation { mapper } => {
                let iterable = {
                    let state = self.state.lock();
                    if let Some(result) = &state.map_result {
                        return Ok(result.clone());
                    }
                    state.operand.clone()
                };
                let result = map_iterable(ctx, &iterable, mapper)?;
                self.state.lock().map_result = Some(result.clone());
                Ok(result)
            }
            DynamicOp::If { .. } => Ok(self.state.lock().operand.clone()),
            DynamicOp::Call { .. } => {
                let state = self.state.lock();
                match &state.failure {
                    Some(error) => Err(error.clone()),
                    None => Ok(state.operand.clone()),
                }
            }
        })
    }

    pub fn on_mutation(&self, callback: MutationCallbackFn) -> CallbackHandle {
        self.callbacks.add(callback)
    }

    pub fn remove_mutation_callback(&self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(handle)
    }

    fn notify(&self, ctx: &Context) {
        self.callbacks.fire(ctx, &Mutation::unspecified(""));
    }

    /// Register `on_change` on `source` if it is watchable.
    fn watch(
        dynamic: &Heap<DynamicValue>,
        source: &Value,
        on_change: impl Fn(&DynamicValue, &Context, &Mutation) + Send + Sync + 'static,
    ) -> Result<(), EvalError> {
        if !source.is_watchable() {
            return Ok(());
        }
        let weak: Weak<DynamicValue> = Arc::downgrade(Heap::arc(dynamic));
        let handle = source.on_mutation(Arc::new(move |ctx, mutation| {
            let Some(dynamic) = weak.upgrade() else {
                return false;
            };
            on_change(&dynamic, ctx, mutation);
            true
        }))?;
        dynamic.registrations.lock().push((source.clone(), handle));
        Ok(())
    }

    /// Follow the inner dynamic value: re-resolve the operand when it changes.
    fn watch_inner(dynamic: &Heap<DynamicValue>) -> Result<(), EvalError> {
        let Some(inner) = &dynamic.inner else {
            return Ok(());
        };
        Self::watch(dynamic, &Value::Dynamic(inner.clone()), |dynamic, ctx, _| {
            let Some(inner) = &dynamic.inner else {
                return;
            };
            let resolved = match inner.resolve(ctx) {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::debug!(%error, op = dynamic.op.name(), "failed to re-resolve dynamic operand");
                    return;
                }
            };
            {
                let mut state = dynamic.state.lock();
                match &dynamic.op {
                    DynamicOp::If {
                        consequent,
                        alternate,
                    } => {
                        state.operand = if matches!(resolved, Value::Bool(true)) {
                            consequent.clone()
                        } else {
                            alternate.clone()
                        };
                    }
                    _ => {
                        state.operand = resolved;
                        state.map_result = None;
                    }
                }
            }
            dynamic.notify(ctx);
        })
    }
}

impl Drop for DynamicValue {
    fn drop(&mut self) {
        for (source, handle) in self.registrations.get_mut().drain(..) {
            source.remove_mutation_callback(handle);
        }
    }
}

/// Inner dynamic value (if any) and the concrete operand.
fn split_inner(ctx: &Context, value: &Value) -> Result<(Option<Heap<DynamicValue>>, Value), EvalError> {
    match value {
        Value::Dynamic(inner) => Ok((Some(inner.clone()), inner.resolve(ctx)?)),
        other => Ok((None, other.clone())),
    }
}

fn resolved(ctx: &Context, value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Dynamic(dynamic) => dynamic.resolve(ctx),
        other => Ok(other.clone()),
    }
}

fn call_with_resolved_args(ctx: &Context, callee: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let args = args
        .iter()
        .map(|arg| resolved(ctx, arg))
        .collect::<Result<Vec<_>, _>>()?;
    ctx.dispatcher()?.call(ctx, callee, args)
}

/// List of the values produced by applying `mapper` to each element of
/// `iterable`.
///
/// A function mapper is called with the element; a property name extracts
/// the property; a key list extracts a record with the listed properties.
pub fn map_iterable(ctx: &Context, iterable: &Value, mapper: &Value) -> Result<Value, EvalError> {
    let iterator = iterable.iterator(ctx, IteratorConfig::default())?;
    let mut results = Vec::new();
    while let Some((_, element)) = iterator.next(ctx) {
        let mapped = match mapper {
            Value::HostFunction(_) | Value::InoxFunction(_) => {
                ctx.dispatcher()?.call(ctx, mapper, vec![element])?
            }
            Value::PropertyName(name) => element.prop(ctx, name)?,
            Value::KeyList(keys) => Value::record(
                keys.0
                    .iter()
                    .map(|key| Ok((key.clone(), element.prop(ctx, key)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?,
            ),
            other => return Err(errors::type_mismatch("mapper", other.type_name())),
        };
        results.push(mapped);
    }
    Ok(Value::list(results))
}
