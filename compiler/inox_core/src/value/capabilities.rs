//! Capability operations: properties, indexing, slicing, containment,
//! iteration and mutation watching.
//!
//! Each operation dispatches on the variant; a value without the capability
//! reports `TypeMismatch` naming the capability.

use std::sync::Arc;

use super::{Heap, HostFunction, IteratorConfig, Value, ValueIterator};
use crate::context::Context;
use crate::errors::{self, EvalError};
use crate::mutation::{CallbackHandle, MutationCallbackFn};

fn method(
    name: &str,
    f: impl Fn(&Context, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
) -> Value {
    Value::host_function(HostFunction::new(name, Arc::new(f)))
}

fn index_from(index: i64, len: usize) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| errors::index_out_of_bounds(index, len))
}

impl Value {
    /// Read a property.
    pub fn prop(&self, ctx: &Context, name: &str) -> Result<Value, EvalError> {
        let found = match self {
            Value::Object(object) => object.prop(name),
            Value::Record(record) => record.prop(name).cloned(),
            Value::Namespace(namespace) => namespace.get(name).cloned(),
            Value::Option(option) => match name {
                "name" => Some(Value::str(option.name.as_str())),
                "value" => Some(option.value.clone()),
                _ => None,
            },
            Value::Error(error) => match name {
                "text" => Some(Value::str(error.text.as_str())),
                "data" => Some(error.data.clone()),
                _ => None,
            },
            Value::Event(event) => match name {
                "value" => Some(event.value.clone()),
                "time" => Some(Value::DateTime(event.time)),
                _ => None,
            },
            Value::Mutation(mutation) => match name {
                "kind" => Some(Value::identifier(mutation.kind.as_str())),
                "path" => Some(Value::path(mutation.path.as_str())),
                "data0" => mutation.data.first().cloned().or(Some(Value::Nil)),
                _ => None,
            },
            Value::Port(port) => match name {
                "number" => Some(Value::int(i64::from(port.number))),
                "scheme" => Some(port.scheme.clone().map_or(Value::Nil, Value::scheme)),
                _ => None,
            },
            Value::SourcePosition(position) => match name {
                "source" => Some(Value::str(position.source_name.as_str())),
                "line" => Some(Value::int(i64::from(position.line))),
                "column" => Some(Value::int(i64::from(position.column))),
                _ => None,
            },
            Value::SystemGraph(graph) => match name {
                "nodes" => Some(Value::list(
                    graph
                        .nodes()
                        .into_iter()
                        .map(|node| {
                            Value::record(vec![
                                ("name".into(), Value::str(node.name)),
                                ("type_name".into(), Value::str(node.type_name)),
                            ])
                        })
                        .collect(),
                )),
                _ => None,
            },
            Value::Treedata(treedata) => match name {
                "root" => Some(treedata.root.clone()),
                _ => None,
            },
            Value::Url(url) => url_prop(url, name),
            Value::Host(host) => match name {
                "scheme" => host.split_once("://").map(|(scheme, _)| Value::scheme(scheme)),
                "name" => host
                    .split_once("://")
                    .map(|(_, rest)| Value::str(rest.split(':').next().unwrap_or(rest))),
                _ => None,
            },
            Value::Path(path) => path_prop(path, name),
            Value::LThread(lthread) => lthread_prop(lthread, name),
            Value::LThreadGroup(group) => {
                let group = group.clone();
                match name {
                    "wait_all_results" => Some(method(name, move |ctx, _| {
                        Ok(Value::list(group.wait_all_results(ctx)?))
                    })),
                    "cancel_all" => Some(method(name, move |_, _| {
                        group.cancel_all();
                        Ok(Value::Nil)
                    })),
                    _ => None,
                }
            }
            Value::Transaction(tx) => {
                let tx = tx.clone();
                match name {
                    "id" => Some(Value::Ulid(tx.id())),
                    "commit" => Some(method(name, move |ctx, _| {
                        tx.commit(ctx)?;
                        Ok(Value::Nil)
                    })),
                    "rollback" => Some(method(name, move |ctx, _| {
                        tx.rollback(ctx)?;
                        Ok(Value::Nil)
                    })),
                    _ => None,
                }
            }
            Value::Mapping(mapping) => {
                let mapping = mapping.clone();
                match name {
                    "compute" => Some(method(name, move |ctx, args| {
                        let key = args.first().ok_or_else(|| errors::missing_argument("key"))?;
                        mapping.compute(ctx, key)
                    })),
                    _ => None,
                }
            }
            Value::Dynamic(dynamic) => return dynamic.resolve(ctx)?.prop(ctx, name),
            Value::Secret(_) | Value::MarkupElement(_) | Value::Stream(_) => None,
            _ => return Err(errors::type_mismatch("value with properties", self.type_name())),
        };
        found.ok_or_else(|| errors::property_not_found(name))
    }

    /// Write a property.
    pub fn set_prop(&self, ctx: &Context, name: &str, value: Value) -> Result<(), EvalError> {
        match self {
            Value::Object(object) => object.set_prop(ctx, name, value),
            _ => Err(errors::cannot_set_prop(name, self.type_name())),
        }
    }

    /// Names of the readable properties.
    pub fn property_names(&self) -> Result<Vec<String>, EvalError> {
        Ok(match self {
            Value::Object(object) => object.property_names(),
            Value::Record(record) => record.property_names(),
            Value::Namespace(namespace) => {
                namespace.entries().iter().map(|(k, _)| k.clone()).collect()
            }
            Value::Option(_) => vec!["name".into(), "value".into()],
            Value::Error(_) => vec!["data".into(), "text".into()],
            Value::Event(_) => vec!["time".into(), "value".into()],
            Value::Mutation(_) => vec!["data0".into(), "kind".into(), "path".into()],
            _ => return Err(errors::type_mismatch("value with properties", self.type_name())),
        })
    }

    /// Length of an indexable value.
    pub fn len(&self) -> Result<usize, EvalError> {
        Ok(match self {
            Value::List(list) => list.len(),
            Value::Tuple(tuple) => tuple.len(),
            Value::Str(s) => s.len(),
            Value::RuneSlice(slice) => slice.len(),
            Value::ByteSlice(slice) => slice.len(),
            Value::KeyList(keys) => keys.0.len(),
            Value::IntRange(range) => range
                .len()
                .ok_or_else(|| errors::invalid_argument("range length is unknown"))?,
            Value::RuneRange(range) => range.len(),
            _ => return Err(errors::type_mismatch("indexable", self.type_name())),
        })
    }

    /// Element at `index`.
    pub fn at(&self, index: i64) -> Result<Value, EvalError> {
        match self {
            Value::List(list) => {
                let len = list.len();
                list.at(index_from(index, len)?)
                    .ok_or_else(|| errors::index_out_of_bounds(index, len))
            }
            Value::Tuple(tuple) => Ok(tuple.items()[index_from(index, tuple.len())?].clone()),
            Value::Str(s) => Ok(Value::Byte(s.as_bytes()[index_from(index, s.len())?])),
            Value::RuneSlice(slice) => {
                let len = slice.len();
                slice
                    .at(index_from(index, len)?)
                    .map(Value::Rune)
                    .ok_or_else(|| errors::index_out_of_bounds(index, len))
            }
            Value::ByteSlice(slice) => {
                let len = slice.len();
                slice
                    .at(index_from(index, len)?)
                    .map(Value::Byte)
                    .ok_or_else(|| errors::index_out_of_bounds(index, len))
            }
            Value::KeyList(keys) => Ok(Value::str(
                keys.0[index_from(index, keys.0.len())?].as_str(),
            )),
            Value::IntRange(range) => {
                let len = self.len()?;
                let offset = i64::try_from(index_from(index, len)?).unwrap_or(i64::MAX);
                Ok(Value::int(range.start.saturating_add(offset)))
            }
            Value::RuneRange(range) => {
                let offset = u32::try_from(index_from(index, range.len())?).unwrap_or(u32::MAX);
                char::from_u32(u32::from(range.start).saturating_add(offset))
                    .map(Value::Rune)
                    .ok_or_else(|| errors::index_out_of_bounds(index, range.len()))
            }
            _ => Err(errors::type_mismatch("indexable", self.type_name())),
        }
    }

    /// Sub-sequence `start..end` (end exclusive, clamped to the length).
    pub fn slice(&self, start: i64, end: Option<i64>) -> Result<Value, EvalError> {
        let len = self.len()?;
        let start = usize::try_from(start).map_err(|_| errors::index_out_of_bounds(start, len))?;
        let end = match end {
            Some(end) => usize::try_from(end)
                .map_err(|_| errors::index_out_of_bounds(end, len))?
                .min(len),
            None => len,
        };
        if start > end {
            return Err(errors::invalid_argument(format!(
                "slice start ({start}) is greater than its end ({end})"
            )));
        }
        match self {
            Value::List(list) => Ok(Value::list(list.snapshot()[start..end].to_vec())),
            Value::Tuple(tuple) => Ok(Value::tuple(tuple.items()[start..end].to_vec())),
            Value::Str(s) => s
                .get(start..end)
                .map(Value::str)
                .ok_or_else(|| errors::invalid_argument("slice bounds are not on rune boundaries")),
            Value::RuneSlice(slice) => Ok(Value::rune_slice(slice.to_vec()[start..end].to_vec())),
            Value::ByteSlice(slice) => Ok(Value::byte_slice(slice.to_vec()[start..end].to_vec())),
            _ => Err(errors::type_mismatch("sequence", self.type_name())),
        }
    }

    /// Replace the element at `index`.
    pub fn set_at(&self, ctx: &Context, index: i64, value: Value) -> Result<(), EvalError> {
        match self {
            Value::List(list) => list.set(ctx, index_from(index, list.len())?, value),
            Value::RuneSlice(slice) => slice.set(ctx, index_from(index, slice.len())?, &value),
            Value::ByteSlice(slice) => slice.set(ctx, index_from(index, slice.len())?, &value),
            _ => Err(errors::type_mismatch("mutable sequence", self.type_name())),
        }
    }

    /// Replace `start..end` by the elements of `values`.
    pub fn set_slice(
        &self,
        ctx: &Context,
        start: i64,
        end: i64,
        values: &Value,
    ) -> Result<(), EvalError> {
        let Value::List(list) = self else {
            return Err(errors::type_mismatch("mutable sequence", self.type_name()));
        };
        let len = list.len();
        let start = usize::try_from(start).map_err(|_| errors::index_out_of_bounds(start, len))?;
        let end = usize::try_from(end).map_err(|_| errors::index_out_of_bounds(end, len))?;
        let elements = values.sequence_elements()?;
        list.set_slice(ctx, start, end, elements)
    }

    /// Elements of a list, tuple or slice.
    pub fn sequence_elements(&self) -> Result<Vec<Value>, EvalError> {
        Ok(match self {
            Value::List(list) => list.snapshot(),
            Value::Tuple(tuple) => tuple.items().to_vec(),
            Value::RuneSlice(slice) => slice.to_vec().into_iter().map(Value::Rune).collect(),
            Value::ByteSlice(slice) => slice.to_vec().into_iter().map(Value::Byte).collect(),
            Value::KeyList(keys) => keys.0.iter().map(|k| Value::str(k.as_str())).collect(),
            _ => return Err(errors::type_mismatch("sequence", self.type_name())),
        })
    }

    /// `element in self`.
    pub fn contains(&self, element: &Value) -> Result<bool, EvalError> {
        Ok(match self {
            Value::List(list) => list.snapshot().iter().any(|v| v.equals(element)),
            Value::Tuple(tuple) => tuple.items().iter().any(|v| v.equals(element)),
            Value::Object(object) => object.entries().iter().any(|(_, v)| v.equals(element)),
            Value::Record(record) => record.iter().any(|(_, v)| v.equals(element)),
            Value::Dictionary(dict) => dict.entries().iter().any(|(_, v)| v.equals(element)),
            Value::KeyList(keys) => element.as_str().is_some_and(|k| keys.contains(k)),
            Value::Str(s) => match element {
                Value::Str(sub) => s.contains(&**sub),
                Value::Rune(r) => s.contains(*r),
                _ => false,
            },
            Value::RuneSlice(slice) => matches!(element, Value::Rune(r) if slice.to_vec().contains(r)),
            Value::ByteSlice(slice) => matches!(element, Value::Byte(b) if slice.to_vec().contains(b)),
            Value::IntRange(range) => matches!(element, Value::Int(n) if range.contains(n.raw())),
            Value::FloatRange(range) => matches!(element, Value::Float(f) if range.contains(*f)),
            Value::RuneRange(range) => matches!(element, Value::Rune(r) if range.contains(*r)),
            Value::QuantityRange(range) => range.contains(element),
            _ => return Err(errors::type_mismatch("container", self.type_name())),
        })
    }

    /// Iterator over `(key, value)` entries.
    pub fn iterator(
        &self,
        ctx: &Context,
        config: IteratorConfig,
    ) -> Result<Heap<ValueIterator>, EvalError> {
        fn indexed(values: Vec<Value>) -> Vec<(Value, Value)> {
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::int(i64::try_from(i).unwrap_or(i64::MAX)), v))
                .collect()
        }

        let entries = match self {
            Value::Iterator(iterator) => return Ok(iterator.clone()),
            Value::List(list) => indexed(list.locked_snapshot(ctx)?),
            Value::Tuple(_) | Value::RuneSlice(_) | Value::ByteSlice(_) | Value::KeyList(_) => {
                indexed(self.sequence_elements()?)
            }
            Value::Str(s) => s
                .char_indices()
                .map(|(i, r)| (Value::int(i64::try_from(i).unwrap_or(i64::MAX)), Value::Rune(r)))
                .collect(),
            Value::Object(object) => {
                let _guard = if object.is_shared() {
                    Some(object.smart_lock().guard(ctx)?)
                } else {
                    None
                };
                object
                    .entries()
                    .into_iter()
                    .filter(|(k, _)| k.as_str() != super::IMPLICIT_PROP_NAME)
                    .map(|(k, v)| (Value::str(k), v))
                    .collect()
            }
            Value::Record(record) => record
                .iter()
                .filter(|(k, _)| *k != super::IMPLICIT_PROP_NAME)
                .map(|(k, v)| (Value::str(k), v.clone()))
                .collect(),
            Value::Dictionary(dict) => dict.entries(),
            Value::IntRange(range) => {
                if range.unknown_start || range.is_unbounded() {
                    return Err(errors::invalid_argument("cannot iterate an unbounded range"));
                }
                return Ok(Heap::new(ValueIterator::int_range(
                    range.start,
                    range.end,
                    range.step,
                    config,
                )));
            }
            Value::RuneRange(range) => indexed((range.start..=range.end).map(Value::Rune).collect()),
            Value::Dynamic(dynamic) => return dynamic.resolve(ctx)?.iterator(ctx, config),
            _ => return Err(errors::type_mismatch("iterable", self.type_name())),
        };
        Ok(Heap::new(ValueIterator::new(entries, config)))
    }

    pub fn is_iterable(&self) -> bool {
        matches!(
            self,
            Value::Iterator(_)
                | Value::List(_)
                | Value::Tuple(_)
                | Value::RuneSlice(_)
                | Value::ByteSlice(_)
                | Value::KeyList(_)
                | Value::Str(_)
                | Value::Object(_)
                | Value::Record(_)
                | Value::Dictionary(_)
                | Value::IntRange(_)
                | Value::RuneRange(_)
                | Value::Dynamic(_)
        )
    }

    pub fn is_indexable(&self) -> bool {
        matches!(
            self,
            Value::List(_)
                | Value::Tuple(_)
                | Value::Str(_)
                | Value::RuneSlice(_)
                | Value::ByteSlice(_)
                | Value::KeyList(_)
                | Value::IntRange(_)
                | Value::RuneRange(_)
        )
    }

    pub fn is_watchable(&self) -> bool {
        matches!(
            self,
            Value::Object(_)
                | Value::List(_)
                | Value::Dictionary(_)
                | Value::RuneSlice(_)
                | Value::ByteSlice(_)
                | Value::Dynamic(_)
        )
    }

    /// Register a mutation callback.
    pub fn on_mutation(&self, callback: MutationCallbackFn) -> Result<CallbackHandle, EvalError> {
        Ok(match self {
            Value::Object(object) => object.on_mutation(callback),
            Value::List(list) => list.on_mutation(callback),
            Value::Dictionary(dict) => dict.on_mutation(callback),
            Value::RuneSlice(slice) => slice.on_mutation(callback),
            Value::ByteSlice(slice) => slice.on_mutation(callback),
            Value::Dynamic(dynamic) => dynamic.on_mutation(callback),
            _ => return Err(errors::type_mismatch("watchable", self.type_name())),
        })
    }

    pub fn remove_mutation_callback(&self, handle: CallbackHandle) -> bool {
        match self {
            Value::Object(object) => object.remove_mutation_callback(handle),
            Value::List(list) => list.remove_mutation_callback(handle),
            Value::Dictionary(dict) => dict.remove_mutation_callback(handle),
            Value::RuneSlice(slice) => slice.remove_mutation_callback(handle),
            Value::ByteSlice(slice) => slice.remove_mutation_callback(handle),
            Value::Dynamic(dynamic) => dynamic.remove_mutation_callback(handle),
            _ => false,
        }
    }
}

fn url_prop(url: &str, name: &str) -> Option<Value> {
    let parsed = url::Url::parse(url).ok()?;
    match name {
        "scheme" => Some(Value::scheme(parsed.scheme())),
        "host" => {
            let host = parsed.host_str()?;
            Some(match parsed.port() {
                Some(port) => Value::host(format!("{}://{host}:{port}", parsed.scheme())),
                None => Value::host(format!("{}://{host}", parsed.scheme())),
            })
        }
        "path" => Some(Value::path(parsed.path())),
        "raw-query" => Some(Value::str(parsed.query().unwrap_or(""))),
        _ => None,
    }
}

fn path_prop(path: &str, name: &str) -> Option<Value> {
    let trimmed = path.trim_end_matches('/');
    let (dir, file) = match trimmed.rfind('/') {
        Some(index) => (&trimmed[..=index], &trimmed[index + 1..]),
        None => ("./", trimmed),
    };
    match name {
        "name" => Some(Value::str(file)),
        "dir" => Some(Value::path(dir)),
        "ext" => Some(Value::str(
            file.rfind('.').map_or("", |index| &file[index..]),
        )),
        "ends_with_slash" => Some(Value::Bool(path.ends_with('/'))),
        _ => None,
    }
}

fn lthread_prop(lthread: &Heap<super::LThread>, name: &str) -> Option<Value> {
    let lthread = lthread.clone();
    match name {
        "wait_result" => Some(method(name, move |ctx, _| lthread.wait_result(ctx))),
        "cancel" => Some(method(name, move |_, _| {
            lthread.cancel();
            Ok(Value::Nil)
        })),
        "is_done" => Some(Value::Bool(lthread.is_done())),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
