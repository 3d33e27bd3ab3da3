//! Iterators over iterable values.
//!
//! An iterator works on a snapshot of its source taken when it is created
//! (under the source's lock when the source is shared), so mutating the
//! source while iterating never invalidates the iteration. Integer ranges
//! are immutable and stepped lazily instead.

use parking_lot::Mutex;

use super::{Heap, Value};
use crate::context::Context;
use crate::pattern::Pattern;

/// Filters applied by an iterator.
#[derive(Clone, Default)]
pub struct IteratorConfig {
    pub key_pattern: Option<Heap<Pattern>>,
    pub value_pattern: Option<Heap<Pattern>>,
}

impl IteratorConfig {
    fn accepts(&self, ctx: &Context, key: &Value, value: &Value) -> bool {
        self.key_pattern.as_ref().map_or(true, |p| p.test(ctx, key))
            && self.value_pattern.as_ref().map_or(true, |p| p.test(ctx, value))
    }
}

/// Where the remaining entries come from.
enum Source {
    Entries {
        entries: Vec<(Value, Value)>,
        position: usize,
    },
    /// Integer range stepped on demand; `next` is `None` once exhausted.
    IntRange {
        next: Option<i64>,
        end: i64,
        step: i64,
        index: i64,
    },
}

impl Source {
    fn pull(&mut self) -> Option<(Value, Value)> {
        match self {
            Source::Entries { entries, position } => {
                let entry = entries.get(*position)?.clone();
                *position += 1;
                Some(entry)
            }
            Source::IntRange {
                next,
                end,
                step,
                index,
            } => {
                let current = (*next)?;
                *next = current.checked_add(*step).filter(|n| n <= end);
                let key = *index;
                *index = index.saturating_add(1);
                Some((Value::int(key), Value::int(current)))
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        match self {
            Source::Entries { entries, position } => *position >= entries.len(),
            Source::IntRange { next, .. } => next.is_none(),
        }
    }
}

pub struct ValueIterator {
    source: Mutex<Source>,
    config: IteratorConfig,
}

impl ValueIterator {
    pub fn new(entries: Vec<(Value, Value)>, config: IteratorConfig) -> Self {
        ValueIterator {
            source: Mutex::new(Source::Entries {
                entries,
                position: 0,
            }),
            config,
        }
    }

    /// Iterates `start..=end` by `step` without materializing the range.
    pub fn int_range(start: i64, end: i64, step: i64, config: IteratorConfig) -> Self {
        ValueIterator {
            source: Mutex::new(Source::IntRange {
                next: (start <= end).then_some(start),
                end,
                step: step.max(1),
                index: 0,
            }),
            config,
        }
    }

    /// Next `(key, value)` accepted by the filters.
    pub fn next(&self, ctx: &Context) -> Option<(Value, Value)> {
        let mut source = self.source.lock();
        while let Some((key, value)) = source.pull() {
            if self.config.accepts(ctx, &key, &value) {
                return Some((key, value));
            }
        }
        None
    }

    pub fn has_next(&self) -> bool {
        !self.source.lock().is_exhausted()
    }
}

impl Value {
    pub fn value_iterator(iterator: ValueIterator) -> Self {
        Value::Iterator(Heap::new(iterator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;

    #[test]
    fn value_pattern_filters_entries() {
        let ctx = Context::new_root(ContextConfig::default());
        let int_pattern = ctx.resolve_named_pattern("int").unwrap();
        let iterator = ValueIterator::new(
            vec![
                (Value::int(0), Value::int(1)),
                (Value::int(1), Value::str("a")),
                (Value::int(2), Value::int(3)),
            ],
            IteratorConfig {
                key_pattern: None,
                value_pattern: Some(int_pattern),
            },
        );
        let values: Vec<i64> = std::iter::from_fn(|| iterator.next(&ctx))
            .filter_map(|(_, v)| v.as_int())
            .collect();
        assert_eq!(values, vec![1, 3]);
        assert!(!iterator.has_next());
    }

    #[test]
    fn int_range_steps_lazily() {
        let ctx = Context::new_root(ContextConfig::default());
        let iterator = ValueIterator::int_range(0, i64::MAX - 1, 1, IteratorConfig::default());
        let first: Vec<(i64, i64)> = std::iter::from_fn(|| iterator.next(&ctx))
            .take(3)
            .map(|(k, v)| (k.as_int().unwrap(), v.as_int().unwrap()))
            .collect();
        assert_eq!(first, vec![(0, 0), (1, 1), (2, 2)]);
        assert!(iterator.has_next());
    }

    #[test]
    fn int_range_stops_at_its_end_without_overflowing() {
        let ctx = Context::new_root(ContextConfig::default());
        let iterator = ValueIterator::int_range(i64::MAX - 4, i64::MAX, 3, IteratorConfig::default());
        let values: Vec<i64> = std::iter::from_fn(|| iterator.next(&ctx))
            .filter_map(|(_, v)| v.as_int())
            .collect();
        assert_eq!(values, vec![i64::MAX - 4, i64::MAX - 1]);
        assert!(!iterator.has_next());
    }
}
