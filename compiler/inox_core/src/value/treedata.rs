//! Tree-shaped data (`treedata` literals) and their pre-order walker.

use std::sync::Arc;

use super::Value;

#[derive(Clone)]
pub struct TreedataEntry {
    pub value: Value,
    pub children: Arc<[TreedataEntry]>,
}

impl TreedataEntry {
    pub fn new(value: Value, children: Vec<TreedataEntry>) -> Self {
        TreedataEntry {
            value,
            children: children.into(),
        }
    }
}

#[derive(Clone)]
pub struct Treedata {
    pub root: Value,
    pub children: Arc<[TreedataEntry]>,
}

impl Treedata {
    pub fn new(root: Value, children: Vec<TreedataEntry>) -> Self {
        Treedata {
            root,
            children: children.into(),
        }
    }

    pub fn walker(&self) -> TreedataWalker {
        TreedataWalker {
            stack: vec![(self.root.clone(), Arc::clone(&self.children), 0)],
            pending: None,
        }
    }
}

/// Pre-order walk; [`TreedataWalker::prune`] skips the children of the
/// entry returned last.
pub struct TreedataWalker {
    stack: Vec<(Value, Arc<[TreedataEntry]>, usize)>,
    pending: Option<(Arc<[TreedataEntry]>, usize)>,
}

impl TreedataWalker {
    pub fn prune(&mut self) {
        self.pending = None;
    }
}

impl Iterator for TreedataWalker {
    /// Entry value and its depth (0 for the root).
    type Item = (Value, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((children, depth)) = self.pending.take() {
            for child in children.iter().rev() {
                self.stack
                    .push((child.value.clone(), Arc::clone(&child.children), depth + 1));
            }
        }
        let (value, children, depth) = self.stack.pop()?;
        self.pending = Some((children, depth));
        Some((value, depth))
    }
}
