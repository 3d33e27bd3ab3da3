//! Facts recorded by a successful check and consumed by the evaluator.

use rustc_hash::FxHashMap;

use inox_ir::NodeId;

/// Globals referenced by function bodies and mapping entries.
///
/// The evaluator captures the values of these globals when it creates the
/// function or mapping value, so that the callable keeps working once it is
/// passed to another lthread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticCheckData {
    fn_captured_globals: FxHashMap<NodeId, Vec<String>>,
    mapping_captured_globals: FxHashMap<NodeId, Vec<String>>,
}

impl StaticCheckData {
    /// Globals referenced by the function expression `function`, in order of
    /// first reference.
    pub fn fn_captured_globals(&self, function: NodeId) -> &[String] {
        self.fn_captured_globals
            .get(&function)
            .map_or(&[], Vec::as_slice)
    }

    pub fn mapping_captured_globals(&self, mapping: NodeId) -> &[String] {
        self.mapping_captured_globals
            .get(&mapping)
            .map_or(&[], Vec::as_slice)
    }

    pub(crate) fn add_fn_captured_global(&mut self, function: NodeId, name: &str) {
        push_unique(self.fn_captured_globals.entry(function).or_default(), name);
    }

    pub(crate) fn add_mapping_captured_global(&mut self, mapping: NodeId, name: &str) {
        push_unique(self.mapping_captured_globals.entry(mapping).or_default(), name);
    }

    pub(crate) fn merge(&mut self, other: StaticCheckData) {
        self.fn_captured_globals.extend(other.fn_captured_globals);
        self.mapping_captured_globals
            .extend(other.mapping_captured_globals);
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}
