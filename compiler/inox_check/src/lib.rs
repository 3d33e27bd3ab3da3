#![allow(
    clippy::result_large_err,
    reason = "check errors carry position stacks and are returned once per module"
)]
//! Static checker of the Inox runtime.
//!
//! The checker walks a module before it is evaluated and rejects programs
//! that reference undeclared names, shadow globals, misplace control-flow
//! statements or have malformed manifests. It also records, for every
//! function and mapping expression, the globals its body references; the
//! evaluator captures those globals when it creates the callable.
//!
//! # Module Structure
//!
//! - `checker`: the checking pass, one submodule per family of rules
//! - `scope`: name tables keyed by module and scope node
//! - `input`: what a check starts from
//! - `data`: facts recorded by a successful check
//! - `errors`: rule violations and their aggregation

mod checker;
mod data;
mod errors;
mod input;
mod scope;

pub use data::StaticCheckData;
pub use errors::{CheckError, CheckErrorKind, StaticCheckError, MAX_NAME_BYTE_LEN};
pub use input::{CheckInput, InputGlobal};

/// Whether `name` is reserved for metaproperties: `_name_`, with a single
/// leading and a single trailing underscore.
pub fn is_metadata_key(name: &str) -> bool {
    let bytes = name.as_bytes();
    let len = bytes.len();
    len > 2
        && bytes[0] == b'_'
        && bytes[1] != b'_'
        && bytes[len - 1] == b'_'
        && bytes[len - 2] != b'_'
}

/// Check the module rooted at `input.node`.
///
/// Every violation is collected; the check fails if there is at least one.
#[tracing::instrument(level = "debug", skip_all, fields(module = %input.module.name))]
pub fn check(input: &CheckInput<'_>) -> Result<StaticCheckData, StaticCheckError> {
    let root = input.module.ast.kind(input.node);
    if !root.is_module() {
        return Err(StaticCheckError::InvalidRoot(root.name()));
    }

    let (data, errors) = checker::Checker::new(input).run();
    tracing::debug!(errors = errors.len(), "static check done");
    if errors.is_empty() {
        Ok(data)
    } else {
        Err(StaticCheckError::Invalid(errors))
    }
}
