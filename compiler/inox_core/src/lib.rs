#![allow(
    clippy::result_large_err,
    reason = "EvalError carries its position stack and notes inline; boxing it would put an allocation on every error path"
)]
//! Inox Core - values, patterns and permission contexts of the Inox runtime.
//!
//! # Architecture
//!
//! - [`value`]: the closed [`Value`] sum type with capability methods
//!   (`prop`, `at`, `iterator`, `compare`, `on_mutation`, ...)
//! - [`pattern`]: matchers over values, including the regex-backed string
//!   pattern algebra
//! - [`context`]: permission bags, cancellation, limits, named patterns and
//!   type extensions, organised as a tree of contexts
//! - [`dynamic`]: values recomputed when the values they watch mutate
//! - [`quantity`]: quantity and rate literals, quantity arithmetic
//! - [`pretty_print`]: deterministic rendering
//!
//! The evaluator (`inox_eval`) and the static checker (`inox_check`) build on
//! top of this crate; nothing here walks syntax trees except to capture them
//! in function and mapping values.

pub mod context;
mod default_patterns;
pub mod dynamic;
pub mod errors;
pub mod mutation;
pub mod pattern;
pub mod pretty_print;
pub mod quantity;
pub mod smart_lock;
pub mod value;

pub use context::{CallDispatcher, Context, ContextConfig, Permission, PermissionKind};
pub use dynamic::DynamicValue;
pub use errors::{EvalError, EvalErrorKind, EvalResult};
pub use mutation::{Mutation, MutationKind};
pub use pattern::{Pattern, StringPattern};
pub use pretty_print::{pretty_print, to_compact_string, PrettyPrintConfig};
pub use value::{Heap, Value};
